use staff_auth::config::database::{Database, DatabaseTrait};
use staff_auth::config::settings::Settings;
use staff_auth::config::{logging, parameter};
use staff_auth::error::AppError;
use staff_auth::repository::UserStore;
use staff_auth::repository::user_repository::UserRepository;
use staff_auth::routes;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    parameter::init();
    logging::init();
    info!("Starting staff auth service...");
    info!("Configuration initialized with {} parameters", parameter::loaded_count());

    let settings = Settings::from_parameters().inspect_err(|e| {
        error!("Invalid configuration: {}", e);
    })?;

    let connection = match Database::init(&settings.database).await {
        Ok(conn) => {
            info!("Database connection established successfully");
            conn
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e.into());
        }
    };

    if settings.database.run_migrations {
        connection.migrate().await.inspect_err(|e| {
            error!("Failed to apply migrations: {}", e);
        })?;
    }

    let store: Arc<dyn UserStore> = Arc::new(UserRepository::new(&Arc::new(connection)));

    let app = match routes::root::routes(store, &settings) {
        Ok(router) => router,
        Err(e) => {
            error!("Failed to initialize routes: {}", e);
            return Err(e);
        }
    };

    let host = settings.server.bind_address();
    let listener = match tokio::net::TcpListener::bind(&host).await {
        Ok(listener) => {
            info!("Server successfully bound to {}", host);
            listener
        }
        Err(e) => {
            error!("Failed to bind to {}: {}", host, e);
            return Err(e.into());
        }
    };

    info!("Server starting...");
    match axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        Ok(()) => {
            info!("Server shutdown gracefully");
            Ok(())
        }
        Err(e) => {
            error!("Server error: {}", e);
            Err(e.into())
        }
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal, initiating graceful shutdown..."),
        Err(err) => {
            error!("Unable to listen for shutdown signal: {}", err);
            std::future::pending::<()>().await
        }
    }
}
