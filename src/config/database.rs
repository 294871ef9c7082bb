use crate::config::logging;
use crate::config::settings::DatabaseSettings;
use async_trait::async_trait;
use sqlx::{Error, Pool, Postgres, migrate::MigrateError, pool::PoolOptions};
use tracing::info;

pub struct Database {
    pool: Pool<Postgres>,
}

impl Database {
    /// Wrap an existing pool, e.g. one handed out by `#[sqlx::test]`
    pub fn from_pool(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
pub trait DatabaseTrait {
    async fn init(settings: &DatabaseSettings) -> Result<Self, Error>
    where
        Self: Sized;
    async fn migrate(&self) -> Result<(), MigrateError>;
    fn get_pool(&self) -> &Pool<Postgres>;
}

#[async_trait]
impl DatabaseTrait for Database {
    async fn init(settings: &DatabaseSettings) -> Result<Self, Error> {
        let pool = PoolOptions::<Postgres>::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(settings.acquire_timeout)
            .idle_timeout(settings.idle_timeout)
            .max_lifetime(settings.max_lifetime)
            .connect(&settings.url)
            .await?;

        // Pool capacity is only worth printing while developing
        if logging::get_config().allow_detailed_errors() {
            info!(
                "Database pool configured: max={}, min={}, acquire_timeout={:?}, idle_timeout={:?}, max_lifetime={:?}",
                settings.max_connections,
                settings.min_connections,
                settings.acquire_timeout,
                settings.idle_timeout,
                settings.max_lifetime
            );
        } else {
            info!("Database pool configured successfully");
        }

        Ok(Self { pool })
    }

    async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    fn get_pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}
