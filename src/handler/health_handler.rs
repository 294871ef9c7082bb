use crate::response::app_response::SuccessResponse;
use crate::state::user_state::UserState;
use axum::extract::State;
use serde::Serialize;
use std::time::Instant;

#[derive(Serialize, Debug)]
pub struct HealthStatus {
    pub status: &'static str,
    pub database: &'static str,
    pub uptime_seconds: u64,
    pub version: &'static str,
}

static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

pub fn init_start_time() {
    START_TIME.get_or_init(Instant::now);
}

pub fn get_uptime_seconds() -> u64 {
    START_TIME
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

pub async fn health_check(State(state): State<UserState>) -> SuccessResponse<HealthStatus> {
    let (status, database) = if state.user_service.store_reachable().await {
        ("healthy", "up")
    } else {
        ("unhealthy", "down")
    };

    SuccessResponse::send(HealthStatus {
        status,
        database,
        uptime_seconds: get_uptime_seconds(),
        version: env!("CARGO_PKG_VERSION"),
    })
}
