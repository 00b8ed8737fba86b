use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::middleware;
use axum::routing::{any, get};
use axum::{Json, Router};

use crate::config::Config;
use crate::domain::auth::AuthGate;
use crate::domain::cors::CorsPolicy;
use crate::domain::dashboard_service::DashboardService;
use crate::domain::gateway::GatewayApi;
use crate::domain::rate_limiter::RateLimiter;
use crate::domain::runner::CommandRunner;
use crate::domain::types::*;

use super::error::ApiError;
use super::{pipeline, static_files};

pub const HEALTH_PATH: &str = "/health";
pub const API_PREFIX: &str = "/api/";

/// Shared application state for all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<DashboardService>,
    pub limiter: Arc<RateLimiter>,
    pub auth: Arc<AuthGate>,
    pub cors: Arc<CorsPolicy>,
    pub static_dir: Arc<PathBuf>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        config: &Config,
        runner: Arc<dyn CommandRunner>,
        gateway: Arc<dyn GatewayApi>,
    ) -> Self {
        Self {
            dashboard: DashboardService::new(config, runner, gateway),
            limiter: Arc::new(RateLimiter::new(
                config.rate_limit.max_requests,
                Duration::from_secs(config.rate_limit.window_secs),
            )),
            auth: Arc::new(AuthGate::new(config.auth.token.clone())),
            cors: Arc::new(CorsPolicy::new(config.cors.allowed_origins.clone())),
            static_dir: Arc::new(config.static_dir.clone()),
            started_at: Instant::now(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health))
        .route("/api/system", get(system))
        .route("/api/sessions", get(sessions))
        .route("/api/services", get(services))
        .route("/api/network", get(network))
        .route("/api/crons", get(crons))
        .route("/api/config", get(settings))
        .route("/api/{*rest}", any(api_not_found))
        .fallback(static_files::serve)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            pipeline::request_pipeline,
        ))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        uptime: state.started_at.elapsed().as_secs_f64(),
    })
}

async fn system(State(state): State<AppState>) -> Json<SystemStats> {
    Json(state.dashboard.system().await)
}

async fn sessions(State(state): State<AppState>) -> Json<SessionList> {
    Json(state.dashboard.sessions().await)
}

async fn services(State(state): State<AppState>) -> Json<ServiceList> {
    Json(state.dashboard.services().await)
}

async fn network(State(state): State<AppState>) -> Json<HostList> {
    Json(state.dashboard.network().await)
}

async fn crons(State(state): State<AppState>) -> Json<CronList> {
    Json(state.dashboard.crons().await)
}

async fn settings(State(state): State<AppState>) -> Json<DashboardSettings> {
    Json(state.dashboard.settings())
}

async fn api_not_found() -> ApiError {
    ApiError::NotFound
}
