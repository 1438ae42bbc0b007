//! HTTP 路由

mod basedatos;
mod localidades;
mod nuevo_estatus;
mod ops;
mod support;
mod usuarios;
mod ws;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
};
use po_config::AppConfig;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use super::state::AppState;

/// 业务与运维路由
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/basedatos", basedatos::routes())
        .nest("/api/nuevo-estatus", nuevo_estatus::routes())
        .nest("/api/usuarios", usuarios::routes())
        .route("/api/login", post(usuarios::login))
        .nest("/api/localidades", localidades::routes())
        .route("/ws", get(ws::websocket_handler))
        .route("/health", get(ops::health_check))
        .route("/ready", get(ops::readiness_check))
        .route("/metrics", get(ops::metrics))
        .with_state(state)
}

/// 加上追踪、CORS 与请求体大小限制
pub fn app(state: AppState, config: &AppConfig) -> Router {
    router(state)
        .layer(DefaultBodyLimit::max(config.server.body_limit_mb * 1024 * 1024))
        .layer(cors_layer(&config.cors.allowed_origins))
        .layer(TraceLayer::new_for_http())
}

/// 未配置来源时允许任意来源
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
