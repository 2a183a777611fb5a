pub mod api;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod health;
pub mod lifecycle;
pub mod matchmaker;
pub mod rate_limit;
pub mod registry;
pub mod relay;
pub mod state;
pub mod ws;

use axum::Router;
use axum::routing::get;
use tower_http::services::ServeDir;

use config::ServerConfig;
use state::AppState;

/// Build the Axum router and application state from a config.
pub fn build_app(config: ServerConfig) -> (Router<()>, AppState) {
    let web_root = config.web_root.clone();
    let state = AppState::new(config);

    let api_routes = Router::new()
        .route("/lobby", get(api::get_lobby))
        .route("/sessions/{session_id}", get(api::get_session));

    let app = Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/health", get(health::health_check))
        .nest("/api/v1", api_routes)
        .fallback_service(ServeDir::new(&web_root))
        .with_state(state.clone());

    (app, state)
}
