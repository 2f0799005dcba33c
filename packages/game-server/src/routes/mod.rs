use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

pub mod health;
pub mod matches;
pub mod queue;
pub mod websocket;

pub fn app(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health_check))
        .merge(queue::routes())
        .merge(matches::routes())
        .merge(websocket::routes())
        .layer(cors)
        .with_state(app_state)
}
