pub mod backup;
pub mod health;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(backup::router())
        .merge(health::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
