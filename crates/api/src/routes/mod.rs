pub mod health;
pub mod notifications;
pub mod trash;

use axum::Router;

use crate::state::AppState;

/// Build the complete API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(trash::router())
        .merge(notifications::router())
        .with_state(state)
}
