/// API routes and handlers
pub mod ai;
pub mod entities;
pub mod extract;
pub mod health;
pub mod middleware;
pub mod system;

use crate::context::AppContext;
use axum::Router;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(health::routes())
        .merge(entities::routes())
        .merge(system::routes())
        .merge(ai::routes())
}
