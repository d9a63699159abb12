//! HTTP API
//!
//! One router module per resource, each exposing a `router()` merged
//! here into the application router.

pub mod health;
pub mod orders;

use crate::core::ServerState;
use axum::Router;

pub fn router(state: ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(orders::router())
        .with_state(state)
}
