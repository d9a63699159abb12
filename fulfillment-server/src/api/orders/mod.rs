//! Orders API Module
//!
//! REST endpoints over the order operation surface: creation, lifecycle,
//! payment capture, print tracking and billing.

mod handler;

use axum::{routing::get, routing::post, Router};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", order_routes())
}

fn order_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/purge", post(handler::purge))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/advance", post(handler::advance))
        .route("/{id}/payment-method", post(handler::set_payment_method))
        .route("/{id}/items", get(handler::items))
        .route("/{id}/unprinted-items", get(handler::unprinted_items))
        .route("/{id}/print", post(handler::mark_printed))
        .route("/{id}/ticket", get(handler::ticket))
        .route("/{id}/invoice", post(handler::invoice))
}
