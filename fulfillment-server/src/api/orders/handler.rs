//! Orders API Handlers

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::orders::manager::NewOrder;
use crate::utils::{AppError, AppResult};
use shared::order::{
    CanonicalLineItem, Discount, Invoice, KitchenTicket, Order, OrderStatus, PaymentMethod,
    PrintEntry,
};

/// POST /api/orders - Create a pending order
pub async fn create(
    State(state): State<ServerState>,
    Json(new_order): Json<NewOrder>,
) -> AppResult<Json<Order>> {
    let order = state.manager.create_order(new_order)?;
    Ok(Json(order))
}

/// GET /api/orders - List active (non-terminal) orders
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Order>>> {
    Ok(Json(state.manager.list_active()?))
}

/// GET /api/orders/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    Ok(Json(state.manager.get_order(&id)?))
}

#[derive(Debug, Default, Deserialize)]
pub struct AdvanceRequest {
    /// Explicit target status; omitted means the next status in the flow
    #[serde(default)]
    pub target: Option<OrderStatus>,
}

/// POST /api/orders/:id/advance
pub async fn advance(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<AdvanceRequest>,
) -> AppResult<Json<Order>> {
    Ok(Json(state.manager.advance_status(&id, req.target)?))
}

#[derive(Debug, Deserialize)]
pub struct PaymentMethodRequest {
    pub method: PaymentMethod,
}

/// POST /api/orders/:id/payment-method - One-time payment method capture
pub async fn set_payment_method(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<PaymentMethodRequest>,
) -> AppResult<Json<Order>> {
    Ok(Json(state.manager.set_payment_method(&id, req.method)?))
}

/// GET /api/orders/:id/items - Canonical priced items (full reprint view)
pub async fn items(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<CanonicalLineItem>>> {
    Ok(Json(state.manager.get_canonical_items(&id)?))
}

/// GET /api/orders/:id/unprinted-items
pub async fn unprinted_items(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<CanonicalLineItem>>> {
    Ok(Json(state.manager.get_unprinted_items(&id)?))
}

#[derive(Debug, Deserialize)]
pub struct PrintRequest {
    pub entries: Vec<PrintEntry>,
}

/// POST /api/orders/:id/print - Mark item units printed
pub async fn mark_printed(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<PrintRequest>,
) -> AppResult<Json<KitchenTicket>> {
    Ok(Json(state.manager.mark_printed(&id, &req.entries)?))
}

/// GET /api/orders/:id/ticket - The order's kitchen ticket, if printed
pub async fn ticket(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<KitchenTicket>> {
    let ticket = state
        .manager
        .get_ticket(&id)?
        .ok_or_else(|| AppError::NotFound(format!("No kitchen ticket for order {id}")))?;
    Ok(Json(ticket))
}

#[derive(Debug, Default, Deserialize)]
pub struct InvoiceRequest {
    #[serde(default)]
    pub discount: Option<Discount>,
}

/// POST /api/orders/:id/invoice - Build the bill over fresh canonical items
pub async fn invoice(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<InvoiceRequest>,
) -> AppResult<Json<Invoice>> {
    Ok(Json(state.manager.build_invoice(&id, req.discount.as_ref())?))
}

#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    pub removed: usize,
}

/// POST /api/orders/purge - Delete terminal orders and their tickets
pub async fn purge(State(state): State<ServerState>) -> AppResult<Json<PurgeResponse>> {
    let removed = state.manager.purge_terminal()?;
    Ok(Json(PurgeResponse { removed }))
}
