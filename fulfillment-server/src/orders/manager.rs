//! OrdersManager - the operation surface over orders
//!
//! Mutations follow a fixed shape: open one write transaction, read the
//! order row, apply the change, commit, then publish the lifecycle
//! event. Concurrent mutations of the same order serialize on the write
//! transaction, and a subscriber that misses an event still converges
//! through its periodic resync.

use crate::catalog::{TableStore, TaxDefaultSource, VendorProfileStore};
use crate::events::{EventBroadcaster, Subscription};
use crate::lifecycle;
use crate::orders::error::{OrderError, OrderResult};
use crate::orders::storage::{OrderStorage, StorageError};
use crate::pricing;
use crate::printing::apply_print_entries;
use shared::order::{
    CanonicalLineItem, Channel, ChannelRef, CustomerInfo, Discount, Invoice, KitchenTicket,
    LifecycleEvent, Order, OrderStatus, PaymentMethod, PrintEntry, TicketStatus,
};
use shared::util::now_millis;
use std::sync::Arc;

/// Checkout input for a new order
#[derive(Debug, Clone, serde::Deserialize)]
pub struct NewOrder {
    pub vendor_id: String,
    pub channel: Channel,
    /// Raw line items, stored as received and reconciled on every read
    #[serde(default)]
    pub items: serde_json::Value,
    #[serde(default)]
    pub customer: CustomerInfo,
    pub channel_ref: ChannelRef,
}

pub struct OrdersManager {
    storage: OrderStorage,
    broadcaster: EventBroadcaster,
    tax_defaults: Arc<dyn TaxDefaultSource>,
    vendors: Arc<dyn VendorProfileStore>,
    tables: Arc<dyn TableStore>,
}

impl OrdersManager {
    pub fn new(
        storage: OrderStorage,
        broadcaster: EventBroadcaster,
        tax_defaults: Arc<dyn TaxDefaultSource>,
        vendors: Arc<dyn VendorProfileStore>,
        tables: Arc<dyn TableStore>,
    ) -> Self {
        Self {
            storage,
            broadcaster,
            tax_defaults,
            vendors,
            tables,
        }
    }

    pub fn broadcaster(&self) -> &EventBroadcaster {
        &self.broadcaster
    }

    /// Subscribe to lifecycle events with an observer-side filter
    pub fn subscribe<F>(&self, predicate: F) -> Subscription
    where
        F: Fn(&LifecycleEvent) -> bool + Send + 'static,
    {
        self.broadcaster.subscribe(predicate)
    }

    fn fetch(&self, order_id: &str) -> OrderResult<Order> {
        self.storage.get_order(order_id).map_err(map_not_found)
    }

    // ========== Creation ==========

    /// Create a pending order on a fulfillment channel.
    ///
    /// Rejected when the vendor has the channel disabled or when the
    /// channel reference does not match the channel (a dining order
    /// needs a table, a delivery order an address).
    pub fn create_order(&self, new_order: NewOrder) -> OrderResult<Order> {
        if !self
            .vendors
            .is_channel_enabled(&new_order.vendor_id, new_order.channel)
        {
            return Err(OrderError::ChannelDisabled {
                vendor_id: new_order.vendor_id,
                channel: new_order.channel,
            });
        }
        if !new_order.channel_ref.matches_channel(new_order.channel) {
            return Err(OrderError::Validation(format!(
                "channel reference does not match channel {}",
                new_order.channel
            )));
        }

        let now = now_millis();
        let order = Order {
            id: uuid::Uuid::new_v4().to_string(),
            vendor_id: new_order.vendor_id,
            channel: new_order.channel,
            status: OrderStatus::Pending,
            items_payload: serde_json::to_string(&new_order.items)
                .unwrap_or_else(|_| "[]".to_string()),
            payment_method: None,
            customer: new_order.customer,
            channel_ref: new_order.channel_ref,
            timestamps: Default::default(),
            created_at: now,
            updated_at: now,
        };

        let txn = self.storage.begin_write()?;
        self.storage.put_order_txn(&txn, &order)?;
        self.storage.mark_order_active(&txn, &order.id)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(
            order_id = %order.id,
            vendor_id = %order.vendor_id,
            channel = %order.channel,
            "Order created"
        );
        self.broadcaster.publish(LifecycleEvent::OrderCreated {
            order_id: order.id.clone(),
            vendor_id: order.vendor_id.clone(),
            channel: order.channel,
        });

        if let Some(table_id) = order.channel_ref.table_id() {
            self.tables.occupy_table(&order.vendor_id, table_id);
            self.broadcaster.publish(LifecycleEvent::TableStatusChanged {
                vendor_id: order.vendor_id.clone(),
                table_id: table_id.to_string(),
                occupied: true,
            });
        }

        Ok(order)
    }

    // ========== Reads ==========

    pub fn get_order(&self, order_id: &str) -> OrderResult<Order> {
        self.fetch(order_id)
    }

    pub fn list_active(&self) -> OrderResult<Vec<Order>> {
        Ok(self.storage.get_active_orders()?)
    }

    /// Canonical priced items, recomputed from the raw payload on every
    /// call. Never cached, never trusted from storage.
    pub fn get_canonical_items(&self, order_id: &str) -> OrderResult<Vec<CanonicalLineItem>> {
        let order = self.fetch(order_id)?;
        Ok(self.reconcile(&order))
    }

    /// Items with at least one unprinted unit
    pub fn get_unprinted_items(&self, order_id: &str) -> OrderResult<Vec<CanonicalLineItem>> {
        let mut items = self.get_canonical_items(order_id)?;
        items.retain(|i| i.unprinted_quantity > 0);
        Ok(items)
    }

    pub fn get_ticket(&self, order_id: &str) -> OrderResult<Option<KitchenTicket>> {
        Ok(self.storage.get_ticket(order_id)?)
    }

    fn reconcile(&self, order: &Order) -> Vec<CanonicalLineItem> {
        let raw = order.raw_items();
        pricing::reconcile_items(&raw, |category_id| self.tax_defaults.tax_default(category_id))
    }

    // ========== Lifecycle ==========

    /// Advance an order, either to an explicit target or to the next
    /// status in its channel flow. Advancing a terminal order is a no-op.
    pub fn advance_status(
        &self,
        order_id: &str,
        target: Option<OrderStatus>,
    ) -> OrderResult<Order> {
        let txn = self.storage.begin_write()?;
        let mut order = self
            .storage
            .get_order_txn(&txn, order_id)
            .map_err(map_not_found)?;

        let target = target.unwrap_or_else(|| lifecycle::next(order.channel, order.status));
        let validated = lifecycle::advance_to(order.channel, order.status, target)?;
        if validated == order.status {
            // Terminal no-op, nothing to persist
            return Ok(order);
        }

        // Completing an order finalizes its bill; the payment method must
        // already be on record. Delivery's terminal delivered is exempt.
        if validated == OrderStatus::Completed && order.payment_method.is_none() {
            return Err(OrderError::MissingPaymentMethod(order.id.clone()));
        }

        let from = order.status;
        let now = now_millis();
        order.status = validated;
        order.timestamps.record(validated, now);
        order.updated_at = now;

        let terminal = lifecycle::is_terminal(order.channel, validated);
        self.storage.put_order_txn(&txn, &order)?;
        if terminal {
            self.storage.mark_order_inactive(&txn, &order.id)?;
        }
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(
            order_id = %order.id,
            from = %from,
            to = %validated,
            "Order status advanced"
        );
        self.broadcaster.publish(LifecycleEvent::OrderStatusChanged {
            order_id: order.id.clone(),
            vendor_id: order.vendor_id.clone(),
            channel: order.channel,
            from,
            to: validated,
        });

        // Completed dine-in frees the table; delivery/pickup have none
        if validated == OrderStatus::Completed {
            if let Some(table_id) = order.channel_ref.table_id() {
                self.tables.release_table(&order.vendor_id, table_id);
                self.broadcaster.publish(LifecycleEvent::TableStatusChanged {
                    vendor_id: order.vendor_id.clone(),
                    table_id: table_id.to_string(),
                    occupied: false,
                });
            }
        }

        Ok(order)
    }

    // ========== Payment ==========

    /// One-time payment method capture. Re-setting the same value is a
    /// no-op; changing it is rejected.
    pub fn set_payment_method(
        &self,
        order_id: &str,
        method: PaymentMethod,
    ) -> OrderResult<Order> {
        let txn = self.storage.begin_write()?;
        let mut order = self
            .storage
            .get_order_txn(&txn, order_id)
            .map_err(map_not_found)?;

        match order.payment_method {
            Some(existing) if existing == method => return Ok(order),
            Some(_) => return Err(OrderError::PaymentMethodAlreadySet(order.id.clone())),
            None => {}
        }

        order.payment_method = Some(method);
        order.updated_at = now_millis();
        self.storage.put_order_txn(&txn, &order)?;
        txn.commit().map_err(StorageError::from)?;

        self.broadcaster.publish(LifecycleEvent::OrderUpdated {
            order_id: order.id.clone(),
            vendor_id: order.vendor_id.clone(),
        });
        Ok(order)
    }

    // ========== Printing ==========

    /// Mark item units printed, clamped so printed never exceeds the
    /// item quantity. The first successful print creates the order's
    /// kitchen ticket; later prints reuse it.
    pub fn mark_printed(
        &self,
        order_id: &str,
        entries: &[PrintEntry],
    ) -> OrderResult<KitchenTicket> {
        // Items must be fetchable before anything is touched
        self.fetch(order_id).map_err(|e| match e {
            OrderError::OrderNotFound(id) => OrderError::OrderNotFound(id),
            other => OrderError::PrintPrecondition(other.to_string()),
        })?;

        let txn = self.storage.begin_write()?;
        let mut order = self
            .storage
            .get_order_txn(&txn, order_id)
            .map_err(map_not_found)?;

        let mut raw = order.raw_items();
        let marked = apply_print_entries(&mut raw, entries);
        order.set_raw_items(&raw);
        order.updated_at = now_millis();

        let now = now_millis();
        let (ticket, created) = match self.storage.get_ticket_txn(&txn, order_id)? {
            Some(mut ticket) => {
                // The item snapshot is frozen at first-print time; later
                // prints only touch the ledger
                ticket.status = TicketStatus::Reprinted;
                ticket.printed_at = now;
                ticket.print_count += 1;
                (ticket, false)
            }
            None => {
                let snapshot = pricing::reconcile_items(&raw, |category_id| {
                    self.tax_defaults.tax_default(category_id)
                });
                let count = self.storage.next_ticket_count(&txn)?;
                let date = chrono::Utc::now().format("%Y%m%d");
                let ticket = KitchenTicket {
                    order_id: order.id.clone(),
                    ticket_number: format!("KOT{}{}", date, 10000 + count),
                    status: TicketStatus::Printed,
                    created_at: now,
                    printed_at: now,
                    print_count: 1,
                    items: snapshot,
                };
                (ticket, true)
            }
        };

        self.storage.put_order_txn(&txn, &order)?;
        self.storage.put_ticket_txn(&txn, &ticket)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(
            order_id = %order.id,
            ticket_number = %ticket.ticket_number,
            marked,
            "Print recorded"
        );
        if created {
            self.broadcaster.publish(LifecycleEvent::KotCreated {
                order_id: order.id.clone(),
                vendor_id: order.vendor_id.clone(),
                ticket_number: ticket.ticket_number.clone(),
            });
        } else {
            self.broadcaster.publish(LifecycleEvent::OrderUpdated {
                order_id: order.id.clone(),
                vendor_id: order.vendor_id.clone(),
            });
        }

        Ok(ticket)
    }

    // ========== Billing ==========

    /// Build the invoice over fresh canonical items. The order's stored
    /// payment method is authoritative and carried onto the bill.
    pub fn build_invoice(
        &self,
        order_id: &str,
        discount: Option<&Discount>,
    ) -> OrderResult<Invoice> {
        let order = self.fetch(order_id)?;
        let items = self.reconcile(&order);
        let mut invoice = pricing::build_invoice(&items, discount);
        invoice.payment_method = order.payment_method;
        Ok(invoice)
    }

    // ========== Maintenance ==========

    /// Delete terminal orders and their tickets
    pub fn purge_terminal(&self) -> OrderResult<usize> {
        let removed = self.storage.purge_terminal()?;
        if removed > 0 {
            tracing::info!(removed, "Purged terminal orders");
        }
        Ok(removed)
    }
}

fn map_not_found(err: StorageError) -> OrderError {
    match err {
        StorageError::OrderNotFound(id) => OrderError::OrderNotFound(id),
        other => OrderError::Storage(other),
    }
}
