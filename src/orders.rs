use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{error::ApiError, models::CreateOrderRequest};

/// OrderStatus
///
/// An order's position in its lifecycle. The legal progression is
/// PENDING → CONFIRMED → PREPARING → READY → DELIVERED, with CANCELLED
/// reachable from any non-terminal state. DELIVERED and CANCELLED are terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, TS, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Whether `next` is a legal successor of this status.
    ///
    /// This check is enforced server-side on every transition request; a status
    /// value that skips ahead (or moves backwards) is rejected regardless of
    /// which buttons a client chose to render.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        match self {
            OrderStatus::Pending => {
                matches!(next, OrderStatus::Confirmed | OrderStatus::Cancelled)
            }
            OrderStatus::Confirmed => {
                matches!(next, OrderStatus::Preparing | OrderStatus::Cancelled)
            }
            OrderStatus::Preparing => {
                matches!(next, OrderStatus::Ready | OrderStatus::Cancelled)
            }
            OrderStatus::Ready => {
                matches!(next, OrderStatus::Delivered | OrderStatus::Cancelled)
            }
            OrderStatus::Delivered | OrderStatus::Cancelled => false,
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = ();

    /// Parses the wire form ("PENDING", "CONFIRMED", ...). Unknown values are
    /// rejected by the caller with a validation error rather than a panic.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "CONFIRMED" => Ok(OrderStatus::Confirmed),
            "PREPARING" => Ok(OrderStatus::Preparing),
            "READY" => Ok(OrderStatus::Ready),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Ready => "READY",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        };
        f.write_str(name)
    }
}

/// OrderType
///
/// Determines whether a table is required (DINE_IN) and whether the flat
/// delivery fee applies (DELIVERY).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, TS, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum OrderType {
    DineIn,
    Takeaway,
    Delivery,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, TS, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

/// Tax is a flat 10% of the subtotal.
pub const TAX_RATE: f64 = 0.10;
/// Delivery orders carry a flat fee regardless of subtotal.
pub const DELIVERY_FEE: f64 = 50.0;

/// OrderTotals
///
/// The computed money fields of an order. A pure function of the line items and
/// the order type: the same inputs always produce the same totals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderTotals {
    pub subtotal: f64,
    pub tax: f64,
    pub delivery_fee: f64,
    pub total: f64,
}

/// compute_totals
///
/// subtotal = Σ(price × quantity), tax = 10% of subtotal, delivery fee = 50
/// flat for DELIVERY orders, total = subtotal + tax + delivery fee.
pub fn compute_totals(items: &[(f64, i32)], order_type: OrderType) -> OrderTotals {
    let subtotal: f64 = items
        .iter()
        .map(|(price, quantity)| price * f64::from(*quantity))
        .sum();
    let tax = subtotal * TAX_RATE;
    let delivery_fee = if order_type == OrderType::Delivery {
        DELIVERY_FEE
    } else {
        0.0
    };
    OrderTotals {
        subtotal,
        tax,
        delivery_fee,
        total: subtotal + tax + delivery_fee,
    }
}

// Process-wide sequence mixed into order numbers. Two orders created within the
// same millisecond still get distinct numbers because the sequence differs.
static ORDER_SEQ: AtomicU64 = AtomicU64::new(0);

/// next_order_number
///
/// Generates a unique, human-readable order number of the form
/// `ORD-{unix_millis}-{seq}`.
pub fn next_order_number() -> String {
    let seq = ORDER_SEQ.fetch_add(1, Ordering::Relaxed) % 10_000;
    format!("ORD-{}-{:04}", Utc::now().timestamp_millis(), seq)
}

/// validate_order_request
///
/// Input validation for order placement. Checked before anything is persisted:
/// line items must be non-empty, the customer contact fields are always
/// required, DELIVERY orders need an address and DINE_IN orders need a table.
pub fn validate_order_request(req: &CreateOrderRequest) -> Result<(), ApiError> {
    if req.items.is_empty() {
        return Err(ApiError::Validation("Order must contain at least one item".into()));
    }
    if req.customer_name.trim().is_empty() || req.customer_phone.trim().is_empty() {
        return Err(ApiError::Validation("Missing required fields".into()));
    }
    match req.order_type {
        OrderType::Delivery => {
            let has_address = req
                .delivery_address
                .as_deref()
                .is_some_and(|a| !a.trim().is_empty());
            if !has_address {
                return Err(ApiError::Validation(
                    "Delivery address is required for delivery orders".into(),
                ));
            }
        }
        OrderType::DineIn => {
            if req.table_id.is_none() {
                return Err(ApiError::Validation(
                    "Table is required for dine-in orders".into(),
                ));
            }
        }
        OrderType::Takeaway => {}
    }
    for item in &req.items {
        if item.quantity <= 0 {
            return Err(ApiError::Validation("Item quantity must be positive".into()));
        }
    }
    Ok(())
}
