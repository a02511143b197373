//! Order domain models.

use bramble_core::{OrderId, OrderItemId, ProductId, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// An order with its owner and line items joined in.
///
/// The owner is fixed at creation and drives every later access decision for
/// the record.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub username: String,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single product line in an order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
}
