//! Order repository for database operations.
//!
//! Listing joins the owner row in the same query and fetches line items for
//! the whole page in one batch, so serializing N orders never costs N
//! follow-up queries.

use std::collections::HashMap;

use bramble_core::{OrderId, OrderItemId, ProductId, Scope, UserId};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::RepositoryError;
use crate::models::order::{Order, OrderItem};
use crate::pagination::PAGE_SIZE;

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    username: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Order {
        Order {
            id: OrderId::new(self.id),
            user_id: UserId::new(self.user_id),
            username: self.username,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    product_id: i32,
    product_name: String,
    quantity: i32,
}

const SELECT_ORDER: &str = "SELECT o.id, o.user_id, u.username, o.created_at, o.updated_at \
     FROM orders o JOIN app_user u ON u.id = o.user_id";

/// A product line in an order payload.
#[derive(Debug, Clone, Copy)]
pub struct NewOrderItem {
    pub product: ProductId,
    pub quantity: i32,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch one page of orders visible under the given scope, line items
    /// included.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(&self, scope: Scope, page: i64) -> Result<Vec<Order>, RepositoryError> {
        let offset = (page.max(1) - 1) * PAGE_SIZE;

        let rows: Vec<OrderRow> = match scope {
            Scope::Everything => {
                sqlx::query_as(&format!(
                    "{SELECT_ORDER} ORDER BY o.id LIMIT $1 OFFSET $2"
                ))
                .bind(PAGE_SIZE)
                .bind(offset)
                .fetch_all(self.pool)
                .await?
            }
            Scope::Mine(user_id) => {
                sqlx::query_as(&format!(
                    "{SELECT_ORDER} WHERE o.user_id = $1 ORDER BY o.id LIMIT $2 OFFSET $3"
                ))
                .bind(user_id)
                .bind(PAGE_SIZE)
                .bind(offset)
                .fetch_all(self.pool)
                .await?
            }
            Scope::Nothing => Vec::new(),
        };

        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let mut items = self.items_for(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let order_items = items.remove(&row.id).unwrap_or_default();
                row.into_order(order_items)
            })
            .collect())
    }

    /// Count the orders visible under the given scope.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, scope: Scope) -> Result<i64, RepositoryError> {
        let count: i64 = match scope {
            Scope::Everything => {
                sqlx::query_scalar("SELECT COUNT(*) FROM orders")
                    .fetch_one(self.pool)
                    .await?
            }
            Scope::Mine(user_id) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
                    .bind(user_id)
                    .fetch_one(self.pool)
                    .await?
            }
            Scope::Nothing => 0,
        };

        Ok(count)
    }

    /// Get an order by id, honoring the visibility scope.
    ///
    /// A row outside the scope reads as absent so that existence never leaks
    /// across accounts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, scope: Scope, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> = match scope {
            Scope::Everything => {
                sqlx::query_as(&format!("{SELECT_ORDER} WHERE o.id = $1"))
                    .bind(id)
                    .fetch_optional(self.pool)
                    .await?
            }
            Scope::Mine(user_id) => {
                sqlx::query_as(&format!(
                    "{SELECT_ORDER} WHERE o.id = $1 AND o.user_id = $2"
                ))
                .bind(id)
                .bind(user_id)
                .fetch_optional(self.pool)
                .await?
            }
            Scope::Nothing => None,
        };

        let Some(row) = row else {
            return Ok(None);
        };

        let mut items = self.items_for(&[row.id]).await?;
        let order_items = items.remove(&row.id).unwrap_or_default();
        Ok(Some(row.into_order(order_items)))
    }

    /// Create an order owned by `owner` with the given line items, in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::ForeignKey` if a product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        owner: UserId,
        items: &[NewOrderItem],
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (order_id,): (i32,) =
            sqlx::query_as("INSERT INTO orders (user_id) VALUES ($1) RETURNING id")
                .bind(owner)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| {
                    RepositoryError::from_write_error(e, "order conflict", "unknown user")
                })?;

        insert_items(&mut tx, order_id, items).await?;

        tx.commit().await?;

        self.get(Scope::Everything, OrderId::new(order_id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Replace an order's line items, in one transaction. The owner is never
    /// changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::ForeignKey` if a product doesn't exist.
    pub async fn replace_items(
        &self,
        id: OrderId,
        items: &[NewOrderItem],
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE orders SET updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query("DELETE FROM order_item WHERE order_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        insert_items(&mut tx, id.as_i32(), items).await?;

        tx.commit().await?;

        self.get(Scope::Everything, id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Delete an order and its line items. Returns `true` if the row existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: OrderId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Batch-fetch line items for a set of orders, keyed by order id.
    async fn items_for(
        &self,
        order_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<OrderItem>>, RepositoryError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<OrderItemRow> = sqlx::query_as(
            "SELECT i.id, i.order_id, i.product_id, p.name AS product_name, i.quantity \
             FROM order_item i JOIN product p ON p.id = i.product_id \
             WHERE i.order_id = ANY($1) ORDER BY i.id",
        )
        .bind(order_ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_order: HashMap<i32, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            by_order.entry(row.order_id).or_default().push(OrderItem {
                id: OrderItemId::new(row.id),
                product_id: ProductId::new(row.product_id),
                product_name: row.product_name,
                quantity: row.quantity,
            });
        }

        Ok(by_order)
    }
}

/// Insert line items for an order inside an open transaction.
async fn insert_items(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    order_id: i32,
    items: &[NewOrderItem],
) -> Result<(), RepositoryError> {
    for item in items {
        sqlx::query("INSERT INTO order_item (order_id, product_id, quantity) VALUES ($1, $2, $3)")
            .bind(order_id)
            .bind(item.product)
            .bind(item.quantity)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                RepositoryError::from_write_error(e, "duplicate line item", "unknown product")
            })?;
    }

    Ok(())
}
