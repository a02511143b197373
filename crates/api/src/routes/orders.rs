//! Order CRUD handlers.
//!
//! Every order action requires an authenticated actor. The owner is the
//! creating actor, fixed for the record's lifetime. Retrieval and mutation
//! of a specific order allow staff OR the owner, evaluated as a single
//! union; everyone else sees 404 because the row sits outside their
//! visible set.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use bramble_core::{Action, OrderId, ProductId, Resource, allows_order_object, visible_scope};
use serde::Deserialize;

use super::ensure_allowed;
use crate::db::{NewOrderItem, OrderRepository};
use crate::error::{ApiError, Result, ValidationErrors};
use crate::middleware::RequireAuth;
use crate::models::order::Order;
use crate::pagination::{Page, PageParams};
use crate::state::AppState;

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/orders", get(list).post(create))
        .route("/api/orders/{id}", get(retrieve).put(update).delete(destroy))
}

/// A product line in an order payload.
#[derive(Debug, Deserialize)]
pub struct OrderItemRequest {
    pub product: ProductId,
    pub quantity: i32,
}

/// Order payload for create and update: the full set of line items.
#[derive(Debug, Deserialize)]
pub struct OrderRequest {
    pub items: Vec<OrderItemRequest>,
}

fn validate(body: &OrderRequest) -> Result<Vec<NewOrderItem>> {
    let mut errors = ValidationErrors::new();

    if body.items.is_empty() {
        errors.add("items", "An order needs at least one line item.");
    }
    for (index, item) in body.items.iter().enumerate() {
        if item.quantity < 1 {
            errors.add(
                &format!("items[{index}].quantity"),
                "Ensure this value is greater than or equal to 1.",
            );
        }
    }
    errors.into_result()?;

    Ok(body
        .items
        .iter()
        .map(|item| NewOrderItem {
            product: item.product,
            quantity: item.quantity,
        })
        .collect())
}

/// List orders visible to the actor, line items included.
pub async fn list(
    auth: RequireAuth,
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<Order>>> {
    let actor = auth.0.actor();
    ensure_allowed(&actor, Action::List, Resource::Order)?;

    let scope = visible_scope(&actor, Resource::Order);
    let repo = OrderRepository::new(state.pool());

    let count = repo.count(scope).await?;
    let results = repo.list(scope, params.page()).await?;

    Ok(Json(Page::new(count, params.page(), results)))
}

/// Retrieve an order. Staff or the owner only; anyone else gets 404.
pub async fn retrieve(
    auth: RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    let actor = auth.0.actor();
    ensure_allowed(&actor, Action::Retrieve, Resource::Order)?;

    let scope = visible_scope(&actor, Resource::Order);
    let order = OrderRepository::new(state.pool())
        .get(scope, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("order {id}")))?;

    if !allows_order_object(&actor, order.user_id) {
        return Err(ApiError::Forbidden(
            "You do not have permission to perform this action.".to_owned(),
        ));
    }

    Ok(Json(order))
}

/// Create an order owned by the authenticated actor.
pub async fn create(
    auth: RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<OrderRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let actor = auth.0.actor();
    ensure_allowed(&actor, Action::Create, Resource::Order)?;
    let owner = auth.0.id;

    let items = validate(&body)?;
    let order = OrderRepository::new(state.pool())
        .create(owner, &items)
        .await
        .map_err(fk_to_field_error)?;

    tracing::info!(order_id = %order.id, owner = %owner, "order created");

    Ok((StatusCode::CREATED, Json(order)))
}

/// Replace an order's line items. Staff or the owner only.
pub async fn update(
    auth: RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(body): Json<OrderRequest>,
) -> Result<Json<Order>> {
    let actor = auth.0.actor();
    ensure_allowed(&actor, Action::Update, Resource::Order)?;

    let scope = visible_scope(&actor, Resource::Order);
    let repo = OrderRepository::new(state.pool());

    let existing = repo
        .get(scope, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("order {id}")))?;

    if !allows_order_object(&actor, existing.user_id) {
        return Err(ApiError::Forbidden(
            "You do not have permission to perform this action.".to_owned(),
        ));
    }

    let items = validate(&body)?;
    let order = repo
        .replace_items(id, &items)
        .await
        .map_err(fk_to_field_error)?;

    Ok(Json(order))
}

/// Delete an order. Staff or the owner only.
pub async fn destroy(
    auth: RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<StatusCode> {
    let actor = auth.0.actor();
    ensure_allowed(&actor, Action::Delete, Resource::Order)?;

    let scope = visible_scope(&actor, Resource::Order);
    let repo = OrderRepository::new(state.pool());

    let existing = repo
        .get(scope, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("order {id}")))?;

    if !allows_order_object(&actor, existing.user_id) {
        return Err(ApiError::Forbidden(
            "You do not have permission to perform this action.".to_owned(),
        ));
    }

    repo.delete(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// A dangling product reference in a payload is a field error, not a bare
/// 400 detail.
fn fk_to_field_error(err: crate::db::RepositoryError) -> ApiError {
    match err {
        crate::db::RepositoryError::ForeignKey(_) => ApiError::Validation(
            ValidationErrors::single("items", "Unknown product in line items."),
        ),
        other => ApiError::Database(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(quantities: &[i32]) -> OrderRequest {
        OrderRequest {
            items: quantities
                .iter()
                .map(|&quantity| OrderItemRequest {
                    product: ProductId::new(1),
                    quantity,
                })
                .collect(),
        }
    }

    #[test]
    fn empty_orders_are_rejected() {
        assert!(validate(&items(&[])).is_err());
    }

    #[test]
    fn non_positive_quantities_are_rejected() {
        assert!(validate(&items(&[0])).is_err());
        assert!(validate(&items(&[-2])).is_err());
        assert!(validate(&items(&[2, 0])).is_err());
    }

    #[test]
    fn valid_items_pass_through() {
        let items = validate(&items(&[2, 5])).expect("valid payload");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].quantity, 2);
    }
}
