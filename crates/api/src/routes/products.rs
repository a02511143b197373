//! Product CRUD handlers and catalog listing.
//!
//! The catalog is readable by anyone, filtered and paginated; writes require
//! an authenticated actor.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use bramble_core::{Action, CategoryId, ProductId, Resource};
use rust_decimal::Decimal;
use serde::Deserialize;

use super::ensure_allowed;
use crate::db::{CategoryRepository, ProductInput, ProductOrdering, ProductQuery, ProductRepository};
use crate::error::{ApiError, Result, ValidationErrors};
use crate::middleware::OptionalAuth;
use crate::models::catalog::Product;
use crate::pagination::Page;
use crate::state::AppState;

/// Maximum product name length, matching the schema column.
const MAX_NAME_LENGTH: usize = 200;

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list).post(create))
        .route(
            "/api/products/{id}",
            get(retrieve).put(update).delete(destroy),
        )
}

/// Catalog listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ProductListParams {
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub category: Option<CategoryId>,
    pub in_stock: Option<bool>,
    pub search: Option<String>,
    pub ordering: Option<String>,
    pub page: Option<i64>,
}

impl ProductListParams {
    fn into_query(self) -> ProductQuery {
        ProductQuery {
            min_price: self.min_price,
            max_price: self.max_price,
            category: self.category,
            in_stock: self.in_stock,
            search: self.search,
            ordering: ProductOrdering::from_param(self.ordering.as_deref()),
            page: self.page.unwrap_or(1).max(1),
        }
    }
}

/// Product payload for create and update.
#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    pub name: String,
    pub price: Decimal,
    pub stock_quantity: i32,
    #[serde(default)]
    pub category: Option<CategoryId>,
}

/// The price column is `NUMERIC(10, 2)`: two decimal places, eight integer
/// digits. Reject anything the column would silently round or overflow on.
fn validate_price(errors: &mut ValidationErrors, price: Decimal) {
    if price.is_sign_negative() {
        errors.add("price", "Ensure this value is greater than or equal to 0.");
    }
    if price.scale() > 2 {
        errors.add("price", "Ensure that there are no more than 2 decimal places.");
    }
    if price >= Decimal::new(100_000_000, 0) {
        errors.add(
            "price",
            "Ensure that there are no more than 8 digits before the decimal point.",
        );
    }
}

async fn validate(state: &AppState, body: &ProductRequest) -> Result<()> {
    let mut errors = ValidationErrors::new();

    if body.name.trim().is_empty() {
        errors.add("name", "This field is required.");
    } else if body.name.len() > MAX_NAME_LENGTH {
        errors.add(
            "name",
            format!("Ensure this field has no more than {MAX_NAME_LENGTH} characters."),
        );
    }
    validate_price(&mut errors, body.price);
    if body.stock_quantity < 0 {
        errors.add(
            "stock_quantity",
            "Ensure this value is greater than or equal to 0.",
        );
    }
    if let Some(category) = body.category
        && !CategoryRepository::new(state.pool()).exists(category).await?
    {
        errors.add("category", format!("Invalid category {category}."));
    }

    errors.into_result()
}

/// List the catalog: filtered, searched, ordered, and paginated.
pub async fn list(
    auth: OptionalAuth,
    State(state): State<AppState>,
    Query(params): Query<ProductListParams>,
) -> Result<Json<Page<Product>>> {
    ensure_allowed(&auth.actor(), Action::List, Resource::Product)?;

    let query = params.into_query();
    let repo = ProductRepository::new(state.pool());

    let count = repo.count(&query).await?;
    let results = repo.search(&query).await?;

    Ok(Json(Page::new(count, query.page, results)))
}

/// Retrieve a product by id, category joined.
pub async fn retrieve(
    auth: OptionalAuth,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    ensure_allowed(&auth.actor(), Action::Retrieve, Resource::Product)?;

    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("product {id}")))?;

    Ok(Json(product))
}

/// Create a product. Requires authentication.
pub async fn create(
    auth: OptionalAuth,
    State(state): State<AppState>,
    Json(body): Json<ProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    ensure_allowed(&auth.actor(), Action::Create, Resource::Product)?;
    validate(&state, &body).await?;

    let product = ProductRepository::new(state.pool())
        .create(&ProductInput {
            name: body.name.trim().to_owned(),
            price: body.price,
            stock_quantity: body.stock_quantity,
            category: body.category,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(product)))
}

/// Replace a product's fields. Requires authentication.
pub async fn update(
    auth: OptionalAuth,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(body): Json<ProductRequest>,
) -> Result<Json<Product>> {
    ensure_allowed(&auth.actor(), Action::Update, Resource::Product)?;
    validate(&state, &body).await?;

    let product = ProductRepository::new(state.pool())
        .update(
            id,
            &ProductInput {
                name: body.name.trim().to_owned(),
                price: body.price,
                stock_quantity: body.stock_quantity,
                category: body.category,
            },
        )
        .await?;

    Ok(Json(product))
}

/// Delete a product. Requires authentication.
pub async fn destroy(
    auth: OptionalAuth,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    ensure_allowed(&auth.actor(), Action::Delete, Resource::Product)?;

    let deleted = ProductRepository::new(state.pool()).delete(id).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("product {id}")));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_map_onto_the_repository_query() {
        let params = ProductListParams {
            min_price: Some(Decimal::new(1000, 2)),
            max_price: Some(Decimal::new(2000, 2)),
            category: Some(CategoryId::new(2)),
            in_stock: Some(true),
            search: Some("tea".to_owned()),
            ordering: Some("-price".to_owned()),
            page: Some(3),
        };

        let query = params.into_query();
        assert_eq!(query.min_price, Some(Decimal::new(1000, 2)));
        assert_eq!(query.max_price, Some(Decimal::new(2000, 2)));
        assert_eq!(query.category, Some(CategoryId::new(2)));
        assert_eq!(query.in_stock, Some(true));
        assert_eq!(query.search.as_deref(), Some("tea"));
        assert_eq!(query.ordering, ProductOrdering::PriceDesc);
        assert_eq!(query.page, 3);
    }

    #[test]
    fn absent_params_mean_default_ordering_and_first_page() {
        let query = ProductListParams::default().into_query();
        assert_eq!(query.ordering, ProductOrdering::NameAsc);
        assert_eq!(query.page, 1);
        assert!(query.min_price.is_none());
        assert!(query.in_stock.is_none());
    }

    #[test]
    fn non_positive_page_clamps_to_first() {
        let params = ProductListParams {
            page: Some(0),
            ..ProductListParams::default()
        };
        assert_eq!(params.into_query().page, 1);
    }

    #[test]
    fn price_allows_at_most_two_decimal_places() {
        let mut errors = ValidationErrors::new();
        validate_price(&mut errors, Decimal::new(19_999, 3)); // 19.999
        assert!(!errors.is_empty());

        let mut errors = ValidationErrors::new();
        validate_price(&mut errors, Decimal::new(1999, 2)); // 19.99
        assert!(errors.is_empty());
    }

    #[test]
    fn price_sign_and_magnitude_are_bounded() {
        let mut errors = ValidationErrors::new();
        validate_price(&mut errors, Decimal::new(-100, 2)); // -1.00
        assert!(!errors.is_empty());

        let mut errors = ValidationErrors::new();
        validate_price(&mut errors, Decimal::new(100_000_000, 0)); // 1e8
        assert!(!errors.is_empty());

        let mut errors = ValidationErrors::new();
        validate_price(&mut errors, Decimal::new(9_999_999_999, 2)); // 99999999.99
        assert!(errors.is_empty());
    }
}
