//! Product repository and catalog query shaping.
//!
//! Listing supports the catalog's filter surface: price range, category,
//! stock availability, free-text search over product and category names,
//! ordering by price or name, and fixed-size pagination. The category is
//! joined in the same query so serializing a page costs no follow-up
//! queries.

use bramble_core::{CategoryId, ProductId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::RepositoryError;
use crate::models::catalog::{CategoryRef, Product};
use crate::pagination::PAGE_SIZE;

const SELECT_PRODUCT: &str = "SELECT p.id, p.name, p.price, p.stock_quantity, \
            p.category_id, c.name AS category_name, p.created_at, p.updated_at \
     FROM product p LEFT JOIN category c ON c.id = p.category_id";

const COUNT_PRODUCT: &str =
    "SELECT COUNT(*) FROM product p LEFT JOIN category c ON c.id = p.category_id";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    price: Decimal,
    stock_quantity: i32,
    category_id: Option<i32>,
    category_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        let category = match (row.category_id, row.category_name) {
            (Some(id), Some(name)) => Some(CategoryRef {
                id: CategoryId::new(id),
                name,
            }),
            _ => None,
        };

        Self {
            id: ProductId::new(row.id),
            name: row.name,
            price: row.price,
            stock_quantity: row.stock_quantity,
            category,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Sort order for product listings. Default is name ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductOrdering {
    #[default]
    NameAsc,
    NameDesc,
    PriceAsc,
    PriceDesc,
}

impl ProductOrdering {
    /// Parse the `ordering` query parameter (`name`, `-name`, `price`,
    /// `-price`). Unknown values fall back to the default.
    #[must_use]
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("-name") => Self::NameDesc,
            Some("price") => Self::PriceAsc,
            Some("-price") => Self::PriceDesc,
            _ => Self::NameAsc,
        }
    }

    /// The ORDER BY clause body. Ties break on id so pages are stable.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::NameAsc => "p.name ASC, p.id ASC",
            Self::NameDesc => "p.name DESC, p.id ASC",
            Self::PriceAsc => "p.price ASC, p.id ASC",
            Self::PriceDesc => "p.price DESC, p.id ASC",
        }
    }
}

/// The catalog listing parameters after parsing and validation.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    /// Keep products priced at or above this value.
    pub min_price: Option<Decimal>,
    /// Keep products priced at or below this value.
    pub max_price: Option<Decimal>,
    /// Keep products in exactly this category.
    pub category: Option<CategoryId>,
    /// `true` keeps only products with stock on hand.
    pub in_stock: Option<bool>,
    /// Case-insensitive substring match over product and category names.
    pub search: Option<String>,
    pub ordering: ProductOrdering,
    /// 1-based page number.
    pub page: i64,
}

/// Escape LIKE metacharacters and wrap the term for substring matching.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Append the WHERE clauses for a catalog query.
///
/// Shared between the page select and the count so the two can never
/// disagree on which rows are in the result set.
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &ProductQuery) {
    builder.push(" WHERE TRUE");

    if let Some(min) = query.min_price {
        builder.push(" AND p.price >= ").push_bind(min);
    }
    if let Some(max) = query.max_price {
        builder.push(" AND p.price <= ").push_bind(max);
    }
    if let Some(category) = query.category {
        builder.push(" AND p.category_id = ").push_bind(category);
    }
    if query.in_stock == Some(true) {
        builder.push(" AND p.stock_quantity > 0");
    }
    if let Some(term) = query.search.as_deref().filter(|t| !t.is_empty()) {
        let pattern = like_pattern(term);
        builder
            .push(" AND (p.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR c.name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Fields for creating or replacing a product.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub category: Option<CategoryId>,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch one page of the catalog under the given filters.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(&self, query: &ProductQuery) -> Result<Vec<Product>, RepositoryError> {
        let mut builder = QueryBuilder::new(SELECT_PRODUCT);
        push_filters(&mut builder, query);
        builder.push(" ORDER BY ").push(query.ordering.as_sql());

        let offset = (query.page.max(1) - 1) * PAGE_SIZE;
        builder
            .push(" LIMIT ")
            .push_bind(PAGE_SIZE)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows: Vec<ProductRow> = builder.build_query_as().fetch_all(self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Count the catalog rows matching the filters (pagination envelope).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, query: &ProductQuery) -> Result<i64, RepositoryError> {
        let mut builder = QueryBuilder::new(COUNT_PRODUCT);
        push_filters(&mut builder, query);

        let count: i64 = builder.build_query_scalar().fetch_one(self.pool).await?;
        Ok(count)
    }

    /// Get a product by id, category joined.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("{SELECT_PRODUCT} WHERE p.id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        Ok(row.map(Into::into))
    }

    /// Create a new product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::ForeignKey` if the category doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let row: (i32,) = sqlx::query_as(
            "INSERT INTO product (name, price, stock_quantity, category_id) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&input.name)
        .bind(input.price)
        .bind(input.stock_quantity)
        .bind(input.category)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            RepositoryError::from_write_error(e, "product already exists", "unknown category")
        })?;

        self.get(ProductId::new(row.0))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Replace a product's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::ForeignKey` if the category doesn't exist.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let result = sqlx::query(
            "UPDATE product SET name = $2, price = $3, stock_quantity = $4, \
                 category_id = $5, updated_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.price)
        .bind(input.stock_quantity)
        .bind(input.category)
        .execute(self.pool)
        .await
        .map_err(|e| {
            RepositoryError::from_write_error(e, "product already exists", "unknown category")
        })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a product. Returns `true` if the row existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::ForeignKey` if the product appears in an
    /// order (`order_item` restricts deletes).
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| {
                RepositoryError::from_write_error(
                    e,
                    "product already exists",
                    "Cannot delete a product that appears in an order.",
                )
            })?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether a product id exists (payload foreign-key validation).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let row: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM product WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn built_sql(query: &ProductQuery) -> String {
        let mut builder = QueryBuilder::new(SELECT_PRODUCT);
        push_filters(&mut builder, query);
        builder.push(" ORDER BY ").push(query.ordering.as_sql());
        builder.sql().to_owned()
    }

    #[test]
    fn empty_query_applies_no_filters() {
        let sql = built_sql(&ProductQuery::default());
        assert!(sql.contains("WHERE TRUE"));
        assert!(!sql.contains("p.price >="));
        assert!(!sql.contains("p.price <="));
        assert!(!sql.contains("ILIKE"));
        assert!(!sql.contains("stock_quantity > 0"));
        assert!(sql.ends_with("ORDER BY p.name ASC, p.id ASC"));
    }

    #[test]
    fn price_range_binds_both_bounds() {
        let query = ProductQuery {
            min_price: Some(Decimal::new(1000, 2)),
            max_price: Some(Decimal::new(2000, 2)),
            ..ProductQuery::default()
        };
        let sql = built_sql(&query);
        assert!(sql.contains("p.price >= $1"));
        assert!(sql.contains("p.price <= $2"));
    }

    #[test]
    fn in_stock_true_filters_positive_stock() {
        let query = ProductQuery {
            in_stock: Some(true),
            ..ProductQuery::default()
        };
        assert!(built_sql(&query).contains("p.stock_quantity > 0"));
    }

    #[test]
    fn in_stock_false_is_not_a_constraint() {
        let query = ProductQuery {
            in_stock: Some(false),
            ..ProductQuery::default()
        };
        assert!(!built_sql(&query).contains("stock_quantity"));
    }

    #[test]
    fn search_matches_product_and_category_names() {
        let query = ProductQuery {
            search: Some("tea".to_owned()),
            ..ProductQuery::default()
        };
        let sql = built_sql(&query);
        assert!(sql.contains("p.name ILIKE $1"));
        assert!(sql.contains("c.name ILIKE $2"));
    }

    #[test]
    fn blank_search_is_ignored() {
        let query = ProductQuery {
            search: Some(String::new()),
            ..ProductQuery::default()
        };
        assert!(!built_sql(&query).contains("ILIKE"));
    }

    #[test]
    fn category_filter_is_exact() {
        let query = ProductQuery {
            category: Some(CategoryId::new(3)),
            ..ProductQuery::default()
        };
        assert!(built_sql(&query).contains("p.category_id = $1"));
    }

    #[test]
    fn ordering_parses_signed_field_params() {
        assert_eq!(ProductOrdering::from_param(None), ProductOrdering::NameAsc);
        assert_eq!(
            ProductOrdering::from_param(Some("name")),
            ProductOrdering::NameAsc
        );
        assert_eq!(
            ProductOrdering::from_param(Some("-name")),
            ProductOrdering::NameDesc
        );
        assert_eq!(
            ProductOrdering::from_param(Some("price")),
            ProductOrdering::PriceAsc
        );
        assert_eq!(
            ProductOrdering::from_param(Some("-price")),
            ProductOrdering::PriceDesc
        );
        // Unknown values fall back to the default rather than erroring.
        assert_eq!(
            ProductOrdering::from_param(Some("stock")),
            ProductOrdering::NameAsc
        );
    }

    #[test]
    fn like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("tea"), "%tea%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("c\\d"), "%c\\\\d%");
    }
}
