//! Demo data seeding.
//!
//! Creates a couple of accounts, a small catalog, and a review so a fresh
//! database has something to look at. Reruns fail on the unique username
//! constraint; seed an empty database.

use bramble_api::db::{
    CategoryRepository, ProductInput, ProductRepository, ReviewInput, ReviewRepository,
    UserRepository,
};
use bramble_api::services::AuthService;
use rust_decimal::Decimal;

use super::{CommandError, connect};

/// Seed the database with demo data.
///
/// # Errors
///
/// Fails when the database is unreachable or any insert is rejected.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    let auth = AuthService::new(&pool);

    tracing::info!("Creating demo accounts...");
    let admin = auth
        .register("admin", Some("admin@example.com"), "change-me-now")
        .await?;
    let shopper = auth
        .register("shopper", Some("shopper@example.com"), "letmein-please")
        .await?;

    UserRepository::new(&pool).set_staff("admin", true).await?;
    tracing::info!("  admin (staff, id {})", admin.id);
    tracing::info!("  shopper (id {})", shopper.id);

    tracing::info!("Creating demo catalog...");
    let categories = CategoryRepository::new(&pool);
    let books = categories.create("Books").await?;
    let garden = categories.create("Garden").await?;

    let products = ProductRepository::new(&pool);
    let inputs = [
        ProductInput {
            name: "Field Guide to Brambles".to_owned(),
            price: Decimal::new(1999, 2),
            stock_quantity: 12,
            category: Some(books.id),
        },
        ProductInput {
            name: "Pruning Shears".to_owned(),
            price: Decimal::new(3450, 2),
            stock_quantity: 5,
            category: Some(garden.id),
        },
        ProductInput {
            name: "Seed Starter Tray".to_owned(),
            price: Decimal::new(899, 2),
            stock_quantity: 0,
            category: Some(garden.id),
        },
    ];

    let mut first_product = None;
    for input in &inputs {
        let product = products.create(input).await?;
        tracing::info!("  {} ({})", product.name, product.price);
        first_product.get_or_insert(product.id);
    }

    if let Some(product) = first_product {
        ReviewRepository::new(&pool)
            .create(
                shopper.id,
                &ReviewInput {
                    product,
                    rating: 5,
                    comment: "Identified every bramble in my hedge.".to_owned(),
                },
            )
            .await?;
    }

    tracing::info!("Seed complete!");
    Ok(())
}
