//! Domain models for the API.
//!
//! These are the shapes handlers and repositories exchange. Request payloads
//! live next to the route handlers that accept them.

pub mod catalog;
pub mod order;
pub mod review;
pub mod user;

pub use catalog::{Category, CategoryRef, Product};
pub use order::{Order, OrderItem};
pub use review::Review;
pub use user::{CurrentUser, User};
