//! Bramble Core - Shared types and access policy library.
//!
//! This crate provides common pieces used across all Bramble Market components:
//! - `api` - The REST backend
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP handling. This keeps it lightweight and allows it to be
//! used anywhere, and it keeps every authorization decision unit-testable
//! without a running server.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs
//! - [`policy`] - The declarative access-policy table and visibility scopes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod policy;
pub mod types;

pub use policy::*;
pub use types::*;
