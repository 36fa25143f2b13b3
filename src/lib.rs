//! booknook: a self-hosted library catalog server.
//!
//! Users browse, search, bookmark, review and download books;
//! administrators manage books, categories and user accounts. All
//! persistence goes through a single catalog store over SQLite.
//!
//! # Features
//!
//! - Book catalog with categories, search and sort (newest, downloads, rating)
//! - Per-book review aggregation (average rating, review count)
//! - Bookmarks and reading progress sync per user
//! - Download counting and an append-only download log
//! - User accounts with roles and account blocking

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Authentication and user management.
pub mod auth;
/// Configuration and CLI.
pub mod config;
/// Error types.
pub mod error;
/// HTTP server.
pub mod server;
/// Catalog store and entity models.
pub mod store;

#[cfg(test)]
mod tests;

pub use config::{Cli, Command, Config};
pub use error::{AppError, Result};
pub use server::AppState;
pub use store::Store;
