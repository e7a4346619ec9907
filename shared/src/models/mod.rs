//! Data models
//!
//! Shared between the store server and API consumers.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY).
//! All money amounts are whole-unit VND as `i64`.

pub mod book;
pub mod customer;
pub mod event;
pub mod order;
pub mod search;
pub mod stock;
pub mod warehouse;

// Re-exports
pub use book::*;
pub use customer::*;
pub use event::*;
pub use order::*;
pub use search::*;
pub use stock::*;
pub use warehouse::*;
