//! Shared types for the bookstore platform
//!
//! Domain models and utility types used by the store server and its
//! integration tests. DB row types are feature-gated behind `db`.

pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use models::{
    Book, BookFormat, CatalogChange, ChangeKind, Customer, DeliveryInfo, ItemKind, Order,
    OrderEntry, OrderStatus, OrderType, PaymentStatus, SearchDocument, ShippingAddress, StockLevel,
    Warehouse,
};
