//! Order Models
//!
//! Orders and their entries are created once, atomically, by the checkout
//! pipeline and never structurally mutated afterwards. Status and payment
//! transitions belong to downstream fulfillment.

use serde::{Deserialize, Serialize};

use super::ItemKind;

/// Derived from the order's entries at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Physical,
    Digital,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

/// Destination address captured at checkout time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub recipient_name: String,
    pub phone: String,
    pub street: String,
    pub ward: String,
    pub district: String,
    pub province: String,
}

/// Order row. `total == subtotal + shipping_fee` at creation, always.
/// `order_number` is globally unique and immutable once assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub order_number: String,
    pub customer_id: i64,
    pub order_type: OrderType,
    pub subtotal: i64,
    pub shipping_fee: i64,
    pub total: i64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: String,
    /// Serialized [`ShippingAddress`] snapshot (JSON), empty for digital-only orders
    pub shipping_address: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Order line. `unit_price` is a snapshot taken at purchase time and is never
/// re-derived — later catalog price changes must not alter historical orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderEntry {
    pub id: i64,
    pub order_id: i64,
    pub book_id: i64,
    /// 0-based cart position
    pub line_no: i64,
    pub item_kind: ItemKind,
    pub quantity: i64,
    pub unit_price: i64,
    pub line_total: i64,
}

/// Delivery details, present only when the order has at least one physical
/// entry and the shipping-rate quote succeeded. Absence is a valid, supported
/// state (degraded mode).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DeliveryInfo {
    pub id: i64,
    pub order_id: i64,
    pub recipient_name: String,
    pub phone: String,
    pub street: String,
    pub ward: String,
    pub district: String,
    pub province: String,
    /// Package inputs used for the fee quote
    pub weight_grams: i64,
    pub length_cm: i64,
    pub width_cm: i64,
    pub height_cm: i64,
    /// Shipping-service identifiers chosen by the provider
    pub service_id: i64,
    pub service_type_id: i64,
    pub quoted_fee: i64,
}

/// Order with its entries and optional delivery info (read model).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub entries: Vec<OrderEntry>,
    pub delivery_info: Option<DeliveryInfo>,
}
