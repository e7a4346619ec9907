//! Stock Level Model

use serde::{Deserialize, Serialize};

/// Per (book, warehouse) stock row — the unit of concurrency control.
///
/// Invariant: `0 <= reserved <= quantity`. Mutated only through the stock
/// ledger's reservation path, under the per-key lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct StockLevel {
    pub id: i64,
    pub book_id: i64,
    pub warehouse_id: i64,
    pub quantity: i64,
    pub reserved: i64,
}

impl StockLevel {
    /// Quantity still open for reservation.
    pub fn available(&self) -> i64 {
        self.quantity - self.reserved
    }
}
