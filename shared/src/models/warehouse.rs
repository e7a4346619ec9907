//! Warehouse Model

use serde::{Deserialize, Serialize};

/// Warehouse entity. Read-mostly reference data; one warehouse serves one city.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Warehouse {
    pub id: i64,
    pub code: String,
    pub city: String,
}
