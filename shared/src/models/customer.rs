//! Customer Model

use serde::{Deserialize, Serialize};

/// Customer account (owned by the out-of-scope account subsystem; this service
/// only resolves it during checkout).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: i64,
}
