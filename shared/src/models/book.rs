//! Book Model

use serde::{Deserialize, Serialize};

/// Physical format of a catalog item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum BookFormat {
    Paperback,
    Hardcover,
    Ebook,
}

impl BookFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookFormat::Paperback => "paperback",
            BookFormat::Hardcover => "hardcover",
            BookFormat::Ebook => "ebook",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "paperback" => Some(BookFormat::Paperback),
            "hardcover" => Some(BookFormat::Hardcover),
            "ebook" => Some(BookFormat::Ebook),
            _ => None,
        }
    }
}

/// Whether an order line needs physical fulfillment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Physical,
    Digital,
}

/// Book entity
///
/// Prices are whole-unit VND. Author and genre names are denormalized onto the
/// book row (JSON text columns) — the admin catalog keeps the normalized
/// relations; this service only reads the projection it needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    /// Unique human-readable code (e.g. ISBN or internal SKU)
    pub code: String,
    pub title: String,
    pub description: String,
    pub authors: Vec<String>,
    pub genres: Vec<String>,
    pub publisher: String,
    /// ISO 639-1 language code
    pub language: String,
    pub format: BookFormat,
    pub price: i64,
    /// Publication date, `YYYY-MM-DD`
    pub publication_date: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Book {
    /// Digital items never touch the stock ledger or shipping.
    pub fn kind(&self) -> ItemKind {
        match self.format {
            BookFormat::Ebook => ItemKind::Digital,
            _ => ItemKind::Physical,
        }
    }
}

/// Create book payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookCreate {
    pub code: String,
    pub title: String,
    pub description: Option<String>,
    pub authors: Vec<String>,
    pub genres: Vec<String>,
    pub publisher: String,
    pub language: String,
    pub format: BookFormat,
    pub price: i64,
    pub publication_date: Option<String>,
}

/// Update book payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub authors: Option<Vec<String>>,
    pub genres: Option<Vec<String>>,
    pub publisher: Option<String>,
    pub language: Option<String>,
    pub format: Option<BookFormat>,
    pub price: Option<i64>,
    pub publication_date: Option<String>,
    pub is_active: Option<bool>,
}
