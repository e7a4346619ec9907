//! Catalog Change Events

use serde::{Deserialize, Serialize};

use super::Book;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// Notification emitted after a catalog write has committed.
///
/// `snapshot` is advisory — index consumers re-read current catalog state per
/// attempt rather than trusting a possibly stale capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogChange {
    pub kind: ChangeKind,
    pub book_id: i64,
    pub snapshot: Option<Book>,
}

impl CatalogChange {
    pub fn created(book: Book) -> Self {
        Self {
            kind: ChangeKind::Created,
            book_id: book.id,
            snapshot: Some(book),
        }
    }

    pub fn updated(book: Book) -> Self {
        Self {
            kind: ChangeKind::Updated,
            book_id: book.id,
            snapshot: Some(book),
        }
    }

    pub fn deleted(book_id: i64) -> Self {
        Self {
            kind: ChangeKind::Deleted,
            book_id,
            snapshot: None,
        }
    }
}
