//! Search Index Document

use serde::{Deserialize, Serialize};

use super::{Book, BookFormat};

/// Denormalized projection of a catalog item for the external search engine.
///
/// Entirely derived from catalog state — never a source of truth, always safe
/// to drop and rebuild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchDocument {
    pub id: i64,
    pub code: String,
    pub title: String,
    pub description: String,
    pub authors: Vec<String>,
    pub genres: Vec<String>,
    pub publisher: String,
    pub language: String,
    pub format: BookFormat,
    pub price: i64,
    /// Cities with at least one unit available (quantity - reserved > 0)
    pub available_cities: Vec<String>,
    pub publication_date: Option<String>,
}

impl SearchDocument {
    /// Project a book plus its current city availability into a document.
    pub fn from_book(book: &Book, available_cities: Vec<String>) -> Self {
        Self {
            id: book.id,
            code: book.code.clone(),
            title: book.title.clone(),
            description: book.description.clone(),
            authors: book.authors.clone(),
            genres: book.genres.clone(),
            publisher: book.publisher.clone(),
            language: book.language.clone(),
            format: book.format,
            price: book.price,
            available_cities,
            publication_date: book.publication_date.clone(),
        }
    }
}
