//! Search document derivation
//!
//! Every indexing attempt re-derives the full document from the catalog's
//! CURRENT state rather than replaying a captured diff. Applying the same
//! update twice, or an update for data that has changed again since, always
//! converges to the latest readable state.

use shared::models::SearchDocument;
use sqlx::SqlitePool;

use crate::db::repository::{book, stock_level};
use crate::utils::AppResult;

/// Build the document for a book from current catalog state.
///
/// Returns `None` when the book no longer exists or has been deactivated —
/// the caller turns that into a delete.
pub async fn build(pool: &SqlitePool, book_id: i64) -> AppResult<Option<SearchDocument>> {
    let Some(book) = book::find_by_id(pool, book_id).await? else {
        return Ok(None);
    };
    if !book.is_active {
        return Ok(None);
    }
    let cities = stock_level::cities_with_stock(pool, book_id).await?;
    Ok(Some(SearchDocument::from_book(&book, cities)))
}
