//! Stock Level Repository
//!
//! Reservation writes go through [`try_reserve`] inside the caller's
//! transaction; everything else is snapshot reads.

use shared::models::StockLevel;
use sqlx::{Sqlite, SqlitePool, Transaction};

use super::RepoResult;

const STOCK_SELECT: &str =
    "SELECT id, book_id, warehouse_id, quantity, reserved FROM stock_level";

pub async fn find(
    pool: &SqlitePool,
    book_id: i64,
    warehouse_id: i64,
) -> RepoResult<Option<StockLevel>> {
    let sql = format!("{STOCK_SELECT} WHERE book_id = ? AND warehouse_id = ?");
    let row = sqlx::query_as::<_, StockLevel>(&sql)
        .bind(book_id)
        .bind(warehouse_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Re-read a stock row inside an open transaction (the authoritative read
/// while the per-key lock is held).
pub async fn find_in_tx(
    tx: &mut Transaction<'_, Sqlite>,
    book_id: i64,
    warehouse_id: i64,
) -> RepoResult<Option<StockLevel>> {
    let sql = format!("{STOCK_SELECT} WHERE book_id = ? AND warehouse_id = ?");
    let row = sqlx::query_as::<_, StockLevel>(&sql)
        .bind(book_id)
        .bind(warehouse_id)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(row)
}

/// Conditionally bump `reserved` by `qty` — applies only while
/// `quantity - reserved >= qty` still holds. Returns whether a row changed.
pub async fn try_reserve(
    tx: &mut Transaction<'_, Sqlite>,
    book_id: i64,
    warehouse_id: i64,
    qty: i64,
) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE stock_level SET reserved = reserved + ?1 \
         WHERE book_id = ?2 AND warehouse_id = ?3 AND quantity - reserved >= ?1",
    )
    .bind(qty)
    .bind(book_id)
    .bind(warehouse_id)
    .execute(&mut **tx)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Available quantity for a book in a city's warehouse (optimistic pre-check
/// read; the authoritative check happens under the per-key lock).
pub async fn available_in_city(
    pool: &SqlitePool,
    book_id: i64,
    city: &str,
) -> RepoResult<Option<i64>> {
    let available = sqlx::query_scalar::<_, i64>(
        "SELECT s.quantity - s.reserved FROM stock_level s \
         JOIN warehouse w ON s.warehouse_id = w.id \
         WHERE s.book_id = ? AND w.city = ?",
    )
    .bind(book_id)
    .bind(city)
    .fetch_optional(pool)
    .await?;
    Ok(available)
}

/// Cities where at least one unit of the book is available. Feeds the search
/// document's city-availability flags.
pub async fn cities_with_stock(pool: &SqlitePool, book_id: i64) -> RepoResult<Vec<String>> {
    let cities = sqlx::query_scalar::<_, String>(
        "SELECT w.city FROM stock_level s \
         JOIN warehouse w ON s.warehouse_id = w.id \
         WHERE s.book_id = ? AND s.quantity - s.reserved > 0 ORDER BY w.city",
    )
    .bind(book_id)
    .fetch_all(pool)
    .await?;
    Ok(cities)
}

/// Seed helper used by tests and fixtures.
pub async fn upsert(
    pool: &SqlitePool,
    book_id: i64,
    warehouse_id: i64,
    quantity: i64,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO stock_level (id, book_id, warehouse_id, quantity, reserved) \
         VALUES (?1, ?2, ?3, ?4, 0) \
         ON CONFLICT(book_id, warehouse_id) DO UPDATE SET quantity = excluded.quantity",
    )
    .bind(shared::util::snowflake_id())
    .bind(book_id)
    .bind(warehouse_id)
    .bind(quantity)
    .execute(pool)
    .await?;
    Ok(())
}
