//! Stock Ledger — per (book, warehouse) reservation control
//!
//! The ledger is the only serialization point between concurrent checkouts
//! touching the same book/warehouse pair. Each key maps to its own async
//! mutex in a [`DashMap`]: unrelated keys never contend, and the classic
//! read-modify-write race (two checkouts both reading "9 available, need 5")
//! cannot happen because the conditional reserve update runs while the key's
//! lock is held, inside the caller's order transaction.
//!
//! A failed reservation never retries here; the surrounding transaction rolls
//! back as a unit and the caller surfaces `Conflict`.

use std::sync::Arc;

use dashmap::DashMap;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tokio::sync::Mutex;

use crate::db::repository::stock_level;
use crate::utils::{AppError, AppResult};

/// (book_id, warehouse_id)
pub type StockKey = (i64, i64);

pub struct StockLedger {
    pool: SqlitePool,
    /// Lock table; entries are created on first touch and never removed
    /// (bounded by catalog size × warehouse count).
    locks: DashMap<StockKey, Arc<Mutex<()>>>,
}

impl std::fmt::Debug for StockLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StockLedger")
            .field("locks", &self.locks.len())
            .finish()
    }
}

impl StockLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            locks: DashMap::new(),
        }
    }

    /// The mutex guarding a (book, warehouse) key, created on demand.
    ///
    /// Callers locking multiple keys MUST acquire them in sorted key order.
    pub fn key_lock(&self, key: StockKey) -> Arc<Mutex<()>> {
        self.locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Lock-free snapshot of available quantity for the optimistic pre-check.
    pub async fn available(&self, book_id: i64, city: &str) -> AppResult<Option<i64>> {
        Ok(stock_level::available_in_city(&self.pool, book_id, city).await?)
    }

    /// Reserve `qty` units inside the caller's transaction.
    ///
    /// MUST be called while holding [`Self::key_lock`] for the key. The
    /// conditional update is both the availability check and, as the
    /// transaction's first statement, what makes it a write transaction from
    /// the start. A read here instead would take a WAL snapshot that SQLite
    /// refuses to upgrade (SQLITE_BUSY_SNAPSHOT, not covered by busy_timeout)
    /// once any unrelated write commits, failing a valid order. An update
    /// miss is a `Conflict`; the follow-up read only shapes the message.
    pub async fn reserve(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        book_id: i64,
        warehouse_id: i64,
        qty: i64,
    ) -> AppResult<()> {
        debug_assert!(qty > 0);

        let applied = stock_level::try_reserve(tx, book_id, warehouse_id, qty).await?;
        if !applied {
            let row = stock_level::find_in_tx(tx, book_id, warehouse_id).await?;
            return Err(match row {
                Some(level) => AppError::conflict(format!(
                    "Insufficient stock for book {book_id}: requested {qty}, available {}",
                    level.available()
                )),
                None => AppError::conflict(format!(
                    "No stock row for book {book_id} in warehouse {warehouse_id}"
                )),
            });
        }

        tracing::debug!(book_id, warehouse_id, qty, "Stock reserved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::warehouse;
    use crate::db::DbService;

    async fn seed_stock(pool: &SqlitePool, quantity: i64) -> (i64, i64) {
        let wh = warehouse::create(pool, "WH-HN", "Hanoi").await.unwrap();
        let book_id = shared::util::snowflake_id();
        // Minimal book row to satisfy the FK
        sqlx::query(
            "INSERT INTO book (id, code, title, format, price, created_at, updated_at) \
             VALUES (?1, ?2, 'Test Book', 'paperback', 100000, 0, 0)",
        )
        .bind(book_id)
        .bind(format!("BK-{book_id}"))
        .execute(pool)
        .await
        .unwrap();
        stock_level::upsert(pool, book_id, wh.id, quantity)
            .await
            .unwrap();
        (book_id, wh.id)
    }

    #[tokio::test]
    async fn reserve_decrements_available() {
        let db = DbService::in_memory().await.unwrap();
        let ledger = StockLedger::new(db.pool.clone());
        let (book_id, wh_id) = seed_stock(&db.pool, 10).await;

        let lock = ledger.key_lock((book_id, wh_id));
        let _guard = lock.lock().await;
        let mut tx = db.pool.begin().await.unwrap();
        ledger.reserve(&mut tx, book_id, wh_id, 4).await.unwrap();
        tx.commit().await.unwrap();

        let row = stock_level::find(&db.pool, book_id, wh_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.reserved, 4);
        assert_eq!(row.available(), 6);
    }

    #[tokio::test]
    async fn reserve_fails_when_insufficient() {
        let db = DbService::in_memory().await.unwrap();
        let ledger = StockLedger::new(db.pool.clone());
        let (book_id, wh_id) = seed_stock(&db.pool, 3).await;

        let lock = ledger.key_lock((book_id, wh_id));
        let _guard = lock.lock().await;
        let mut tx = db.pool.begin().await.unwrap();
        let err = ledger.reserve(&mut tx, book_id, wh_id, 5).await.unwrap_err();
        drop(tx); // rollback

        assert!(matches!(err, AppError::Conflict(_)));
        let row = stock_level::find(&db.pool, book_id, wh_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.reserved, 0);
    }

    #[tokio::test]
    async fn rollback_releases_reservation() {
        let db = DbService::in_memory().await.unwrap();
        let ledger = StockLedger::new(db.pool.clone());
        let (book_id, wh_id) = seed_stock(&db.pool, 10).await;

        let lock = ledger.key_lock((book_id, wh_id));
        {
            let _guard = lock.lock().await;
            let mut tx = db.pool.begin().await.unwrap();
            ledger.reserve(&mut tx, book_id, wh_id, 7).await.unwrap();
            // Dropped without commit
        }

        let row = stock_level::find(&db.pool, book_id, wh_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.reserved, 0);
        assert_eq!(row.available(), 10);
    }

    #[tokio::test]
    async fn reserve_succeeds_after_unrelated_commit_in_window() {
        // File-backed pool so a second connection can write while the order
        // transaction is open. The unrelated commit lands between BEGIN and
        // the reservation; the reservation must still go through rather than
        // die on a stale WAL snapshot.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stock.db").to_string_lossy().into_owned();
        let db = DbService::new(&path).await.unwrap();
        let ledger = StockLedger::new(db.pool.clone());
        let (book_id, wh_id) = seed_stock(&db.pool, 10).await;
        let other = warehouse::create(&db.pool, "WH-HCM", "Ho Chi Minh City")
            .await
            .unwrap();

        let lock = ledger.key_lock((book_id, wh_id));
        let _guard = lock.lock().await;
        let mut tx = db.pool.begin().await.unwrap();

        // Unrelated (book, warehouse) write commits on the pool.
        stock_level::upsert(&db.pool, book_id, other.id, 50)
            .await
            .unwrap();

        ledger.reserve(&mut tx, book_id, wh_id, 2).await.unwrap();
        tx.commit().await.unwrap();

        let row = stock_level::find(&db.pool, book_id, wh_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.reserved, 2);
    }

    #[tokio::test]
    async fn reserve_without_stock_row_is_conflict() {
        let db = DbService::in_memory().await.unwrap();
        let ledger = StockLedger::new(db.pool.clone());
        let (book_id, wh_id) = seed_stock(&db.pool, 5).await;

        let mut tx = db.pool.begin().await.unwrap();
        let err = ledger
            .reserve(&mut tx, book_id, wh_id + 1, 1)
            .await
            .unwrap_err();
        drop(tx);

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn same_key_lock_is_shared() {
        let db = DbService::in_memory().await.unwrap();
        let ledger = StockLedger::new(db.pool.clone());
        let a = ledger.key_lock((1, 2));
        let b = ledger.key_lock((1, 2));
        assert!(Arc::ptr_eq(&a, &b));
        let c = ledger.key_lock((1, 3));
        assert!(!Arc::ptr_eq(&a, &c));
    }
}
