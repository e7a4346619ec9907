//! IndexSynchronizer — background worker that keeps the search index
//! eventually consistent with the catalog
//!
//! Consumes post-commit catalog change events on its own task, re-derives the
//! affected document from current catalog state, and pushes it to the search
//! engine with bounded retries and exponential backoff. Exhausting all
//! attempts logs and gives up: the index stays stale until the next mutation
//! or a full re-index sweep. The originating write is never failed or delayed.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use shared::models::{CatalogChange, ChangeKind};
use sqlx::SqlitePool;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use super::document;
use super::engine::SearchEngine;
use crate::db::repository::book;
use crate::utils::AppResult;

/// Backoff ceiling regardless of attempt count
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);
/// Batch size for lag-recovery sweeps
const RECOVERY_BATCH_SIZE: usize = 100;

/// Bounded retry with exponential backoff (delay doubles per attempt).
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 500,
        }
    }
}

pub struct IndexSynchronizer {
    pool: SqlitePool,
    engine: Arc<dyn SearchEngine>,
    rx: broadcast::Receiver<CatalogChange>,
    policy: RetryPolicy,
    shutdown: CancellationToken,
}

impl IndexSynchronizer {
    pub fn new(
        pool: SqlitePool,
        engine: Arc<dyn SearchEngine>,
        rx: broadcast::Receiver<CatalogChange>,
        policy: RetryPolicy,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            pool,
            engine,
            rx,
            policy,
            shutdown,
        }
    }

    /// Run the synchronizer until shutdown or channel close.
    pub async fn run(mut self) {
        tracing::info!("IndexSynchronizer started");

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("IndexSynchronizer shutting down");
                    break;
                }

                result = self.rx.recv() => {
                    match result {
                        Ok(change) => {
                            self.sync_with_retry(&change).await;
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            tracing::warn!("IndexSynchronizer lagged {n} events, running full re-index");
                            match reindex_all(&self.pool, self.engine.as_ref(), RECOVERY_BATCH_SIZE).await {
                                Ok(report) => tracing::info!(?report, "Recovery re-index complete"),
                                Err(e) => tracing::error!("Recovery re-index failed: {e}"),
                            }
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            tracing::info!("Change event channel closed, IndexSynchronizer stopping");
                            break;
                        }
                    }
                }
            }
        }

        tracing::info!("IndexSynchronizer stopped");
    }

    /// Index one change with exponential backoff.
    ///
    /// Failures are absorbed: exhaustion leaves the index stale (bounded
    /// inconsistency window) and logs at error level.
    pub async fn sync_with_retry(&self, change: &CatalogChange) {
        let mut delay = Duration::from_millis(self.policy.base_delay_ms);
        // A zero-attempt policy would silently drop every event.
        let max_attempts = self.policy.max_retries.max(1);

        for attempt in 0..max_attempts {
            match self.sync_once(change).await {
                Ok(()) => {
                    tracing::debug!(book_id = change.book_id, kind = ?change.kind, "Indexed");
                    return;
                }
                Err(e) if attempt + 1 < max_attempts => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        book_id = change.book_id,
                        "Index attempt failed, retrying: {e}"
                    );
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(MAX_RETRY_DELAY);
                }
                Err(e) => {
                    tracing::error!(
                        book_id = change.book_id,
                        "Giving up on index sync after {max_attempts} attempts: {e}"
                    );
                }
            }
        }
    }

    /// One indexing attempt. Re-derives the document from CURRENT catalog
    /// state — never from the event snapshot — so late or repeated attempts
    /// converge to the latest readable state.
    async fn sync_once(&self, change: &CatalogChange) -> Result<(), String> {
        if change.kind == ChangeKind::Deleted {
            return self
                .engine
                .delete(change.book_id)
                .await
                .map_err(|e| e.to_string());
        }

        match document::build(&self.pool, change.book_id)
            .await
            .map_err(|e| e.to_string())?
        {
            Some(doc) => self.engine.upsert(&doc).await.map_err(|e| e.to_string()),
            // Gone or deactivated since the event fired
            None => self
                .engine
                .delete(change.book_id)
                .await
                .map_err(|e| e.to_string()),
        }
    }
}

/// Result of a bulk re-index sweep.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReindexReport {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed_ms: u64,
}

/// Rebuild the entire index from the catalog in batches.
///
/// Used for initial population and recovery from extended engine outages.
/// A failing batch falls back to indexing that batch's items one at a time
/// rather than abandoning the whole sweep. Soft-deleted books are purged
/// from the index so a sweep also clears documents whose delete events were
/// lost.
pub async fn reindex_all(
    pool: &SqlitePool,
    engine: &dyn SearchEngine,
    batch_size: usize,
) -> AppResult<ReindexReport> {
    let start = std::time::Instant::now();

    let stale = book::find_inactive_ids(pool).await?;
    if !stale.is_empty() {
        if let Err(e) = engine.delete_many(&stale).await {
            tracing::warn!("Failed to purge {} inactive books: {e}", stale.len());
        }
    }

    let books = book::find_all_active(pool).await?;
    let mut processed = 0usize;
    let mut succeeded = 0usize;
    let mut failed = 0usize;

    for chunk in books.chunks(batch_size.max(1)) {
        let mut docs = Vec::with_capacity(chunk.len());
        for b in chunk {
            processed += 1;
            match document::build(pool, b.id).await? {
                Some(doc) => docs.push(doc),
                // Raced with a deactivation mid-sweep; nothing to index
                None => succeeded += 1,
            }
        }

        match engine.bulk_upsert(&docs).await {
            Ok(()) => succeeded += docs.len(),
            Err(e) => {
                tracing::warn!("Bulk index batch failed ({e}), falling back to per-item");
                for doc in &docs {
                    match engine.upsert(doc).await {
                        Ok(()) => succeeded += 1,
                        Err(e) => {
                            tracing::error!(book_id = doc.id, "Failed to index: {e}");
                            failed += 1;
                        }
                    }
                }
            }
        }
    }

    let report = ReindexReport {
        processed,
        succeeded,
        failed,
        elapsed_ms: start.elapsed().as_millis() as u64,
    };
    tracing::info!(
        processed = report.processed,
        succeeded = report.succeeded,
        failed = report.failed,
        elapsed_ms = report.elapsed_ms,
        "Re-index sweep complete"
    );
    Ok(report)
}
