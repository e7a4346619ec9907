//! Search subsystem
//!
//! - [`engine`] - external search engine client (trait + HTTP implementation)
//! - [`document`] - search document derivation from current catalog state
//! - [`indexer`] - asynchronous index synchronizer with retry/backoff
//! - [`service`] - query service with the in-process fallback scan
//!
//! The index is a disposable cache of catalog state: never locked, never a
//! source of truth, safe to drop and rebuild with [`indexer::reindex_all`].

pub mod document;
pub mod engine;
pub mod indexer;
pub mod service;
#[cfg(test)]
pub mod testing;

pub use engine::{HttpSearchEngine, SearchEngine, SearchError, SearchPage, SearchQuery};
pub use indexer::{reindex_all, IndexSynchronizer, ReindexReport, RetryPolicy};
pub use service::{SearchResults, SearchService};
