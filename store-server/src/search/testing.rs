//! In-memory [`SearchEngine`] double with failure injection for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use shared::models::SearchDocument;

use super::engine::{SearchEngine, SearchError, SearchPage, SearchQuery};

#[derive(Default)]
pub struct MockSearchEngine {
    docs: Mutex<HashMap<i64, SearchDocument>>,
    fail_next: AtomicU32,
    fail_all: AtomicBool,
    fail_bulk: AtomicBool,
    fail_query: AtomicBool,
    upsert_attempts: AtomicU32,
}

impl MockSearchEngine {
    /// Fail the next `n` single-document writes, then recover.
    pub fn fail_next(&self, n: u32) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    pub fn fail_all(&self, on: bool) {
        self.fail_all.store(on, Ordering::SeqCst);
    }

    pub fn fail_bulk(&self, on: bool) {
        self.fail_bulk.store(on, Ordering::SeqCst);
    }

    pub fn fail_query(&self, on: bool) {
        self.fail_query.store(on, Ordering::SeqCst);
    }

    pub fn doc(&self, id: i64) -> Option<SearchDocument> {
        self.docs.lock().unwrap().get(&id).cloned()
    }

    pub fn doc_count(&self) -> usize {
        self.docs.lock().unwrap().len()
    }

    pub fn upsert_attempts(&self) -> u32 {
        self.upsert_attempts.load(Ordering::SeqCst)
    }

    fn check_write(&self) -> Result<(), SearchError> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(SearchError("injected failure".into()));
        }
        let remaining = self.fail_next.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_next.store(remaining - 1, Ordering::SeqCst);
            return Err(SearchError("injected transient failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl SearchEngine for MockSearchEngine {
    async fn upsert(&self, doc: &SearchDocument) -> Result<(), SearchError> {
        self.upsert_attempts.fetch_add(1, Ordering::SeqCst);
        self.check_write()?;
        self.docs.lock().unwrap().insert(doc.id, doc.clone());
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), SearchError> {
        self.check_write()?;
        self.docs.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn delete_many(&self, ids: &[i64]) -> Result<(), SearchError> {
        self.check_write()?;
        let mut docs = self.docs.lock().unwrap();
        for id in ids {
            docs.remove(id);
        }
        Ok(())
    }

    async fn bulk_upsert(&self, docs: &[SearchDocument]) -> Result<(), SearchError> {
        if self.fail_bulk.load(Ordering::SeqCst) {
            return Err(SearchError("injected bulk failure".into()));
        }
        self.check_write()?;
        let mut stored = self.docs.lock().unwrap();
        for doc in docs {
            stored.insert(doc.id, doc.clone());
        }
        Ok(())
    }

    async fn query(&self, query: &SearchQuery) -> Result<SearchPage, SearchError> {
        if self.fail_query.load(Ordering::SeqCst) {
            return Err(SearchError("injected query failure".into()));
        }
        let docs = self.docs.lock().unwrap();
        let needle = query.q.as_deref().unwrap_or("").to_lowercase();
        let mut hits: Vec<SearchDocument> = docs
            .values()
            .filter(|d| needle.is_empty() || d.title.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        hits.sort_by_key(|d| d.id);
        let total = hits.len() as u64;
        Ok(SearchPage { hits, total })
    }

    async fn suggest(&self, prefix: &str) -> Result<Vec<String>, SearchError> {
        if self.fail_query.load(Ordering::SeqCst) {
            return Err(SearchError("injected query failure".into()));
        }
        let docs = self.docs.lock().unwrap();
        let prefix = prefix.to_lowercase();
        let mut titles: Vec<String> = docs
            .values()
            .filter(|d| d.title.to_lowercase().starts_with(&prefix))
            .map(|d| d.title.clone())
            .collect();
        titles.sort();
        Ok(titles)
    }
}
