//! Search query service
//!
//! Queries go to the external engine first. If the engine is unreachable the
//! service degrades to an in-process scan of the catalog (substring match,
//! no relevance ranking) and marks the response as degraded. Engine trouble
//! never turns into a request failure.

use std::sync::Arc;

use serde::Serialize;
use shared::models::SearchDocument;
use sqlx::SqlitePool;

use super::engine::{SearchEngine, SearchQuery};
use crate::db::repository::{book, stock_level};
use crate::utils::AppResult;

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub hits: Vec<SearchDocument>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    /// True when the engine was down and the fallback scan answered instead
    pub degraded: bool,
}

pub struct SearchService {
    pool: SqlitePool,
    engine: Arc<dyn SearchEngine>,
}

impl SearchService {
    pub fn new(pool: SqlitePool, engine: Arc<dyn SearchEngine>) -> Self {
        Self { pool, engine }
    }

    pub async fn search(&self, query: &SearchQuery) -> AppResult<SearchResults> {
        let page = query.page.max(1);
        let page_size = match query.page_size {
            0 => DEFAULT_PAGE_SIZE,
            n => n.min(MAX_PAGE_SIZE),
        };
        let query = SearchQuery {
            page,
            page_size,
            ..query.clone()
        };

        match self.engine.query(&query).await {
            Ok(result) => Ok(SearchResults {
                hits: result.hits,
                total: result.total,
                page,
                page_size,
                degraded: false,
            }),
            Err(e) => {
                tracing::warn!("Search engine unavailable, serving fallback scan: {e}");
                self.fallback_scan(&query).await
            }
        }
    }

    /// Suggestions have no fallback: the engine being down just means an
    /// empty list.
    pub async fn suggest(&self, prefix: &str) -> Vec<String> {
        match self.engine.suggest(prefix).await {
            Ok(titles) => titles,
            Err(e) => {
                tracing::debug!("Suggest unavailable: {e}");
                Vec::new()
            }
        }
    }

    /// Direct catalog scan, used while the engine is down.
    ///
    /// Matches the free-text term as a case-insensitive substring of title or
    /// description and applies the language and format filters exactly as the
    /// engine would.
    async fn fallback_scan(&self, query: &SearchQuery) -> AppResult<SearchResults> {
        let needle = query
            .q
            .as_deref()
            .map(str::to_lowercase)
            .unwrap_or_default();

        let matches: Vec<_> = book::find_all_active(&self.pool)
            .await?
            .into_iter()
            .filter(|b| {
                if !needle.is_empty() {
                    let in_title = b.title.to_lowercase().contains(&needle);
                    let in_description = b.description.to_lowercase().contains(&needle);
                    if !in_title && !in_description {
                        return false;
                    }
                }
                if let Some(lang) = &query.language
                    && !b.language.eq_ignore_ascii_case(lang)
                {
                    return false;
                }
                if let Some(format) = query.format
                    && b.format != format
                {
                    return false;
                }
                true
            })
            .collect();

        let total = matches.len() as u64;
        let offset = (query.page as usize - 1) * query.page_size as usize;
        let mut hits = Vec::new();
        for b in matches.into_iter().skip(offset).take(query.page_size as usize) {
            let cities = stock_level::cities_with_stock(&self.pool, b.id).await?;
            hits.push(SearchDocument::from_book(&b, cities));
        }

        Ok(SearchResults {
            hits,
            total,
            page: query.page,
            page_size: query.page_size,
            degraded: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::search::testing::MockSearchEngine;
    use shared::models::{BookCreate, BookFormat};

    async fn seed(pool: &SqlitePool) {
        let books = [
            ("BK-1", "Dế Mèn Phiêu Lưu Ký", "vi", BookFormat::Paperback),
            ("BK-2", "Truyện Kiều", "vi", BookFormat::Hardcover),
            ("BK-3", "The Quiet American", "en", BookFormat::Paperback),
        ];
        for (code, title, language, format) in books {
            book::create(
                pool,
                BookCreate {
                    code: code.into(),
                    title: title.into(),
                    description: Some("A classic".into()),
                    authors: vec!["Author".into()],
                    genres: vec!["fiction".into()],
                    publisher: "NXB Kim Đồng".into(),
                    language: language.into(),
                    format,
                    price: 95000,
                    publication_date: None,
                },
            )
            .await
            .unwrap();
        }
    }

    fn service(pool: SqlitePool, engine: Arc<MockSearchEngine>) -> SearchService {
        SearchService::new(pool, engine)
    }

    #[tokio::test]
    async fn engine_results_pass_through_undegraded() {
        let db = DbService::in_memory().await.unwrap();
        seed(&db.pool).await;
        let engine = Arc::new(MockSearchEngine::default());
        let book = book::find_by_code(&db.pool, "BK-1").await.unwrap().unwrap();
        engine
            .upsert(&SearchDocument::from_book(&book, vec!["Hanoi".into()]))
            .await
            .unwrap();

        let svc = service(db.pool.clone(), engine);
        let results = svc
            .search(&SearchQuery {
                q: Some("Dế Mèn".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(!results.degraded);
        assert_eq!(results.total, 1);
        assert_eq!(results.hits[0].title, "Dế Mèn Phiêu Lưu Ký");
    }

    #[tokio::test]
    async fn engine_failure_falls_back_to_catalog_scan() {
        let db = DbService::in_memory().await.unwrap();
        seed(&db.pool).await;
        let engine = Arc::new(MockSearchEngine::default());
        engine.fail_query(true);

        let svc = service(db.pool.clone(), engine);
        let results = svc
            .search(&SearchQuery {
                q: Some("kiều".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(results.degraded);
        assert_eq!(results.total, 1);
        assert_eq!(results.hits[0].title, "Truyện Kiều");
    }

    #[tokio::test]
    async fn fallback_applies_language_and_format_filters() {
        let db = DbService::in_memory().await.unwrap();
        seed(&db.pool).await;
        let engine = Arc::new(MockSearchEngine::default());
        engine.fail_query(true);

        let svc = service(db.pool.clone(), engine);
        let results = svc
            .search(&SearchQuery {
                language: Some("vi".into()),
                format: Some(BookFormat::Paperback),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(results.total, 1);
        assert_eq!(results.hits[0].code, "BK-1");
    }

    #[tokio::test]
    async fn fallback_matches_description_text() {
        let db = DbService::in_memory().await.unwrap();
        seed(&db.pool).await;
        let engine = Arc::new(MockSearchEngine::default());
        engine.fail_query(true);

        let svc = service(db.pool.clone(), engine);
        let results = svc
            .search(&SearchQuery {
                q: Some("classic".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(results.total, 3);
    }

    #[tokio::test]
    async fn fallback_paginates() {
        let db = DbService::in_memory().await.unwrap();
        seed(&db.pool).await;
        let engine = Arc::new(MockSearchEngine::default());
        engine.fail_query(true);

        let svc = service(db.pool.clone(), engine);
        let results = svc
            .search(&SearchQuery {
                page: 2,
                page_size: 2,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(results.total, 3);
        assert_eq!(results.hits.len(), 1);
        assert_eq!(results.page, 2);
    }

    #[tokio::test]
    async fn suggest_degrades_to_empty() {
        let db = DbService::in_memory().await.unwrap();
        let engine = Arc::new(MockSearchEngine::default());
        engine.fail_query(true);

        let svc = service(db.pool.clone(), engine);
        assert!(svc.suggest("Dế").await.is_empty());
    }
}
