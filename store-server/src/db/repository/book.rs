//! Book Repository
//!
//! The book row stores author/genre name lists as JSON text; [`BookRow`] is the
//! raw row shape, converted to [`Book`] at the repository boundary.

use shared::models::{Book, BookCreate, BookFormat, BookUpdate};
use sqlx::SqlitePool;

use super::{RepoError, RepoResult};

const BOOK_SELECT: &str = "SELECT id, code, title, description, authors, genres, publisher, language, format, price, publication_date, is_active, created_at, updated_at FROM book";

#[derive(sqlx::FromRow)]
struct BookRow {
    id: i64,
    code: String,
    title: String,
    description: String,
    authors: String,
    genres: String,
    publisher: String,
    language: String,
    format: BookFormat,
    price: i64,
    publication_date: Option<String>,
    is_active: bool,
    created_at: i64,
    updated_at: i64,
}

impl BookRow {
    fn into_book(self) -> Book {
        Book {
            id: self.id,
            code: self.code,
            title: self.title,
            description: self.description,
            authors: serde_json::from_str(&self.authors).unwrap_or_default(),
            genres: serde_json::from_str(&self.genres).unwrap_or_default(),
            publisher: self.publisher,
            language: self.language,
            format: self.format,
            price: self.price,
            publication_date: self.publication_date,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

pub async fn find_all_active(pool: &SqlitePool) -> RepoResult<Vec<Book>> {
    let sql = format!("{BOOK_SELECT} WHERE is_active = 1 ORDER BY title");
    let rows = sqlx::query_as::<_, BookRow>(&sql).fetch_all(pool).await?;
    Ok(rows.into_iter().map(BookRow::into_book).collect())
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Book>> {
    let sql = format!("{BOOK_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, BookRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(BookRow::into_book))
}

pub async fn find_by_code(pool: &SqlitePool, code: &str) -> RepoResult<Option<Book>> {
    let sql = format!("{BOOK_SELECT} WHERE code = ? LIMIT 1");
    let row = sqlx::query_as::<_, BookRow>(&sql)
        .bind(code)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(BookRow::into_book))
}

/// IDs of soft-deleted books, for purging stale search documents.
pub async fn find_inactive_ids(pool: &SqlitePool) -> RepoResult<Vec<i64>> {
    let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM book WHERE is_active = 0")
        .fetch_all(pool)
        .await?;
    Ok(ids)
}

pub async fn create(pool: &SqlitePool, data: BookCreate) -> RepoResult<Book> {
    if data.price < 0 {
        return Err(RepoError::Validation("price cannot be negative".into()));
    }
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    let authors = serde_json::to_string(&data.authors).unwrap_or_else(|_| "[]".into());
    let genres = serde_json::to_string(&data.genres).unwrap_or_else(|_| "[]".into());
    sqlx::query(
        "INSERT INTO book (id, code, title, description, authors, genres, publisher, language, format, price, publication_date, is_active, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 1, ?12, ?12)",
    )
    .bind(id)
    .bind(&data.code)
    .bind(&data.title)
    .bind(data.description.as_deref().unwrap_or(""))
    .bind(&authors)
    .bind(&genres)
    .bind(&data.publisher)
    .bind(&data.language)
    .bind(data.format)
    .bind(data.price)
    .bind(&data.publication_date)
    .bind(now)
    .execute(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create book".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: BookUpdate) -> RepoResult<Book> {
    let now = shared::util::now_millis();
    let authors = data
        .authors
        .as_ref()
        .map(|a| serde_json::to_string(a).unwrap_or_else(|_| "[]".into()));
    let genres = data
        .genres
        .as_ref()
        .map(|g| serde_json::to_string(g).unwrap_or_else(|_| "[]".into()));
    let rows = sqlx::query(
        "UPDATE book SET title = COALESCE(?1, title), description = COALESCE(?2, description), \
         authors = COALESCE(?3, authors), genres = COALESCE(?4, genres), \
         publisher = COALESCE(?5, publisher), language = COALESCE(?6, language), \
         format = COALESCE(?7, format), price = COALESCE(?8, price), \
         publication_date = COALESCE(?9, publication_date), is_active = COALESCE(?10, is_active), \
         updated_at = ?11 WHERE id = ?12",
    )
    .bind(&data.title)
    .bind(&data.description)
    .bind(&authors)
    .bind(&genres)
    .bind(&data.publisher)
    .bind(&data.language)
    .bind(data.format)
    .bind(data.price)
    .bind(&data.publication_date)
    .bind(data.is_active)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Book {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Book {id} not found")))
}

/// Soft delete — the row stays for historical order entries.
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE book SET is_active = 0, updated_at = ?1 WHERE id = ?2")
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Book {id} not found")));
    }
    Ok(())
}
