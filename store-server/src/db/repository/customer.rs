//! Customer Repository

use shared::models::Customer;
use sqlx::SqlitePool;

use super::RepoResult;

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Customer>> {
    let customer = sqlx::query_as::<_, Customer>(
        "SELECT id, name, email, is_active, created_at FROM customer WHERE id = ? AND is_active = 1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(customer)
}

/// Seed helper used by tests and fixtures.
pub async fn create(pool: &SqlitePool, name: &str, email: &str) -> RepoResult<Customer> {
    let id = shared::util::snowflake_id();
    let now = shared::util::now_millis();
    sqlx::query("INSERT INTO customer (id, name, email, is_active, created_at) VALUES (?1, ?2, ?3, 1, ?4)")
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(now)
        .execute(pool)
        .await?;
    Ok(Customer {
        id,
        name: name.to_string(),
        email: email.to_string(),
        is_active: true,
        created_at: now,
    })
}
