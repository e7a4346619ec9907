//! Warehouse Repository

use shared::models::Warehouse;
use sqlx::SqlitePool;

use super::RepoResult;

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Warehouse>> {
    let warehouses =
        sqlx::query_as::<_, Warehouse>("SELECT id, code, city FROM warehouse ORDER BY city")
            .fetch_all(pool)
            .await?;
    Ok(warehouses)
}

pub async fn find_by_city(pool: &SqlitePool, city: &str) -> RepoResult<Option<Warehouse>> {
    let warehouse =
        sqlx::query_as::<_, Warehouse>("SELECT id, code, city FROM warehouse WHERE city = ?")
            .bind(city)
            .fetch_optional(pool)
            .await?;
    Ok(warehouse)
}

/// Seed helper used by tests and fixtures.
pub async fn create(pool: &SqlitePool, code: &str, city: &str) -> RepoResult<Warehouse> {
    let id = shared::util::snowflake_id();
    sqlx::query("INSERT INTO warehouse (id, code, city) VALUES (?1, ?2, ?3)")
        .bind(id)
        .bind(code)
        .bind(city)
        .execute(pool)
        .await?;
    Ok(Warehouse {
        id,
        code: code.to_string(),
        city: city.to_string(),
    })
}
