//! User / Address Repository (read-mostly profile slice)

use super::{RepoError, RepoResult};
use shared::models::{ShippingAddress, User};
use sqlx::SqlitePool;

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<User>> {
    let row = sqlx::query_as::<_, User>(
        "SELECT id, name, email, phone, is_plus_member, created_at FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn get(pool: &SqlitePool, id: i64) -> RepoResult<User> {
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("User {id} not found")))
}

pub async fn insert(pool: &SqlitePool, user: &User) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO users (id, name, email, phone, is_plus_member, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.phone)
    .bind(user.is_plus_member)
    .bind(user.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_address(pool: &SqlitePool, id: i64) -> RepoResult<Option<ShippingAddress>> {
    let row = sqlx::query_as::<_, ShippingAddress>(
        "SELECT id, user_id, recipient, phone, line1, city, created_at FROM shipping_addresses WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn insert_address(pool: &SqlitePool, address: &ShippingAddress) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO shipping_addresses (id, user_id, recipient, phone, line1, city, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(address.id)
    .bind(address.user_id)
    .bind(&address.recipient)
    .bind(&address.phone)
    .bind(&address.line1)
    .bind(&address.city)
    .bind(address.created_at)
    .execute(pool)
    .await?;
    Ok(())
}
