//! User identity store
//!
//! A profile is created in the same transaction as its user, so every user
//! has exactly one profile.

use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use tastematch_common::api::auth::{generate_salt, hash_password, verify_password};
use tastematch_common::db::User;

/// Registration input
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

const USER_COLUMNS: &str = "id, username, email, first_name, last_name";

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> sqlx::Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
    })
}

/// Create a user and its empty profile atomically
pub async fn create_user_with_profile(pool: &SqlitePool, new_user: &NewUser) -> sqlx::Result<User> {
    let salt = generate_salt();
    let password_hash = hash_password(&new_user.password, &salt);

    let mut tx = pool.begin().await?;

    let row = sqlx::query(&format!(
        "INSERT INTO users (username, email, first_name, last_name, password_hash, password_salt) \
         VALUES (?, ?, ?, ?, ?, ?) RETURNING {}",
        USER_COLUMNS
    ))
    .bind(&new_user.username)
    .bind(&new_user.email)
    .bind(&new_user.first_name)
    .bind(&new_user.last_name)
    .bind(&password_hash)
    .bind(&salt)
    .fetch_one(&mut *tx)
    .await?;
    let user = row_to_user(&row)?;

    sqlx::query("INSERT INTO profiles (user_id) VALUES (?)")
        .bind(user.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(user)
}

/// Whether `username` or `email` is already registered
pub async fn identity_taken(pool: &SqlitePool, username: &str, email: &str) -> sqlx::Result<Option<&'static str>> {
    let username_taken: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;
    if username_taken.is_some() {
        return Ok(Some("Username already exists"));
    }

    let email_taken: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    if email_taken.is_some() {
        return Ok(Some("Email already exists"));
    }

    Ok(None)
}

/// Check credentials, returning the user on success
pub async fn authenticate(pool: &SqlitePool, username: &str, password: &str) -> sqlx::Result<Option<User>> {
    let row = sqlx::query(&format!(
        "SELECT {}, password_hash, password_salt FROM users WHERE username = ?",
        USER_COLUMNS
    ))
    .bind(username)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let hash: String = row.try_get("password_hash")?;
    let salt: String = row.try_get("password_salt")?;
    if !verify_password(password, &salt, &hash) {
        return Ok(None);
    }

    row_to_user(&row).map(Some)
}

pub async fn find_user(pool: &SqlitePool, user_id: i64) -> sqlx::Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(row_to_user).transpose()
}

/// Usernames for `user_ids` in one query; unknown ids are absent
pub async fn usernames_for(pool: &SqlitePool, user_ids: &[i64]) -> sqlx::Result<HashMap<i64, String>> {
    if user_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders = vec!["?"; user_ids.len()].join(", ");
    let sql = format!("SELECT id, username FROM users WHERE id IN ({})", placeholders);
    let mut query = sqlx::query_as::<_, (i64, String)>(&sql);
    for id in user_ids {
        query = query.bind(id);
    }

    Ok(query.fetch_all(pool).await?.into_iter().collect())
}

/// All users ordered by id
pub async fn list_users(pool: &SqlitePool) -> sqlx::Result<Vec<User>> {
    let rows = sqlx::query(&format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS))
        .fetch_all(pool)
        .await?;

    rows.iter().map(row_to_user).collect()
}
