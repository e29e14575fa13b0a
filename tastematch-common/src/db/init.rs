//! Database initialization
//!
//! Creates the SQLite database on first run and brings the schema up to date.
//! Every statement is `CREATE ... IF NOT EXISTS`, so initialization is safe to
//! repeat on every startup.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::cmp::Ordering;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Catalog tables holding plain named entities
///
/// Names are unique under [`CATALOG_COLLATION`] so "Rock" and "rock" share a
/// row, and so do "Björk" and "BJÖRK".
pub const NAMED_CATALOG_TABLES: [&str; 6] = [
    "interests",
    "artists",
    "music_genres",
    "ingredients",
    "dish_categories",
    "drink_categories",
];

/// Collation used for catalog names
///
/// SQLite's built-in `NOCASE` only folds ASCII; this one folds full Unicode
/// case. Registered on every connection by [`init_database`] and
/// [`init_memory_database`].
pub const CATALOG_COLLATION: &str = "UNICODE_NOCASE";

/// Case-folded key of a catalog name
///
/// Two names are the same catalog entity exactly when their keys are equal.
pub fn catalog_key(name: &str) -> String {
    name.chars().flat_map(char::to_lowercase).collect()
}

/// Ordering behind [`CATALOG_COLLATION`]
pub fn catalog_cmp(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Open (creating if needed) the database at `db_path` and initialize schema
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000))
        .collation(CATALOG_COLLATION, catalog_cmp);

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    init_schema(&pool).await?;

    Ok(pool)
}

/// Single-connection in-memory database with schema applied
///
/// Every connection to `sqlite::memory:` is a separate database, so the pool
/// is capped at one connection that is never recycled.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?
        .foreign_keys(true)
        .collation(CATALOG_COLLATION, catalog_cmp);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    init_schema(&pool).await?;
    Ok(pool)
}

/// Create all tables and indexes (idempotent)
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    create_settings_table(pool).await?;
    create_users_table(pool).await?;
    create_profiles_table(pool).await?;

    for table in NAMED_CATALOG_TABLES {
        create_named_catalog_table(pool, table).await?;
    }

    create_dishes_table(pool).await?;
    create_drinks_table(pool).await?;
    create_venues_table(pool).await?;

    // Many-to-many links: (table, left column, left table, right column, right table)
    let links: [(&str, &str, &str, &str, &str); 11] = [
        ("profile_interests", "profile_id", "profiles", "interest_id", "interests"),
        ("profile_artists", "profile_id", "profiles", "artist_id", "artists"),
        ("profile_genres", "profile_id", "profiles", "genre_id", "music_genres"),
        ("profile_favorite_dishes", "profile_id", "profiles", "dish_id", "dishes"),
        ("profile_favorite_drinks", "profile_id", "profiles", "drink_id", "drinks"),
        ("profile_dish_categories", "profile_id", "profiles", "category_id", "dish_categories"),
        ("profile_drink_categories", "profile_id", "profiles", "category_id", "drink_categories"),
        ("dish_ingredients", "dish_id", "dishes", "ingredient_id", "ingredients"),
        ("venue_dishes", "venue_id", "venues", "dish_id", "dishes"),
        ("venue_drinks", "venue_id", "venues", "drink_id", "drinks"),
        ("venue_music_genres", "venue_id", "venues", "genre_id", "music_genres"),
    ];
    for (table, left, left_table, right, right_table) in links {
        create_link_table(pool, table, left, left_table, right, right_table).await?;
    }

    Ok(())
}

/// Key-value settings (holds the token signing secret)
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE COLLATE NOCASE,
            first_name TEXT NOT NULL DEFAULT '',
            last_name TEXT NOT NULL DEFAULT '',
            password_hash TEXT NOT NULL,
            password_salt TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_profiles_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS profiles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
            longitude REAL,
            latitude REAL,
            gender TEXT NOT NULL DEFAULT 'other'
                CHECK (gender IN ('male', 'female', 'other')),
            age INTEGER CHECK (age IS NULL OR (age >= 13 AND age <= 120)),
            bio TEXT CHECK (bio IS NULL OR length(bio) <= 500),
            streaming_service TEXT
                CHECK (streaming_service IS NULL
                       OR streaming_service IN ('spotify', 'apple_music', 'youtube_music', 'other')),
            visibility TEXT NOT NULL DEFAULT 'public'
                CHECK (visibility IN ('public', 'friends', 'interests', 'closed')),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK ((longitude IS NULL) = (latitude IS NULL))
        )
        "#,
    )
    .execute(pool)
    .await?;

    for (name, columns) in [
        ("idx_profiles_visibility", "visibility"),
        ("idx_profiles_age", "age"),
        ("idx_profiles_streaming_service", "streaming_service"),
        ("idx_profiles_location", "latitude, longitude"),
    ] {
        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS {} ON profiles({})",
            name, columns
        ))
        .execute(pool)
        .await?;
    }

    Ok(())
}

async fn create_named_catalog_table(pool: &SqlitePool, table: &str) -> Result<()> {
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE COLLATE {}
        )
        "#,
        table, CATALOG_COLLATION
    ))
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_dishes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS dishes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            category_id INTEGER NOT NULL REFERENCES dish_categories(id) ON DELETE CASCADE,
            description TEXT NOT NULL DEFAULT '',
            UNIQUE (name, category_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_drinks_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS drinks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            category_id INTEGER NOT NULL REFERENCES drink_categories(id) ON DELETE CASCADE,
            description TEXT NOT NULL DEFAULT '',
            alcohol_content REAL
                CHECK (alcohol_content IS NULL OR (alcohol_content >= 0 AND alcohol_content <= 100)),
            UNIQUE (name, category_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_venues_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS venues (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            venue_type TEXT NOT NULL DEFAULT 'other'
                CHECK (venue_type IN ('restaurant', 'bar', 'cafe', 'club', 'pub', 'other')),
            longitude REAL NOT NULL,
            latitude REAL NOT NULL,
            address TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            is_active INTEGER NOT NULL DEFAULT 1,
            average_price REAL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    for (name, columns) in [
        ("idx_venues_name", "name"),
        ("idx_venues_type", "venue_type"),
        ("idx_venues_active", "is_active"),
        ("idx_venues_location", "latitude, longitude"),
    ] {
        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS {} ON venues({})",
            name, columns
        ))
        .execute(pool)
        .await?;
    }

    Ok(())
}

/// Join table with a composite primary key
///
/// The key makes `INSERT OR IGNORE` associations idempotent.
async fn create_link_table(
    pool: &SqlitePool,
    table: &str,
    left: &str,
    left_table: &str,
    right: &str,
    right_table: &str,
) -> Result<()> {
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            {left} INTEGER NOT NULL REFERENCES {left_table}(id) ON DELETE CASCADE,
            {right} INTEGER NOT NULL REFERENCES {right_table}(id) ON DELETE CASCADE,
            PRIMARY KEY ({left}, {right})
        )
        "#,
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        "CREATE INDEX IF NOT EXISTS idx_{table}_{right} ON {table}({right})"
    ))
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let pool = init_memory_database().await.unwrap();
        init_schema(&pool).await.unwrap();

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();

        // settings, users, profiles, 6 catalogs, dishes, drinks, venues, 11 links
        assert_eq!(count, 23);
    }

    #[tokio::test]
    async fn test_catalog_names_unique_case_insensitive() {
        let pool = init_memory_database().await.unwrap();

        sqlx::query("INSERT INTO artists (name) VALUES ('Pink Floyd')")
            .execute(&pool)
            .await
            .unwrap();
        let dup = sqlx::query("INSERT INTO artists (name) VALUES ('pink floyd')")
            .execute(&pool)
            .await;

        assert!(dup.is_err());
    }

    #[tokio::test]
    async fn test_catalog_names_unique_beyond_ascii() {
        let pool = init_memory_database().await.unwrap();

        sqlx::query("INSERT INTO artists (name) VALUES ('Björk')")
            .execute(&pool)
            .await
            .unwrap();
        let dup = sqlx::query("INSERT INTO artists (name) VALUES ('BJÖRK')")
            .execute(&pool)
            .await;
        assert!(dup.is_err());

        let id: i64 = sqlx::query_scalar("SELECT id FROM artists WHERE name = 'björk'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(id, 1);
    }

    #[test]
    fn test_catalog_cmp_folds_unicode_case() {
        assert_eq!(catalog_cmp("ÉLECTRO", "électro"), Ordering::Equal);
        assert_eq!(catalog_cmp("Rock", "rock"), Ordering::Equal);
        assert_eq!(catalog_cmp("abba", "Blur"), Ordering::Less);
        assert_eq!(catalog_key("BJÖRK"), catalog_key("Björk"));
    }

    #[tokio::test]
    async fn test_profile_age_bounds_enforced() {
        let pool = init_memory_database().await.unwrap();
        sqlx::query(
            "INSERT INTO users (username, email, password_hash, password_salt) VALUES ('a', 'a@x.io', '', '')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let too_young = sqlx::query("INSERT INTO profiles (user_id, age) VALUES (1, 12)")
            .execute(&pool)
            .await;
        assert!(too_young.is_err());

        sqlx::query("INSERT INTO profiles (user_id, age) VALUES (1, 13)")
            .execute(&pool)
            .await
            .unwrap();
    }
}
