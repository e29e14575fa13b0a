//! Catalog entity operations
//!
//! Named entities (artists, genres, interests, categories, ...) are created
//! lazily. Creation is an upsert against the unique index on `name`, which
//! folds Unicode case, so concurrent syncs never produce duplicates.

use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashSet;
use tastematch_common::db::{catalog_cmp, NamedEntity};

/// Catalog table of a named entity kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Catalog {
    Interests,
    Artists,
    MusicGenres,
    Ingredients,
    DishCategories,
    DrinkCategories,
    Dishes,
    Drinks,
}

impl Catalog {
    pub fn table(&self) -> &'static str {
        match self {
            Catalog::Interests => "interests",
            Catalog::Artists => "artists",
            Catalog::MusicGenres => "music_genres",
            Catalog::Ingredients => "ingredients",
            Catalog::DishCategories => "dish_categories",
            Catalog::DrinkCategories => "drink_categories",
            Catalog::Dishes => "dishes",
            Catalog::Drinks => "drinks",
        }
    }
}

/// Get the id of `name` in `catalog`, creating the row if missing
///
/// `name` must already be normalized. Lookup is case-insensitive; the
/// first-seen casing is kept.
pub async fn get_or_create(
    conn: &mut SqliteConnection,
    catalog: Catalog,
    name: &str,
) -> sqlx::Result<(i64, bool)> {
    debug_assert!(!matches!(catalog, Catalog::Dishes | Catalog::Drinks));

    let inserted = sqlx::query(&format!(
        "INSERT INTO {} (name) VALUES (?) ON CONFLICT DO NOTHING",
        catalog.table()
    ))
    .bind(name)
    .execute(&mut *conn)
    .await?
    .rows_affected()
        > 0;

    let id: i64 = sqlx::query_scalar(&format!(
        "SELECT id FROM {} WHERE name = ?",
        catalog.table()
    ))
    .bind(name)
    .fetch_one(&mut *conn)
    .await?;

    Ok((id, inserted))
}

/// Idempotently associate `left_id` with `right_id` in a link table
pub async fn link(
    conn: &mut SqliteConnection,
    table: &str,
    left_column: &str,
    right_column: &str,
    left_id: i64,
    right_id: i64,
) -> sqlx::Result<bool> {
    let result = sqlx::query(&format!(
        "INSERT OR IGNORE INTO {} ({}, {}) VALUES (?, ?)",
        table, left_column, right_column
    ))
    .bind(left_id)
    .bind(right_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Replace every association of `left_id` in a link table with `right_ids`
pub async fn replace_links(
    conn: &mut SqliteConnection,
    table: &str,
    left_column: &str,
    right_column: &str,
    left_id: i64,
    right_ids: &HashSet<i64>,
) -> sqlx::Result<()> {
    sqlx::query(&format!("DELETE FROM {} WHERE {} = ?", table, left_column))
        .bind(left_id)
        .execute(&mut *conn)
        .await?;

    for right_id in right_ids {
        link(conn, table, left_column, right_column, left_id, *right_id).await?;
    }
    Ok(())
}

/// Ids from `ids` that have no row in `catalog`
pub async fn missing_ids(
    pool: &SqlitePool,
    catalog: Catalog,
    ids: &HashSet<i64>,
) -> sqlx::Result<Vec<i64>> {
    let mut missing = Vec::new();
    for id in ids {
        let exists: Option<i64> = sqlx::query_scalar(&format!(
            "SELECT id FROM {} WHERE id = ?",
            catalog.table()
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;
        if exists.is_none() {
            missing.push(*id);
        }
    }
    missing.sort_unstable();
    Ok(missing)
}

/// Entities for `ids`, ordered by name
pub async fn entities_for_ids(
    pool: &SqlitePool,
    catalog: Catalog,
    ids: &HashSet<i64>,
) -> sqlx::Result<Vec<NamedEntity>> {
    let mut entities = Vec::with_capacity(ids.len());
    for id in ids {
        let row: Option<(i64, String)> = sqlx::query_as(&format!(
            "SELECT id, name FROM {} WHERE id = ?",
            catalog.table()
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;
        if let Some((id, name)) = row {
            entities.push(NamedEntity { id, name });
        }
    }
    entities.sort_by(|a, b| catalog_cmp(&a.name, &b.name));
    Ok(entities)
}

/// Names stored in a named catalog, ordered
pub async fn list_names(pool: &SqlitePool, catalog: Catalog) -> sqlx::Result<Vec<String>> {
    sqlx::query_scalar(&format!(
        "SELECT name FROM {} ORDER BY name",
        catalog.table()
    ))
    .fetch_all(pool)
    .await
}

/// Insert a dish in `category_id`, returning its id
///
/// Used by curation and fixtures; (name, category) is unique.
pub async fn create_dish(
    pool: &SqlitePool,
    name: &str,
    category_id: i64,
    ingredient_ids: &[i64],
) -> sqlx::Result<i64> {
    let mut tx = pool.begin().await?;
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO dishes (name, category_id) VALUES (?, ?) RETURNING id",
    )
    .bind(name)
    .bind(category_id)
    .fetch_one(&mut *tx)
    .await?;

    for ingredient_id in ingredient_ids {
        link(&mut *tx, "dish_ingredients", "dish_id", "ingredient_id", id, *ingredient_id).await?;
    }
    tx.commit().await?;
    Ok(id)
}

/// Insert a drink in `category_id`, returning its id
pub async fn create_drink(
    pool: &SqlitePool,
    name: &str,
    category_id: i64,
    alcohol_content: Option<f64>,
) -> sqlx::Result<i64> {
    sqlx::query_scalar(
        "INSERT INTO drinks (name, category_id, alcohol_content) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(name)
    .bind(category_id)
    .bind(alcohol_content)
    .fetch_one(pool)
    .await
}
