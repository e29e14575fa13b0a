//! Venue store

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::{HashMap, HashSet};
use tastematch_common::db::{Venue, VenueType};
use tastematch_common::geo::GeoPoint;

use super::catalog;
use super::{bind_box, BoxFilter};

const VENUE_COLUMNS: &str = "v.id, v.name, v.venue_type, v.longitude, v.latitude, v.address, \
     v.description, v.is_active, v.average_price";

/// Venue creation input
#[derive(Debug, Clone)]
pub struct NewVenue {
    pub name: String,
    pub venue_type: VenueType,
    pub location: GeoPoint,
    pub address: String,
    pub description: String,
    pub average_price: Option<f64>,
}

/// Menu/detail update; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct VenueUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub average_price: Option<f64>,
    pub dishes: Option<HashSet<i64>>,
    pub drinks: Option<HashSet<i64>>,
    pub music_genres: Option<HashSet<i64>>,
}

fn row_to_venue(row: &SqliteRow) -> sqlx::Result<Venue> {
    let venue_type: String = row.try_get("venue_type")?;
    let venue_type = venue_type
        .parse::<VenueType>()
        .map_err(|e| sqlx::Error::ColumnDecode {
            index: "venue_type".to_string(),
            source: Box::new(e),
        })?;

    Ok(Venue {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        venue_type,
        location: GeoPoint {
            longitude: row.try_get("longitude")?,
            latitude: row.try_get("latitude")?,
        },
        address: row.try_get("address")?,
        description: row.try_get("description")?,
        is_active: row.try_get("is_active")?,
        average_price: row.try_get("average_price")?,
        dishes: HashSet::new(),
        drinks: HashSet::new(),
        music_genres: HashSet::new(),
        dish_categories: Vec::new(),
        drink_categories: Vec::new(),
    })
}

pub async fn create_venue(pool: &SqlitePool, venue: &NewVenue) -> sqlx::Result<i64> {
    sqlx::query_scalar(
        "INSERT INTO venues (name, venue_type, longitude, latitude, address, description, average_price) \
         VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(&venue.name)
    .bind(venue.venue_type.as_str())
    .bind(venue.location.longitude)
    .bind(venue.location.latitude)
    .bind(&venue.address)
    .bind(&venue.description)
    .bind(venue.average_price)
    .fetch_one(pool)
    .await
}

/// Load one venue with its full menu
pub async fn load_venue(pool: &SqlitePool, venue_id: i64) -> sqlx::Result<Option<Venue>> {
    let row = sqlx::query(&format!("SELECT {} FROM venues v WHERE v.id = ?", VENUE_COLUMNS))
        .bind(venue_id)
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let mut venue = row_to_venue(&row)?;

    let dishes: Vec<(i64, i64)> = sqlx::query_as(
        "SELECT d.id, d.category_id FROM venue_dishes vd JOIN dishes d ON d.id = vd.dish_id \
         WHERE vd.venue_id = ?",
    )
    .bind(venue_id)
    .fetch_all(pool)
    .await?;
    for (dish_id, category_id) in dishes {
        venue.dishes.insert(dish_id);
        venue.dish_categories.push(category_id);
    }

    let drinks: Vec<(i64, i64)> = sqlx::query_as(
        "SELECT d.id, d.category_id FROM venue_drinks vd JOIN drinks d ON d.id = vd.drink_id \
         WHERE vd.venue_id = ?",
    )
    .bind(venue_id)
    .fetch_all(pool)
    .await?;
    for (drink_id, category_id) in drinks {
        venue.drinks.insert(drink_id);
        venue.drink_categories.push(category_id);
    }

    let genres: Vec<i64> =
        sqlx::query_scalar("SELECT genre_id FROM venue_music_genres WHERE venue_id = ?")
            .bind(venue_id)
            .fetch_all(pool)
            .await?;
    venue.music_genres = genres.into_iter().collect();

    Ok(Some(venue))
}

/// Venues inside the bounding box of `radius_km` around `center`, with menus
///
/// Inactive venues are included. Callers apply the exact radius check.
pub async fn venues_near(
    pool: &SqlitePool,
    center: &GeoPoint,
    radius_km: f64,
) -> sqlx::Result<Vec<Venue>> {
    let filter = BoxFilter::around(center, radius_km);

    let sql = format!(
        "SELECT {} FROM venues v WHERE {} ORDER BY v.id",
        VENUE_COLUMNS,
        BoxFilter::predicate("v")
    );
    let rows = bind_box!(sqlx::query(&sql), filter).fetch_all(pool).await?;
    let mut venues = rows
        .iter()
        .map(row_to_venue)
        .collect::<sqlx::Result<Vec<Venue>>>()?;

    let mut dishes: HashMap<i64, Vec<(i64, i64)>> = HashMap::new();
    let sql = format!(
        "SELECT vd.venue_id, d.id, d.category_id FROM venue_dishes vd \
         JOIN dishes d ON d.id = vd.dish_id JOIN venues v ON v.id = vd.venue_id WHERE {}",
        BoxFilter::predicate("v")
    );
    let rows: Vec<(i64, i64, i64)> = bind_box!(sqlx::query_as(&sql), filter)
        .fetch_all(pool)
        .await?;
    for (venue_id, dish_id, category_id) in rows {
        dishes.entry(venue_id).or_default().push((dish_id, category_id));
    }

    let mut drinks: HashMap<i64, Vec<(i64, i64)>> = HashMap::new();
    let sql = format!(
        "SELECT vd.venue_id, d.id, d.category_id FROM venue_drinks vd \
         JOIN drinks d ON d.id = vd.drink_id JOIN venues v ON v.id = vd.venue_id WHERE {}",
        BoxFilter::predicate("v")
    );
    let rows: Vec<(i64, i64, i64)> = bind_box!(sqlx::query_as(&sql), filter)
        .fetch_all(pool)
        .await?;
    for (venue_id, drink_id, category_id) in rows {
        drinks.entry(venue_id).or_default().push((drink_id, category_id));
    }

    for venue in venues.iter_mut() {
        for (dish_id, category_id) in dishes.remove(&venue.id).unwrap_or_default() {
            venue.dishes.insert(dish_id);
            venue.dish_categories.push(category_id);
        }
        for (drink_id, category_id) in drinks.remove(&venue.id).unwrap_or_default() {
            venue.drinks.insert(drink_id);
            venue.drink_categories.push(category_id);
        }
    }

    Ok(venues)
}

/// Apply a venue update in one transaction
///
/// Returns `false` when the venue does not exist.
pub async fn update_venue(
    pool: &SqlitePool,
    venue_id: i64,
    update: &VenueUpdate,
) -> sqlx::Result<bool> {
    let mut tx = pool.begin().await?;

    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM venues WHERE id = ?")
        .bind(venue_id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Ok(false);
    }

    if let Some(name) = &update.name {
        sqlx::query("UPDATE venues SET name = ? WHERE id = ?")
            .bind(name)
            .bind(venue_id)
            .execute(&mut *tx)
            .await?;
    }
    if let Some(address) = &update.address {
        sqlx::query("UPDATE venues SET address = ? WHERE id = ?")
            .bind(address)
            .bind(venue_id)
            .execute(&mut *tx)
            .await?;
    }
    if let Some(description) = &update.description {
        sqlx::query("UPDATE venues SET description = ? WHERE id = ?")
            .bind(description)
            .bind(venue_id)
            .execute(&mut *tx)
            .await?;
    }
    if let Some(is_active) = update.is_active {
        sqlx::query("UPDATE venues SET is_active = ? WHERE id = ?")
            .bind(is_active)
            .bind(venue_id)
            .execute(&mut *tx)
            .await?;
    }
    if let Some(price) = update.average_price {
        sqlx::query("UPDATE venues SET average_price = ? WHERE id = ?")
            .bind(price)
            .bind(venue_id)
            .execute(&mut *tx)
            .await?;
    }

    let menus = [
        (&update.dishes, "venue_dishes", "dish_id"),
        (&update.drinks, "venue_drinks", "drink_id"),
        (&update.music_genres, "venue_music_genres", "genre_id"),
    ];
    for (ids, table, column) in menus {
        if let Some(ids) = ids {
            catalog::replace_links(&mut tx, table, "venue_id", column, venue_id, ids).await?;
        }
    }

    sqlx::query("UPDATE venues SET updated_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(venue_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::catalog::{create_dish, create_drink};
    use tastematch_common::db::init_memory_database;

    fn cafe(lon: f64, lat: f64) -> NewVenue {
        NewVenue {
            name: "Corner Cafe".to_string(),
            venue_type: VenueType::Cafe,
            location: GeoPoint::new(lon, lat).unwrap(),
            address: String::new(),
            description: String::new(),
            average_price: Some(12.5),
        }
    }

    #[tokio::test]
    async fn test_menu_update_and_load() {
        let pool = init_memory_database().await.unwrap();
        sqlx::query("INSERT INTO dish_categories (name) VALUES ('Pasta')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO drink_categories (name) VALUES ('Coffee')")
            .execute(&pool)
            .await
            .unwrap();
        let dish = create_dish(&pool, "Carbonara", 1, &[]).await.unwrap();
        let drink = create_drink(&pool, "Espresso", 1, None).await.unwrap();
        let venue_id = create_venue(&pool, &cafe(-122.41, 37.77)).await.unwrap();

        let update = VenueUpdate {
            dishes: Some([dish].into_iter().collect()),
            drinks: Some([drink].into_iter().collect()),
            ..Default::default()
        };
        assert!(update_venue(&pool, venue_id, &update).await.unwrap());

        let venue = load_venue(&pool, venue_id).await.unwrap().unwrap();
        assert!(venue.dishes.contains(&dish));
        assert!(venue.drinks.contains(&drink));
        assert_eq!(venue.dish_categories, vec![1]);
        assert!(venue.is_active);
    }

    #[tokio::test]
    async fn test_update_missing_venue() {
        let pool = init_memory_database().await.unwrap();
        assert!(!update_venue(&pool, 99, &VenueUpdate::default()).await.unwrap());
    }

    #[tokio::test]
    async fn test_venues_near_includes_inactive() {
        let pool = init_memory_database().await.unwrap();
        let open = create_venue(&pool, &cafe(-122.41, 37.77)).await.unwrap();
        let closed = create_venue(&pool, &cafe(-122.42, 37.78)).await.unwrap();
        let far = create_venue(&pool, &cafe(-121.0, 37.0)).await.unwrap();
        let update = VenueUpdate {
            is_active: Some(false),
            ..Default::default()
        };
        update_venue(&pool, closed, &update).await.unwrap();

        let center = GeoPoint::new(-122.4194, 37.7749).unwrap();
        let near = venues_near(&pool, &center, 10.0).await.unwrap();
        let ids: Vec<i64> = near.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![open, closed]);
        assert!(!ids.contains(&far));
        assert!(!near[1].is_active);
    }
}
