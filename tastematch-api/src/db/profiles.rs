//! Profile store
//!
//! Loads profiles with their attribute sets and applies profile updates.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::collections::{HashMap, HashSet};
use tastematch_common::db::{Gender, Profile, StreamingService, Visibility};
use tastematch_common::geo::GeoPoint;

use super::catalog::{self, Catalog};
use super::{bind_box, BoxFilter};

/// One many-to-many attribute dimension of a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileSet {
    Interests,
    Artists,
    Genres,
    FavoriteDishes,
    FavoriteDrinks,
    DishCategories,
    DrinkCategories,
}

impl ProfileSet {
    pub const ALL: [ProfileSet; 7] = [
        ProfileSet::Interests,
        ProfileSet::Artists,
        ProfileSet::Genres,
        ProfileSet::FavoriteDishes,
        ProfileSet::FavoriteDrinks,
        ProfileSet::DishCategories,
        ProfileSet::DrinkCategories,
    ];

    /// (link table, catalog id column)
    pub fn link(&self) -> (&'static str, &'static str) {
        match self {
            ProfileSet::Interests => ("profile_interests", "interest_id"),
            ProfileSet::Artists => ("profile_artists", "artist_id"),
            ProfileSet::Genres => ("profile_genres", "genre_id"),
            ProfileSet::FavoriteDishes => ("profile_favorite_dishes", "dish_id"),
            ProfileSet::FavoriteDrinks => ("profile_favorite_drinks", "drink_id"),
            ProfileSet::DishCategories => ("profile_dish_categories", "category_id"),
            ProfileSet::DrinkCategories => ("profile_drink_categories", "category_id"),
        }
    }

    pub fn catalog(&self) -> Catalog {
        match self {
            ProfileSet::Interests => Catalog::Interests,
            ProfileSet::Artists => Catalog::Artists,
            ProfileSet::Genres => Catalog::MusicGenres,
            ProfileSet::FavoriteDishes => Catalog::Dishes,
            ProfileSet::FavoriteDrinks => Catalog::Drinks,
            ProfileSet::DishCategories => Catalog::DishCategories,
            ProfileSet::DrinkCategories => Catalog::DrinkCategories,
        }
    }

    pub fn get<'a>(&self, profile: &'a Profile) -> &'a HashSet<i64> {
        match self {
            ProfileSet::Interests => &profile.interests,
            ProfileSet::Artists => &profile.artists,
            ProfileSet::Genres => &profile.genres,
            ProfileSet::FavoriteDishes => &profile.favorite_dishes,
            ProfileSet::FavoriteDrinks => &profile.favorite_drinks,
            ProfileSet::DishCategories => &profile.preferred_dish_categories,
            ProfileSet::DrinkCategories => &profile.preferred_drink_categories,
        }
    }

    fn get_mut<'a>(&self, profile: &'a mut Profile) -> &'a mut HashSet<i64> {
        match self {
            ProfileSet::Interests => &mut profile.interests,
            ProfileSet::Artists => &mut profile.artists,
            ProfileSet::Genres => &mut profile.genres,
            ProfileSet::FavoriteDishes => &mut profile.favorite_dishes,
            ProfileSet::FavoriteDrinks => &mut profile.favorite_drinks,
            ProfileSet::DishCategories => &mut profile.preferred_dish_categories,
            ProfileSet::DrinkCategories => &mut profile.preferred_drink_categories,
        }
    }
}

const PROFILE_COLUMNS: &str =
    "p.id, p.user_id, p.longitude, p.latitude, p.gender, p.age, p.bio, p.visibility, p.streaming_service";

fn row_to_profile(row: &SqliteRow) -> sqlx::Result<Profile> {
    let longitude: Option<f64> = row.try_get("longitude")?;
    let latitude: Option<f64> = row.try_get("latitude")?;
    let location = match (longitude, latitude) {
        (Some(longitude), Some(latitude)) => Some(GeoPoint {
            longitude,
            latitude,
        }),
        _ => None,
    };

    let decode = |column: &str, e: tastematch_common::Error| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    };

    let gender: String = row.try_get("gender")?;
    let visibility: String = row.try_get("visibility")?;
    let streaming_service: Option<String> = row.try_get("streaming_service")?;

    Ok(Profile {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        location,
        gender: gender
            .parse::<Gender>()
            .map_err(|e| decode("gender", e))?,
        age: row.try_get("age")?,
        bio: row.try_get("bio")?,
        visibility: visibility
            .parse::<Visibility>()
            .map_err(|e| decode("visibility", e))?,
        streaming_service: streaming_service
            .map(|s| s.parse::<StreamingService>())
            .transpose()
            .map_err(|e| decode("streaming_service", e))?,
        ..Profile::default()
    })
}

/// Load a profile and all of its attribute sets
pub async fn load_profile(pool: &SqlitePool, profile_id: i64) -> sqlx::Result<Option<Profile>> {
    let row = sqlx::query(&format!("SELECT {} FROM profiles p WHERE p.id = ?", PROFILE_COLUMNS))
        .bind(profile_id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let mut profile = row_to_profile(&row)?;
            load_sets(pool, &mut profile, &ProfileSet::ALL).await?;
            Ok(Some(profile))
        }
        None => Ok(None),
    }
}

/// Load the profile owned by `user_id` with all attribute sets
pub async fn load_profile_by_user(pool: &SqlitePool, user_id: i64) -> sqlx::Result<Option<Profile>> {
    let profile_id: Option<i64> = sqlx::query_scalar("SELECT id FROM profiles WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    match profile_id {
        Some(id) => load_profile(pool, id).await,
        None => Ok(None),
    }
}

/// Fill `sets` of `profile` from the store
pub async fn load_sets(
    pool: &SqlitePool,
    profile: &mut Profile,
    sets: &[ProfileSet],
) -> sqlx::Result<()> {
    for set in sets {
        let (table, column) = set.link();
        let ids: Vec<i64> = sqlx::query_scalar(&format!(
            "SELECT {} FROM {} WHERE profile_id = ?",
            column, table
        ))
        .bind(profile.id)
        .fetch_all(pool)
        .await?;
        *set.get_mut(profile) = ids.into_iter().collect();
    }
    Ok(())
}

/// Located profiles inside the bounding box of `radius_km` around `center`
///
/// Only `sets` are loaded. Callers apply the exact radius check.
pub async fn profiles_near(
    pool: &SqlitePool,
    center: &GeoPoint,
    radius_km: f64,
    sets: &[ProfileSet],
) -> sqlx::Result<Vec<Profile>> {
    let filter = BoxFilter::around(center, radius_km);

    let sql = format!(
        "SELECT {} FROM profiles p WHERE p.latitude IS NOT NULL AND {} ORDER BY p.id",
        PROFILE_COLUMNS,
        BoxFilter::predicate("p")
    );
    let rows = bind_box!(sqlx::query(&sql), filter).fetch_all(pool).await?;

    let mut profiles = rows
        .iter()
        .map(row_to_profile)
        .collect::<sqlx::Result<Vec<Profile>>>()?;

    for set in sets {
        let (table, column) = set.link();
        let sql = format!(
            "SELECT l.profile_id, l.{} FROM {} l JOIN profiles p ON p.id = l.profile_id \
             WHERE p.latitude IS NOT NULL AND {}",
            column,
            table,
            BoxFilter::predicate("p")
        );
        let links: Vec<(i64, i64)> = bind_box!(sqlx::query_as(&sql), filter)
            .fetch_all(pool)
            .await?;

        let mut by_profile: HashMap<i64, HashSet<i64>> = HashMap::new();
        for (profile_id, value) in links {
            by_profile.entry(profile_id).or_default().insert(value);
        }
        for profile in profiles.iter_mut() {
            if let Some(values) = by_profile.remove(&profile.id) {
                *set.get_mut(profile) = values;
            }
        }
    }

    Ok(profiles)
}

/// Changes applied by a profile update; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub location: Option<GeoPoint>,
    pub gender: Option<Gender>,
    pub age: Option<i64>,
    pub bio: Option<String>,
    pub visibility: Option<Visibility>,
    pub streaming_service: Option<StreamingService>,
    pub sets: Vec<(ProfileSet, HashSet<i64>)>,
}

/// Apply `update` to a profile in one transaction
pub async fn update_profile(
    pool: &SqlitePool,
    profile_id: i64,
    update: &ProfileUpdate,
) -> sqlx::Result<()> {
    let mut tx = pool.begin().await?;

    if let Some(location) = update.location {
        sqlx::query("UPDATE profiles SET longitude = ?, latitude = ? WHERE id = ?")
            .bind(location.longitude)
            .bind(location.latitude)
            .bind(profile_id)
            .execute(&mut *tx)
            .await?;
    }
    if let Some(gender) = update.gender {
        sqlx::query("UPDATE profiles SET gender = ? WHERE id = ?")
            .bind(gender.as_str())
            .bind(profile_id)
            .execute(&mut *tx)
            .await?;
    }
    if let Some(age) = update.age {
        sqlx::query("UPDATE profiles SET age = ? WHERE id = ?")
            .bind(age)
            .bind(profile_id)
            .execute(&mut *tx)
            .await?;
    }
    if let Some(bio) = &update.bio {
        sqlx::query("UPDATE profiles SET bio = ? WHERE id = ?")
            .bind(bio)
            .bind(profile_id)
            .execute(&mut *tx)
            .await?;
    }
    if let Some(visibility) = update.visibility {
        sqlx::query("UPDATE profiles SET visibility = ? WHERE id = ?")
            .bind(visibility.as_str())
            .bind(profile_id)
            .execute(&mut *tx)
            .await?;
    }
    if let Some(service) = update.streaming_service {
        set_streaming_service(&mut tx, profile_id, service).await?;
    }

    for (set, ids) in &update.sets {
        let (table, column) = set.link();
        catalog::replace_links(&mut tx, table, "profile_id", column, profile_id, ids).await?;
    }

    touch(&mut tx, profile_id).await?;
    tx.commit().await
}

pub async fn set_streaming_service(
    conn: &mut SqliteConnection,
    profile_id: i64,
    service: StreamingService,
) -> sqlx::Result<()> {
    sqlx::query("UPDATE profiles SET streaming_service = ? WHERE id = ?")
        .bind(service.as_str())
        .bind(profile_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Bump `updated_at`
pub async fn touch(conn: &mut SqliteConnection, profile_id: i64) -> sqlx::Result<()> {
    sqlx::query("UPDATE profiles SET updated_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(profile_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::users::{create_user_with_profile, NewUser};
    use tastematch_common::db::init_memory_database;

    async fn user(pool: &SqlitePool, name: &str) -> i64 {
        create_user_with_profile(
            pool,
            &NewUser {
                username: name.to_string(),
                email: format!("{}@example.com", name),
                password: "pass".to_string(),
                first_name: String::new(),
                last_name: String::new(),
            },
        )
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn test_new_profile_defaults() {
        let pool = init_memory_database().await.unwrap();
        let user_id = user(&pool, "ana").await;

        let profile = load_profile_by_user(&pool, user_id).await.unwrap().unwrap();
        assert_eq!(profile.user_id, user_id);
        assert_eq!(profile.visibility, Visibility::Public);
        assert_eq!(profile.gender, Gender::Other);
        assert!(profile.location.is_none());
        assert!(profile.streaming_service.is_none());
    }

    #[tokio::test]
    async fn test_update_sets_and_location() {
        let pool = init_memory_database().await.unwrap();
        let user_id = user(&pool, "ben").await;
        let profile = load_profile_by_user(&pool, user_id).await.unwrap().unwrap();

        sqlx::query("INSERT INTO interests (name) VALUES ('Music'), ('Food')")
            .execute(&pool)
            .await
            .unwrap();

        let update = ProfileUpdate {
            location: Some(GeoPoint::new(-122.4194, 37.7749).unwrap()),
            age: Some(30),
            visibility: Some(Visibility::Interests),
            sets: vec![(ProfileSet::Interests, [1, 2].into_iter().collect())],
            ..Default::default()
        };
        update_profile(&pool, profile.id, &update).await.unwrap();

        let reloaded = load_profile(&pool, profile.id).await.unwrap().unwrap();
        assert_eq!(reloaded.age, Some(30));
        assert_eq!(reloaded.visibility, Visibility::Interests);
        assert_eq!(reloaded.interests.len(), 2);
        assert_eq!(reloaded.location.unwrap().latitude, 37.7749);

        // Replacing the set drops old members
        let update = ProfileUpdate {
            sets: vec![(ProfileSet::Interests, [2].into_iter().collect())],
            ..Default::default()
        };
        update_profile(&pool, profile.id, &update).await.unwrap();
        let reloaded = load_profile(&pool, profile.id).await.unwrap().unwrap();
        assert_eq!(reloaded.interests, [2].into_iter().collect());
    }

    #[tokio::test]
    async fn test_profiles_near_uses_bounding_box() {
        let pool = init_memory_database().await.unwrap();
        let near = user(&pool, "near").await;
        let far = user(&pool, "far").await;
        let _unlocated = user(&pool, "nowhere").await;

        for (user_id, lon, lat) in [(near, -122.4190, 37.7745), (far, -118.2437, 34.0522)] {
            sqlx::query("UPDATE profiles SET longitude = ?, latitude = ? WHERE user_id = ?")
                .bind(lon)
                .bind(lat)
                .bind(user_id)
                .execute(&pool)
                .await
                .unwrap();
        }

        let center = GeoPoint::new(-122.4194, 37.7749).unwrap();
        let found = profiles_near(&pool, &center, 5.0, &[ProfileSet::Interests])
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].user_id, near);
    }
}
