//! JSON representations returned by the API

use serde::Serialize;
use sqlx::SqlitePool;
use tastematch_common::db::{
    Gender, NamedEntity, Profile, StreamingService, User, Venue, VenueType, Visibility,
};
use tastematch_common::geo::GeoPoint;

use crate::db::catalog::{self, Catalog};
use crate::db::profiles::ProfileSet;
use crate::matching::{MenuOverlap, MusicMatch, ProfileMatch, VenueMatch};

#[derive(Debug, Clone, Copy, Serialize)]
pub struct LocationView {
    pub longitude: f64,
    pub latitude: f64,
}

impl From<GeoPoint> for LocationView {
    fn from(point: GeoPoint) -> Self {
        Self {
            longitude: point.longitude,
            latitude: point.latitude,
        }
    }
}

/// Scalar profile fields
#[derive(Debug, Clone, Serialize)]
pub struct ProfileSummary {
    pub id: i64,
    pub user: i64,
    pub location: Option<LocationView>,
    pub gender: Gender,
    pub age: Option<i64>,
    pub bio: Option<String>,
    pub visibility: Visibility,
    pub streaming_service: Option<StreamingService>,
}

impl From<&Profile> for ProfileSummary {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id,
            user: profile.user_id,
            location: profile.location.map(LocationView::from),
            gender: profile.gender,
            age: profile.age,
            bio: profile.bio.clone(),
            visibility: profile.visibility,
            streaming_service: profile.streaming_service,
        }
    }
}

/// Profile with its attribute sets resolved to names
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    #[serde(flatten)]
    pub summary: ProfileSummary,
    pub interests_detail: Vec<NamedEntity>,
    pub artists_detail: Vec<NamedEntity>,
    pub genres_detail: Vec<NamedEntity>,
    pub favorite_dishes_detail: Vec<NamedEntity>,
    pub favorite_drinks_detail: Vec<NamedEntity>,
    pub preferred_dish_categories_detail: Vec<NamedEntity>,
    pub preferred_drink_categories_detail: Vec<NamedEntity>,
}

impl ProfileView {
    pub async fn load(pool: &SqlitePool, profile: &Profile) -> sqlx::Result<Self> {
        let detail = |set: ProfileSet| catalog::entities_for_ids(pool, set.catalog(), set.get(profile));

        Ok(Self {
            summary: ProfileSummary::from(profile),
            interests_detail: detail(ProfileSet::Interests).await?,
            artists_detail: detail(ProfileSet::Artists).await?,
            genres_detail: detail(ProfileSet::Genres).await?,
            favorite_dishes_detail: detail(ProfileSet::FavoriteDishes).await?,
            favorite_drinks_detail: detail(ProfileSet::FavoriteDrinks).await?,
            preferred_dish_categories_detail: detail(ProfileSet::DishCategories).await?,
            preferred_drink_categories_detail: detail(ProfileSet::DrinkCategories).await?,
        })
    }
}

/// User as returned by registration
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

/// User listing entry with its profile
#[derive(Debug, Clone, Serialize)]
pub struct UserWithProfile {
    #[serde(flatten)]
    pub user: UserView,
    pub profile: Option<ProfileSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NearbyMatchView {
    pub id: i64,
    pub username: String,
    pub profile: ProfileSummary,
    pub distance_km: f64,
    pub shared_interests: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MusicMatchView {
    pub id: i64,
    pub username: String,
    pub profile: ProfileSummary,
    pub distance_km: f64,
    pub shared_artists: usize,
    pub shared_genres: usize,
}

impl NearbyMatchView {
    pub fn new(m: &ProfileMatch, username: String) -> Self {
        Self {
            id: m.profile.user_id,
            username,
            profile: ProfileSummary::from(&m.profile),
            distance_km: m.distance_km,
            shared_interests: m.shared_interests,
        }
    }
}

impl MusicMatchView {
    pub fn new(m: &MusicMatch, username: String) -> Self {
        Self {
            id: m.profile.user_id,
            username,
            profile: ProfileSummary::from(&m.profile),
            distance_km: m.distance_km,
            shared_artists: m.shared_artists,
            shared_genres: m.shared_genres,
        }
    }
}

/// Venue with its menu resolved to names
#[derive(Debug, Clone, Serialize)]
pub struct VenueView {
    pub id: i64,
    pub name: String,
    pub venue_type: VenueType,
    pub location: LocationView,
    pub address: String,
    pub description: String,
    pub is_active: bool,
    pub average_price: Option<f64>,
    pub dishes: Vec<NamedEntity>,
    pub drinks: Vec<NamedEntity>,
    pub music_genres: Vec<NamedEntity>,
}

impl VenueView {
    pub async fn load(pool: &SqlitePool, venue: &Venue) -> sqlx::Result<Self> {
        Ok(Self {
            id: venue.id,
            name: venue.name.clone(),
            venue_type: venue.venue_type,
            location: venue.location.into(),
            address: venue.address.clone(),
            description: venue.description.clone(),
            is_active: venue.is_active,
            average_price: venue.average_price,
            dishes: catalog::entities_for_ids(pool, Catalog::Dishes, &venue.dishes).await?,
            drinks: catalog::entities_for_ids(pool, Catalog::Drinks, &venue.drinks).await?,
            music_genres: catalog::entities_for_ids(pool, Catalog::MusicGenres, &venue.music_genres)
                .await?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VenueMatchView {
    #[serde(flatten)]
    pub venue: VenueView,
    pub distance_km: f64,
    #[serde(flatten)]
    pub overlap: MenuOverlap,
}

impl VenueMatchView {
    pub async fn load(pool: &SqlitePool, m: &VenueMatch) -> sqlx::Result<Self> {
        Ok(Self {
            venue: VenueView::load(pool, &m.venue).await?,
            distance_km: m.distance_km,
            overlap: m.overlap,
        })
    }
}
