//! User listing and profile endpoints

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use std::collections::HashSet;
use tastematch_common::db::{Gender, Profile, Visibility};
use tastematch_common::geo::GeoPoint;

use super::auth::AuthUser;
use super::views::{ProfileSummary, ProfileView, UserWithProfile};
use crate::db::catalog;
use crate::db::profiles::{self, ProfileSet, ProfileUpdate};
use crate::db::users;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

const MIN_AGE: i64 = 13;
const MAX_AGE: i64 = 120;
const MAX_BIO_CHARS: usize = 500;

/// GET /users
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<UserWithProfile>>> {
    let all = users::list_users(&state.db).await?;

    let mut listed = Vec::with_capacity(all.len());
    for user in all {
        let profile = profiles::load_profile_by_user(&state.db, user.id).await?;
        listed.push(UserWithProfile {
            profile: profile.as_ref().map(ProfileSummary::from),
            user: user.into(),
        });
    }
    Ok(Json(listed))
}

async fn owned_profile(state: &AppState, auth: AuthUser, profile_id: i64) -> ApiResult<Profile> {
    let profile = profiles::load_profile(&state.db, profile_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Profile {}", profile_id)))?;

    if profile.user_id != auth.user_id {
        return Err(ApiError::Forbidden(
            "You do not have permission to access this profile".to_string(),
        ));
    }
    Ok(profile)
}

/// GET /profiles/:id
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(profile_id): Path<i64>,
) -> ApiResult<Json<ProfileView>> {
    let profile = owned_profile(&state, auth, profile_id).await?;
    Ok(Json(ProfileView::load(&state.db, &profile).await?))
}

/// Profile update body; omitted fields are left unchanged
#[derive(Debug, Default, Deserialize)]
pub struct ProfileUpdateRequest {
    /// `[longitude, latitude]`
    pub location_input: Option<Vec<f64>>,
    pub gender: Option<Gender>,
    pub age: Option<i64>,
    pub bio: Option<String>,
    pub visibility: Option<Visibility>,
    pub interest_ids: Option<HashSet<i64>>,
    pub artist_ids: Option<HashSet<i64>>,
    pub genre_ids: Option<HashSet<i64>>,
    pub favorite_dish_ids: Option<HashSet<i64>>,
    pub favorite_drink_ids: Option<HashSet<i64>>,
    pub preferred_dish_category_ids: Option<HashSet<i64>>,
    pub preferred_drink_category_ids: Option<HashSet<i64>>,
}

impl ProfileUpdateRequest {
    /// Validate scalar fields and collect the requested changes
    fn into_update(self) -> ApiResult<ProfileUpdate> {
        let location = self
            .location_input
            .map(|pair| GeoPoint::from_lon_lat(&pair))
            .transpose()?;

        if let Some(age) = self.age {
            if !(MIN_AGE..=MAX_AGE).contains(&age) {
                return Err(ApiError::BadRequest(format!(
                    "age must be between {} and {}",
                    MIN_AGE, MAX_AGE
                )));
            }
        }
        if let Some(bio) = &self.bio {
            if bio.chars().count() > MAX_BIO_CHARS {
                return Err(ApiError::BadRequest(format!(
                    "bio must be at most {} characters",
                    MAX_BIO_CHARS
                )));
            }
        }

        let sets = [
            (ProfileSet::Interests, self.interest_ids),
            (ProfileSet::Artists, self.artist_ids),
            (ProfileSet::Genres, self.genre_ids),
            (ProfileSet::FavoriteDishes, self.favorite_dish_ids),
            (ProfileSet::FavoriteDrinks, self.favorite_drink_ids),
            (ProfileSet::DishCategories, self.preferred_dish_category_ids),
            (ProfileSet::DrinkCategories, self.preferred_drink_category_ids),
        ]
        .into_iter()
        .filter_map(|(set, ids)| ids.map(|ids| (set, ids)))
        .collect();

        Ok(ProfileUpdate {
            location,
            gender: self.gender,
            age: self.age,
            bio: self.bio,
            visibility: self.visibility,
            streaming_service: None,
            sets,
        })
    }
}

/// Reject ids that do not name an existing catalog row
async fn check_ids(state: &AppState, update: &ProfileUpdate) -> ApiResult<()> {
    for (set, ids) in &update.sets {
        let missing = catalog::missing_ids(&state.db, set.catalog(), ids).await?;
        if !missing.is_empty() {
            return Err(ApiError::BadRequest(format!(
                "Unknown {} ids: {:?}",
                set.catalog().table(),
                missing
            )));
        }
    }
    Ok(())
}

/// PATCH /profiles/:id
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(profile_id): Path<i64>,
    Json(request): Json<ProfileUpdateRequest>,
) -> ApiResult<Json<ProfileView>> {
    owned_profile(&state, auth, profile_id).await?;

    let update = request.into_update()?;
    check_ids(&state, &update).await?;
    profiles::update_profile(&state.db, profile_id, &update).await?;

    let profile = profiles::load_profile(&state.db, profile_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Profile {}", profile_id)))?;
    Ok(Json(ProfileView::load(&state.db, &profile).await?))
}
