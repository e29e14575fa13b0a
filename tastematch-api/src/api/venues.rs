//! Venue detail and menu update endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use std::collections::HashSet;

use super::views::VenueView;
use crate::db::catalog::{self, Catalog};
use crate::db::venues::{self, VenueUpdate};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

async fn venue_view(state: &AppState, venue_id: i64) -> ApiResult<Json<VenueView>> {
    let venue = venues::load_venue(&state.db, venue_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Venue {}", venue_id)))?;
    Ok(Json(VenueView::load(&state.db, &venue).await?))
}

/// GET /venues/:id
pub async fn get_venue(
    State(state): State<AppState>,
    Path(venue_id): Path<i64>,
) -> ApiResult<Json<VenueView>> {
    venue_view(&state, venue_id).await
}

#[derive(Debug, Default, Deserialize)]
pub struct VenueMenuRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub average_price: Option<f64>,
    pub dish_ids: Option<HashSet<i64>>,
    pub drink_ids: Option<HashSet<i64>>,
    pub music_genre_ids: Option<HashSet<i64>>,
}

impl VenueMenuRequest {
    /// `replace_all` turns omitted id lists into empty ones
    fn into_update(self, replace_all: bool) -> ApiResult<VenueUpdate> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(ApiError::BadRequest("name may not be blank".to_string()));
            }
        }
        if let Some(price) = self.average_price {
            if !price.is_finite() || price < 0.0 {
                return Err(ApiError::BadRequest(
                    "average_price must be a non-negative number".to_string(),
                ));
            }
        }

        let ids = |ids: Option<HashSet<i64>>| {
            if replace_all {
                Some(ids.unwrap_or_default())
            } else {
                ids
            }
        };

        Ok(VenueUpdate {
            name: self.name,
            address: self.address,
            description: self.description,
            is_active: self.is_active,
            average_price: self.average_price,
            dishes: ids(self.dish_ids),
            drinks: ids(self.drink_ids),
            music_genres: ids(self.music_genre_ids),
        })
    }
}

async fn check_menu_ids(state: &AppState, update: &VenueUpdate) -> ApiResult<()> {
    let menus = [
        (Catalog::Dishes, &update.dishes),
        (Catalog::Drinks, &update.drinks),
        (Catalog::MusicGenres, &update.music_genres),
    ];
    for (kind, ids) in menus {
        let Some(ids) = ids else { continue };
        let missing = catalog::missing_ids(&state.db, kind, ids).await?;
        if !missing.is_empty() {
            return Err(ApiError::BadRequest(format!(
                "Unknown {} ids: {:?}",
                kind.table(),
                missing
            )));
        }
    }
    Ok(())
}

async fn apply(
    state: &AppState,
    venue_id: i64,
    request: VenueMenuRequest,
    replace_all: bool,
) -> ApiResult<Json<VenueView>> {
    let update = request.into_update(replace_all)?;
    check_menu_ids(state, &update).await?;

    if !venues::update_venue(&state.db, venue_id, &update).await? {
        return Err(ApiError::NotFound(format!("Venue {}", venue_id)));
    }
    venue_view(state, venue_id).await
}

/// PATCH /venues/:id
///
/// Only the provided fields and menus change.
pub async fn patch_venue(
    State(state): State<AppState>,
    Path(venue_id): Path<i64>,
    Json(request): Json<VenueMenuRequest>,
) -> ApiResult<Json<VenueView>> {
    apply(&state, venue_id, request, false).await
}

/// PUT /venues/:id
///
/// Every menu is replaced; omitted menus become empty.
pub async fn put_venue(
    State(state): State<AppState>,
    Path(venue_id): Path<i64>,
    Json(request): Json<VenueMenuRequest>,
) -> ApiResult<Json<VenueView>> {
    apply(&state, venue_id, request, true).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_clears_omitted_menus() {
        let request = VenueMenuRequest {
            dish_ids: Some([1].into_iter().collect()),
            ..Default::default()
        };
        let update = request.into_update(true).unwrap();
        assert_eq!(update.dishes.unwrap().len(), 1);
        assert_eq!(update.drinks, Some(HashSet::new()));
        assert_eq!(update.music_genres, Some(HashSet::new()));
    }

    #[test]
    fn test_patch_keeps_omitted_menus() {
        let update = VenueMenuRequest::default().into_update(false).unwrap();
        assert!(update.dishes.is_none());
        assert!(update.drinks.is_none());
    }

    #[test]
    fn test_negative_price_rejected() {
        let request = VenueMenuRequest {
            average_price: Some(-1.0),
            ..Default::default()
        };
        assert!(request.into_update(false).is_err());
    }
}
