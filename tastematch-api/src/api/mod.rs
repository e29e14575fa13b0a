//! HTTP API handlers for tastematch-api

pub mod accounts;
pub mod auth;
pub mod health;
pub mod matches;
pub mod spotify;
pub mod users;
pub mod venues;
pub mod views;

pub use accounts::{obtain_token, refresh_token, register};
pub use auth::{auth_middleware, AuthUser};
pub use health::health_routes;
pub use matches::{music_matches, nearby_matches, venue_matches};
pub use users::{get_profile, list_users, update_profile};
pub use venues::{get_venue, patch_venue, put_venue};
