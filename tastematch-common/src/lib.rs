//! # TasteMatch Common Library
//!
//! Shared code for the TasteMatch service crates:
//! - Error type and result alias
//! - Configuration loading and root folder resolution
//! - Geo Index (great-circle radius filtering)
//! - Attribute overlap counting
//! - Database schema, initialization and models
//! - Credential primitives (password hashing, signed bearer tokens)

pub mod api;
pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod geo;
pub mod overlap;

pub use error::{Error, Result};
pub use geo::GeoPoint;
pub use overlap::overlap_count;
