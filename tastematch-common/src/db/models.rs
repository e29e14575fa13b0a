//! Database models

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::geo::{GeoPoint, Located};
use crate::Error;

/// Implements `as_str`, `Display` and `FromStr` for a string-backed enum
macro_rules! string_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(Error::InvalidInput(format!(
                        "Unknown {} '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}

/// Profile discoverability policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Friends,
    Interests,
    Closed,
}

string_enum!(Visibility {
    Public => "public",
    Friends => "friends",
    Interests => "interests",
    Closed => "closed",
});

impl Visibility {
    /// Whether interest-based discovery may surface this profile
    pub fn discoverable_by_interest(&self) -> bool {
        matches!(self, Visibility::Public | Visibility::Interests)
    }

    /// Whether music-based discovery may surface this profile
    pub fn discoverable_by_music(&self) -> bool {
        !matches!(self, Visibility::Closed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Other,
}

string_enum!(Gender {
    Male => "male",
    Female => "female",
    Other => "other",
});

/// Music streaming service a profile last synced from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamingService {
    Spotify,
    AppleMusic,
    YoutubeMusic,
    Other,
}

string_enum!(StreamingService {
    Spotify => "spotify",
    AppleMusic => "apple_music",
    YoutubeMusic => "youtube_music",
    Other => "other",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VenueType {
    Restaurant,
    Bar,
    Cafe,
    Club,
    Pub,
    #[default]
    Other,
}

string_enum!(VenueType {
    Restaurant => "restaurant",
    Bar => "bar",
    Cafe => "cafe",
    Club => "club",
    Pub => "pub",
    Other => "other",
});

/// Registered identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Plain named catalog entity (interest, artist, genre, category, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedEntity {
    pub id: i64,
    pub name: String,
}

/// A user's matchable attribute bundle
///
/// Attribute sets hold catalog ids.
#[derive(Debug, Clone, Default)]
pub struct Profile {
    pub id: i64,
    pub user_id: i64,
    pub location: Option<GeoPoint>,
    pub gender: Gender,
    pub age: Option<i64>,
    pub bio: Option<String>,
    pub visibility: Visibility,
    pub streaming_service: Option<StreamingService>,
    pub interests: HashSet<i64>,
    pub artists: HashSet<i64>,
    pub genres: HashSet<i64>,
    pub favorite_dishes: HashSet<i64>,
    pub favorite_drinks: HashSet<i64>,
    pub preferred_dish_categories: HashSet<i64>,
    pub preferred_drink_categories: HashSet<i64>,
}

impl Located for Profile {
    fn location(&self) -> Option<GeoPoint> {
        self.location
    }
}

impl Located for &Profile {
    fn location(&self) -> Option<GeoPoint> {
        self.location
    }
}

/// Venue with its menu
///
/// `dish_categories`/`drink_categories` hold the categories of each listed
/// dish/drink, one entry per item (duplicates possible).
#[derive(Debug, Clone)]
pub struct Venue {
    pub id: i64,
    pub name: String,
    pub venue_type: VenueType,
    pub location: GeoPoint,
    pub address: String,
    pub description: String,
    pub is_active: bool,
    pub average_price: Option<f64>,
    pub dishes: HashSet<i64>,
    pub drinks: HashSet<i64>,
    pub music_genres: HashSet<i64>,
    pub dish_categories: Vec<i64>,
    pub drink_categories: Vec<i64>,
}

impl Located for Venue {
    fn location(&self) -> Option<GeoPoint> {
        Some(self.location)
    }
}
