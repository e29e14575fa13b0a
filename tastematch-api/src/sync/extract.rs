//! Service-specific payload normalization
//!
//! Supported shapes:
//!
//! - `spotify`: `{"items": [{"name": ..., "genres": [...]}, ...]}`
//! - `apple_music`: `{"data": [{"attributes": {"artistName": ..., "genreNames": [...]}}]}`,
//!   only the first genre name of each artist is used
//!
//! Any other service yields nothing. Malformed items are skipped with a
//! warning.

use serde_json::Value;
use std::collections::HashSet;
use tastematch_common::db::catalog_key;
use tracing::warn;

use super::SyncError;

/// Artist and genre names pulled out of one payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    /// Every non-empty artist name, in payload order (may repeat)
    pub artists: Vec<String>,
    /// Distinct genre names, compared by catalog key
    pub genres: Vec<String>,
}

impl Extracted {
    fn push_genre(&mut self, seen: &mut HashSet<String>, raw: &Value) {
        match raw.as_str().and_then(normalize_name) {
            Some(genre) => {
                if seen.insert(catalog_key(&genre)) {
                    self.genres.push(genre);
                }
            }
            None => warn!(genre = %raw, "Skipping malformed genre"),
        }
    }
}

/// Trim and collapse internal whitespace; `None` if nothing is left
pub fn normalize_name(raw: &str) -> Option<String> {
    let name = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    (!name.is_empty()).then_some(name)
}

/// Extract artist and genre names from a `service` payload
///
/// Fails only when `payload` is not a JSON object.
pub fn extract(service: &str, payload: &Value) -> Result<Extracted, SyncError> {
    if !payload.is_object() {
        return Err(SyncError::InvalidPayload(
            "music payload must be a JSON object".to_string(),
        ));
    }

    Ok(match service {
        "spotify" => extract_spotify(payload),
        "apple_music" => extract_apple_music(payload),
        other => {
            tracing::debug!(service = other, "No extractor for service, nothing to sync");
            Extracted::default()
        }
    })
}

fn items<'a>(payload: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    let list = match payload.get(key) {
        Some(Value::Array(items)) => Some(items),
        Some(other) => {
            warn!(key, found = %other, "Expected a list of items");
            None
        }
        None => None,
    };
    list.into_iter().flatten()
}

fn extract_spotify(payload: &Value) -> Extracted {
    let mut extracted = Extracted::default();
    let mut seen_genres = HashSet::new();

    for item in items(payload, "items") {
        let Some(name) = item.get("name").and_then(Value::as_str).and_then(normalize_name) else {
            warn!(item = %item, "Skipping artist without a name");
            continue;
        };
        extracted.artists.push(name);

        match item.get("genres") {
            Some(Value::Array(genres)) => {
                for genre in genres {
                    extracted.push_genre(&mut seen_genres, genre);
                }
            }
            Some(other) => warn!(genres = %other, "Skipping malformed genre list"),
            None => {}
        }
    }

    extracted
}

fn extract_apple_music(payload: &Value) -> Extracted {
    let mut extracted = Extracted::default();
    let mut seen_genres = HashSet::new();

    for item in items(payload, "data") {
        let Some(attributes) = item.get("attributes").filter(|a| a.is_object()) else {
            warn!(item = %item, "Skipping artist without attributes");
            continue;
        };
        let Some(name) = attributes
            .get("artistName")
            .and_then(Value::as_str)
            .and_then(normalize_name)
        else {
            warn!(item = %item, "Skipping artist without a name");
            continue;
        };
        extracted.artists.push(name);

        if let Some(genre) = attributes
            .get("genreNames")
            .and_then(Value::as_array)
            .and_then(|names| names.first())
        {
            extracted.push_genre(&mut seen_genres, genre);
        }
    }

    extracted
}
