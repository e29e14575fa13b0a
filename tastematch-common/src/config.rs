//! Configuration loading and root folder resolution
//!
//! Settings come from a TOML file with `[server]`, `[matching]`, `[spotify]`
//! and `[auth]` sections. Every field has a compiled default, so a missing or
//! partial file still yields a usable configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::{Error, Result};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "TASTEMATCH_ROOT";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "tastematch.db";

/// Complete service configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Data directory holding the database
    pub root_folder: Option<PathBuf>,
    pub server: ServerConfig,
    pub matching: MatchingConfig,
    pub spotify: SpotifyConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Radii used by the matching engine
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// User-to-user search radius
    pub user_radius_km: f64,
    /// User-to-venue search radius
    pub venue_radius_km: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            user_radius_km: 5.0,
            venue_radius_km: 10.0,
        }
    }
}

impl MatchingConfig {
    /// Reject negative or non-finite radii
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("user_radius_km", self.user_radius_km),
            ("venue_radius_km", self.venue_radius_km),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!(
                    "matching.{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Spotify Web API credentials and endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub api_base_url: String,
    pub accounts_base_url: String,
    /// Upper bound for every outbound call
    pub timeout_secs: u64,
    /// Number of top artists requested per sync
    pub top_artists_limit: u32,
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: "http://127.0.0.1:8000/spotify/callback".to_string(),
            api_base_url: "https://api.spotify.com/v1".to_string(),
            accounts_base_url: "https://accounts.spotify.com".to_string(),
            timeout_secs: 10,
            top_artists_limit: 10,
        }
    }
}

impl SpotifyConfig {
    /// Overlay `SPOTIFY_CLIENT_ID`, `SPOTIFY_CLIENT_SECRET` and
    /// `SPOTIFY_REDIRECT_URI` when set
    pub fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("SPOTIFY_CLIENT_ID") {
            self.client_id = v;
        }
        if let Ok(v) = std::env::var("SPOTIFY_CLIENT_SECRET") {
            self.client_secret = v;
        }
        if let Ok(v) = std::env::var("SPOTIFY_REDIRECT_URI") {
            self.redirect_uri = v;
        }
    }
}

/// Bearer token lifetimes
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_ttl_secs: 15 * 60,
            refresh_ttl_secs: 7 * 24 * 60 * 60,
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))?;
        config.matching.validate()?;
        Ok(config)
    }

    /// Load configuration from `path`
    ///
    /// A missing file is not an error: a warning is logged and compiled
    /// defaults are returned. A file that exists but fails to parse is an
    /// error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "Config file {} not found, using compiled defaults",
                path.display()
            );
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

/// Root folder resolution, highest priority first:
/// 1. Command-line argument
/// 2. `TASTEMATCH_ROOT` environment variable
/// 3. `root_folder` from the TOML config
/// 4. OS-dependent compiled default
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// Default config file location (`<config dir>/tastematch/config.toml`)
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("tastematch").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("/etc/tastematch/config.toml"))
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("tastematch"))
        .unwrap_or_else(|| PathBuf::from("./tastematch_data"))
}

/// Database path inside `root_folder`
pub fn database_path(root_folder: &Path) -> PathBuf {
    root_folder.join(DATABASE_FILE)
}
