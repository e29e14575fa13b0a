//! Configuration loading and root folder resolution
//!
//! Tests touching TASTEMATCH_ROOT are #[serial] so they don't race on the
//! process environment.

use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use tastematch_common::config::{
    database_path, default_root_folder, resolve_root_folder, TomlConfig, ROOT_FOLDER_ENV,
};

#[test]
fn test_missing_config_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = TomlConfig::load(&dir.path().join("absent.toml")).unwrap();

    assert_eq!(config.matching.user_radius_km, 5.0);
    assert_eq!(config.matching.venue_radius_km, 10.0);
    assert!(config.root_folder.is_none());
}

#[test]
fn test_full_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
root_folder = "/srv/tastematch"

[server]
host = "0.0.0.0"
port = 9000

[matching]
user_radius_km = 3.0
venue_radius_km = 7.5

[spotify]
client_id = "abc"
timeout_secs = 4

[auth]
access_ttl_secs = 60
"#
    )
    .unwrap();

    let config = TomlConfig::load(file.path()).unwrap();

    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/tastematch")));
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.matching.user_radius_km, 3.0);
    assert_eq!(config.matching.venue_radius_km, 7.5);
    assert_eq!(config.spotify.client_id, "abc");
    assert_eq!(config.spotify.timeout_secs, 4);
    assert_eq!(config.spotify.top_artists_limit, 10);
    assert_eq!(config.auth.access_ttl_secs, 60);
}

#[test]
fn test_invalid_toml_is_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[matching\nuser_radius_km = ").unwrap();

    assert!(TomlConfig::load(file.path()).is_err());
}

#[test]
#[serial]
fn test_cli_argument_wins() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/from-env");
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/from-toml")),
        ..Default::default()
    };

    let resolved = resolve_root_folder(Some(Path::new("/tmp/from-cli")), &config);
    env::remove_var(ROOT_FOLDER_ENV);

    assert_eq!(resolved, PathBuf::from("/tmp/from-cli"));
}

#[test]
#[serial]
fn test_env_beats_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/from-env");
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/from-toml")),
        ..Default::default()
    };

    let resolved = resolve_root_folder(None, &config);
    env::remove_var(ROOT_FOLDER_ENV);

    assert_eq!(resolved, PathBuf::from("/tmp/from-env"));
}

#[test]
#[serial]
fn test_toml_then_default() {
    env::remove_var(ROOT_FOLDER_ENV);

    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/from-toml")),
        ..Default::default()
    };
    assert_eq!(
        resolve_root_folder(None, &config),
        PathBuf::from("/tmp/from-toml")
    );

    assert_eq!(
        resolve_root_folder(None, &TomlConfig::default()),
        default_root_folder()
    );
}

#[test]
fn test_database_path_in_root_folder() {
    assert_eq!(
        database_path(Path::new("/data")),
        PathBuf::from("/data/tastematch.db")
    );
}

#[test]
#[serial]
fn test_spotify_env_overlay() {
    env::set_var("SPOTIFY_CLIENT_ID", "env-client");
    let mut spotify = TomlConfig::default().spotify;
    spotify.apply_env();
    env::remove_var("SPOTIFY_CLIENT_ID");

    assert_eq!(spotify.client_id, "env-client");
}
