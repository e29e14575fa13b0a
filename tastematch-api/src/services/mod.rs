//! Outbound integrations

pub mod music_client;

pub use music_client::{
    MusicClientError, MusicServiceClient, OAuthToken, SpotifyClient, TOP_READ_SCOPE,
};
