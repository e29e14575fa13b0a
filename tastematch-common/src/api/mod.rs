//! API support shared by service crates

pub mod auth;

pub use auth::{issue_token, validate_token, AuthError, TokenClaims, TokenKind};
