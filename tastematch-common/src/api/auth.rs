//! Credential primitives: password hashing and signed bearer tokens
//!
//! # Tokens
//!
//! A bearer token is `<kind>.<user_id>.<expires_ms>.<signature>` where the
//! signature is the SHA-256 (hex) of `<kind>.<user_id>.<expires_ms>` followed
//! by the server secret as a decimal string. The secret lives in the
//! `settings` table under `token_signing_secret`.
//!
//! # Passwords
//!
//! Stored as SHA-256 (hex) of `salt || password` with a random 16-byte salt.

use rand::Rng;
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

#[cfg(feature = "sqlx")]
use sqlx::SqlitePool;

/// Settings key holding the token signing secret
pub const TOKEN_SECRET_KEY: &str = "token_signing_secret";

// ========================================
// Error Types
// ========================================

/// Authentication error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Token is not `kind.user.expiry.signature`
    Malformed,

    /// Token kind differs from the one required
    WrongKind { expected: TokenKind },

    /// Token expired at the given unix ms
    Expired { expired_at: i64 },

    /// Signature does not match
    InvalidSignature,

    /// Database error loading the signing secret
    DatabaseError(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Malformed => write!(f, "Malformed token"),
            AuthError::WrongKind { expected } => write!(f, "Expected {} token", expected),
            AuthError::Expired { .. } => write!(f, "Token expired"),
            AuthError::InvalidSignature => write!(f, "Invalid token signature"),
            AuthError::DatabaseError(err) => write!(f, "Database error: {}", err),
        }
    }
}

impl std::error::Error for AuthError {}

// ========================================
// Signing Secret Management
// ========================================

/// Load the token signing secret, generating one on first use
#[cfg(feature = "sqlx")]
pub async fn load_token_secret(db: &SqlitePool) -> Result<i64, AuthError> {
    let result: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(TOKEN_SECRET_KEY)
        .fetch_optional(db)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

    match result {
        Some((value,)) => value
            .parse::<i64>()
            .map_err(|e| AuthError::DatabaseError(format!("Invalid i64: {}", e))),
        None => initialize_token_secret(db).await,
    }
}

/// Generate and store a random non-zero signing secret
#[cfg(feature = "sqlx")]
pub async fn initialize_token_secret(db: &SqlitePool) -> Result<i64, AuthError> {
    let mut rng = rand::thread_rng();
    let secret: i64 = loop {
        let val = rng.gen::<i64>();
        if val != 0 {
            break val;
        }
    };

    // OR IGNORE keeps the first writer's secret if two instances race
    sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
        .bind(TOKEN_SECRET_KEY)
        .bind(secret.to_string())
        .execute(db)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

    let (stored,): (String,) = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(TOKEN_SECRET_KEY)
        .fetch_one(db)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

    stored
        .parse::<i64>()
        .map_err(|e| AuthError::DatabaseError(format!("Invalid i64: {}", e)))
}

// ========================================
// Bearer Tokens
// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "access" => Some(TokenKind::Access),
            "refresh" => Some(TokenKind::Refresh),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated token contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenClaims {
    pub kind: TokenKind,
    pub user_id: i64,
    pub expires_at_ms: i64,
}

/// Current unix time in milliseconds
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

fn sign(payload: &str, secret: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    hasher.update(secret.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Compare two strings without short-circuiting on the first difference
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Issue a token of `kind` for `user_id` valid for `ttl_secs`
pub fn issue_token(kind: TokenKind, user_id: i64, ttl_secs: i64, secret: i64) -> String {
    issue_token_at(kind, user_id, now_ms() + ttl_secs * 1000, secret)
}

/// Issue a token expiring at an explicit unix ms
pub fn issue_token_at(kind: TokenKind, user_id: i64, expires_at_ms: i64, secret: i64) -> String {
    let payload = format!("{}.{}.{}", kind.as_str(), user_id, expires_at_ms);
    let signature = sign(&payload, secret);
    format!("{}.{}", payload, signature)
}

/// Validate a token's shape, signature, kind and expiry
///
/// # Examples
///
/// ```
/// use tastematch_common::api::auth::{issue_token, validate_token, TokenKind};
///
/// let token = issue_token(TokenKind::Access, 42, 60, 123456789);
/// let claims = validate_token(&token, TokenKind::Access, 123456789).unwrap();
/// assert_eq!(claims.user_id, 42);
///
/// // Wrong secret fails
/// assert!(validate_token(&token, TokenKind::Access, 1).is_err());
/// ```
pub fn validate_token(
    token: &str,
    expected: TokenKind,
    secret: i64,
) -> Result<TokenClaims, AuthError> {
    let parts: Vec<&str> = token.split('.').collect();
    let [kind, user_id, expires, signature] = parts.as_slice() else {
        return Err(AuthError::Malformed);
    };

    let kind = TokenKind::parse(kind).ok_or(AuthError::Malformed)?;
    let user_id: i64 = user_id.parse().map_err(|_| AuthError::Malformed)?;
    let expires_at_ms: i64 = expires.parse().map_err(|_| AuthError::Malformed)?;

    let payload = format!("{}.{}.{}", kind.as_str(), user_id, expires_at_ms);
    if !constant_time_eq(&sign(&payload, secret), signature) {
        return Err(AuthError::InvalidSignature);
    }

    if kind != expected {
        return Err(AuthError::WrongKind { expected });
    }

    if expires_at_ms < now_ms() {
        return Err(AuthError::Expired {
            expired_at: expires_at_ms,
        });
    }

    Ok(TokenClaims {
        kind,
        user_id,
        expires_at_ms,
    })
}

// ========================================
// Passwords
// ========================================

/// Random hex salt
pub fn generate_salt() -> String {
    let bytes: [u8; 16] = rand::thread_rng().gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn verify_password(password: &str, salt: &str, expected_hash: &str) -> bool {
    constant_time_eq(&hash_password(password, salt), expected_hash)
}
