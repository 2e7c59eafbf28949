//! Admin authentication.
//!
//! The admin logs in once with HTTP Basic credentials and receives a session
//! token. Every admin-only action afterwards only asks [`AdminVerifier`]
//! whether a token is valid.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, Response, StatusCode},
    middleware::Next,
    response::IntoResponse,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::types::AdminId;

/// Decides whether a session token belongs to an admin
pub trait AdminVerifier: Send + Sync {
    fn verify_admin(&self, token: &str) -> bool;
}

/// Authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Admin username (None = auth disabled)
    pub username: Option<String>,
    pub password: Option<String>,
    /// Key mixed into session tokens
    secret: String,
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl AuthConfig {
    /// Load auth config from environment variables.
    /// ADMIN_USERNAME and ADMIN_PASSWORD must both be set to enable auth.
    pub fn from_env() -> Self {
        let username = non_empty_var("ADMIN_USERNAME");
        let password = non_empty_var("ADMIN_PASSWORD");
        let secret = non_empty_var("ADMIN_SECRET").unwrap_or_else(|| {
            tracing::info!("ADMIN_SECRET not set, admin tokens expire on restart");
            random_secret()
        });

        if username.is_some() && password.is_some() {
            tracing::info!("Admin authentication enabled");
            Self::new(username, password, secret)
        } else {
            if username.is_some() || password.is_some() {
                tracing::warn!(
                    "ADMIN_USERNAME and ADMIN_PASSWORD must both be set to enable authentication"
                );
            }
            tracing::warn!("Admin authentication DISABLED - anyone can control games!");
            Self::new(None, None, secret)
        }
    }

    pub fn new(username: Option<String>, password: Option<String>, secret: String) -> Self {
        Self {
            username,
            password,
            secret,
        }
    }

    /// Auth switched off; every token verifies
    pub fn disabled() -> Self {
        Self::new(None, None, random_secret())
    }

    pub fn is_enabled(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    /// Validate login credentials
    pub fn validate(&self, username: &str, password: &str) -> bool {
        match (&self.username, &self.password) {
            (Some(u), Some(p)) => {
                constant_time_eq(u.as_bytes(), username.as_bytes())
                    & constant_time_eq(p.as_bytes(), password.as_bytes())
            }
            _ => true,
        }
    }

    fn token_for(&self, username: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(b":");
        hasher.update(username.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Exchange credentials for a session token
    pub fn login(&self, username: &str, password: &str) -> Option<String> {
        if !self.validate(username, password) {
            return None;
        }
        let name = self.username.as_deref().unwrap_or(username);
        Some(self.token_for(name))
    }

    /// Identity recorded as a game's creator
    pub fn admin_id(&self) -> AdminId {
        self.username
            .clone()
            .unwrap_or_else(|| "admin".to_string())
    }
}

impl AdminVerifier for AuthConfig {
    fn verify_admin(&self, token: &str) -> bool {
        match &self.username {
            Some(username) if self.is_enabled() => {
                let expected = self.token_for(username);
                constant_time_eq(expected.as_bytes(), token.as_bytes())
            }
            _ => true,
        }
    }
}

fn random_secret() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

/// Constant-time byte comparison to prevent timing attacks
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// `(username, password)` from a `Basic` authorization header
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = String::from_utf8(STANDARD.decode(encoded.trim()).ok()?).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

/// Middleware guarding admin-only HTTP routes with a bearer session token
pub async fn admin_auth_middleware(
    State(verifier): State<Arc<dyn AdminVerifier>>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    let token = bearer_token(request.headers()).unwrap_or_default();
    if verifier.verify_admin(token) {
        return next.run(request).await;
    }

    tracing::warn!("Rejected admin request to {}", request.uri().path());
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Bearer realm=\"Fake News Admin\"")],
        "Unauthorized",
    )
        .into_response()
}
