use anyhow::Context;
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::api::{ApiError, AppState};
use crate::db::Database;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Issues and verifies bearer tokens. Built once at startup from the
/// process-wide signing secret; never mutated afterwards.
#[derive(Clone)]
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: &[u8], ttl_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Read `JWT_SECRET` (required) and `JWT_TTL_HOURS` (default one week)
    /// from the environment.
    pub fn from_env() -> anyhow::Result<Self> {
        let secret = std::env::var("JWT_SECRET").context("JWT_SECRET is required")?;
        let ttl_hours = match std::env::var("JWT_TTL_HOURS") {
            Ok(raw) => {
                let parsed: i64 = raw.parse().context("JWT_TTL_HOURS must be an integer")?;
                anyhow::ensure!(parsed > 0, "JWT_TTL_HOURS must be positive");
                parsed
            }
            Err(_) => 168,
        };
        Ok(Self::new(secret.as_bytes(), ttl_hours))
    }

    pub fn issue(&self, user_id: i64) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
    }

    /// Returns the verified user id, or `None` for anything invalid or
    /// expired.
    pub fn verify(&self, token: &str) -> Option<i64> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default()).ok()?;
        data.claims.sub.parse().ok()
    }
}

/// Verified caller identity, extracted from the `Authorization: Bearer`
/// header.
pub struct AuthUser(pub i64);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");
        let token = header_value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .unwrap_or("");
        if token.is_empty() {
            return Err(ApiError::Unauthenticated("missing token".into()));
        }
        match state.signer.verify(token) {
            Some(user_id) => Ok(AuthUser(user_id)),
            None => Err(ApiError::Unauthenticated("invalid token".into())),
        }
    }
}

/// Destructive operations are restricted to users whose role is "admin".
pub fn require_admin(db: &Database, user_id: i64) -> Result<(), ApiError> {
    let user = db
        .get_user(user_id)?
        .ok_or_else(|| ApiError::Unauthenticated("unknown user".into()))?;
    if !user.is_admin() {
        return Err(ApiError::PermissionDenied("admin role required".into()));
    }
    Ok(())
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| anyhow::anyhow!("hash password: {err}"))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
