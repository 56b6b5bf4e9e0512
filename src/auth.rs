//! Bearer token verification for the `/todos` routes.
//!
//! Tokens are issued by the external identity provider and signed with the
//! shared `JWT_SECRET` (HS256). A request that passes gets its [`Claims`]
//! attached to the request extensions; handlers read the owner from
//! `claims.sub`.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::state::AppState;

pub const MISSING_TOKEN: &str = "Unauthorized Status";
pub const INVALID_TOKEN: &str = "Invalid Token";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Claims {
    pub fn new(sub: impl Into<String>, expires_in: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: sub.into(),
            exp: (now + expires_in).timestamp(),
            iat: Some(now.timestamp()),
            email: None,
        }
    }
}

#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        // Provider tokens carry `aud: "authenticated"`; it is only checked
        // when an audience is configured.
        validation.validate_aud = false;

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Requires the token's `aud` claim to contain `audience`.
    pub fn with_audience(mut self, audience: &str) -> Self {
        self.validation.set_audience(&[audience]);
        self.validation.set_required_spec_claims(&["exp", "sub", "aud"]);
        self.validation.validate_aud = true;
        self
    }

    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding_key, &self.validation).map(|data| data.claims)
    }
}

/// Extracts `<token>` from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.split_whitespace();

    match (parts.next(), parts.next()) {
        (Some(scheme), Some(token)) if scheme.eq_ignore_ascii_case("bearer") => Some(token),
        _ => None,
    }
}

/// Rejects the request before it reaches any handler unless it carries a
/// valid token.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(token) = bearer_token(req.headers()) else {
        warn!("rejected {} {}: no bearer token", req.method(), req.uri().path());
        return Err(AppError::Unauthorized(MISSING_TOKEN));
    };

    let claims = state.verifier.verify(token).map_err(|e| {
        debug!("token verification failed: {}", e);
        warn!("rejected {} {}: invalid token", req.method(), req.uri().path());
        AppError::Unauthorized(INVALID_TOKEN)
    })?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
