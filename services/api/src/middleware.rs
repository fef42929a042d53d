//! Session guard middleware
//!
//! Verifies the identity provider's session token on protected routes and
//! makes the caller identity available to handlers through request
//! extensions.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, Cookie, authorization::Bearer},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tracing::warn;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Cookie carrying the session token for browser requests
pub const SESSION_COOKIE: &str = "__session";

/// Verified identity of the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity(String);

impl CallerIdentity {
    /// Wrap a user id, rejecting empty ones
    pub fn new(user_id: impl Into<String>) -> Option<Self> {
        let user_id = user_id.into();
        if user_id.is_empty() {
            None
        } else {
            Some(Self(user_id))
        }
    }

    pub fn user_id(&self) -> &str {
        &self.0
    }
}

/// Turns a session token into a caller identity
#[cfg_attr(test, mockall::automock)]
pub trait IdentityVerifier: Send + Sync {
    fn verify(&self, token: &str) -> ApiResult<CallerIdentity>;
}

/// Session token claims
#[derive(Debug, Deserialize)]
struct SessionClaims {
    /// User ID
    sub: String,
}

/// Verifies RS256 session tokens against the identity provider's public key
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// Create a verifier from a PEM encoded RSA public key
    pub fn from_rsa_pem(public_key: &str) -> anyhow::Result<Self> {
        let decoding_key = DecodingKey::from_rsa_pem(public_key.as_bytes())
            .map_err(|e| anyhow::anyhow!("Failed to create decoding key: {}", e))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;
        validation.validate_aud = false;

        Ok(Self {
            decoding_key,
            validation,
        })
    }
}

impl IdentityVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> ApiResult<CallerIdentity> {
        let token_data =
            jsonwebtoken::decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
                .map_err(|e| {
                    warn!("Failed to validate session token: {}", e);
                    ApiError::Unauthorized
                })?;

        CallerIdentity::new(token_data.claims.sub).ok_or(ApiError::Unauthorized)
    }
}

/// Reject requests without a valid session
///
/// The token is taken from a `Bearer` authorization header, falling back to
/// the session cookie.
pub async fn session_guard(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    cookies: Option<TypedHeader<Cookie>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer
        .as_ref()
        .map(|TypedHeader(auth)| auth.token())
        .or_else(|| {
            cookies
                .as_ref()
                .and_then(|TypedHeader(cookies)| cookies.get(SESSION_COOKIE))
        })
        .filter(|token| !token.is_empty())
        .ok_or(ApiError::Unauthorized)?;

    let caller = state.identity_verifier.verify(token)?;

    req.extensions_mut().insert(caller);

    Ok(next.run(req).await)
}
