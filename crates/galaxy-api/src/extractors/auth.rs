//! Bearer-token extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;

use galaxy_auth::AccessClaims;
use galaxy_core::error::AppError;

use crate::error::ApiError;
use crate::state::AppState;

/// The raw access token from `Authorization: Bearer <token>`.
///
/// Rejects with `NO_AUTH_TOKEN` when the header is missing or not a bearer
/// credential. Performs no verification.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::missing_token("No authentication token provided"))?;
        Ok(Self(bearer.token().to_string()))
    }
}

/// The verified claims of the presented access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Verified claims.
    pub claims: AccessClaims,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let claims = state.sessions.verify(&token).await?;
        Ok(Self { claims })
    }
}
