//! Auth handlers: register, login, refresh, logout, verify, revoke-all, password, me.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;

use galaxy_core::error::AppError;

use crate::dto::request::{self, ChangePasswordRequest, LoginRequest, RegisterRequest};
use crate::dto::response::{
    AuthResponse, MessageResponse, RefreshResponse, RevokeAllResponse, UserResponse,
    VerifyResponse,
};
use crate::error::ApiError;
use crate::extractors::{AuthUser, BearerToken, ClientMeta};
use crate::state::AppState;

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    ClientMeta(client): ClientMeta,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), ApiError> {
    request::validate(&req)?;

    let outcome = state
        .sessions
        .register(&req.email, &req.password, req.display_name, client)
        .await?;

    let jar = state.refresh_cookie.set(
        jar,
        outcome.tokens.refresh_token,
        outcome.tokens.refresh_expires_at,
    );
    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            access_token: outcome.tokens.access_token,
            access_expires_at: outcome.tokens.access_expires_at,
            user: UserResponse::from(&outcome.user),
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ClientMeta(client): ClientMeta,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    request::validate(&req)?;

    let outcome = state
        .sessions
        .login(&req.email, &req.password, client)
        .await?;

    let jar = state.refresh_cookie.set(
        jar,
        outcome.tokens.refresh_token,
        outcome.tokens.refresh_expires_at,
    );
    Ok((
        jar,
        Json(AuthResponse {
            access_token: outcome.tokens.access_token,
            access_expires_at: outcome.tokens.access_expires_at,
            user: UserResponse::from(&outcome.user),
        }),
    ))
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<RefreshResponse>), ApiError> {
    let token = state
        .refresh_cookie
        .get(&jar)
        .ok_or_else(|| AppError::missing_token("No refresh token provided"))?;

    let pair = state.sessions.refresh(&token).await?;

    let jar = state
        .refresh_cookie
        .set(jar, pair.refresh_token, pair.refresh_expires_at);
    Ok((
        jar,
        Json(RefreshResponse {
            access_token: pair.access_token,
            access_expires_at: pair.access_expires_at,
        }),
    ))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>), ApiError> {
    let refresh = state.refresh_cookie.get(&jar);
    state.sessions.logout(&token, refresh.as_deref()).await?;

    Ok((
        state.refresh_cookie.clear(jar),
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    ))
}

/// GET /api/auth/verify
///
/// Always answers with a `valid` flag; failures carry the error code.
/// A missing or non-bearer `Authorization` header counts as no token.
pub async fn verify(
    State(state): State<AppState>,
    bearer: Result<BearerToken, ApiError>,
) -> Response {
    let result = match bearer {
        Ok(BearerToken(token)) => state.sessions.verify(&token).await,
        Err(ApiError(err)) => Err(err),
    };

    match result {
        Ok(claims) => Json(VerifyResponse {
            valid: true,
            user_id: Some(claims.sub),
            role: Some(claims.role.to_string()),
            error: None,
            message: None,
        })
        .into_response(),
        Err(err) => {
            let (status, body) = ApiError(err).parts();
            (
                status,
                Json(VerifyResponse {
                    valid: false,
                    user_id: None,
                    role: None,
                    error: Some(body.error),
                    message: Some(body.message),
                }),
            )
                .into_response()
        }
    }
}

/// POST /api/auth/revoke-all
pub async fn revoke_all(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    jar: CookieJar,
) -> Result<(CookieJar, Json<RevokeAllResponse>), ApiError> {
    let revoked = state.sessions.revoke_all(&token).await?;

    Ok((
        state.refresh_cookie.clear(jar),
        Json(RevokeAllResponse {
            message: "All tokens revoked. Please login again.".to_string(),
            revoked,
        }),
    ))
}

/// POST /api/auth/password
pub async fn change_password(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    jar: CookieJar,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<(CookieJar, Json<MessageResponse>), ApiError> {
    request::validate(&req)?;

    state
        .sessions
        .change_password(&token, &req.current_password, &req.new_password)
        .await?;

    Ok((
        state.refresh_cookie.clear(jar),
        Json(MessageResponse {
            message: "Password changed. Please login again.".to_string(),
        }),
    ))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .repositories
        .users
        .find_by_id(auth.claims.sub)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(Json(UserResponse::from(&user)))
}

