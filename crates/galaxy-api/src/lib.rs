//! # galaxy-api
//!
//! HTTP API layer for Galaxy built on Axum.
//!
//! Exposes the authentication endpoints under `/api/auth` and a health
//! probe. Access tokens travel in response bodies and `Authorization`
//! headers; refresh tokens travel only in an HTTP-only cookie.

pub mod app;
pub mod cookie;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, build_state};
pub use error::ApiError;
pub use state::AppState;
