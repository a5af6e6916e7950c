//! # galaxy-database
//!
//! PostgreSQL connection management and the repositories backing the
//! token lifecycle: users, refresh-token rows, and session audit rows.
//! Each repository has a Postgres implementation and an in-memory one
//! with the same atomicity guarantees.

pub mod connection;
pub mod migration;
pub mod provider;
pub mod repositories;

pub use connection::DatabasePool;
pub use provider::Repositories;
pub use repositories::{
    FailedLogin, RefreshTokenRepository, SessionRepository, UserRepository,
};
