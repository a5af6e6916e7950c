//! # galaxy-entity
//!
//! Row models for the Galaxy authentication store. Every struct here maps
//! to a database table row and derives `sqlx::FromRow` so the Postgres
//! repositories can load it directly.

pub mod session;
pub mod token;
pub mod user;
