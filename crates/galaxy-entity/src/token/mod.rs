//! Persisted refresh-token rows.

pub mod model;

pub use model::RefreshTokenRecord;
