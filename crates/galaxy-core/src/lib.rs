//! # galaxy-core
//!
//! Core crate for the Galaxy backend. Contains the unified error system,
//! configuration schemas, and the expiring-store trait shared by the
//! cache backends.
//!
//! This crate has **no** internal dependencies on other Galaxy crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
