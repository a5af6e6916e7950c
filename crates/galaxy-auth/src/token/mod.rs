//! Refresh-token persistence, rotation and the access-token blacklist.

pub mod cleanup;
pub mod store;

pub use cleanup::TokenCleanup;
pub use store::{BlacklistEntry, TokenPair, TokenStore};
