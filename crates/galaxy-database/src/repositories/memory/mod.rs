//! In-process repository implementations.
//!
//! Used by tests and by development runs with `database.provider = "memory"`.
//! State lives in `DashMap`s; every compound update happens under a single
//! shard guard so the atomicity matches the Postgres backends.

pub mod session;
pub mod token;
pub mod user;

pub use session::MemorySessionRepository;
pub use token::MemoryRefreshTokenRepository;
pub use user::MemoryUserRepository;
