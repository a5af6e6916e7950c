//! PostgreSQL repository implementations.

pub mod session;
pub mod token;
pub mod user;

pub use session::PgSessionRepository;
pub use token::PgRefreshTokenRepository;
pub use user::PgUserRepository;
