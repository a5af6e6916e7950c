//! # galaxy-auth
//!
//! Token lifecycle management for Galaxy.
//!
//! ## Modules
//!
//! - `password`: salted Argon2id credentials and password policy
//! - `jwt`: signing secrets, access/refresh issuance and decoding
//! - `token`: refresh-token persistence, rotation, access-token blacklist
//! - `session`: register, login, refresh, logout and revoke-all flows

pub mod jwt;
pub mod password;
pub mod session;
pub mod token;

pub use jwt::{AccessClaims, JwtDecoder, RefreshClaims, SigningSecrets, TokenIssuer};
pub use password::{
    Credential, PasswordCredential, PasswordValidator, StrengthReport, generate_password,
    generate_valid_password,
};
pub use session::{AuthOutcome, ClientInfo, SessionManager};
pub use token::{TokenCleanup, TokenPair, TokenStore};
