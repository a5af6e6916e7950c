//! Session lifecycle: register, login, refresh, logout, revoke-all.

pub mod manager;

pub use manager::{AuthOutcome, ClientInfo, SessionManager};
