//! Password hashing, policy enforcement and generation.

pub mod generator;
pub mod hasher;
pub mod validator;

pub use generator::{generate_password, generate_valid_password};
pub use hasher::{Credential, PasswordCredential};
pub use validator::{PasswordStrength, PasswordValidator, StrengthChecks, StrengthReport};
