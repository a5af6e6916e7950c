//! Random password generation.

use argon2::password_hash::rand_core::{OsRng, RngCore};

use galaxy_core::error::AppError;
use galaxy_core::result::AppResult;

use super::validator::PasswordValidator;

/// Draws before giving up on a policy-compliant password.
const MAX_ATTEMPTS: usize = 32;

const CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Generates a password of `length` characters from the OS RNG.
///
/// Bytes that would bias the modulo are discarded.
pub fn generate_password(length: usize) -> String {
    let n = CHARSET.len();
    let limit = 256 - (256 % n);
    let mut out = String::with_capacity(length);
    let mut buf = [0u8; 64];

    while out.len() < length {
        OsRng.fill_bytes(&mut buf);
        for &b in buf.iter() {
            if (b as usize) < limit {
                out.push(CHARSET[b as usize % n] as char);
                if out.len() == length {
                    break;
                }
            }
        }
    }
    out
}

/// Generates a password that the given policy accepts.
///
/// Fails with a validation error when `length` is below the policy minimum
/// or no draw passes within a bounded number of attempts.
pub fn generate_valid_password(validator: &PasswordValidator, length: usize) -> AppResult<String> {
    for _ in 0..MAX_ATTEMPTS {
        let candidate = generate_password(length);
        if validator.validate(&candidate).is_ok() {
            return Ok(candidate);
        }
    }
    Err(AppError::validation(format!(
        "Could not generate a {length}-character password that satisfies the password policy"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_and_charset() {
        let pw = generate_password(24);
        assert_eq!(pw.len(), 24);
        assert!(pw.bytes().all(|b| CHARSET.contains(&b)));
    }

    #[test]
    fn test_not_repeated() {
        assert_ne!(generate_password(16), generate_password(16));
        assert!(generate_password(0).is_empty());
    }

    #[test]
    fn test_generated_password_passes_policy() {
        let validator = PasswordValidator::new(8, true);
        let pw = generate_valid_password(&validator, 20).unwrap();
        assert_eq!(pw.len(), 20);
        assert!(validator.validate(&pw).is_ok());
        assert_ne!(validator.assess(&pw).strength, crate::password::PasswordStrength::Weak);
    }

    #[test]
    fn test_length_below_minimum_fails() {
        let validator = PasswordValidator::new(12, false);
        let err = generate_valid_password(&validator, 6).unwrap_err();
        assert_eq!(err.kind, galaxy_core::ErrorKind::Validation);
    }
}
