//! Password policy enforcement and strength reporting.

use serde::Serialize;

use galaxy_core::config::AuthConfig;
use galaxy_core::error::AppError;

/// Passwords rejected outright when strength enforcement is on.
const COMMON_PASSWORDS: &[&str] = &[
    "password", "123456", "12345678", "qwerty", "abc123", "monkey", "1234567", "letmein",
    "trustno1", "dragon", "baseball", "iloveyou", "master", "sunshine", "ashley", "bailey",
    "passw0rd", "shadow", "123123", "654321",
];

const SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{};':\"\\|,.<>?";

/// Character classes a password must mix when enforcement is on (3 of 4).
const REQUIRED_CLASSES: usize = 3;

/// Individual strength checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StrengthChecks {
    /// At least the configured minimum length.
    pub min_length: bool,
    /// Contains an uppercase letter.
    pub has_upper_case: bool,
    /// Contains a lowercase letter.
    pub has_lower_case: bool,
    /// Contains a digit.
    pub has_numbers: bool,
    /// Contains a special character.
    pub has_special_char: bool,
    /// Not on the common-password list.
    pub not_common: bool,
}

impl StrengthChecks {
    fn passed(&self) -> u8 {
        [
            self.min_length,
            self.has_upper_case,
            self.has_lower_case,
            self.has_numbers,
            self.has_special_char,
            self.not_common,
        ]
        .into_iter()
        .filter(|c| *c)
        .count() as u8
    }

    fn classes(&self) -> usize {
        [
            self.has_upper_case,
            self.has_lower_case,
            self.has_numbers,
            self.has_special_char,
        ]
        .into_iter()
        .filter(|c| *c)
        .count()
    }
}

/// Coarse strength label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordStrength {
    /// Two or fewer checks pass.
    Weak,
    /// Three or four checks pass.
    Medium,
    /// Five or six checks pass.
    Strong,
}

/// Result of [`PasswordValidator::assess`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StrengthReport {
    /// Number of passing checks (0..=6).
    pub score: u8,
    /// Label derived from the score.
    pub strength: PasswordStrength,
    /// The individual checks.
    pub checks: StrengthChecks,
}

/// Validates password strength against configured policies.
#[derive(Debug, Clone)]
pub struct PasswordValidator {
    min_length: usize,
    enforce_strength: bool,
}

impl PasswordValidator {
    /// Creates a validator with an explicit policy.
    pub fn new(min_length: usize, enforce_strength: bool) -> Self {
        Self {
            min_length,
            enforce_strength,
        }
    }

    /// Creates a new validator from auth configuration.
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.password_min_length, config.enforce_password_strength)
    }

    /// Validates a password for use as a new credential.
    ///
    /// The minimum length always applies. With enforcement on, the password
    /// must also avoid the common list, mix three character classes, and
    /// reach a zxcvbn score of at least two.
    pub fn validate(&self, password: &str) -> Result<(), AppError> {
        if password.chars().count() < self.min_length {
            return Err(self.rejection(
                password,
                format!(
                    "Password must be at least {} characters long",
                    self.min_length
                ),
            ));
        }

        if !self.enforce_strength {
            return Ok(());
        }

        let checks = self.checks(password);
        if !checks.not_common {
            return Err(self.rejection(
                password,
                "Password is too common. Please choose a different one.",
            ));
        }

        if checks.classes() < REQUIRED_CLASSES {
            return Err(self.rejection(
                password,
                "Password must mix at least three of: uppercase, lowercase, digits, special characters",
            ));
        }

        let estimate = zxcvbn::zxcvbn(password, &[]);
        if estimate.score() < zxcvbn::Score::Two {
            return Err(self.rejection(
                password,
                "Password is too guessable. Please use a stronger password.",
            ));
        }

        Ok(())
    }

    /// Reports the six strength checks without rejecting anything.
    pub fn assess(&self, password: &str) -> StrengthReport {
        let checks = self.checks(password);
        let score = checks.passed();
        let strength = match score {
            0..=2 => PasswordStrength::Weak,
            3..=4 => PasswordStrength::Medium,
            _ => PasswordStrength::Strong,
        };
        StrengthReport {
            score,
            strength,
            checks,
        }
    }

    /// A weak-password error carrying the strength report as details.
    fn rejection(&self, password: &str, message: impl Into<String>) -> AppError {
        let err = AppError::weak_password(message);
        match serde_json::to_value(self.assess(password)) {
            Ok(report) => err.with_details(report),
            Err(_) => err,
        }
    }

    /// Case-insensitive membership in the common-password list.
    pub fn is_common(password: &str) -> bool {
        let lowered = password.to_lowercase();
        COMMON_PASSWORDS.contains(&lowered.as_str())
    }

    fn checks(&self, password: &str) -> StrengthChecks {
        StrengthChecks {
            min_length: password.chars().count() >= self.min_length,
            has_upper_case: password.chars().any(|c| c.is_ascii_uppercase()),
            has_lower_case: password.chars().any(|c| c.is_ascii_lowercase()),
            has_numbers: password.chars().any(|c| c.is_ascii_digit()),
            has_special_char: password.chars().any(|c| SPECIAL_CHARS.contains(c)),
            not_common: !Self::is_common(password),
        }
    }
}
