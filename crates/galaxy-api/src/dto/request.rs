//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use galaxy_core::error::AppError;

/// Registration request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// Password. Strength is checked by the credential policy.
    #[validate(length(min = 1, max = 1024, message = "Password is required"))]
    pub password: String,
    /// Display name.
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    #[serde(default, alias = "name")]
    pub display_name: Option<String>,
}

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address.
    #[validate(length(min = 1, message = "Email and password required"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, max = 1024, message = "Email and password required"))]
    pub password: String,
}

/// Password change request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    /// Current password.
    #[validate(length(min = 1, max = 1024))]
    pub current_password: String,
    /// New password.
    #[validate(length(min = 1, max = 1024))]
    pub new_password: String,
}

/// Runs `validator` rules and maps failures to a validation error.
pub fn validate<T: Validate>(request: &T) -> Result<(), AppError> {
    request
        .validate()
        .map_err(|e| AppError::validation(format!("Invalid request: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_validation() {
        let ok = RegisterRequest {
            email: "a@x.com".into(),
            password: "Str0ng!Pass".into(),
            display_name: None,
        };
        assert!(validate(&ok).is_ok());

        let bad = RegisterRequest {
            email: "nope".into(),
            ..ok
        };
        assert!(validate(&bad).is_err());
    }

    #[test]
    fn test_name_alias() {
        let req: RegisterRequest =
            serde_json::from_str(r#"{"email":"a@x.com","password":"p","name":"Ann"}"#).unwrap();
        assert_eq!(req.display_name.as_deref(), Some("Ann"));
    }
}
