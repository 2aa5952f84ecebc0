//! Request DTOs with validation.
//!
//! Field names are snake_case; camelCase spellings are accepted as aliases.

use serde::{Deserialize, Serialize};
use validator::Validate;

use passage_auth::{LoginInput, RegisterInput};

/// Registration request body.
///
/// Only presence is checked here; email format, username policy, and
/// password strength are enforced by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address.
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    /// Desired username.
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    /// Plaintext password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    /// Given name.
    #[serde(default, alias = "firstName")]
    #[validate(length(max = 100, message = "First name is too long"))]
    pub first_name: String,
    /// Family name.
    #[serde(default, alias = "lastName")]
    #[validate(length(max = 100, message = "Last name is too long"))]
    pub last_name: String,
}

impl RegisterRequest {
    /// Convert into orchestrator input, attaching the client replay key.
    pub fn into_input(self, idempotency_key: Option<String>) -> RegisterInput {
        RegisterInput {
            email: self.email,
            username: self.username,
            password: self.password,
            first_name: self.first_name,
            last_name: self.last_name,
            idempotency_key,
        }
    }
}

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email or username.
    #[serde(alias = "emailOrUsername", alias = "identifier")]
    #[validate(length(min = 1, message = "Email or username is required"))]
    pub email_or_username: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl From<LoginRequest> for LoginInput {
    fn from(req: LoginRequest) -> Self {
        Self {
            identifier: req.email_or_username,
            password: req.password,
        }
    }
}

/// Body of refresh, logout, and logout-all. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefreshTokenBody {
    /// Refresh credential.
    #[serde(default, alias = "refreshToken")]
    pub refresh_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_case_aliases() {
        let req: LoginRequest =
            serde_json::from_str(r#"{"emailOrUsername":"omar","password":"x"}"#).unwrap();
        assert_eq!(req.email_or_username, "omar");

        let body: RefreshTokenBody = serde_json::from_str(r#"{"refreshToken":"t"}"#).unwrap();
        assert_eq!(body.refresh_token.as_deref(), Some("t"));
    }

    #[test]
    fn test_register_names_default_to_empty() {
        let req: RegisterRequest =
            serde_json::from_str(r#"{"email":"a@x.com","username":"alice","password":"p"}"#)
                .unwrap();
        assert!(req.first_name.is_empty());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_empty_login_fields_fail_validation() {
        let req = LoginRequest {
            email_or_username: String::new(),
            password: String::new(),
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email_or_username"));
        assert!(errors.field_errors().contains_key("password"));
    }
}
