//! Account payloads exchanged with the gateway

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationErrors;
use crate::models::session::AccountType;
use crate::validation::{validate_email, validate_password};

/// Registration request
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Registration response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Login credentials
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response. Everything except the token is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub profile_completed: Option<bool>,
    #[serde(default, deserialize_with = "lenient_account_type")]
    pub user_type: Option<AccountType>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Third-party credential exchange request
#[derive(Debug, Clone, Serialize)]
pub struct GoogleLoginRequest {
    pub credential: String,
}

/// Third-party credential exchange response
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleLoginResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<GoogleAccount>,
    #[serde(default)]
    pub registered: Option<bool>,
}

/// Account details returned alongside a third-party sign-in
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleAccount {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub profile_completed: Option<bool>,
    #[serde(default, deserialize_with = "lenient_account_type")]
    pub user_type: Option<AccountType>,
}

/// Unknown account type strings are ignored rather than failing the response
fn lenient_account_type<'de, D>(deserializer: D) -> Result<Option<AccountType>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

/// Quick sign-up form
#[derive(Debug, Clone, Default)]
pub struct SignUpForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

impl SignUpForm {
    /// Field-level checks run before any network call
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();

        if self.name.trim().is_empty() {
            errors.add("name", "Please enter your name");
        }
        if !validate_email(self.email.trim()) {
            errors.add("email", "Please enter a valid email");
        }
        if !validate_password(&self.password) {
            errors.add(
                "password",
                "Password must have at least 8 characters, with letters and numbers",
            );
        } else if self.password != self.password_confirmation {
            errors.add("passwordConfirmation", "Passwords do not match");
        }

        errors
    }

    pub fn to_request(&self) -> RegisterRequest {
        RegisterRequest {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        }
    }
}
