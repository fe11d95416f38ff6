//! Session model and authentication state

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::jwt::Claims;

/// Kind of donor record created by profile completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Residential,
    Business,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Residential => "residential",
            AccountType::Business => "business",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "residential" | "residence" => Ok(AccountType::Residential),
            "business" | "company" => Ok(AccountType::Business),
            other => Err(format!("unknown account type: {}", other)),
        }
    }
}

/// The signed-in user as cached by the portal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    #[serde(default)]
    pub account_type: Option<AccountType>,
    #[serde(default)]
    pub profile_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_code: Option<String>,
}

impl Session {
    /// Minimal session rebuilt from token claims alone.
    ///
    /// Claims are unverified, so the result never has a completed profile.
    pub fn from_claims(claims: &Claims) -> Option<Self> {
        Some(Session {
            user_id: claims.subject()?,
            email: claims.email().unwrap_or_default(),
            display_name: claims.display_name().unwrap_or_default(),
            account_type: None,
            profile_completed: false,
            user_code: None,
        })
    }

    /// A completed profile always carries an account type
    pub fn is_consistent(&self) -> bool {
        !self.profile_completed || self.account_type.is_some()
    }
}

/// Authentication state published by the session store
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    /// Persisted state not read yet
    #[default]
    Loading,
    Unauthenticated,
    Authenticated(Session),
}

impl AuthState {
    pub fn is_loading(&self) -> bool {
        matches!(self, AuthState::Loading)
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthState::Authenticated(session) => Some(session),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session() -> Session {
        Session {
            user_id: "u1".to_string(),
            email: "ana@renovar.org".to_string(),
            display_name: "Ana Souza".to_string(),
            account_type: Some(AccountType::Residential),
            profile_completed: true,
            user_code: Some("42".to_string()),
        }
    }

    #[test]
    fn test_session_serializes_camel_case() {
        let value = serde_json::to_value(session()).unwrap();
        assert_eq!(
            value,
            json!({
                "userId": "u1",
                "email": "ana@renovar.org",
                "displayName": "Ana Souza",
                "accountType": "residential",
                "profileCompleted": true,
                "userCode": "42"
            })
        );
    }

    #[test]
    fn test_minimal_record_deserializes_with_defaults() {
        let parsed: Session = serde_json::from_value(json!({
            "userId": "u1",
            "email": "ana@renovar.org",
            "displayName": "",
            "accountType": null
        }))
        .unwrap();

        assert_eq!(parsed.account_type, None);
        assert!(!parsed.profile_completed);
        assert_eq!(parsed.user_code, None);
        assert!(parsed.is_consistent());
    }

    #[test]
    fn test_completed_profile_without_type_is_inconsistent() {
        let mut broken = session();
        broken.account_type = None;
        assert!(!broken.is_consistent());
    }

    #[test]
    fn test_account_type_parsing() {
        assert_eq!("Residential".parse::<AccountType>(), Ok(AccountType::Residential));
        assert_eq!("BUSINESS".parse::<AccountType>(), Ok(AccountType::Business));
        assert!("other".parse::<AccountType>().is_err());
    }

    #[test]
    fn test_auth_state_accessors() {
        assert!(AuthState::default().is_loading());
        assert_eq!(AuthState::Unauthenticated.session(), None);
        assert_eq!(
            AuthState::Authenticated(session()).session().map(|s| s.user_id.as_str()),
            Some("u1")
        );
    }
}
