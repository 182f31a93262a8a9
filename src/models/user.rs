//! User model for storage and API.

use serde::{Deserialize, Serialize};

use crate::db::EntityId;
use crate::error::AppError;

/// How a user proves their identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "auth", rename_all = "snake_case")]
pub enum Credential {
    /// Username + bcrypt hash
    Password {
        username: String,
        password_hash: String,
    },
    /// OIDC subject claim + email
    Oidc { subject: String, email: String },
}

/// User stored in the `users` collection.
///
/// The ID is the document key and is not part of the stored fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(skip)]
    pub id: EntityId,
    #[serde(flatten)]
    pub credential: Credential,
    /// When the user signed up (RFC3339)
    pub created_at: String,
}

impl User {
    /// New password user. The hash must already be computed.
    pub fn with_password(
        username: &str,
        password_hash: String,
        created_at: String,
    ) -> Result<Self, AppError> {
        if username.trim().is_empty() {
            return Err(AppError::Validation("User name cannot be empty!".to_string()));
        }
        if password_hash.is_empty() {
            return Err(AppError::Validation("Password cannot be empty!".to_string()));
        }
        Ok(Self {
            id: 0,
            credential: Credential::Password {
                username: username.to_string(),
                password_hash,
            },
            created_at,
        })
    }

    /// New OIDC user keyed by the provider's subject claim.
    pub fn with_oidc(subject: &str, email: &str, created_at: String) -> Result<Self, AppError> {
        if subject.is_empty() {
            return Err(AppError::Validation("Subject claim cannot be empty!".to_string()));
        }
        Ok(Self {
            id: 0,
            credential: Credential::Oidc {
                subject: subject.to_string(),
                email: email.to_string(),
            },
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{from_fields, to_fields};

    #[test]
    fn password_user_fields_are_flat() {
        let user = User::with_password("alice", "$2b$hash".to_string(), "2024-01-01T00:00:00Z".into())
            .unwrap();
        let fields = to_fields(&user).unwrap();

        assert_eq!(fields["auth"], "password");
        assert_eq!(fields["username"], "alice");
        assert!(!fields.contains_key("id"));

        let decoded: User = from_fields(fields).unwrap();
        assert_eq!(decoded.credential, user.credential);
    }

    #[test]
    fn oidc_user_requires_subject() {
        assert!(User::with_oidc("", "a@example.com", String::new()).is_err());
        let user = User::with_oidc("1234", "a@example.com", String::new()).unwrap();
        assert_eq!(to_fields(&user).unwrap()["subject"], "1234");
    }

    #[test]
    fn empty_username_rejected() {
        let err = User::with_password("  ", "hash".to_string(), String::new()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
