use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use pvz_core::UserId;

use crate::Role;

/// A registered user as exposed outside the credential store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialsError {
    #[error("email is empty")]
    EmptyEmail,

    #[error("password is empty")]
    EmptyPassword,

    #[error("password must differ from email")]
    PasswordEqualsEmail,
}

pub fn validate_credentials(email: &str, password: &str) -> Result<(), CredentialsError> {
    if email.trim().is_empty() {
        return Err(CredentialsError::EmptyEmail);
    }
    if password.is_empty() {
        return Err(CredentialsError::EmptyPassword);
    }
    if email == password {
        return Err(CredentialsError::PasswordEqualsEmail);
    }
    Ok(())
}

/// Fixed identity used by dummy login for each role.
pub fn dummy_user_id(role: Role) -> UserId {
    match role {
        Role::Moderator => UserId::from_uuid(Uuid::from_u128(0x11111111_1111_1111_1111_111111111111)),
        Role::Employee => UserId::from_uuid(Uuid::from_u128(0x22222222_2222_2222_2222_222222222222)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rejects_degenerate_credentials() {
        assert_eq!(validate_credentials("", "pw"), Err(CredentialsError::EmptyEmail));
        assert_eq!(validate_credentials("a@b.c", ""), Err(CredentialsError::EmptyPassword));
        assert_eq!(validate_credentials("a@b.c", "a@b.c"), Err(CredentialsError::PasswordEqualsEmail));
    }

    #[test]
    fn dummy_ids_are_stable() {
        assert_eq!(
            dummy_user_id(Role::Moderator).to_string(),
            "11111111-1111-1111-1111-111111111111"
        );
        assert_eq!(
            dummy_user_id(Role::Employee).to_string(),
            "22222222-2222-2222-2222-222222222222"
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            ..ProptestConfig::default()
        })]

        #[test]
        fn distinct_non_empty_credentials_are_accepted(
            email in "[a-z]{1,12}@[a-z]{1,8}\\.ru",
            password in "[A-Za-z0-9]{1,16}",
        ) {
            prop_assert_eq!(validate_credentials(&email, &password), Ok(()));
        }
    }
}
