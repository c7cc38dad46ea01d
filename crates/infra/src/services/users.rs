use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use pvz_auth::{
    dummy_user_id, hash_password, validate_credentials, verify_password, PasswordError, Role, TokenIssuer, User,
};
use pvz_core::UserId;

use super::{AuthError, ServiceError};
use crate::store::{StoreError, StoredUser, UserRepository};

/// Registration, login and token issuance.
pub struct UserService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn TokenIssuer>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>, tokens: Arc<dyn TokenIssuer>) -> Self {
        Self { users, tokens }
    }

    /// Token for the fixed identity of `role`; no credentials involved.
    pub fn dummy_login(&self, role: Role) -> Result<String, ServiceError> {
        self.issue(dummy_user_id(role), role, None)
    }

    #[instrument(skip(self, password), err)]
    pub async fn register(&self, email: &str, password: &str, role: Role) -> Result<User, ServiceError> {
        validate_credentials(email, password)?;

        let user = User {
            id: UserId::new(),
            email: email.to_string(),
            role,
        };
        let password = password.to_string();
        let stored = StoredUser {
            user: user.clone(),
            password_hash: off_runtime(move || hash_password(&password)).await?.map_err(AuthError::from)?,
        };

        self.users.insert_user(&stored).await.map_err(|e| match e {
            StoreError::UniqueViolation(_) => ServiceError::Auth(AuthError::EmailTaken(email.to_string())),
            other => other.into(),
        })?;

        info!(user_id = %user.id, role = %role, "user registered");
        Ok(user)
    }

    #[instrument(skip(self, password), err)]
    pub async fn login(&self, email: &str, password: &str) -> Result<String, ServiceError> {
        validate_credentials(email, password)?;

        let Some(stored) = self.users.find_by_email(email).await? else {
            return Err(AuthError::UnknownEmail(email.to_string()).into());
        };

        let (candidate, hash) = (password.to_string(), stored.password_hash.clone());
        if !off_runtime(move || verify_password(&candidate, &hash)).await? {
            warn!(user_id = %stored.user.id, "login with wrong password");
            return Err(AuthError::WrongPassword.into());
        }

        self.issue(stored.user.id, stored.user.role, Some(&stored.user.email))
    }

    fn issue(&self, user_id: UserId, role: Role, email: Option<&str>) -> Result<String, ServiceError> {
        self.tokens
            .issue(user_id, role, email, Utc::now())
            .map_err(|e| AuthError::Token(e.to_string()).into())
    }
}

/// Argon2 is CPU-bound; run it on the blocking pool.
async fn off_runtime<T, F>(work: F) -> Result<T, AuthError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AuthError::Password(PasswordError::Hash(format!("password task failed: {e}"))))
}
