use pvz_auth::{Principal, Role};
use pvz_core::UserId;

/// Principal context for a request (authenticated identity + role).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
    email: Option<String>,
}

impl PrincipalContext {
    pub fn new(principal: Principal, email: Option<String>) -> Self {
        Self { principal, email }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn user_id(&self) -> UserId {
        self.principal.user_id
    }

    pub fn role(&self) -> Role {
        self.principal.role
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}
