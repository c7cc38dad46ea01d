//! API-side authorization guard.
//!
//! Handlers check the permission here before calling a service; services
//! trust the actor id they are given.

use pvz_auth::{authorize, AuthzError, Permission};

use crate::context::PrincipalContext;

pub fn authorize_request(principal: &PrincipalContext, permission: &Permission) -> Result<(), AuthzError> {
    authorize(principal.principal(), permission)
}

#[cfg(test)]
mod tests {
    use pvz_auth::{Principal, Role};
    use pvz_core::UserId;

    use super::*;

    fn ctx(role: Role) -> PrincipalContext {
        PrincipalContext::new(Principal { user_id: UserId::new(), role }, None)
    }

    #[test]
    fn employee_cannot_create_pickup_points() {
        assert!(authorize_request(&ctx(Role::Employee), &Permission::PICKUP_POINTS_CREATE).is_err());
        assert!(authorize_request(&ctx(Role::Moderator), &Permission::PICKUP_POINTS_CREATE).is_ok());
    }

    #[test]
    fn moderator_cannot_touch_receptions() {
        assert!(authorize_request(&ctx(Role::Moderator), &Permission::RECEPTIONS_OPEN).is_err());
        assert!(authorize_request(&ctx(Role::Employee), &Permission::RECEPTIONS_OPEN).is_ok());
    }
}
