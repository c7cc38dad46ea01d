use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::Role;

/// Permission identifier.
///
/// Permissions are modeled as opaque strings (e.g. "receptions.open").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const PICKUP_POINTS_CREATE: Permission = Permission::from_static("pickup_points.create");
    pub const PICKUP_POINTS_READ: Permission = Permission::from_static("pickup_points.read");
    pub const RECEPTIONS_OPEN: Permission = Permission::from_static("receptions.open");
    pub const RECEPTIONS_CLOSE: Permission = Permission::from_static("receptions.close");
    pub const PRODUCTS_ADD: Permission = Permission::from_static("products.add");
    pub const PRODUCTS_REMOVE: Permission = Permission::from_static("products.remove");

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Permissions granted by a role.
    pub fn granted_to(role: Role) -> &'static [Permission] {
        const MODERATOR: &[Permission] = &[Permission::PICKUP_POINTS_CREATE, Permission::PICKUP_POINTS_READ];
        const EMPLOYEE: &[Permission] = &[
            Permission::PICKUP_POINTS_READ,
            Permission::RECEPTIONS_OPEN,
            Permission::RECEPTIONS_CLOSE,
            Permission::PRODUCTS_ADD,
            Permission::PRODUCTS_REMOVE,
        ];

        match role {
            Role::Moderator => MODERATOR,
            Role::Employee => EMPLOYEE,
        }
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
