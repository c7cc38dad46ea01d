//! `pvz-auth`: authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it knows how to
//! mint and verify tokens, hash passwords and map roles to permissions, but not
//! where users live.

pub mod authorize;
pub mod claims;
pub mod credentials;
pub mod password;
pub mod permissions;
pub mod roles;
pub mod token;

pub use authorize::{authorize, AuthzError, Principal};
pub use claims::{validate_claims, JwtClaims, TokenValidationError};
pub use credentials::{dummy_user_id, validate_credentials, CredentialsError, User};
pub use password::{hash_password, verify_password, PasswordError};
pub use permissions::Permission;
pub use roles::Role;
pub use token::{Hs256Jwt, JwtValidator, TokenIssuer, TOKEN_TTL_HOURS};
