//! HS256 token minting and verification.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use pvz_core::UserId;

use crate::{validate_claims, JwtClaims, Role, TokenValidationError};

/// Lifetime of issued tokens.
pub const TOKEN_TTL_HOURS: i64 = 24;

/// Verifies a bearer token and returns its claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError>;
}

/// Mints bearer tokens for authenticated users.
pub trait TokenIssuer: Send + Sync {
    fn issue(
        &self,
        user_id: UserId,
        role: Role,
        email: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<String, jsonwebtoken::errors::Error>;
}

/// Symmetric HS256 implementation of both token traits.
#[derive(Clone)]
pub struct Hs256Jwt {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Hs256Jwt {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

impl TokenIssuer for Hs256Jwt {
    fn issue(
        &self,
        user_id: UserId,
        role: Role,
        email: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = JwtClaims {
            sub: user_id,
            email: email.map(str::to_string),
            role,
            iat: now.timestamp(),
            exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }
}

impl JwtValidator for Hs256Jwt {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError> {
        // Time checks run against the caller's clock in `validate_claims`.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.decoding, &validation)
            .map_err(|e| TokenValidationError::Malformed(e.to_string()))?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_validates_with_same_secret() {
        let jwt = Hs256Jwt::new("secret");
        let user = UserId::new();
        let now = Utc::now();

        let token = jwt.issue(user, Role::Moderator, Some("a@b.c"), now).unwrap();
        let claims = jwt.validate(&token, now).unwrap();

        assert_eq!(claims.sub, user);
        assert_eq!(claims.role, Role::Moderator);
        assert_eq!(claims.email.as_deref(), Some("a@b.c"));
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_HOURS * 3600);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let now = Utc::now();
        let token = Hs256Jwt::new("one").issue(UserId::new(), Role::Employee, None, now).unwrap();

        let err = Hs256Jwt::new("two").validate(&token, now).unwrap_err();
        assert!(matches!(err, TokenValidationError::Malformed(_)));
    }

    #[test]
    fn token_expires_after_ttl() {
        let jwt = Hs256Jwt::new("secret");
        let issued = Utc::now();
        let token = jwt.issue(UserId::new(), Role::Employee, None, issued).unwrap();

        let later = issued + Duration::hours(TOKEN_TTL_HOURS) + Duration::seconds(1);
        assert_eq!(jwt.validate(&token, later), Err(TokenValidationError::Expired));
    }
}
