//! Session token generation and validation

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use plangate_shared::SessionUser;

/// Claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: Uuid,
    /// Email; billing actions require it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Issued at
    pub iat: i64,
    /// Expiration
    pub exp: i64,
}

impl From<Claims> for SessionUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            name: claims.name,
        }
    }
}

/// JWT manager for session token operations
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_hours: i64,
}

impl JwtManager {
    /// Create a new JWT manager
    pub fn new(secret: &str, expiry_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry_hours,
        }
    }

    /// Issue a session token for a user
    pub fn generate_token(&self, user: &SessionUser) -> Result<String, jsonwebtoken::errors::Error> {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            iat: now.unix_timestamp(),
            exp: (now + Duration::hours(self.expiry_hours)).unix_timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
    }

    /// Validate a session token and return its claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let validation = Validation::new(Algorithm::HS256);
        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-chars!";

    #[test]
    fn test_token_generation_and_validation() {
        let jwt = JwtManager::new(SECRET, 24);
        let user = SessionUser::new(Uuid::new_v4(), "test@example.com");

        let token = jwt.generate_token(&user).expect("Failed to generate token");
        let claims = jwt.validate_token(&token).expect("Invalid token");

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email.as_deref(), Some("test@example.com"));
        assert!(claims.exp > claims.iat);
        assert_eq!(SessionUser::from(claims), user);
    }

    #[test]
    fn test_token_without_email_still_validates() {
        let jwt = JwtManager::new(SECRET, 24);
        let mut user = SessionUser::new(Uuid::new_v4(), "x@example.com");
        user.email = None;

        let token = jwt.generate_token(&user).unwrap();
        let claims = jwt.validate_token(&token).unwrap();
        assert!(claims.email.is_none());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = JwtManager::new(SECRET, 24);
        let verifier = JwtManager::new("another-secret-key-at-least-32-chars", 24);
        let token = issuer
            .generate_token(&SessionUser::new(Uuid::new_v4(), "a@example.com"))
            .unwrap();

        assert!(verifier.validate_token(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        // Past the default 60s leeway
        let jwt = JwtManager::new(SECRET, -1);
        let token = jwt
            .generate_token(&SessionUser::new(Uuid::new_v4(), "a@example.com"))
            .unwrap();

        assert!(jwt.validate_token(&token).is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        let jwt = JwtManager::new(SECRET, 24);
        assert!(jwt.validate_token("not.a.jwt").is_err());
        assert!(jwt.validate_token("").is_err());
    }
}
