//! Staff authentication.
//!
//! Bearer tokens are HS256 JWTs. Each token's `jti` is also recorded in the
//! sessions table, so a token is honoured only while its session row lives:
//!
//! ```text
//! login ──► hash check ──► JwtManager::issue ──► sessions.create(jti)
//!
//! request ──► validate signature/exp ──► sessions.is_active(jti, sub)
//!                                        └── user row still exists
//! ```

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cafe_core::Role;

use crate::error::ApiError;

const ACCESS_TOKEN: &str = "access";

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,

    /// Role at issue time. The stored role is re-read on every request.
    pub role: Role,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID, the session key
    pub jti: String,

    /// Token type
    pub token_type: String,
}

impl Claims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

/// JWT token manager.
#[derive(Clone)]
pub struct JwtManager {
    secret: String,
    lifetime_secs: i64,
}

impl JwtManager {
    pub fn new(secret: String, lifetime_secs: i64) -> Self {
        JwtManager {
            secret,
            lifetime_secs,
        }
    }

    /// Issues an access token. Returns the token and its claims.
    pub fn issue(&self, username: &str, role: Role) -> Result<(String, Claims), ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: username.to_string(),
            role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type: ACCESS_TOKEN.to_string(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::Internal(format!("Failed to generate token: {}", e)))?;

        Ok((token, claims))
    }

    /// Checks signature, expiry and token type.
    pub fn validate(&self, token: &str) -> Result<Claims, ApiError> {
        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            ApiError::Unauthorized
        })?;

        if token_data.claims.token_type != ACCESS_TOKEN {
            return Err(ApiError::Unauthorized);
        }

        Ok(token_data.claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Hashes a password with a fresh salt.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))
}

/// Checks a password against a stored hash. A malformed hash never matches.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret-at-least-16".to_string(), 3600);

        let (token, issued) = manager.issue("ravi", Role::Waiter).unwrap();
        let claims = manager.validate(&token).unwrap();

        assert_eq!(claims.sub, "ravi");
        assert_eq!(claims.role, Role::Waiter);
        assert_eq!(claims.jti, issued.jti);
        assert!(claims.expires_at() > Utc::now());
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let ours = JwtManager::new("test-secret-at-least-16".to_string(), 3600);
        let theirs = JwtManager::new("another-secret-entirely".to_string(), 3600);

        let (token, _) = theirs.issue("ravi", Role::Admin).unwrap();
        assert!(matches!(ours.validate(&token), Err(ApiError::Unauthorized)));
        assert!(matches!(ours.validate("not-a-jwt"), Err(ApiError::Unauthorized)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let manager = JwtManager::new("test-secret-at-least-16".to_string(), -3600);
        let (token, _) = manager.issue("ravi", Role::Waiter).unwrap();
        assert!(manager.validate(&token).is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }

    #[test]
    fn test_password_hashing() {
        let hash = hash_password("chai-time").unwrap();
        assert_ne!(hash, "chai-time");
        assert!(verify_password("chai-time", &hash));
        assert!(!verify_password("coffee-time", &hash));
        assert!(!verify_password("chai-time", "not-a-phc-string"));
    }
}
