//! JWT Token Handler
//! Mission: Issue and verify HS256 access tokens carrying username, role and expiry

use crate::auth::models::{Claims, User, UserRole};
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use tracing::debug;

/// Why a token was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Bad signature, malformed token or unknown role claim
    Invalid,
    /// `exp` is not in the future
    Expired,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Invalid => write!(f, "Invalid token"),
            TokenError::Expired => write!(f, "Token has expired"),
        }
    }
}

impl std::error::Error for TokenError {}

/// A freshly minted token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: i64, // seconds until expiration
}

/// JWT Handler for token operations
pub struct JwtHandler {
    secret: String,
    default_ttl: Duration,
}

impl JwtHandler {
    /// Create a new JWT handler with secret key and default token lifetime
    pub fn new(secret: String, default_ttl: Duration) -> Self {
        Self {
            secret,
            default_ttl,
        }
    }

    /// Sign a claim set for `subject` expiring `ttl` from now
    pub fn issue(&self, subject: &str, role: UserRole, ttl: Duration) -> Result<IssuedToken> {
        let expiration = Utc::now()
            .checked_add_signed(ttl)
            .context("Invalid timestamp")?
            .timestamp();

        let claims = Claims {
            sub: subject.to_string(),
            role,
            exp: expiration,
        };

        debug!(
            "Generating JWT for {} ({}), expires in {}s",
            subject,
            role,
            ttl.num_seconds()
        );

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .context("Failed to generate JWT")?;

        Ok(IssuedToken {
            token,
            expires_in: ttl.num_seconds(),
        })
    }

    /// Issue a token for a user with the configured lifetime
    pub fn issue_for(&self, user: &User) -> Result<IssuedToken> {
        self.issue(&user.username, user.role, self.default_ttl)
    }

    /// Validate signature and expiry, then extract the claims
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })?;

        // The library accepts exp == now; a token is only valid strictly before its expiry.
        if decoded.claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }

        debug!("Validated JWT for user {}", decoded.claims.sub);

        Ok(decoded.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    fn handler(secret: &str) -> JwtHandler {
        JwtHandler::new(secret.to_string(), Duration::minutes(30))
    }

    fn create_test_user() -> User {
        User {
            id: 7,
            username: "testuser".to_string(),
            email: "testuser@example.com".to_string(),
            first_name: None,
            last_name: None,
            password_hash: "hash".to_string(),
            role: UserRole::Teacher,
            created_at: Utc::now().to_rfc3339(),
            updated_at: Utc::now().to_rfc3339(),
        }
    }

    #[test]
    fn test_jwt_generation_and_validation() {
        let handler = handler("test-secret-key-12345");
        let user = create_test_user();

        let issued = handler.issue_for(&user).unwrap();
        assert!(!issued.token.is_empty());
        assert_eq!(issued.expires_in, 30 * 60);

        let claims = handler.verify(&issued.token).unwrap();
        assert_eq!(claims.sub, user.username);
        assert_eq!(claims.role, user.role);
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_invalid_token_rejected() {
        let handler = handler("test-secret-key-12345");
        assert_eq!(handler.verify("invalid.token.here"), Err(TokenError::Invalid));
        assert_eq!(handler.verify(""), Err(TokenError::Invalid));
    }

    #[test]
    fn test_different_secrets_reject() {
        let handler1 = handler("secret1");
        let handler2 = handler("secret2");

        for role in [UserRole::Admin, UserRole::Teacher, UserRole::Student] {
            let issued = handler1.issue("anyone", role, Duration::hours(1)).unwrap();
            assert_eq!(handler2.verify(&issued.token), Err(TokenError::Invalid));
        }
    }

    #[test]
    fn test_zero_ttl_rejected_immediately() {
        let handler = handler("test-secret-key-12345");
        let issued = handler
            .issue("alice", UserRole::Student, Duration::zero())
            .unwrap();
        assert_eq!(handler.verify(&issued.token), Err(TokenError::Expired));
    }

    #[test]
    fn test_past_expiry_rejected() {
        let handler = handler("test-secret-key-12345");
        let issued = handler
            .issue("alice", UserRole::Student, Duration::minutes(-5))
            .unwrap();
        assert_eq!(handler.verify(&issued.token), Err(TokenError::Expired));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let handler = handler("test-secret-key-12345");
        let issued = handler
            .issue("alice", UserRole::Student, Duration::hours(1))
            .unwrap();

        // Swap the payload for one claiming admin, keeping the original signature.
        let parts: Vec<&str> = issued.token.split('.').collect();
        let forged_payload = URL_SAFE_NO_PAD.encode(format!(
            r#"{{"sub":"alice","role":"admin","exp":{}}}"#,
            Utc::now().timestamp() + 3600
        ));
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert_eq!(handler.verify(&forged), Err(TokenError::Invalid));
    }

    #[test]
    fn test_unknown_role_claim_rejected() {
        // Correctly signed, but the role is outside the enumerated set.
        let secret = "test-secret-key-12345";
        let token = encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({
                "sub": "mallory",
                "role": "superuser",
                "exp": Utc::now().timestamp() + 3600,
            }),
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();

        assert_eq!(handler(secret).verify(&token), Err(TokenError::Invalid));
    }
}
