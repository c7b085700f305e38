//! Signed, time-limited bearer tokens (HS256 JWT).

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::domain::{AuthenticatedUser, User, UserId};
use crate::config::AuthConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0:?}")]
    Invalid(ErrorKind),
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Issues and verifies bearer tokens with one shared secret.
///
/// Keys are built once; clones share them.
#[derive(Clone)]
pub struct TokenAuthority {
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Validation,
    ttl: Duration,
}

impl TokenAuthority {
    pub fn new(secret: &SecretString, ttl: Duration) -> Self {
        let secret = secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: Arc::new(EncodingKey::from_secret(secret)),
            decoding_key: Arc::new(DecodingKey::from_secret(secret)),
            validation,
            ttl,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.jwt_secret, config.token_ttl())
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user: &User, issued_at: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            sub: user.id.0.clone(),
            email: user.email.clone(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| TokenError::Signing(err.to_string()))
    }

    /// Checks signature and expiry against the wall clock.
    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|err| {
            match err.into_kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                kind => TokenError::Invalid(kind),
            }
        })?;

        Ok(AuthenticatedUser {
            id: UserId(data.claims.sub),
            email: data.claims.email,
        })
    }
}

impl std::fmt::Debug for TokenAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuthority")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authority(secret: &str) -> TokenAuthority {
        TokenAuthority::new(&SecretString::from(secret), Duration::hours(1))
    }

    fn user() -> User {
        User {
            id: UserId("4b7d9f0e-2d0a-4c8e-9a55-0c1a2b3c4d5e".to_string()),
            email: "corretor@example.com".to_string(),
            password_hash: "unused".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn issued_token_round_trips_identity() {
        let tokens = authority("top-secret");
        let token = tokens.issue(&user(), Utc::now()).expect("issue");

        let identity = tokens.verify(&token).expect("verify");
        assert_eq!(identity.id, user().id);
        assert_eq!(identity.email, "corretor@example.com");
    }

    #[test]
    fn token_lives_one_hour_from_issuance() {
        let tokens = authority("top-secret");
        let issued_at = Utc::now();
        let token = tokens.issue(&user(), issued_at).expect("issue");

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        let claims = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"top-secret"),
            &validation,
        )
        .expect("decode")
        .claims;
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(claims.iat, issued_at.timestamp());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let tokens = authority("top-secret");
        let token = tokens
            .issue(&user(), Utc::now() - Duration::hours(2))
            .expect("issue");

        assert!(matches!(tokens.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn foreign_signatures_are_rejected() {
        let token = authority("someone-else").issue(&user(), Utc::now()).expect("issue");

        assert!(matches!(
            authority("top-secret").verify(&token),
            Err(TokenError::Invalid(ErrorKind::InvalidSignature))
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            authority("top-secret").verify("not.a.jwt"),
            Err(TokenError::Invalid(_))
        ));
    }
}
