use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{LoginSession, User, UserId};
use super::password::{hash_password, verify_password, PasswordHashError};
use super::repository::CredentialRepository;
use super::token::{TokenAuthority, TokenError};
use crate::clock::Clock;
use crate::error::RepositoryError;

/// Account registration and login.
pub struct AuthService<R> {
    repository: Arc<R>,
    tokens: TokenAuthority,
    clock: Arc<dyn Clock>,
}

impl<R> AuthService<R>
where
    R: CredentialRepository + 'static,
{
    pub fn new(repository: Arc<R>, tokens: TokenAuthority, clock: Arc<dyn Clock>) -> Self {
        Self {
            repository,
            tokens,
            clock,
        }
    }

    pub fn tokens(&self) -> &TokenAuthority {
        &self.tokens
    }

    pub fn register(&self, email: &str, password: &str) -> Result<User, AuthServiceError> {
        if email.is_empty() || password.is_empty() {
            return Err(AuthServiceError::MissingCredentials);
        }
        if self.repository.find_by_email(email)?.is_some() {
            return Err(AuthServiceError::EmailTaken);
        }

        let user = User {
            id: UserId::generate(),
            email: email.to_string(),
            password_hash: hash_password(password)?,
            created_at: self.clock.now(),
        };

        let stored = self.repository.insert(user).map_err(|err| match err {
            RepositoryError::Conflict => AuthServiceError::EmailTaken,
            other => AuthServiceError::Repository(other),
        })?;
        info!(user_id = %stored.id, "account registered");
        Ok(stored)
    }

    /// Unknown email and wrong password fail identically; only the log tells them apart.
    pub fn login(&self, email: &str, password: &str) -> Result<LoginSession, AuthServiceError> {
        if email.is_empty() || password.is_empty() {
            return Err(AuthServiceError::MissingCredentials);
        }

        let Some(user) = self.repository.find_by_email(email)? else {
            warn!(reason = "unknown_email", "login rejected");
            return Err(AuthServiceError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash) {
            warn!(reason = "password_mismatch", user_id = %user.id, "login rejected");
            return Err(AuthServiceError::InvalidCredentials);
        }

        let token = self.tokens.issue(&user, self.clock.now())?;
        info!(user_id = %user.id, "login succeeded");
        Ok(LoginSession {
            token,
            email: user.email,
        })
    }
}

/// Error raised by the auth service.
#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("email and password are required")]
    MissingCredentials,
    #[error("email already registered")]
    EmailTaken,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Hashing(#[from] PasswordHashError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
