use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::User;
use crate::error::RepositoryError;

/// Storage abstraction for accounts, keyed by exact email.
pub trait CredentialRepository: Send + Sync {
    /// Fails with `Conflict` when the email is already taken.
    fn insert(&self, user: User) -> Result<User, RepositoryError>;
    fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
}

/// In-process account store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCredentialRepository {
    users: Arc<Mutex<HashMap<String, User>>>,
}

impl InMemoryCredentialRepository {
    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, User>>, RepositoryError> {
        self.users
            .lock()
            .map_err(|_| RepositoryError::Unavailable("credential table lock poisoned".to_string()))
    }
}

impl CredentialRepository for InMemoryCredentialRepository {
    fn insert(&self, user: User) -> Result<User, RepositoryError> {
        let mut users = self.lock()?;
        if users.contains_key(&user.email) {
            return Err(RepositoryError::Conflict);
        }
        users.insert(user.email.clone(), user.clone());
        Ok(user)
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self.lock()?.get(email).cloned())
    }
}
