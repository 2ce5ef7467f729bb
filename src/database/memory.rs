//! In-memory user repository for development and testing.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::user::{RepositoryError, Result, User, UserRepository};

/// Users kept in process memory, lost on restart.
///
/// Emails are unique, like the `users.email` index.
pub struct MemoryUserRepository {
    users: DashMap<u64, User>,
    emails: DashMap<String, u64>,
    next_id: AtomicU64,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            emails: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    fn update(&self, email: &str, apply: impl FnOnce(&mut User)) -> Result<()> {
        let id = self
            .emails
            .get(email)
            .map(|id| *id.value())
            .ok_or(RepositoryError::NotFound)?;

        let mut user = self.users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        apply(user.value_mut());
        Ok(())
    }
}

impl Default for MemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, user: &User) -> Result<u64> {
        let id = match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => return Err(RepositoryError::Conflict),
            Entry::Vacant(entry) => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                entry.insert(id);
                id
            },
        };

        self.users.insert(
            id,
            User {
                id,
                ..user.clone()
            },
        );

        Ok(id)
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|user| user.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let Some(id) = self.emails.get(email).map(|id| *id.value()) else {
            return Ok(None);
        };

        Ok(self.users.get(&id).map(|user| user.value().clone()))
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> Result<()> {
        self.update(email, |user| user.password = password_hash.to_owned())
    }

    async fn update_name(&self, email: &str, name: &str) -> Result<()> {
        self.update(email, |user| user.name = name.to_owned())
    }
}
