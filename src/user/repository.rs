//! Persistence port for users.

use async_trait::async_trait;

use crate::user::User;

pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Errors returned by any [`UserRepository`].
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The targeted row does not exist.
    #[error("no user matches the query")]
    NotFound,

    #[error("email is already registered")]
    Conflict,

    #[error("SQL request failed: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("stored user is invalid: {0}")]
    InvalidRow(String),
}

/// Port for user persistence operations.
///
/// Lookups answer `Ok(None)` when no row matches. Updates answer
/// [`RepositoryError::NotFound`] when no row was touched.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user and return the identifier assigned by the store.
    ///
    /// `user.id` is ignored.
    async fn create(&self, user: &User) -> Result<u64>;

    /// Find a user by ID.
    async fn find_by_id(&self, id: u64) -> Result<Option<User>>;

    /// Find a user by email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Replace the password hash of the user owning `email`.
    async fn update_password(&self, email: &str, password_hash: &str) -> Result<()>;

    /// Replace the name of the user owning `email`.
    async fn update_name(&self, email: &str, name: &str) -> Result<()>;
}
