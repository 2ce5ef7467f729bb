//! Account operations: validation, credential handling and persistence.

use std::sync::Arc;

use validator::Validate;

use crate::crypto::PasswordManager;
use crate::error::{Result, ServerError};
use crate::telemetry;
use crate::user::{
    ChangeUserNameRequest, ChangeUserPasswordRequest, NewUser, OperationResult,
    RepositoryError, User, UserProfile, UserRepository,
};

pub const CREATE_USER: &str = "CreateUser";
pub const GET_USER_BY_ID: &str = "GetUserByID";
pub const GET_USER_BY_EMAIL: &str = "GetUserByEmail";
pub const UPDATE_USER_PASSWORD: &str = "UpdateUserPassword";
pub const UPDATE_USER_NAME: &str = "UpdateUserName";

/// Account manager.
///
/// Stateless apart from its shared repository and password manager, so one
/// instance serves every request concurrently.
#[derive(Clone)]
pub struct AccountService {
    repo: Arc<dyn UserRepository>,
    pwd: Arc<PasswordManager>,
}

impl AccountService {
    /// Create a new [`AccountService`].
    pub fn new(repo: Arc<dyn UserRepository>, pwd: Arc<PasswordManager>) -> Self {
        Self { repo, pwd }
    }

    /// Validate, hash password and store a new user.
    pub async fn create_user(&self, user: NewUser) -> Result<UserProfile> {
        observe(CREATE_USER, self.create(user).await)
    }

    /// Find a user using its `id`.
    pub async fn get_user_by_id(&self, id: u64) -> Result<User> {
        observe(GET_USER_BY_ID, self.find_by_id(id).await)
    }

    /// Find a user using its `email`.
    pub async fn get_user_by_email(&self, email: &str) -> Result<User> {
        observe(GET_USER_BY_EMAIL, self.find_by_email(email).await)
    }

    /// Replace password after checking the old one.
    pub async fn update_user_password(
        &self,
        request: ChangeUserPasswordRequest,
    ) -> Result<OperationResult> {
        observe(UPDATE_USER_PASSWORD, self.change_password(request).await)
    }

    /// Rename an existing user.
    pub async fn update_user_name(
        &self,
        request: ChangeUserNameRequest,
    ) -> Result<OperationResult> {
        observe(UPDATE_USER_NAME, self.change_name(request).await)
    }

    async fn create(&self, user: NewUser) -> Result<UserProfile> {
        user.validate()?;

        let mut user = User {
            id: 0,
            password: self.hash(user.password).await?,
            name: user.name,
            email: user.email,
        };

        user.id = self
            .repo
            .create(&user)
            .await
            .map_err(|err| ServerError::internal("failed to create user", err))?;

        tracing::info!(user_id = user.id, "user created");
        Ok(user.into())
    }

    async fn find_by_id(&self, id: u64) -> Result<User> {
        if id == 0 {
            return Err(ServerError::InvalidId);
        }

        match self.repo.find_by_id(id).await {
            Ok(Some(user)) => {
                tracing::info!(user_id = user.id, "user found");
                Ok(user)
            },
            Ok(None) => Err(ServerError::NotFound),
            Err(err) => Err(ServerError::internal("failed to get user by id", err)),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<User> {
        match self.repo.find_by_email(email).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(ServerError::NotFound),
            Err(err) => {
                Err(ServerError::internal("failed to get user by email", err))
            },
        }
    }

    /// Lookup preceding an update: a miss is reported as a bad argument.
    async fn find_account(&self, email: &str) -> Result<User> {
        match self.repo.find_by_email(email).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(ServerError::UnknownEmail),
            Err(err) => {
                Err(ServerError::internal("failed to get user by email", err))
            },
        }
    }

    async fn change_password(
        &self,
        request: ChangeUserPasswordRequest,
    ) -> Result<OperationResult> {
        request.validate()?;

        let user = self.find_account(&request.email).await?;
        self.verify(user.password, request.old_password).await?;

        let password = self.hash(request.new_password).await?;
        self.repo
            .update_password(&request.email, &password)
            .await
            .map_err(|err| update_error("failed to update user password", err))?;

        tracing::info!(user_id = user.id, "user password updated");
        Ok(OperationResult::success("Password updated"))
    }

    async fn change_name(
        &self,
        request: ChangeUserNameRequest,
    ) -> Result<OperationResult> {
        request.validate()?;

        let user = self.find_account(&request.email).await?;
        self.repo
            .update_name(&request.email, &request.new_name)
            .await
            .map_err(|err| update_error("failed to update user name", err))?;

        tracing::info!(user_id = user.id, "user name updated");
        Ok(OperationResult::success("User name updated"))
    }

    /// Argon2 is CPU-bound, keep it off the async workers.
    async fn hash(&self, password: String) -> Result<String> {
        let pwd = Arc::clone(&self.pwd);

        tokio::task::spawn_blocking(move || pwd.hash_password(password))
            .await
            .map_err(|err| ServerError::internal("hashing task failed", err))?
            .map_err(|err| ServerError::internal("failed to hash password", err))
    }

    async fn verify(&self, hash: String, password: String) -> Result<()> {
        let pwd = Arc::clone(&self.pwd);

        tokio::task::spawn_blocking(move || pwd.verify_password(&hash, password))
            .await
            .map_err(|err| ServerError::internal("verification task failed", err))?
            .map_err(|_| ServerError::InvalidCredentials)
    }
}

fn update_error(details: &str, err: RepositoryError) -> ServerError {
    match err {
        // row vanished between lookup and update.
        RepositoryError::NotFound => ServerError::UnknownEmail,
        err => ServerError::internal(details, err),
    }
}

fn observe<T>(operation: &'static str, result: Result<T>) -> Result<T> {
    match &result {
        Ok(_) => telemetry::record_operation(operation, "OK"),
        Err(err) => {
            let code = err.code();
            tracing::error!(operation, %code, error = ?err, "account operation failed");
            telemetry::record_operation(operation, code.as_str());
        },
    }

    result
}
