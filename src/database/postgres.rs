//! PostgreSQL implementation for user repository.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::user::{RepositoryError, Result, User, UserRepository};

/// Row of the `users` table.
#[derive(Debug, sqlx::FromRow)]
struct UserRecord {
    id: i64,
    name: String,
    email: String,
    password: String,
}

impl TryFrom<UserRecord> for User {
    type Error = RepositoryError;

    fn try_from(record: UserRecord) -> Result<Self> {
        let id = u64::try_from(record.id).map_err(|_| {
            RepositoryError::InvalidRow(format!("negative id {}", record.id))
        })?;

        Ok(User {
            id,
            name: record.name,
            email: record.email,
            password: record.password,
        })
    }
}

/// PostgreSQL user repository.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new [`PgUserRepository`].
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: &User) -> Result<u64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"INSERT INTO users (name, email, password) VALUES ($1, $2, $3) RETURNING id"#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                RepositoryError::Conflict
            },
            err => RepositoryError::Sql(err),
        })?;

        u64::try_from(id)
            .map_err(|_| RepositoryError::InvalidRow(format!("negative id {id}")))
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<User>> {
        // BIGSERIAL never goes above i64::MAX.
        let Ok(id) = i64::try_from(id) else {
            return Ok(None);
        };

        sqlx::query_as::<_, UserRecord>(
            r#"SELECT id, name, email, password FROM users WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, UserRecord>(
            r#"SELECT id, name, email, password FROM users WHERE email = $1"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> Result<()> {
        let result = sqlx::query(r#"UPDATE users SET password = $1 WHERE email = $2"#)
            .bind(password_hash)
            .bind(email)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn update_name(&self, email: &str, name: &str) -> Result<()> {
        let result = sqlx::query(r#"UPDATE users SET name = $1 WHERE email = $2"#)
            .bind(name)
            .bind(email)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str) -> User {
        User {
            id: 0,
            name: "Alice".into(),
            email: email.into(),
            password: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
        }
    }

    #[sqlx::test]
    #[ignore = "needs PostgreSQL through DATABASE_URL"]
    async fn test_create_and_find(pool: PgPool) {
        let repo = PgUserRepository::new(pool);

        let id = repo.create(&user("alice@example.com")).await.unwrap();
        assert!(id > 0);

        let found = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(found.email, "alice@example.com");
        assert_eq!(
            repo.find_by_email("alice@example.com").await.unwrap(),
            Some(found)
        );

        assert!(repo.find_by_id(id + 1).await.unwrap().is_none());
        assert!(repo.find_by_id(u64::MAX).await.unwrap().is_none());
        assert!(repo.find_by_email("bob@example.com").await.unwrap().is_none());
    }

    #[sqlx::test]
    #[ignore = "needs PostgreSQL through DATABASE_URL"]
    async fn test_duplicate_email(pool: PgPool) {
        let repo = PgUserRepository::new(pool);

        repo.create(&user("alice@example.com")).await.unwrap();
        assert!(matches!(
            repo.create(&user("alice@example.com")).await,
            Err(RepositoryError::Conflict)
        ));
    }

    #[sqlx::test]
    #[ignore = "needs PostgreSQL through DATABASE_URL"]
    async fn test_updates(pool: PgPool) {
        let repo = PgUserRepository::new(pool);
        let id = repo.create(&user("alice@example.com")).await.unwrap();

        repo.update_name("alice@example.com", "Alicia").await.unwrap();
        repo.update_password("alice@example.com", "new-hash").await.unwrap();

        let found = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(found.name, "Alicia");
        assert_eq!(found.password, "new-hash");

        assert!(matches!(
            repo.update_name("bob@example.com", "Bobby").await,
            Err(RepositoryError::NotFound)
        ));
        assert!(matches!(
            repo.update_password("bob@example.com", "new-hash").await,
            Err(RepositoryError::NotFound)
        ));
    }
}
