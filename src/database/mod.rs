//! Storage backends for [`crate::user::UserRepository`].
mod memory;
mod postgres;

pub use memory::MemoryUserRepository;
pub use postgres::PgUserRepository;

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub const DEFAULT_CREDENTIALS: &str = "postgres";
pub const DEFAULT_DATABASE_NAME: &str = "accounts";
pub const DEFAULT_POOL_SIZE: u32 = 10;

/// PostgreSQL connection pool.
#[derive(Clone)]
pub struct Database {
    pub postgres: PgPool,
}

impl Database {
    /// Init database connections.
    ///
    /// `acquire_timeout` bounds the wait for a free connection.
    pub async fn new(
        hostname: &str,
        username: &str,
        password: &str,
        db: &str,
        pool: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, sqlx::Error> {
        let addr = format!("postgres://{username}:{password}@{hostname}/{db}");
        let postgres = PgPoolOptions::new()
            .max_connections(pool)
            .acquire_timeout(acquire_timeout)
            .connect(&addr)
            .await?;

        tracing::info!(%hostname, %db, "postgres connected");

        Ok(Self { postgres })
    }

    /// Execute migrations scripts.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!().run(&self.postgres).await
    }
}
