use diesel::Connection;
use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

use timeledger_core::config::DatabaseConfig;

use crate::db::{ConnectionFuture, DbProvider};
use crate::error::DbError;

pub type DbPool = Pool<AsyncPgConnection>;
pub type DbConnection<'pool> = PooledConnection<'pool, AsyncPgConnection>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// ## Summary
/// Creates a new database connection pool.
///
/// ## Errors
/// Returns an error if the pool cannot be created with the provided database URL.
#[tracing::instrument(skip(database_url), fields(pool_size = size))]
pub async fn create_pool(database_url: &str, size: u32) -> anyhow::Result<DbPool> {
    tracing::debug!("Creating database connection pool");

    let config = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);

    let pool = Pool::builder()
        .max_size(size)
        .min_idle(Some(1))
        .test_on_check_out(false)
        .build(config)
        .await?;

    tracing::info!(
        pool_size = size,
        "Database connection pool created successfully"
    );

    Ok(pool)
}

/// Primary pool for writes plus an optional replica pool for reads.
#[derive(Clone)]
pub struct SplitPool {
    write: DbPool,
    read: DbPool,
}

impl SplitPool {
    /// ## Summary
    /// Builds the pools described by `config`. When no separate read
    /// endpoint is configured, reads share the write pool.
    ///
    /// ## Errors
    /// Returns an error if either pool cannot be created.
    pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<Self> {
        let size = u32::from(config.max_connections.max(1));
        let write = create_pool(&config.url, size).await?;

        let read = if config.read_url() == config.url {
            write.clone()
        } else {
            tracing::info!("Using a separate read endpoint");
            create_pool(config.read_url(), size).await?
        };

        Ok(Self { write, read })
    }
}

impl DbProvider for DbPool {
    fn get_connection(&self) -> ConnectionFuture<'_> {
        Box::pin(async move {
            let conn = self.get().await?;
            Ok(conn)
        })
    }

    fn get_read_connection(&self) -> ConnectionFuture<'_> {
        self.get_connection()
    }
}

impl DbProvider for SplitPool {
    fn get_connection(&self) -> ConnectionFuture<'_> {
        self.write.get_connection()
    }

    fn get_read_connection(&self) -> ConnectionFuture<'_> {
        self.read.get_connection()
    }
}

/// ## Summary
/// Applies pending migrations against the write endpoint.
///
/// ## Errors
/// Returns an error if the connection or any migration fails.
#[tracing::instrument(skip(database_url))]
pub async fn run_migrations(database_url: &str) -> anyhow::Result<()> {
    let url = database_url.to_string();
    tokio::task::spawn_blocking(move || {
        let mut conn = diesel::PgConnection::establish(&url)?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|err| DbError::MigrationError(err.to_string()))?;
        tracing::info!(applied = applied.len(), "Migrations applied");
        Ok::<_, anyhow::Error>(())
    })
    .await??;

    Ok(())
}
