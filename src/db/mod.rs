mod mappers;
mod read_ops;
mod write_ops;

#[cfg(test)]
mod store_tests;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::error::Result;
use crate::reconciler::{PortFuture, ResultsClient};
use crate::types::RunResult;

pub use read_ops::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Schema applied by `init-db`.
pub const SCHEMA_SQL: &str = include_str!("../../schema.sql");

const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// PostgreSQL-backed results store.
#[derive(Clone)]
pub struct ResultsDb {
    pool: PgPool,
}

impl ResultsDb {
    /// # Errors
    /// Returns `ResultsError::SqlxError` when the pool cannot connect.
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(resolve_pool_max_connections())
            .connect(database_url)
            .await?;

        info!("Connected to PostgreSQL results database");
        Ok(Self { pool })
    }

    /// Pool that opens connections on first use.
    ///
    /// # Errors
    /// Returns `ResultsError::SqlxError` when the URL cannot be parsed.
    pub fn connect_lazy(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(resolve_pool_max_connections())
            .connect_lazy(database_url)?;
        Ok(Self { pool })
    }

    /// Create a new `ResultsDb` with an existing pool (for testing).
    #[must_use]
    pub const fn new_with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl ResultsClient for ResultsDb {
    fn create_result(&self, result: RunResult) -> PortFuture<'_, RunResult> {
        Box::pin(async move {
            let parent = result.parent.clone();
            self.insert_result(&parent, &result).await
        })
    }

    fn get_result<'a>(&'a self, name: &'a str) -> PortFuture<'a, RunResult> {
        Box::pin(self.load_result(name))
    }

    fn update_result<'a>(
        &'a self,
        name: &'a str,
        result: RunResult,
    ) -> PortFuture<'a, RunResult> {
        Box::pin(async move { self.replace_result(name, &result).await })
    }
}

fn resolve_pool_max_connections() -> u32 {
    resolve_pool_max_connections_from(|key| std::env::var(key).ok())
}

fn resolve_pool_max_connections_from<F>(env_lookup: F) -> u32
where
    F: Fn(&str) -> Option<String>,
{
    env_lookup("RESULTS_DB_MAX_CONNECTIONS")
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_MAX_CONNECTIONS)
}
