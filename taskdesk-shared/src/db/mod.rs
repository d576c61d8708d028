/// Persistence layer for Taskdesk
///
/// [`Database`] is the explicitly constructed persistence handle. It is opened
/// once at startup, cloned into whatever needs it, and closed on shutdown.
/// Stores never see the backend directly, only the repository traits.
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with health checks
/// - `migrations`: Embedded schema migrations
/// - `repository`: Storage traits shared by both backends
/// - `postgres`: sqlx implementation of the traits
/// - `memory`: In-memory implementation of the traits
///
/// # Example
///
/// ```no_run
/// use taskdesk_shared::db::{pool::DatabaseConfig, Database};
/// use taskdesk_shared::password::PasswordPolicy;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let db = Database::open(&DatabaseConfig::new(std::env::var("DATABASE_URL")?)).await?;
///     let users = db.user_store(PasswordPolicy::default());
///     println!("{} users", users.get_stats().await?.total_users);
///     db.close().await;
///     Ok(())
/// }
/// ```

pub mod memory;
pub mod migrations;
pub mod pool;
pub mod postgres;
pub mod repository;

use std::sync::Arc;

use sqlx::postgres::PgPool;
use tracing::info;

use crate::error::StoreResult;
use crate::password::PasswordPolicy;
use crate::stores::{TaskStore, UserStore};
use memory::{MemoryTaskRepository, MemoryUserRepository};
use pool::{DatabaseConfig, PoolStats};
use postgres::{PgTaskRepository, PgUserRepository};
use repository::{TaskRepository, UserRepository};

#[derive(Debug, Clone)]
enum Backend {
    Postgres(PgPool),
    Memory,
}

/// Handle to an open backend and its repositories
#[derive(Clone)]
pub struct Database {
    backend: Backend,
    users: Arc<dyn UserRepository>,
    tasks: Arc<dyn TaskRepository>,
}

impl Database {
    /// Connects to Postgres and applies pending migrations
    pub async fn open(config: &DatabaseConfig) -> StoreResult<Self> {
        let pool = pool::create_pool(config).await?;
        migrations::run_migrations(&pool).await?;
        Ok(Self::from_pool(pool))
    }

    /// Wraps an existing pool; migrations are the caller's business
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            tasks: Arc::new(PgTaskRepository::new(pool.clone())),
            backend: Backend::Postgres(pool),
        }
    }

    /// Empty in-memory backend
    pub fn in_memory() -> Self {
        info!("Using in-memory storage");
        Self {
            backend: Backend::Memory,
            users: Arc::new(MemoryUserRepository::new()),
            tasks: Arc::new(MemoryTaskRepository::new()),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            Backend::Postgres(_) => "postgres",
            Backend::Memory => "memory",
        }
    }

    /// Checks that the backend answers
    pub async fn ping(&self) -> StoreResult<()> {
        if let Backend::Postgres(pool) = &self.backend {
            pool::health_check(pool).await?;
        }
        Ok(())
    }

    pub fn pool_stats(&self) -> Option<PoolStats> {
        match &self.backend {
            Backend::Postgres(pool) => Some(PoolStats::from_pool(pool)),
            Backend::Memory => None,
        }
    }

    pub fn users(&self) -> Arc<dyn UserRepository> {
        Arc::clone(&self.users)
    }

    pub fn tasks(&self) -> Arc<dyn TaskRepository> {
        Arc::clone(&self.tasks)
    }

    pub fn user_store(&self, policy: PasswordPolicy) -> UserStore {
        UserStore::new(self.users(), policy)
    }

    pub fn task_store(&self) -> TaskStore {
        TaskStore::new(self.tasks(), self.users())
    }

    /// Releases the backend's connections
    pub async fn close(&self) {
        if let Backend::Postgres(pool) = &self.backend {
            pool::close_pool(pool).await;
        }
    }
}
