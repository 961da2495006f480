//! Infrastructure wiring shared by all handlers.

use std::time::Duration;

use sqlx::SqlitePool;

use stockledger_infra::{db, AppConfig, CatalogStore, MovementProcessor, TransactionCoordinator};

pub struct AppServices {
    pub catalog: CatalogStore,
    pub processor: MovementProcessor,
}

impl AppServices {
    /// Open the database described by `config` and wire the stores on top of it.
    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let pool = db::connect(config).await?;
        Ok(Self::from_pool(pool, config.lock_timeout))
    }

    pub fn from_pool(pool: SqlitePool, lock_timeout: Duration) -> Self {
        let catalog = CatalogStore::new(pool.clone());
        let coordinator = TransactionCoordinator::new(pool, lock_timeout);
        Self {
            processor: MovementProcessor::new(catalog.clone(), coordinator),
            catalog,
        }
    }

    /// Pool for read-only queries (ledger and log listings).
    pub fn pool(&self) -> &SqlitePool {
        self.catalog.pool()
    }
}
