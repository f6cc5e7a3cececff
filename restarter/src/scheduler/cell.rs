//! One-time construction of the process-wide restart manager

use anyhow::{anyhow, Result};
use futures::future::{BoxFuture, FutureExt};
use tokio::sync::{Mutex, MutexGuard, OnceCell};
use tracing::info;

use crate::restart::RestartManager;

pub type ManagerFactory = Box<dyn Fn() -> BoxFuture<'static, Result<RestartManager>> + Send + Sync>;

/// Builds the manager on first use and hands out exclusive access to it.
///
/// Concurrent first callers wait on the same initialization, so the factory
/// runs at most once successfully. A failed build leaves the cell empty and
/// the next caller tries again.
pub struct ManagerCell {
    cell: OnceCell<Mutex<RestartManager>>,
    factory: ManagerFactory,
}

impl ManagerCell {
    pub fn new(factory: ManagerFactory) -> Self {
        Self {
            cell: OnceCell::new(),
            factory,
        }
    }

    /// Wrap an already-built manager.
    pub fn with_manager(manager: RestartManager) -> Self {
        Self {
            cell: OnceCell::new_with(Some(Mutex::new(manager))),
            factory: Box::new(|| {
                async { Err::<RestartManager, _>(anyhow!("restart manager already constructed")) }
                    .boxed()
            }),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    pub async fn get(&self) -> Result<MutexGuard<'_, RestartManager>> {
        let manager = self
            .cell
            .get_or_try_init(|| async {
                let manager = (self.factory)().await?;
                info!(
                    "Restart manager initialized, next restart at {}",
                    manager.next_restart_at().to_rfc3339()
                );
                Ok::<_, anyhow::Error>(Mutex::new(manager))
            })
            .await?;
        Ok(manager.lock().await)
    }
}
