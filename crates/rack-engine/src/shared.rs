//! Shared depot handle for concurrent callers
//!
//! All mutations go through a single writer lock, so interleaved callers
//! always observe a fully applied command or none of it.

use std::sync::Arc;

use rack_core::Result;
use tokio::sync::RwLock;
use tracing::debug;

use crate::command::{DepotCommand, DepotQuery, Outcome, Request};
use crate::depot::Depot;

#[derive(Debug, Clone, Default)]
pub struct SharedDepot {
    inner: Arc<RwLock<Depot>>,
}

impl SharedDepot {
    pub fn new(depot: Depot) -> Self {
        Self {
            inner: Arc::new(RwLock::new(depot)),
        }
    }

    /// Run `f` with shared read access
    pub async fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Depot) -> R,
    {
        let depot = self.inner.read().await;
        f(&depot)
    }

    /// Run `f` with exclusive write access
    pub async fn write<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Depot) -> R,
    {
        let mut depot = self.inner.write().await;
        f(&mut depot)
    }

    pub async fn execute(&self, command: DepotCommand) -> Result<Outcome> {
        debug!("Executing {}", command.name());
        self.write(|depot| command.apply(depot)).await
    }

    pub async fn query(&self, query: DepotQuery) -> Result<Outcome> {
        self.read(|depot| query.evaluate(depot)).await
    }

    /// Dispatch a request, taking the write lock only for commands
    pub async fn dispatch(&self, request: Request) -> Result<Outcome> {
        match request {
            Request::Command(command) => self.execute(command).await,
            Request::Query(query) => self.query(query).await,
        }
    }

    /// Clone of the current depot state
    pub async fn snapshot(&self) -> Depot {
        self.read(Depot::clone).await
    }
}
