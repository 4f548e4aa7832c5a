use crate::error::StoreError;
use crate::store::actor::{StoreHandle, StoreOptions, open};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

/// Process-wide store handle that opens the database on first use.
///
/// Clones share the same cell, so concurrent first callers race on a single
/// open; the losers wait for the winner's handle. A failed open leaves the
/// cell empty and the next call tries again.
#[derive(Clone)]
pub struct LazyStore {
    options: Arc<StoreOptions>,
    cell: Arc<OnceCell<StoreHandle>>,
}

impl LazyStore {
    pub fn new(options: StoreOptions) -> Self {
        Self {
            options: Arc::new(options),
            cell: Arc::new(OnceCell::new()),
        }
    }

    pub async fn get(&self) -> Result<&StoreHandle, StoreError> {
        self.cell
            .get_or_try_init(|| async {
                debug!(database_url = %self.options.database_url, "Opening record store");
                open((*self.options).clone()).await
            })
            .await
    }

    pub fn is_open(&self) -> bool {
        self.cell.initialized()
    }

    /// Stop the store actor if it was ever opened.
    pub async fn close(&self) -> Result<(), StoreError> {
        match self.cell.get() {
            Some(handle) => handle.close().await,
            None => Ok(()),
        }
    }
}
