//! Token janitor — periodic deletion of revoked refresh tokens
//!
//! Rotation only ever flips `is_revoked`; physical deletion happens here.
//! The janitor is owned by the process lifecycle: started once the store
//! is ready, aborted on stop or drop. Its predicate is strictly
//! `is_revoked = true`, so it can never race the rotation protocol into
//! deleting a live token.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::error::Result;
use crate::store::{CredentialStore, TokenPurge};

/// Background sweeper for revoked refresh tokens
pub struct TokenJanitor {
    store: Arc<dyn CredentialStore>,
    handles: Vec<JoinHandle<()>>,
}

impl TokenJanitor {
    /// Create a janitor tied to a credential store
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            handles: Vec::new(),
        }
    }

    /// Start the periodic sweep. Failures are logged and retried on the
    /// next tick; they never reach request-handling paths.
    pub fn start(&mut self, interval: Duration) {
        // tokio::time::interval panics on a zero period
        let interval = interval.max(Duration::from_millis(1));
        let store = Arc::clone(&self.store);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                match store.delete_refresh_tokens(TokenPurge::Revoked).await {
                    Ok(deleted) => {
                        if deleted > 0 {
                            info!(deleted, "Swept revoked refresh tokens");
                        }
                    }
                    Err(e) => error!(error = ?e, "Token sweep failed"),
                }
            }
        });
        self.handles.push(handle);
        info!(interval_secs = interval.as_secs(), "Token janitor started");
    }

    /// Run a single sweep (useful for CLI and tests)
    pub async fn run_once(store: &dyn CredentialStore) -> Result<u64> {
        let deleted = store.delete_refresh_tokens(TokenPurge::Revoked).await?;
        if deleted > 0 {
            info!(deleted, "Swept revoked refresh tokens");
        }
        Ok(deleted)
    }

    /// Stop all background tasks
    pub fn stop(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
        info!("Token janitor stopped");
    }
}

impl Drop for TokenJanitor {
    fn drop(&mut self) {
        self.stop();
    }
}
