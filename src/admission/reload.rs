//! Periodic file-based policy reloading.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{info, warn};

use super::controller::AdmissionController;
use crate::config::RateLimitPolicy;
use crate::error::Result;

/// Polls a policy file and reloads the controller when it changes.
///
/// Change detection is by modification time. A file that fails to read or
/// parse leaves the previous policy live and logs a warning; the poll loop
/// keeps running.
pub struct PolicyReloader {
    controller: Arc<AdmissionController>,
    path: PathBuf,
    interval: Duration,
    last_modified: Option<SystemTime>,
}

impl PolicyReloader {
    /// Create a reloader watching `path` every `interval`.
    pub fn new(
        controller: Arc<AdmissionController>,
        path: impl Into<PathBuf>,
        interval: Duration,
    ) -> Self {
        Self {
            controller,
            path: path.into(),
            interval,
            last_modified: None,
        }
    }

    /// Run the polling loop.
    ///
    /// Intended to be spawned as a task and aborted on shutdown.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            ticker.tick().await;
            if let Err(e) = self.poll() {
                warn!(path = %self.path.display(), error = %e, "Policy reload failed");
            }
        }
    }

    /// Check the file once and reload the controller on change.
    ///
    /// The first poll reloads too; with an unchanged policy that is a
    /// no-op since the controller reuses buckets for unchanged settings.
    fn poll(&mut self) -> Result<()> {
        let modified = std::fs::metadata(&self.path)?.modified()?;
        if self.last_modified == Some(modified) {
            return Ok(());
        }

        let policy = RateLimitPolicy::from_file(&self.path)?;
        self.last_modified = Some(modified);
        self.controller.reload(policy);
        info!(path = %self.path.display(), "Rate limit policy reloaded from file");
        Ok(())
    }
}
