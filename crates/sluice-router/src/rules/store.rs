//! Hot-reloading rule store.
//!
//! The active [`RuleSet`] lives in an [`ArcSwap`], so evaluation takes a
//! consistent snapshot without locking. Reloads are serialized by a FIFO
//! `tokio::sync::Mutex`; a caller that queued behind a reload attempt of the
//! same (or a newer) modification time takes that attempt's outcome instead
//! of repeating it.

use crate::error::RuleError;
use crate::rules::rule::RuleSet;
use crate::rules::source::RuleSource;
use arc_swap::ArcSwap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;
use tokio::sync::Mutex;

/// Outcome of the most recent reload attempt.
#[derive(Debug, Default)]
struct ReloadState {
    /// Modification time the last attempt loaded.
    attempted: Option<SystemTime>,
    last_error: Option<Arc<RuleError>>,
}

/// Holds the active rule set and refreshes it when its source changes.
pub struct RuleStore {
    source: Arc<dyn RuleSource>,
    active: ArcSwap<RuleSet>,
    reload: Mutex<ReloadState>,
    /// Completed reload attempts. Only written while `reload` is held.
    attempts: AtomicU64,
}

impl std::fmt::Debug for RuleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleStore")
            .field("source", &self.source.describe())
            .field("rules", &self.active.load().len())
            .finish()
    }
}

impl RuleStore {
    /// Store with an empty rule set; the first [`ensure_fresh`](Self::ensure_fresh)
    /// loads the source.
    pub fn empty(source: Arc<dyn RuleSource>) -> Self {
        Self {
            source,
            active: ArcSwap::from_pointee(RuleSet::empty()),
            reload: Mutex::new(ReloadState::default()),
            attempts: AtomicU64::new(0),
        }
    }

    /// Build a store and attempt an initial load. Failure is logged and leaves
    /// the store empty.
    pub async fn load(source: Arc<dyn RuleSource>) -> Self {
        let store = Self::empty(source);
        if let Err(e) = store.ensure_fresh().await {
            tracing::error!(
                source = %store.source.describe(),
                error = %e,
                "Initial routing rule load failed; starting with no rules"
            );
        }
        store
    }

    /// Current rule set.
    pub fn snapshot(&self) -> Arc<RuleSet> {
        self.active.load_full()
    }

    pub fn source(&self) -> &Arc<dyn RuleSource> {
        &self.source
    }

    /// Reload the rule set if the source changed since it was loaded.
    ///
    /// On failure the previous rule set stays active and the error is
    /// returned; callers that were waiting on the same attempt get the same
    /// error.
    pub async fn ensure_fresh(&self) -> Result<(), RuleError> {
        let modified = self.source.modified().await?;
        if !self.is_stale(modified) {
            return Ok(());
        }

        let observed = self.attempts.load(Ordering::Acquire);
        let mut state = self.reload.lock().await;

        let covered = state.attempted.is_some_and(|attempted| attempted >= modified);
        if self.attempts.load(Ordering::Acquire) != observed && covered {
            // Someone reloaded what we saw while we waited.
            if let Some(e) = &state.last_error {
                return Err(RuleError::ReloadFailed(Arc::clone(e)));
            }
        }
        if !self.is_stale(modified) {
            return Ok(());
        }

        let outcome = self.reload_from(modified).await;
        state.attempted = Some(modified);
        self.attempts.fetch_add(1, Ordering::Release);

        match outcome {
            Ok(()) => {
                state.last_error = None;
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    source = %self.source.describe(),
                    error = %e,
                    "Routing rule reload failed; keeping previous rules"
                );
                let e = Arc::new(e);
                state.last_error = Some(Arc::clone(&e));
                Err(RuleError::ReloadFailed(e))
            }
        }
    }

    fn is_stale(&self, modified: SystemTime) -> bool {
        match self.active.load().loaded_at() {
            Some(loaded_at) => modified > loaded_at,
            None => true,
        }
    }

    async fn reload_from(&self, modified: SystemTime) -> Result<(), RuleError> {
        let rules = self.source.load().await?;
        let set = RuleSet::new(rules, Some(modified));
        tracing::info!(
            source = %self.source.describe(),
            rules = set.len(),
            "Loaded routing rules"
        );
        self.active.store(Arc::new(set));
        Ok(())
    }
}
