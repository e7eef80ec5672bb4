//! Outward-facing collaborators the worker notifies.
//!
//! None of these feed back into the simulation. A missing presentation sink
//! is logged once and otherwise ignored.
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use arena_core::EntityId;

/// Session-wide announcements such as kill messages.
pub trait ChatSink: Send + Sync {
    fn announce(&self, message: &str);
}

/// Removes what is left of a destroyed agent after a delay.
pub trait CleanupScheduler: Send + Sync {
    fn schedule(&self, agent: EntityId, delay: Duration);
}

/// Cosmetic state: name tags and the chase indicator.
pub trait PresentationSink: Send + Sync {
    fn show_name(&self, agent: EntityId, name: &str);

    fn set_chase_indicator(&self, agent: EntityId, visible: bool);

    fn remove(&self, agent: EntityId);
}

/// Writes announcements to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingChat;

impl ChatSink for TracingChat {
    fn announce(&self, message: &str) {
        tracing::info!(target: "arena::chat", "{message}");
    }
}

/// Cleanups remembered by [`TokioCleanup`]; older ones are forgotten.
pub const CLEANUP_HISTORY: usize = 64;

/// Runs cleanups on the Tokio runtime and records the most recent ones.
#[derive(Debug, Default, Clone)]
pub struct TokioCleanup {
    completed: Arc<Mutex<VecDeque<EntityId>>>,
}

impl TokioCleanup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Up to [`CLEANUP_HISTORY`] completed cleanups, oldest first.
    pub fn completed(&self) -> Vec<EntityId> {
        self.completed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .copied()
            .collect()
    }
}

impl CleanupScheduler for TokioCleanup {
    fn schedule(&self, agent: EntityId, delay: Duration) {
        let completed = self.completed.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut completed = completed.lock().unwrap_or_else(PoisonError::into_inner);
                if completed.len() == CLEANUP_HISTORY {
                    completed.pop_front();
                }
                completed.push_back(agent);
            }
            tracing::debug!(target: "arena::cleanup", agent = %agent, "remains cleaned up");
        });
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingPresentation;

impl PresentationSink for TracingPresentation {
    fn show_name(&self, agent: EntityId, name: &str) {
        tracing::debug!(target: "arena::presentation", agent = %agent, name, "name tag");
    }

    fn set_chase_indicator(&self, agent: EntityId, visible: bool) {
        tracing::debug!(target: "arena::presentation", agent = %agent, visible, "chase indicator");
    }

    fn remove(&self, agent: EntityId) {
        tracing::debug!(target: "arena::presentation", agent = %agent, "presentation removed");
    }
}

/// The set of services one worker reports to.
#[derive(Clone)]
pub struct Services {
    pub chat: Arc<dyn ChatSink>,
    pub cleanup: Arc<dyn CleanupScheduler>,
    pub presentation: Option<Arc<dyn PresentationSink>>,
    /// How long remains linger before cleanup.
    pub cleanup_delay: Duration,
}

impl Default for Services {
    fn default() -> Self {
        Self {
            chat: Arc::new(TracingChat),
            cleanup: Arc::new(TokioCleanup::new()),
            presentation: Some(Arc::new(TracingPresentation)),
            cleanup_delay: Duration::from_secs(3),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn cleanup_runs_after_the_delay() {
        let cleanup = TokioCleanup::new();
        cleanup.schedule(EntityId(1000), Duration::from_secs(3));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(cleanup.completed().is_empty());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(cleanup.completed(), vec![EntityId(1000)]);
    }

    #[tokio::test(start_paused = true)]
    async fn cleanup_history_is_bounded() {
        let cleanup = TokioCleanup::new();
        let total = CLEANUP_HISTORY as u32 + 6;
        for i in 0..total {
            cleanup.schedule(EntityId(i), Duration::from_millis(u64::from(i) + 1));
        }

        tokio::time::sleep(Duration::from_secs(1)).await;
        let completed = cleanup.completed();
        assert_eq!(completed.len(), CLEANUP_HISTORY);
        assert_eq!(completed.first(), Some(&EntityId(6)));
        assert_eq!(completed.last(), Some(&EntityId(total - 1)));
    }
}
