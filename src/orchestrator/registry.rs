//! Ownership of in-flight polling tasks
//!
//! Every polling sequence runs under a child token of one root
//! [`CancellationToken`] owned by the registry. Disposing the registry
//! cancels the root, and the cooperative checks inside each sequence
//! guarantee that no poll fires afterward. Join handles are held so a
//! graceful shutdown can wait for the sequences to observe cancellation.

use std::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Registry of outstanding polling tasks for one orchestrator
///
/// Scoped to the lifetime of the session that created it: when the host
/// switches repository it disposes this registry (directly or by
/// dropping the orchestrator) and builds a fresh one.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    root: CancellationToken,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl TaskRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a cancellation token for one polling sequence
    ///
    /// The token is a child of the registry root, so `dispose` cancels
    /// every sequence at once.
    pub fn child_token(&self) -> CancellationToken {
        self.root.child_token()
    }

    /// Takes ownership of a spawned polling task
    pub fn register(&self, handle: JoinHandle<()>) {
        let mut handles = self.handles.lock().unwrap();
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Number of polling tasks that have not yet finished
    pub fn active_tasks(&self) -> usize {
        let mut handles = self.handles.lock().unwrap();
        handles.retain(|h| !h.is_finished());
        handles.len()
    }

    /// Cancels every outstanding polling sequence
    ///
    /// Cooperative: a sequence already past its cancellation check will
    /// finish its current poll body, but no further poll is scheduled
    /// and no callback fires after the sequence observes the token.
    pub fn dispose(&self) {
        debug!("disposing task registry");
        self.root.cancel();
    }

    /// True once `dispose` has been called
    pub fn is_disposed(&self) -> bool {
        self.root.is_cancelled()
    }

    /// Cancels all sequences and waits for them to finish
    pub async fn shutdown(&self) {
        self.dispose();
        self.join_all().await;
    }

    /// Waits for all registered tasks to finish without cancelling them
    pub async fn join_all(&self) {
        let handles: Vec<JoinHandle<()>> = {
            let mut guard = self.handles.lock().unwrap();
            guard.drain(..).collect()
        };
        for handle in handles {
            let _ = handle.await;
        }
    }
}

impl Drop for TaskRegistry {
    fn drop(&mut self) {
        // Dropping the registry must leave no live polling task behind.
        self.root.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn spawn_ticker(registry: &TaskRegistry, ticks: Arc<AtomicU32>) {
        let token = registry.child_token();
        registry.register(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(Duration::from_secs(1)) => {}
                }
                if token.is_cancelled() {
                    return;
                }
                ticks.fetch_add(1, Ordering::SeqCst);
            }
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_stops_ticking() {
        let registry = TaskRegistry::new();
        let ticks = Arc::new(AtomicU32::new(0));
        spawn_ticker(&registry, Arc::clone(&ticks));

        tokio::time::sleep(Duration::from_millis(3500)).await;
        let before = ticks.load(Ordering::SeqCst);
        assert_eq!(before, 3);

        registry.dispose();
        registry.join_all().await;

        // Advance well past several would-be intervals.
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_cancels_all_children() {
        let registry = TaskRegistry::new();
        let ticks = Arc::new(AtomicU32::new(0));
        for _ in 0..5 {
            spawn_ticker(&registry, Arc::clone(&ticks));
        }

        registry.dispose();
        registry.join_all().await;
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_active_tasks_prunes_finished() {
        let registry = TaskRegistry::new();
        registry.register(tokio::spawn(async {}));
        registry.join_all().await;
        assert_eq!(registry.active_tasks(), 0);
    }

    #[tokio::test]
    async fn test_is_disposed_reflects_state() {
        let registry = TaskRegistry::new();
        assert!(!registry.is_disposed());
        registry.dispose();
        assert!(registry.is_disposed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_waits_for_tasks() {
        let registry = TaskRegistry::new();
        let ticks = Arc::new(AtomicU32::new(0));
        spawn_ticker(&registry, Arc::clone(&ticks));

        registry.shutdown().await;
        assert_eq!(registry.active_tasks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_root() {
        let ticks = Arc::new(AtomicU32::new(0));
        let handle;
        {
            let registry = TaskRegistry::new();
            let token = registry.child_token();
            let ticks = Arc::clone(&ticks);
            handle = tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = token.cancelled() => return,
                        _ = tokio::time::sleep(Duration::from_secs(1)) => {}
                    }
                    ticks.fetch_add(1, Ordering::SeqCst);
                }
            });
        }
        let _ = handle.await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
    }
}
