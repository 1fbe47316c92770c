//! Fixed-delay notifications keyed by panel key.
//!
//! Every scheduled callback runs on its own tokio task after the delay. Outside
//! a tokio runtime a plain thread does the waiting instead. The stack never
//! cancels them, but pending timers are tracked per key so they can be
//! cancelled explicitly.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::AbortHandle;

/// What a pending timer will announce when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Opened,
    CloseEnded,
}

#[derive(Clone, Default)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: AtomicU64,
    pending: Mutex<HashMap<u64, Pending>>,
}

struct Pending {
    key: String,
    kind: TimerKind,
    /// `None` for thread-backed timers; those check the pending map when they
    /// wake instead.
    abort: Option<AbortHandle>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` once `delay` has elapsed.
    pub fn schedule<F>(&self, key: &str, kind: TimerKind, delay: Duration, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);

        // Held across the spawn so the timer cannot deregister before it is
        // registered.
        let mut pending = self.inner.pending.lock();
        let inner = self.inner.clone();
        let task_key = key.to_string();
        let fire = move || {
            if inner.pending.lock().remove(&id).is_some() {
                tracing::trace!(key = %task_key, ?kind, "settle timer fired");
                f();
            }
        };

        let abort = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let handle = runtime.spawn(async move {
                    tokio::time::sleep(delay).await;
                    fire();
                });
                Some(handle.abort_handle())
            }
            Err(_) => {
                tracing::warn!(key, ?kind, "no tokio runtime, settle timer runs on a thread");
                std::thread::spawn(move || {
                    std::thread::sleep(delay);
                    fire();
                });
                None
            }
        };

        pending.insert(
            id,
            Pending {
                key: key.to_string(),
                kind,
                abort,
            },
        );
    }

    /// Abort every pending timer for `key`. Returns how many were aborted.
    pub fn cancel(&self, key: &str) -> usize {
        let mut pending = self.inner.pending.lock();
        let ids: Vec<u64> = pending
            .iter()
            .filter(|(_, p)| p.key == key)
            .map(|(id, _)| *id)
            .collect();
        for id in &ids {
            if let Some(p) = pending.remove(id) {
                tracing::trace!(key, kind = ?p.kind, "settle timer cancelled");
                if let Some(abort) = p.abort {
                    abort.abort();
                }
            }
        }
        ids.len()
    }

    /// Number of timers still waiting to fire for `key`.
    pub fn pending_for(&self, key: &str) -> usize {
        self.inner
            .pending
            .lock()
            .values()
            .filter(|p| p.key == key)
            .count()
    }

    pub fn pending_count(&self) -> usize {
        self.inner.pending.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let scheduler = Scheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let f = fired.clone();
        scheduler.schedule("a", TimerKind::Opened, Duration::from_millis(300), move || {
            f.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(scheduler.pending_for("a"), 1);

        tokio::time::sleep(Duration::from_millis(299)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn test_fires_without_runtime() {
        let scheduler = Scheduler::new();
        let (tx, rx) = std::sync::mpsc::channel();

        scheduler.schedule("a", TimerKind::Opened, Duration::from_millis(10), move || {
            let _ = tx.send(());
        });
        assert_eq!(scheduler.pending_for("a"), 1);

        rx.recv_timeout(Duration::from_secs(2))
            .expect("thread-backed timer should fire");
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn test_cancel_without_runtime() {
        let scheduler = Scheduler::new();
        let (tx, rx) = std::sync::mpsc::channel();

        scheduler.schedule("a", TimerKind::CloseEnded, Duration::from_millis(20), move || {
            let _ = tx.send(());
        });
        assert_eq!(scheduler.cancel("a"), 1);

        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_only_affects_key() {
        let scheduler = Scheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        for key in ["a", "a", "b"] {
            let f = fired.clone();
            scheduler.schedule(key, TimerKind::CloseEnded, Duration::from_millis(300), move || {
                f.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert_eq!(scheduler.cancel("a"), 2);
        assert_eq!(scheduler.cancel("a"), 0);
        assert_eq!(scheduler.pending_for("b"), 1);

        tokio::time::sleep(Duration::from_millis(400)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
