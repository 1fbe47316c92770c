//! The side-page stack: which panels are open, in what order, and the
//! lifecycle events around opening and closing them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::Stream;

use crate::broker::{Broker, Latest};
use crate::config::GlobalConfig;
use crate::handle::PanelHandle;
use crate::host::{DetachedHost, HostSurface};
use crate::options::PanelOptions;
use crate::scheduler::{Scheduler, TimerKind};

/// Interval between an append/remove and its "settled" notification, leaving
/// room for the enter/exit transition.
pub const SETTLE_DELAY: Duration = Duration::from_millis(300);

/// One open panel.
#[derive(Debug, Clone)]
pub struct PanelEntry<C> {
    pub key: String,
    pub content: C,
    /// Options resolved at open time.
    pub options: PanelOptions,
    /// True while the panel is considered open. Entries carried by close
    /// events have it cleared.
    pub open_state: bool,
    pub handle: PanelHandle<C>,
}

/// Fired [`SETTLE_DELAY`] after a panel was opened.
#[derive(Debug, Clone)]
pub struct OpenedEvent<C> {
    pub key: String,
    pub entry: PanelEntry<C>,
}

/// Fired when a close starts and again when it has settled.
#[derive(Debug, Clone)]
pub struct CloseEvent<C> {
    pub key: String,
    pub entry: PanelEntry<C>,
    pub result: Option<Value>,
}

/// Events that belong to a single panel key.
pub(crate) trait Keyed {
    fn key(&self) -> &str;
}

impl<C> Keyed for OpenedEvent<C> {
    fn key(&self) -> &str {
        &self.key
    }
}

impl<C> Keyed for CloseEvent<C> {
    fn key(&self) -> &str {
        &self.key
    }
}

/// Ordered stack of open panels.
///
/// Cloning is cheap and yields another view of the same stack. Independent
/// stacks (for example one per test) are built with separate calls to
/// [`StackManager::new`]. Opening and closing must happen inside a tokio
/// runtime because settle notifications run on timer tasks.
pub struct StackManager<C> {
    inner: Arc<Inner<C>>,
}

pub(crate) struct Inner<C> {
    entries: Mutex<Vec<PanelEntry<C>>>,
    pub(crate) snapshot: Latest<Vec<PanelEntry<C>>>,
    pub(crate) opened: Broker<OpenedEvent<C>>,
    pub(crate) close_started: Broker<CloseEvent<C>>,
    pub(crate) close_ended: Broker<CloseEvent<C>>,
    defaults: PanelOptions,
    global: PanelOptions,
    /// `defaults` with `global` layered on top, computed once.
    base: PanelOptions,
    host_mounted: AtomicBool,
    host: Arc<dyn HostSurface>,
    scheduler: Scheduler,
}

impl<C> Clone for StackManager<C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<C: Clone + Send + Sync + 'static> StackManager<C> {
    pub fn new(config: GlobalConfig) -> Self {
        Self::with_host(config, Arc::new(DetachedHost))
    }

    pub fn with_host(config: GlobalConfig, host: Arc<dyn HostSurface>) -> Self {
        let defaults = PanelOptions::defaults();
        let global = config.to_options();
        let base = defaults.merge(&global);
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(Vec::new()),
                snapshot: Latest::new(Vec::new()),
                opened: Broker::new(),
                close_started: Broker::new(),
                close_ended: Broker::new(),
                defaults,
                global,
                base,
                host_mounted: AtomicBool::new(false),
                host,
                scheduler: Scheduler::new(),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<Inner<C>>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<Inner<C>> {
        Arc::downgrade(&self.inner)
    }

    /// Open a panel on top of the stack.
    ///
    /// `options` are layered over the global config, which is layered over the
    /// built-in defaults. Keys are not validated: opening a key that is
    /// already on the stack logs a warning and pushes a second entry.
    pub fn open(
        &self,
        key: impl Into<String>,
        content: C,
        options: Option<PanelOptions>,
    ) -> PanelHandle<C> {
        let key = key.into();
        self.ensure_host_mounted();

        let resolved = match &options {
            Some(options) => self.inner.base.merge(options),
            None => self.inner.base.clone(),
        };
        let handle = PanelHandle::new(
            key.clone(),
            content.clone(),
            resolved.clone(),
            true,
            self.downgrade(),
        );
        let entry = PanelEntry {
            key: key.clone(),
            content,
            options: resolved,
            open_state: true,
            handle: handle.clone(),
        };

        let depth = {
            let mut entries = self.inner.entries.lock();
            if entries.iter().any(|e| e.key == key) {
                tracing::warn!(%key, "opening side page with a key that is already open");
            }
            entries.push(entry.clone());
            self.inner.snapshot.publish(entries.clone());
            entries.len()
        };
        tracing::debug!(%key, depth, "side page opened");
        self.sync_scroll_lock(depth);

        let opened = self.inner.opened.clone();
        let event = OpenedEvent {
            key: key.clone(),
            entry,
        };
        self.inner
            .scheduler
            .schedule(&key, TimerKind::Opened, SETTLE_DELAY, move || {
                opened.publish(event)
            });

        handle
    }

    /// [`StackManager::open`] with a freshly generated UUID key.
    pub fn open_with_generated_key(
        &self,
        content: C,
        options: Option<PanelOptions>,
    ) -> PanelHandle<C> {
        self.open(uuid::Uuid::new_v4().to_string(), content, options)
    }

    /// Close the topmost panel. No-op on an empty stack.
    pub fn close_topmost(&self, result: Option<Value>) -> bool {
        self.close_where(|entries| entries.len().checked_sub(1), result)
    }

    /// Close the panel opened with `key`. Unknown keys are ignored.
    ///
    /// When several open entries share `key`, the oldest one is closed.
    pub fn close_by_key(&self, key: &str, result: Option<Value>) -> bool {
        let closed = self.close_where(|entries| entries.iter().position(|e| e.key == key), result);
        if !closed {
            tracing::debug!(key, "close requested for unknown side page");
        }
        closed
    }

    /// Close requested from the host surface (backdrop or close button).
    /// Ignored when the panel was opened with `disableClose`.
    pub fn request_close(&self, key: &str, result: Option<Value>) -> bool {
        let disabled = self
            .inner
            .entries
            .lock()
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.options.is_close_disabled());
        match disabled {
            Some(true) => {
                tracing::debug!(key, "close request ignored, side page has disableClose");
                false
            }
            Some(false) => self.close_by_key(key, result),
            None => false,
        }
    }

    fn close_where<F>(&self, find: F, result: Option<Value>) -> bool
    where
        F: FnOnce(&[PanelEntry<C>]) -> Option<usize>,
    {
        let (event, depth) = {
            let mut entries = self.inner.entries.lock();
            let Some(index) = find(entries.as_slice()) else {
                return false;
            };

            let mut entry = entries[index].clone();
            entry.open_state = false;
            let event = CloseEvent {
                key: entry.key.clone(),
                entry,
                result,
            };

            // Subscribers see the start of the close before the entry leaves
            // the stack.
            self.inner.close_started.publish(event.clone());
            entries.remove(index);
            self.inner.snapshot.publish(entries.clone());
            (event, entries.len())
        };
        tracing::debug!(key = %event.key, depth, "side page closing");
        self.sync_scroll_lock(depth);

        let key = event.key.clone();
        let close_ended = self.inner.close_ended.clone();
        self.inner
            .scheduler
            .schedule(&key, TimerKind::CloseEnded, SETTLE_DELAY, move || {
                close_ended.publish(event)
            });
        true
    }

    fn ensure_host_mounted(&self) {
        if !self.inner.host_mounted.swap(true, Ordering::SeqCst) {
            tracing::debug!("mounting side page host surface");
            self.inner.host.mount();
        }
    }

    fn sync_scroll_lock(&self, depth: usize) {
        self.inner.host.set_scroll_lock(depth > 0);
    }

    /// Abort the pending "opened" and "closing ended" notifications for `key`.
    pub fn cancel_settle_timers(&self, key: &str) -> usize {
        self.inner.scheduler.cancel(key)
    }

    pub fn pending_settle_timers(&self, key: &str) -> usize {
        self.inner.scheduler.pending_for(key)
    }

    /// Open panels, oldest first.
    pub fn current_snapshot(&self) -> Vec<PanelEntry<C>> {
        self.inner.entries.lock().clone()
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner
            .entries
            .lock()
            .iter()
            .map(|e| e.key.clone())
            .collect()
    }

    pub fn topmost(&self) -> Option<PanelEntry<C>> {
        self.inner.entries.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn host_mounted(&self) -> bool {
        self.inner.host_mounted.load(Ordering::SeqCst)
    }

    pub fn default_options(&self) -> &PanelOptions {
        &self.inner.defaults
    }

    /// The global config as an option layer.
    pub fn global_options(&self) -> &PanelOptions {
        &self.inner.global
    }

    /// Snapshot receiver. The current list is queued first, followed by one
    /// snapshot per later change.
    pub fn subscribe_to_list(&self) -> mpsc::UnboundedReceiver<Vec<PanelEntry<C>>> {
        self.inner.snapshot.subscribe()
    }

    /// Snapshot stream starting with the current list.
    pub fn list_stream(&self) -> impl Stream<Item = Vec<PanelEntry<C>>> + Send + 'static {
        self.inner.snapshot.stream()
    }

    pub fn subscribe_opened(&self) -> mpsc::UnboundedReceiver<OpenedEvent<C>> {
        self.inner.opened.subscribe()
    }

    pub fn subscribe_close_started(&self) -> mpsc::UnboundedReceiver<CloseEvent<C>> {
        self.inner.close_started.subscribe()
    }

    pub fn subscribe_close_ended(&self) -> mpsc::UnboundedReceiver<CloseEvent<C>> {
        self.inner.close_ended.subscribe()
    }
}
