//! Per-panel capability returned by [`StackManager::open`].

use std::future::Future;
use std::sync::Weak;

use futures::future::Either;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::{Stream, StreamExt};

use crate::options::PanelOptions;
use crate::stack::{CloseEvent, Inner, Keyed, PanelEntry, StackManager};

/// Lets the opener of a panel close it and follow its lifecycle without
/// touching other panels.
///
/// Every observation filters the stack's shared channels by this handle's key.
/// The handle only holds a weak reference to its stack; once the stack is
/// dropped, `close` does nothing and the observers never fire.
#[derive(Debug, Clone)]
pub struct PanelHandle<C> {
    key: String,
    content: C,
    options: PanelOptions,
    state: bool,
    stack: Weak<Inner<C>>,
}

impl<C: Clone + Send + Sync + 'static> PanelHandle<C> {
    pub(crate) fn new(
        key: String,
        content: C,
        options: PanelOptions,
        state: bool,
        stack: Weak<Inner<C>>,
    ) -> Self {
        Self {
            key,
            content,
            options,
            state,
            stack,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn component_instance(&self) -> &C {
        &self.content
    }

    /// Options as resolved when the panel was opened.
    pub fn options(&self) -> &PanelOptions {
        &self.options
    }

    /// Every panel currently open on the owning stack.
    pub fn opened_panels(&self) -> Vec<PanelEntry<C>> {
        self.stack
            .upgrade()
            .map(|inner| StackManager::from_inner(inner).current_snapshot())
            .unwrap_or_default()
    }

    /// Open flag captured when the handle was created. Not updated on close.
    pub fn state(&self) -> bool {
        self.state
    }

    pub fn close(&self, result: Option<Value>) {
        if let Some(inner) = self.stack.upgrade() {
            StackManager::from_inner(inner).close_by_key(&self.key, result);
        }
    }

    /// Resolves with the close result once the close has settled.
    ///
    /// Subscribes immediately, so closes issued after this call are observed
    /// even if the future is first polled later. Never resolves if the panel
    /// is never closed.
    pub fn after_closed(&self) -> impl Future<Output = Option<Value>> + Send + 'static {
        let rx = self.stack.upgrade().map(|inner| inner.close_ended.subscribe());
        let key = self.key.clone();
        async move {
            let Some(rx) = rx else {
                return std::future::pending().await;
            };
            match next_for_key(rx, &key).await {
                Some(event) => event.result,
                None => std::future::pending().await,
            }
        }
    }

    /// Close results as each close of this key starts.
    pub fn before_closed(&self) -> impl Stream<Item = Option<Value>> + Send + 'static {
        let key = self.key.clone();
        let events = match self.stack.upgrade() {
            Some(inner) => Either::Left(inner.close_started.stream()),
            None => Either::Right(futures::stream::pending()),
        };
        events.filter_map(move |event: CloseEvent<C>| (event.key == key).then_some(event.result))
    }

    /// Resolves once the panel's open transition has settled.
    pub fn after_opened(&self) -> impl Future<Output = ()> + Send + 'static {
        let rx = self.stack.upgrade().map(|inner| inner.opened.subscribe());
        let key = self.key.clone();
        async move {
            let Some(rx) = rx else {
                return std::future::pending().await;
            };
            if next_for_key(rx, &key).await.is_none() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// First event on `rx` whose key matches. `None` once the stack is gone.
async fn next_for_key<T: Keyed>(mut rx: mpsc::UnboundedReceiver<T>, key: &str) -> Option<T> {
    while let Some(event) = rx.recv().await {
        if event.key() == key {
            return Some(event);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GlobalConfig;
    use crate::stack::SETTLE_DELAY;
    use serde_json::json;
    use std::time::Duration;

    fn stack() -> StackManager<String> {
        StackManager::new(GlobalConfig::default())
    }

    #[tokio::test]
    async fn test_introspection() {
        let stack = stack();
        let handle = stack.open("a", "content".to_string(), None);
        stack.open("b", "other".to_string(), None);

        assert_eq!(handle.key(), "a");
        assert_eq!(handle.component_instance(), "content");
        assert_eq!(handle.options().z_index, Some(1000));
        assert!(handle.state());

        let keys: Vec<_> = handle.opened_panels().into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_state_is_not_live() {
        let stack = stack();
        let handle = stack.open("a", String::new(), None);
        handle.close(None);
        assert!(handle.state());
        assert!(handle.opened_panels().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_resolves_after_closed() {
        let stack = stack();
        let handle = stack.open("a", String::new(), None);
        let closed = handle.after_closed();

        handle.close(Some(json!({"saved": true})));
        assert!(stack.is_empty());

        let result = tokio::time::timeout(SETTLE_DELAY * 2, closed)
            .await
            .expect("after_closed should resolve");
        assert_eq!(result, Some(json!({"saved": true})));
    }

    #[tokio::test(start_paused = true)]
    async fn test_before_closed_yields_result() {
        let stack = stack();
        let handle = stack.open("a", String::new(), None);
        let before = handle.before_closed();
        tokio::pin!(before);

        stack.close_topmost(Some(json!(42)));
        assert_eq!(before.next().await, Some(Some(json!(42))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_after_opened_fires_after_settle_delay() {
        let stack = stack();
        let handle = stack.open("a", String::new(), None);
        let opened = handle.after_opened();
        tokio::pin!(opened);

        tokio::time::sleep(SETTLE_DELAY - Duration::from_millis(1)).await;
        assert!(futures::poll!(&mut opened).is_pending());

        tokio::time::timeout(Duration::from_millis(50), opened)
            .await
            .expect("after_opened should resolve");
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_outliving_stack_is_inert() {
        let handle = {
            let stack = stack();
            stack.open("a", String::new(), None)
        };
        handle.close(None);
        assert!(handle.opened_panels().is_empty());

        let closed = tokio::time::timeout(SETTLE_DELAY * 2, handle.after_closed()).await;
        assert!(closed.is_err());
    }
}
