use std::{sync::Arc, time::Duration};

use shared::domain::CollectionKind;
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::debug;

use crate::SelectionReconciler;

pub const DEFAULT_FILTER_DEBOUNCE: Duration = Duration::from_millis(300);

/// Coalesces filter keystrokes so only the value that stays put for `delay`
/// reaches [`SelectionReconciler::set_filter`].
pub struct FilterDebouncer {
    reconciler: Arc<SelectionReconciler>,
    kind: CollectionKind,
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl FilterDebouncer {
    pub fn new(reconciler: Arc<SelectionReconciler>, kind: CollectionKind, delay: Duration) -> Self {
        Self {
            reconciler,
            kind,
            delay,
            pending: Mutex::new(None),
        }
    }

    pub async fn push(&self, value: impl Into<String>) {
        let value = value.into();
        let reconciler = Arc::clone(&self.reconciler);
        let kind = self.kind;
        let delay = self.delay;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Detached so a later keystroke cannot abort a load half way.
            tokio::spawn(async move {
                let _ = reconciler.set_filter(kind, value).await;
            });
        });

        if let Some(previous) = self.pending.lock().await.replace(task) {
            debug!(collection = %kind, "pager: superseding pending filter");
            previous.abort();
        }
    }

    /// Drops a not-yet-fired filter change.
    pub async fn cancel(&self) {
        if let Some(task) = self.pending.lock().await.take() {
            task.abort();
        }
    }
}

impl Drop for FilterDebouncer {
    fn drop(&mut self) {
        if let Some(task) = self.pending.get_mut().take() {
            task.abort();
        }
    }
}

#[cfg(test)]
#[path = "tests/debounce_tests.rs"]
mod tests;
