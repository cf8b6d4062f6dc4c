use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, Weak,
};

use shared::{
    domain::{AggregateMap, TogglePair},
    error::{Diagnostic, ErrorKind},
    protocol::{AsyncGroupChanged, ToggleChanged},
};
use thiserror::Error;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, error, info};

use crate::{
    emitter::{Emitter, Subscription},
    lock,
    render::{NodeKind, RenderNode, Widget},
    source::PairSource,
    toggle::ToggleWidget,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PopulateError {
    #[error("failed to load toggle pairs: {0}")]
    Source(String),
    #[error("population cancelled before completion")]
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopulationStatus {
    Pending,
    Populated { children: usize },
    Failed(PopulateError),
    Cancelled,
}

impl PopulationStatus {
    fn outcome(&self) -> Option<Result<usize, PopulateError>> {
        match self {
            Self::Pending => None,
            Self::Populated { children } => Some(Ok(*children)),
            Self::Failed(err) => Some(Err(err.clone())),
            Self::Cancelled => Some(Err(PopulateError::Cancelled)),
        }
    }
}

/// A group of toggles whose rows come from an external source.
///
/// Construction returns immediately; children are created once the source
/// resolves and live as long as the widget. The value maps each child's name
/// to its state and is re-emitted whole on every child change.
pub struct AsyncGroupWidget {
    inner: Arc<GroupInner>,
    task: Mutex<Option<JoinHandle<()>>>,
}

struct GroupInner {
    children: Mutex<Vec<Arc<ToggleWidget>>>,
    subscriptions: Mutex<Vec<Subscription>>,
    value: Mutex<AggregateMap>,
    changes: Emitter<AsyncGroupChanged>,
    diagnostics: Emitter<Diagnostic>,
    cancelled: AtomicBool,
    status: watch::Sender<PopulationStatus>,
}

impl GroupInner {
    fn new() -> Self {
        let (status, _) = watch::channel(PopulationStatus::Pending);
        Self {
            children: Mutex::new(Vec::new()),
            subscriptions: Mutex::new(Vec::new()),
            value: Mutex::new(AggregateMap::new()),
            changes: Emitter::new(),
            diagnostics: Emitter::new(),
            cancelled: AtomicBool::new(false),
            status,
        }
    }

    /// Creates and subscribes one child per pair. The caller holds the
    /// children lock for the whole step.
    fn attach_children(
        self: &Arc<Self>,
        children: &mut Vec<Arc<ToggleWidget>>,
        pairs: Vec<TogglePair>,
    ) -> usize {
        for pair in pairs {
            let child = Arc::new(ToggleWidget::with_name_and_color(&pair.name, &pair.color));
            lock(&self.value).insert(pair.name.clone(), false);

            let group = Arc::downgrade(self);
            let name = pair.name;
            let subscription = child.on_change(move |change: &ToggleChanged| {
                if let Some(group) = group.upgrade() {
                    group.record(&name, change.value);
                }
            });

            lock(&self.subscriptions).push(subscription);
            children.push(child);
        }
        children.len()
    }

    fn record(&self, name: &str, checked: bool) {
        let snapshot = {
            let mut value = lock(&self.value);
            if let Some(entry) = value.get_mut(name) {
                *entry = checked;
            }
            value.clone()
        };
        debug!(name, checked, "async group entry changed");
        self.changes.emit(AsyncGroupChanged { value: snapshot });
    }

    /// Moves a pending status to its final state; settled states are kept.
    fn settle(&self, status: PopulationStatus) {
        self.status.send_if_modified(|current| {
            if *current == PopulationStatus::Pending {
                *current = status;
                true
            } else {
                false
            }
        });
    }
}

async fn populate(group: Weak<GroupInner>, source: Arc<dyn PairSource>) {
    let fetched = source.fetch_pairs().await;

    let Some(group) = group.upgrade() else {
        debug!("async group dropped before its source resolved");
        return;
    };

    // `cancel` flips the flag under the same lock, so children are attached
    // either entirely before a cancellation or not at all.
    let mut children = lock(&group.children);
    if group.cancelled.load(Ordering::SeqCst) {
        group.settle(PopulationStatus::Cancelled);
        return;
    }

    match fetched {
        Ok(pairs) => {
            let count = group.attach_children(&mut children, pairs);
            group.settle(PopulationStatus::Populated { children: count });
            drop(children);
            info!(children = count, "async group populated");
        }
        Err(err) => {
            let message = err.to_string();
            group.settle(PopulationStatus::Failed(PopulateError::Source(
                message.clone(),
            )));
            drop(children);
            error!(error = %err, "async group population failed");
            group
                .diagnostics
                .emit(Diagnostic::new(ErrorKind::Upstream, message));
        }
    }
}

impl AsyncGroupWidget {
    /// Starts loading rows from `source`. Must be called from within a Tokio
    /// runtime.
    pub fn spawn(source: Arc<dyn PairSource>) -> Self {
        let inner = Arc::new(GroupInner::new());
        let task = tokio::spawn(populate(Arc::downgrade(&inner), source));
        Self {
            inner,
            task: Mutex::new(Some(task)),
        }
    }

    pub fn value(&self) -> AggregateMap {
        lock(&self.inner.value).clone()
    }

    pub fn children(&self) -> Vec<Arc<ToggleWidget>> {
        lock(&self.inner.children).clone()
    }

    pub fn child(&self, name: &str) -> Option<Arc<ToggleWidget>> {
        lock(&self.inner.children)
            .iter()
            .find(|child| child.name() == name)
            .cloned()
    }

    pub fn status(&self) -> PopulationStatus {
        self.inner.status.borrow().clone()
    }

    pub fn watch_status(&self) -> watch::Receiver<PopulationStatus> {
        self.inner.status.subscribe()
    }

    /// Waits until population has settled and returns the number of children
    /// created.
    pub async fn populated(&self) -> Result<usize, PopulateError> {
        let mut status = self.inner.status.subscribe();
        let settled = status
            .wait_for(|status| *status != PopulationStatus::Pending)
            .await
            .map_err(|_| PopulateError::Cancelled)?;
        settled.outcome().unwrap_or(Err(PopulateError::Cancelled))
    }

    /// Stops a pending population. A source that resolves afterwards creates
    /// no children.
    pub fn cancel(&self) {
        {
            let _children = lock(&self.inner.children);
            self.inner.cancelled.store(true, Ordering::SeqCst);
            self.inner.settle(PopulationStatus::Cancelled);
        }
        if let Some(task) = lock(&self.task).take() {
            task.abort();
        }
    }

    /// Receives a report when the source fails.
    pub fn on_diagnostic<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&Diagnostic) + Send + Sync + 'static,
    {
        self.inner.diagnostics.subscribe(handler)
    }

    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<AsyncGroupChanged> {
        self.inner.changes.subscribe_events()
    }
}

impl Drop for AsyncGroupWidget {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl Widget for AsyncGroupWidget {
    type Change = AsyncGroupChanged;

    fn render(&self) -> RenderNode {
        lock(&self.inner.children)
            .iter()
            .fold(RenderNode::new(NodeKind::Container), |root, child| {
                root.with_child(child.render())
            })
    }

    fn on_change<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&AsyncGroupChanged) + Send + Sync + 'static,
    {
        self.inner.changes.subscribe(handler)
    }
}

#[cfg(test)]
#[path = "tests/async_group_tests.rs"]
mod tests;
