//! Typed change channel shared by all widgets.
//!
//! Listeners run synchronously, in registration order, on the thread that
//! emits. Each event is then also published on a Tokio broadcast channel for
//! consumers that prefer to `recv().await`.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, Weak,
};

use tokio::sync::broadcast;

use crate::lock;

const BROADCAST_CAPACITY: usize = 1024;

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;
type ListenerList<E> = Mutex<Vec<(u64, Listener<E>)>>;

pub struct Emitter<E> {
    listeners: Arc<ListenerList<E>>,
    next_id: AtomicU64,
    broadcast: broadcast::Sender<E>,
}

impl<E: Clone + Send + Sync + 'static> Emitter<E> {
    pub fn new() -> Self {
        let (broadcast, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            listeners: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(0),
            broadcast,
        }
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.listeners).push((id, Arc::new(listener)));

        let listeners: Weak<ListenerList<E>> = Arc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                lock(&listeners).retain(|(existing, _)| *existing != id);
            }
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<E> {
        self.broadcast.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).len()
    }

    pub fn emit(&self, event: E) {
        // Snapshot so a listener may subscribe or unsubscribe while running.
        let listeners: Vec<Listener<E>> = lock(&self.listeners)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in &listeners {
            listener(&event);
        }

        // No receivers is the common case.
        let _ = self.broadcast.send(event);
    }
}

impl<E: Clone + Send + Sync + 'static> Default for Emitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps a listener registered until dropped.
#[must_use = "dropping a Subscription unsubscribes its listener"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Leaves the listener registered for as long as the emitter lives.
    pub fn detach(mut self) {
        self.cancel = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/emitter_tests.rs"]
mod tests;
