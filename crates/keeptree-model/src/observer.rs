//! Observer registration and synchronous event delivery.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use keeptree_core::TreeEvent;

/// Receives every event published by a forest.
///
/// Delivery is synchronous: a mutation does not return before each
/// observer has seen its events, in publication order.
pub trait TreeObserver: Send {
    /// Handle one event.
    fn on_event(&mut self, event: &TreeEvent);
}

impl<F> TreeObserver for F
where
    F: FnMut(&TreeEvent) + Send,
{
    fn on_event(&mut self, event: &TreeEvent) {
        self(event)
    }
}

/// Handle returned by [`crate::Forest::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Registered observers in subscription order.
#[derive(Default)]
pub(crate) struct Observers {
    next_id: u64,
    list: Vec<(ObserverId, Box<dyn TreeObserver>)>,
}

impl Observers {
    pub(crate) fn subscribe(&mut self, observer: Box<dyn TreeObserver>) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.list.push((id, observer));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.list.len();
        self.list.retain(|(existing, _)| *existing != id);
        self.list.len() != before
    }

    pub(crate) fn notify(&mut self, event: &TreeEvent) {
        tracing::trace!(event = event.name(), group = %event.group(), "publishing tree event");
        for (_, observer) in &mut self.list {
            observer.on_event(event);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.list.len()
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("count", &self.list.len())
            .finish()
    }
}

/// Observer that keeps every event it receives.
///
/// Clones share the same buffer, so one clone can be subscribed while
/// another is kept for inspection.
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<TreeEvent>>>,
}

impl EventRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the events recorded so far.
    pub fn events(&self) -> Vec<TreeEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Take the recorded events, leaving the buffer empty.
    pub fn take(&self) -> Vec<TreeEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Event names in order, handy for asserting on brackets.
    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(TreeEvent::name).collect()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all recorded events.
    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl TreeObserver for EventRecorder {
    fn on_event(&mut self, event: &TreeEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
