//! Thread-safe entry point for data produced outside the UI thread.
//!
//! Producers call [`UpdateSource::send`] from any thread. Every subscribed
//! model owns a queue the source pushes into; the model drains it on the UI
//! thread, so buffers themselves are never touched concurrently.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tracing::{debug, trace};

use crate::data_types::{CurveData, DataKind, PlottingItemData};
use crate::error::Result;
use crate::factory::PlottingItemDataFactory;

/// What a source delivers to its subscribers.
#[derive(Clone, Debug, PartialEq)]
pub enum SourceEvent {
    Data(PlottingItemData),
    /// A new "now" without data attached.
    Timestamp(f64),
}

/// Receives edited curves that should be written back to the producer.
pub type EditHandler = Box<dyn Fn(&CurveData) -> eyre::Result<()> + Send + Sync>;

type Queue = Arc<Mutex<VecDeque<SourceEvent>>>;

struct SourceInner {
    subscribers: Mutex<Vec<(u64, Queue)>>,
    next_id: AtomicU64,
    edit_handler: RwLock<Option<EditHandler>>,
    factory: PlottingItemDataFactory,
}

#[derive(Clone)]
pub struct UpdateSource {
    inner: Arc<SourceInner>,
}

impl fmt::Debug for UpdateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateSource")
            .field("subscribers", &self.subscriber_count())
            .finish_non_exhaustive()
    }
}

impl Default for UpdateSource {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateSource {
    pub fn new() -> Self {
        Self::with_factory(PlottingItemDataFactory::new())
    }

    /// Uses `factory` for [`send_value`](Self::send_value).
    pub fn with_factory(factory: PlottingItemDataFactory) -> Self {
        Self {
            inner: Arc::new(SourceInner {
                subscribers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
                edit_handler: RwLock::new(None),
                factory,
            }),
        }
    }

    pub fn factory(&self) -> &PlottingItemDataFactory {
        &self.inner.factory
    }

    /// Registers a new queue. Dropping the subscription unregisters it.
    pub fn subscribe(&self) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let queue = Queue::default();
        self.inner.subscribers.lock().push((id, queue.clone()));
        debug!(subscriber = id, "subscribed to update source");
        Subscription {
            id,
            source: Arc::downgrade(&self.inner),
            queue,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }

    /// Whether both handles refer to the same source.
    pub fn same_source(&self, other: &UpdateSource) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn send(&self, data: impl Into<PlottingItemData>) {
        self.publish(SourceEvent::Data(data.into()));
    }

    /// Breaks curves fed by this source at the current end.
    pub fn send_gap(&self) {
        self.publish(SourceEvent::Data(PlottingItemData::Gap));
    }

    /// Converts raw values with the factory and sends the result.
    pub fn send_value(&self, kind: DataKind, args: &[Value]) -> Result<()> {
        let data = self.inner.factory.transform(kind, args)?;
        self.publish(SourceEvent::Data(data));
        Ok(())
    }

    pub fn send_timestamp(&self, timestamp: f64) {
        self.publish(SourceEvent::Timestamp(timestamp));
    }

    fn publish(&self, event: SourceEvent) {
        let subscribers = self.inner.subscribers.lock();
        trace!(subscribers = subscribers.len(), "publishing source event");
        for (_, queue) in subscribers.iter() {
            queue.lock().push_back(event.clone());
        }
    }

    pub fn set_edit_handler<F>(&self, handler: F)
    where
        F: Fn(&CurveData) -> eyre::Result<()> + Send + Sync + 'static,
    {
        *self.inner.edit_handler.write() = Some(Box::new(handler));
    }

    pub fn clear_edit_handler(&self) {
        *self.inner.edit_handler.write() = None;
    }

    /// Passes an edited curve to the registered handler. Without a handler
    /// the edit is accepted and discarded.
    pub fn handle_data_model_edit(&self, data: &CurveData) -> eyre::Result<()> {
        match self.inner.edit_handler.read().as_ref() {
            Some(handler) => handler(data),
            None => {
                debug!(points = data.len(), "no edit handler registered, edit discarded");
                Ok(())
            }
        }
    }
}

/// Receiving end of an [`UpdateSource`].
pub struct Subscription {
    id: u64,
    source: Weak<SourceInner>,
    queue: Queue,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("pending", &self.pending())
            .finish()
    }
}

impl Subscription {
    /// Events received so far, in arrival order.
    pub fn drain(&self) -> Vec<SourceEvent> {
        self.queue.lock().drain(..).collect()
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Whether this subscription belongs to `source`.
    pub fn is_from(&self, source: &UpdateSource) -> bool {
        self.source
            .upgrade()
            .is_some_and(|inner| Arc::ptr_eq(&inner, &source.inner))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.source.upgrade() {
            inner.subscribers.lock().retain(|(id, _)| *id != self.id);
            debug!(subscriber = self.id, "unsubscribed from update source");
        }
    }
}
