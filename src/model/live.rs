use std::fmt;
use std::marker::PhantomData;

use tracing::{debug, warn};

use super::{Entries, ItemKind, ListenerId, Listeners, ModelEvent, NonFittingDataReport};
use super::{BarKind, CurveKind, InjectionBarKind, TimestampMarkerKind};
use crate::buffer::{SortedDataBuffer, Subset, DEFAULT_BUFFER_SIZE};
use crate::data_types::{CurveData, PlottingItemData};
use crate::error::{DataModelError, Result};
use crate::source::{SourceEvent, Subscription, UpdateSource};
use crate::time_span::TimeSpan;

pub type LiveCurveDataModel = LiveDataModel<CurveKind>;
pub type LiveBarDataModel = LiveDataModel<BarKind>;
pub type LiveInjectionBarDataModel = LiveDataModel<InjectionBarKind>;
pub type LiveTimestampMarkerDataModel = LiveDataModel<TimestampMarkerKind>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelState {
    /// Subscribed, nothing buffered yet.
    Idle,
    /// Subscribed with buffered data.
    Receiving,
    /// Detached for good; further data is ignored.
    Disposed,
}

/// Data model accumulating everything its source sends into a sorted,
/// capacity bounded buffer.
pub struct LiveDataModel<K: ItemKind> {
    buffer: SortedDataBuffer<K::Columns>,
    source: UpdateSource,
    subscription: Option<Subscription>,
    listeners: Listeners,
    latest_timestamp: Option<f64>,
    non_fitting: NonFittingDataReport,
    _kind: PhantomData<K>,
}

impl<K: ItemKind> fmt::Debug for LiveDataModel<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveDataModel")
            .field("kind", &K::NAME)
            .field("len", &self.buffer.len())
            .field("capacity", &self.buffer.capacity())
            .field("state", &self.state())
            .finish()
    }
}

pub struct LiveDataModelBuilder<K: ItemKind> {
    source: Option<UpdateSource>,
    buffer_size: usize,
    _kind: PhantomData<K>,
}

impl<K: ItemKind> LiveDataModelBuilder<K> {
    pub fn source(mut self, source: &UpdateSource) -> Self {
        self.source = Some(source.clone());
        self
    }

    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn build(self) -> Result<LiveDataModel<K>> {
        let source = self.source.ok_or(DataModelError::MissingDataSource)?;
        let buffer = SortedDataBuffer::new(self.buffer_size)?;
        debug!(kind = K::NAME, capacity = self.buffer_size, "live data model created");
        Ok(LiveDataModel {
            buffer,
            subscription: Some(source.subscribe()),
            source,
            listeners: Listeners::default(),
            latest_timestamp: None,
            non_fitting: NonFittingDataReport::default(),
            _kind: PhantomData,
        })
    }
}

impl<K: ItemKind> LiveDataModel<K> {
    pub fn builder() -> LiveDataModelBuilder<K> {
        LiveDataModelBuilder {
            source: None,
            buffer_size: DEFAULT_BUFFER_SIZE,
            _kind: PhantomData,
        }
    }

    /// Model with the default buffer size.
    pub fn new(source: &UpdateSource) -> Result<Self> {
        Self::builder().source(source).build()
    }

    pub fn state(&self) -> ModelState {
        if self.subscription.is_none() {
            ModelState::Disposed
        } else if self.buffer.is_empty() {
            ModelState::Idle
        } else {
            ModelState::Receiving
        }
    }

    pub fn data_source(&self) -> &UpdateSource {
        &self.source
    }

    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&ModelEvent) + Send + 'static,
    {
        self.listeners.add(Box::new(listener))
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Applies everything the source delivered since the last call, in
    /// arrival order. Returns the number of events handled.
    pub fn process_pending(&mut self) -> usize {
        let Some(subscription) = &self.subscription else {
            return 0;
        };
        let events = subscription.drain();
        let count = events.len();
        for event in events {
            match event {
                SourceEvent::Data(data) => {
                    self.handle_data(&data);
                }
                SourceEvent::Timestamp(timestamp) => self.handle_timestamp(timestamp),
            }
        }
        count
    }

    /// Stores a record. Records that do not fit this model are ignored.
    /// Returns whether the stored data changed.
    pub fn handle_data(&mut self, data: &PlottingItemData) -> bool {
        if self.state() == ModelState::Disposed {
            return false;
        }
        let changed = match K::entries(data) {
            None => {
                self.non_fitting.report(data, K::NAME);
                false
            }
            Some(Entries::One { x, row }) => {
                self.buffer.insert_one(x, row);
                true
            }
            Some(Entries::Batch { x, columns }) => {
                if x.is_empty() {
                    false
                } else if let Err(e) = self.buffer.insert_batch(x, columns) {
                    warn!("{} dropped: {e}", data.type_name());
                    false
                } else {
                    true
                }
            }
            Some(Entries::Gap) => self.buffer.insert_gap(),
            Some(Entries::Nothing) => false,
        };
        if changed {
            self.listeners.notify(&ModelEvent::DataChanged);
        }
        changed
    }

    /// Records a "now" reported by the source without data.
    pub fn handle_timestamp(&mut self, timestamp: f64) {
        if timestamp.is_nan() {
            return;
        }
        self.latest_timestamp = Some(self.latest_timestamp.map_or(timestamp, |t| t.max(timestamp)));
    }

    /// Editing is meaningless for live data.
    pub fn handle_editing(&mut self, _data: &CurveData) {}

    /// Detaches from the current source and attaches to `source`.
    pub fn replace_data_source(&mut self, source: &UpdateSource, clear_buffer: bool) {
        if self.state() == ModelState::Disposed {
            return;
        }
        self.subscription = Some(source.subscribe());
        self.source = source.clone();
        if clear_buffer {
            self.buffer.clear();
            self.latest_timestamp = None;
            self.listeners.notify(&ModelEvent::DataChanged);
        }
        debug!(kind = K::NAME, clear_buffer, "data source replaced");
    }

    /// Unsubscribes from the source and drops all observers.
    pub fn dispose(&mut self) {
        self.subscription = None;
        self.listeners.clear();
        debug!(kind = K::NAME, "live data model disposed");
    }

    pub fn buffer(&self) -> &SortedDataBuffer<K::Columns> {
        &self.buffer
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn set_buffer_size(&mut self, buffer_size: usize) -> Result<()> {
        self.buffer.set_capacity(buffer_size)
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn min_dx(&self) -> f64 {
        self.buffer.min_dx()
    }

    /// Largest x in the buffer.
    pub fn max_primary_val(&self) -> Option<f64> {
        self.buffer.latest_x()
    }

    /// Most recent time known to the model, from data or timestamp events.
    pub fn latest_timestamp(&self) -> Option<f64> {
        match (self.latest_timestamp, self.buffer.latest_x()) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn full_data_buffer(&self) -> K::Collection {
        let (x, columns) = self.buffer.snapshot();
        K::collection(x, columns)
    }

    /// Entries inside `[start, end]` plus the neighbours this kind needs to
    /// draw shapes crossing the window boundaries.
    pub fn subset_for_xrange(&self, start: f64, end: f64) -> Subset<K::Columns> {
        let (before, after) = K::PADDING;
        self.buffer.subset_for_xrange_padded(start, end, before, after)
    }

    /// Window relative to [`latest_timestamp`](Self::latest_timestamp).
    pub fn subset_for_time_span(&self, time_span: &TimeSpan) -> Subset<K::Columns> {
        match self.latest_timestamp() {
            Some(latest) => {
                let (start, end) = time_span.window(latest);
                self.subset_for_xrange(start, end)
            }
            None => Subset::default(),
        }
    }
}

impl LiveDataModel<CurveKind> {
    /// Curve clipped to `[start, end]` with interpolated edge points.
    pub fn subset_for_xrange_interpolated(&self, start: f64, end: f64) -> CurveData {
        self.buffer.subset_for_xrange_interpolated(start, end)
    }
}
