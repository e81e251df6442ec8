use std::fmt;
use std::marker::PhantomData;

use tracing::debug;

use super::{Entries, ItemKind, ListenerId, Listeners, ModelEvent, NonFittingDataReport};
use super::{BarKind, CurveKind, InjectionBarKind, TimestampMarkerKind};
use crate::data_types::{ColumnSet, PlottingItemData};
use crate::source::{SourceEvent, Subscription, UpdateSource};

pub type StaticCurveDataModel = StaticDataModel<CurveKind>;
pub type StaticBarDataModel = StaticDataModel<BarKind>;
pub type StaticInjectionBarDataModel = StaticDataModel<InjectionBarKind>;
pub type StaticTimestampMarkerDataModel = StaticDataModel<TimestampMarkerKind>;

/// Data model whose content is replaced by every record it receives.
/// Data is kept in the order it arrived.
pub struct StaticDataModel<K: ItemKind> {
    x: Vec<f64>,
    columns: K::Columns,
    source: UpdateSource,
    subscription: Subscription,
    listeners: Listeners,
    non_fitting: NonFittingDataReport,
    _kind: PhantomData<K>,
}

impl<K: ItemKind> fmt::Debug for StaticDataModel<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticDataModel")
            .field("kind", &K::NAME)
            .field("len", &self.x.len())
            .finish()
    }
}

impl<K: ItemKind> StaticDataModel<K> {
    pub fn new(source: &UpdateSource) -> Self {
        Self {
            x: Vec::new(),
            columns: K::Columns::default(),
            source: source.clone(),
            subscription: source.subscribe(),
            listeners: Listeners::default(),
            non_fitting: NonFittingDataReport::default(),
            _kind: PhantomData,
        }
    }

    pub fn data_source(&self) -> &UpdateSource {
        &self.source
    }

    pub fn replace_data_source(&mut self, source: &UpdateSource) {
        self.subscription = source.subscribe();
        self.source = source.clone();
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

    /// Only the data records matter; timestamps are ignored.
    pub fn process_pending(&mut self) -> usize {
        let events = self.subscription.drain();
        let count = events.len();
        for event in events {
            if let SourceEvent::Data(data) = event {
                self.handle_data(&data);
            }
        }
        count
    }

    /// Replaces the content with `data`. Returns whether it fitted.
    pub fn handle_data(&mut self, data: &PlottingItemData) -> bool {
        match K::entries(data) {
            Some(Entries::One { x, row }) => {
                let mut columns = K::Columns::with_capacity(1);
                columns.push(row);
                self.x = vec![x];
                self.columns = columns;
            }
            Some(Entries::Batch { x, columns }) => {
                self.x = x;
                self.columns = columns;
            }
            Some(Entries::Nothing) => return false,
            Some(Entries::Gap) | None => {
                self.non_fitting.report(data, K::NAME);
                return false;
            }
        }
        debug!(kind = K::NAME, len = self.x.len(), "static data replaced");
        self.listeners.notify(&ModelEvent::DataChanged);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn full_data_buffer(&self) -> K::Collection {
        K::collection(self.x.clone(), self.columns.clone())
    }
}
