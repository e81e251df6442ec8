use std::fmt;

use tracing::{debug, error, info};

use super::{CurveKind, Entries, ItemKind, ListenerId, Listeners, ModelEvent, NonFittingDataReport};
use crate::buffer::SortedDataBuffer;
use crate::data_types::{CurveColumns, CurveData, PlottingItemData};
use crate::error::Result;
use crate::history::{History, MAX_ROLLBACK};
use crate::source::{SourceEvent, Subscription, UpdateSource};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditState {
    /// The current state is the one last received or committed.
    Clean,
    /// Local edits that were not sent yet.
    Dirty,
}

/// Static curve the user can edit, with undo/redo and sending the result
/// back to the source.
///
/// Data from the source replaces the curve and counts as committed. Every
/// edit is recorded in a [`History`] of full curve snapshots.
pub struct EditableCurveDataModel {
    buffer: SortedDataBuffer<CurveColumns>,
    history: History<CurveData>,
    committed: Option<CurveData>,
    source: UpdateSource,
    subscription: Subscription,
    listeners: Listeners,
    non_fitting: NonFittingDataReport,
}

impl fmt::Debug for EditableCurveDataModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditableCurveDataModel")
            .field("len", &self.buffer.len())
            .field("history", &self.history.len())
            .field("state", &self.edit_state())
            .finish()
    }
}

impl EditableCurveDataModel {
    pub fn new(source: &UpdateSource) -> Result<Self> {
        Self::with_history_capacity(source, MAX_ROLLBACK)
    }

    pub fn with_history_capacity(source: &UpdateSource, capacity: usize) -> Result<Self> {
        Ok(Self {
            // no eviction, edited curves are never trimmed
            buffer: SortedDataBuffer::new(usize::MAX)?,
            history: History::with_capacity(capacity),
            committed: None,
            source: source.clone(),
            subscription: source.subscribe(),
            listeners: Listeners::default(),
            non_fitting: NonFittingDataReport::default(),
        })
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

    /// Replaces the curve with data from the source. The new curve is the
    /// committed state.
    pub fn handle_data(&mut self, data: &PlottingItemData) -> bool {
        let curve = match CurveKind::entries(data) {
            Some(Entries::One { x, row }) => CurveData {
                x: vec![x],
                y: vec![row.y],
            },
            Some(Entries::Batch { x, columns }) => CurveKind::collection(x, columns),
            Some(Entries::Nothing) => return false,
            Some(Entries::Gap) | None => {
                self.non_fitting.report(data, "editable curve");
                return false;
            }
        };
        if !self.set_data(&curve) {
            return false;
        }
        let state = self.snapshot();
        self.history.save_state(state.clone());
        self.committed = Some(state);
        self.listeners.notify(&ModelEvent::DataChanged);
        true
    }

    /// Takes over a curve edited in the view. The change is local until
    /// [`commit`](Self::commit) is called.
    pub fn handle_editing(&mut self, data: &CurveData) {
        if self.set_data(data) {
            let state = self.snapshot();
            self.history.save_state(state);
        }
        self.listeners.notify(&ModelEvent::DataChanged);
    }

    /// Removes the points at `indices` and sorts `replacement` in by x. The
    /// two do not need to have the same length.
    pub fn replace_selection(&mut self, indices: &[usize], replacement: &CurveData) {
        if self.history.is_empty() {
            let before = self.snapshot();
            self.history.save_state(before);
        }
        self.buffer.remove_indices(indices);
        if let Err(e) = self.buffer.insert_batch(
            replacement.x.clone(),
            CurveColumns {
                y: replacement.y.clone().into(),
            },
        ) {
            error!("replacement for the selection dropped: {e}");
        }
        debug!(
            removed = indices.len(),
            inserted = replacement.len(),
            "selection replaced"
        );
        let after = self.snapshot();
        self.history.save_state(after);
        self.listeners.notify(&ModelEvent::DataChanged);
    }

    /// Positions of the points with `start <= x <= end`.
    pub fn selection_in_xrange(&self, start: f64, end: f64) -> Vec<usize> {
        if start > end {
            return Vec::new();
        }
        let x = self.buffer.x();
        let lo = x.partition_point(|v| *v < start);
        let hi = x.partition_point(|v| *v <= end);
        (lo..hi).collect()
    }

    pub fn undoable(&self) -> bool {
        self.history.undoable()
    }

    pub fn redoable(&self) -> bool {
        self.history.redoable()
    }

    /// Rolls back to the previous state. Returns whether there was one.
    pub fn undo(&mut self) -> bool {
        let Some(state) = self.history.undo().cloned() else {
            return false;
        };
        self.restore(&state);
        true
    }

    /// Moves forward to the next state. Returns whether there was one.
    pub fn redo(&mut self) -> bool {
        let Some(state) = self.history.redo().cloned() else {
            return false;
        };
        self.restore(&state);
        true
    }

    /// Whether the current state differs from what was last received or
    /// committed.
    pub fn sendable_state_exists(&self) -> bool {
        self.history.current_state().is_some_and(|state| {
            !self
                .committed
                .as_ref()
                .is_some_and(|committed| same_curve(committed, state))
        })
    }

    pub fn edit_state(&self) -> EditState {
        if self.sendable_state_exists() {
            EditState::Dirty
        } else {
            EditState::Clean
        }
    }

    /// Sends the current state to the source's edit handler. A failing
    /// handler is logged and reported as `false`.
    pub fn commit(&mut self) -> bool {
        if !self.sendable_state_exists() {
            return false;
        }
        let Some(state) = self.history.current_state().cloned() else {
            return false;
        };
        match self.source.handle_data_model_edit(&state) {
            Ok(()) => {
                info!(points = state.len(), "edited curve committed");
                self.listeners.notify(&ModelEvent::Edited(state.clone()));
                self.committed = Some(state);
                true
            }
            Err(e) => {
                error!("committing the edited curve failed: {e:?}");
                false
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn history(&self) -> &History<CurveData> {
        &self.history
    }

    pub fn full_data_buffer(&self) -> CurveData {
        self.snapshot()
    }

    fn snapshot(&self) -> CurveData {
        let (x, columns) = self.buffer.snapshot();
        CurveKind::collection(x, columns)
    }

    fn set_data(&mut self, data: &CurveData) -> bool {
        let replaced = self
            .buffer
            .replace(data.x.clone(), CurveColumns { y: data.y.clone().into() });
        match replaced {
            Ok(()) => true,
            Err(e) => {
                error!("curve can not be applied: {e}");
                false
            }
        }
    }

    fn restore(&mut self, state: &CurveData) {
        self.set_data(state);
        self.listeners.notify(&ModelEvent::DataChanged);
    }
}

/// Bitwise equality, so that gaps (`NaN`) compare equal to themselves.
fn same_curve(a: &CurveData, b: &CurveData) -> bool {
    fn same(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(l, r)| l.to_bits() == r.to_bits())
    }
    same(&a.x, &b.x) && same(&a.y, &b.y)
}
