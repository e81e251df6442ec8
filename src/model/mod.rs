//! Data models sitting between an [`UpdateSource`](crate::source::UpdateSource)
//! and a plot item.
//!
//! Every plotting style is an [`ItemKind`]: it names the buffer columns the
//! style needs and turns the records it understands into buffer entries.
//! [`LiveDataModel`] and [`StaticDataModel`] are generic over the kind;
//! [`EditableCurveDataModel`] is curve only.

mod editable;
mod live;
mod static_model;

pub use editable::*;
pub use live::*;
pub use static_model::*;

use std::fmt::Debug;

use crate::data_types::*;
use crate::error::DataWarning;

/// Entries extracted from one inbound record.
#[derive(Clone, Debug, PartialEq)]
pub enum Entries<C: ColumnSet> {
    One { x: f64, row: C::Row },
    Batch { x: Vec<f64>, columns: C },
    /// Break the line at the current end.
    Gap,
    /// The record fitted the model but nothing in it can be drawn.
    Nothing,
}

/// A plotting style as seen by the data models.
pub trait ItemKind: Send + 'static {
    type Columns: ColumnSet;
    /// Record handed out when the full content is requested.
    type Collection: Clone + Debug + PartialEq;

    const NAME: &'static str;

    /// Entries kept before and after a queried window, so that shapes
    /// reaching into the window from outside are still drawn.
    const PADDING: (usize, usize);

    /// Entries for `data`, or `None` if the record is not meant for this
    /// kind. Invalid entries are reported and left out.
    fn entries(data: &PlottingItemData) -> Option<Entries<Self::Columns>>;

    fn collection(x: Vec<f64>, columns: Self::Columns) -> Self::Collection;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CurveKind;

#[derive(Clone, Copy, Debug, Default)]
pub struct BarKind;

#[derive(Clone, Copy, Debug, Default)]
pub struct InjectionBarKind;

#[derive(Clone, Copy, Debug, Default)]
pub struct TimestampMarkerKind;

fn invalid<C: ColumnSet>(record: &PlottingItemData) -> Entries<C> {
    DataWarning::InvalidDataStructure(format!(
        "{} can not be drawn and is skipped",
        record.type_name()
    ))
    .emit();
    Entries::Nothing
}

/// Batch of the entries flagged valid. A record whose columns do not all
/// match its x column is dropped as a whole.
fn keep_valid<C: ColumnSet>(record: &str, x: &[f64], columns: C, validity: &[bool]) -> Entries<C> {
    if let Some(found) = columns.mismatched_len(x.len()) {
        DataWarning::InvalidDataStructure(format!(
            "{record} has {} x values but a column of {found} entries and is skipped",
            x.len()
        ))
        .emit();
        return Entries::Nothing;
    }
    let invalid = validity.iter().filter(|valid| !**valid).count();
    if invalid == 0 {
        return Entries::Batch {
            x: x.to_vec(),
            columns,
        };
    }
    DataWarning::InvalidDataStructure(format!(
        "{invalid} of {} entries of {record} can not be drawn and are skipped",
        x.len()
    ))
    .emit();
    let mut kept_x = Vec::with_capacity(x.len() - invalid);
    let mut kept = C::with_capacity(x.len() - invalid);
    for (i, _) in validity.iter().enumerate().filter(|(_, valid)| **valid) {
        kept_x.push(x[i]);
        kept.push(columns.row(i));
    }
    if kept_x.is_empty() {
        Entries::Nothing
    } else {
        Entries::Batch {
            x: kept_x,
            columns: kept,
        }
    }
}

impl ItemKind for CurveKind {
    type Columns = CurveColumns;
    type Collection = CurveData;

    const NAME: &'static str = "curve";
    const PADDING: (usize, usize) = (1, 0);

    fn entries(data: &PlottingItemData) -> Option<Entries<CurveColumns>> {
        let entries = match data {
            PlottingItemData::Gap => Entries::Gap,
            PlottingItemData::Point(p) if p.is_gap() => Entries::Gap,
            PlottingItemData::Point(p) if p.is_valid() => Entries::One {
                x: p.x,
                row: CurveRow { y: p.y },
            },
            PlottingItemData::Point(_) => invalid(data),
            PlottingItemData::Curve(c) => keep_valid(
                data.type_name(),
                &c.x,
                CurveColumns { y: c.y.clone().into() },
                &c.validity(),
            ),
            _ => return None,
        };
        Some(entries)
    }

    fn collection(x: Vec<f64>, columns: CurveColumns) -> CurveData {
        CurveData {
            x,
            y: columns.y.into(),
        }
    }
}

impl ItemKind for BarKind {
    type Columns = BarColumns;
    type Collection = BarCollectionData;

    const NAME: &'static str = "bar graph";
    const PADDING: (usize, usize) = (1, 1);

    fn entries(data: &PlottingItemData) -> Option<Entries<BarColumns>> {
        let entries = match data {
            PlottingItemData::Bar(b) if b.is_valid() => Entries::One {
                x: b.x,
                row: BarRow {
                    y: b.y,
                    height: b.height,
                },
            },
            PlottingItemData::Bar(_) => invalid(data),
            PlottingItemData::BarCollection(c) => keep_valid(
                data.type_name(),
                &c.x,
                BarColumns {
                    y: c.y.clone().into(),
                    heights: c.heights.clone().into(),
                },
                &c.validity(),
            ),
            _ => return None,
        };
        Some(entries)
    }

    fn collection(x: Vec<f64>, columns: BarColumns) -> BarCollectionData {
        BarCollectionData {
            x,
            y: columns.y.into(),
            heights: columns.heights.into(),
        }
    }
}

impl ItemKind for InjectionBarKind {
    type Columns = InjectionBarColumns;
    type Collection = InjectionBarCollectionData;

    const NAME: &'static str = "injection bar";
    const PADDING: (usize, usize) = (1, 1);

    fn entries(data: &PlottingItemData) -> Option<Entries<InjectionBarColumns>> {
        let entries = match data {
            PlottingItemData::InjectionBar(b) if b.is_valid() => Entries::One {
                x: b.x,
                row: InjectionBarRow {
                    y: b.y,
                    height: b.height,
                    width: b.width,
                    label: b.label.clone(),
                },
            },
            PlottingItemData::InjectionBar(_) => invalid(data),
            PlottingItemData::InjectionBarCollection(c) => keep_valid(
                data.type_name(),
                &c.x,
                InjectionBarColumns {
                    y: c.y.clone().into(),
                    heights: c.heights.clone().into(),
                    widths: c.widths.clone().into(),
                    labels: c.labels.clone().into(),
                },
                &c.validity(),
            ),
            _ => return None,
        };
        Some(entries)
    }

    fn collection(x: Vec<f64>, columns: InjectionBarColumns) -> InjectionBarCollectionData {
        InjectionBarCollectionData {
            x,
            y: columns.y.into(),
            heights: columns.heights.into(),
            widths: columns.widths.into(),
            labels: columns.labels.into(),
        }
    }
}

impl ItemKind for TimestampMarkerKind {
    type Columns = TimestampMarkerColumns;
    type Collection = TimestampMarkerCollectionData;

    const NAME: &'static str = "timestamp marker";
    const PADDING: (usize, usize) = (0, 0);

    fn entries(data: &PlottingItemData) -> Option<Entries<TimestampMarkerColumns>> {
        let entries = match data {
            PlottingItemData::TimestampMarker(m) if m.is_valid() => Entries::One {
                x: m.x,
                row: TimestampMarkerRow {
                    color: m.color.clone(),
                    label: m.label.clone(),
                },
            },
            PlottingItemData::TimestampMarker(_) => invalid(data),
            PlottingItemData::TimestampMarkerCollection(c) => keep_valid(
                data.type_name(),
                &c.x,
                TimestampMarkerColumns {
                    colors: c.colors.clone().into(),
                    labels: c.labels.clone().into(),
                },
                &c.validity(),
            ),
            _ => return None,
        };
        Some(entries)
    }

    fn collection(x: Vec<f64>, columns: TimestampMarkerColumns) -> TimestampMarkerCollectionData {
        TimestampMarkerCollectionData {
            x,
            colors: columns.colors.into(),
            labels: columns.labels.into(),
        }
    }
}

/// Notifications sent by a model to its observers.
#[derive(Clone, Debug, PartialEq)]
pub enum ModelEvent {
    /// The stored data changed.
    DataChanged,
    /// An edited curve was sent back to the source.
    Edited(CurveData),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn Fn(&ModelEvent) + Send>;

#[derive(Default)]
pub(crate) struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, Listener)>,
}

impl Listeners {
    pub(crate) fn add(&mut self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(existing, _)| *existing != id);
        self.entries.len() != before
    }

    pub(crate) fn notify(&self, event: &ModelEvent) {
        for (_, listener) in &self.entries {
            listener(event);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Warns once per model about records it can not handle, so one source can
/// feed several models without flooding the log.
#[derive(Debug, Default)]
pub(crate) struct NonFittingDataReport {
    printed: bool,
}

impl NonFittingDataReport {
    pub(crate) fn report(&mut self, data: &PlottingItemData, model: &str) {
        if self.printed {
            return;
        }
        self.printed = true;
        DataWarning::InvalidDataStructure(format!(
            "data of type {} does not fit this {model} data model and will be ignored",
            data.type_name()
        ))
        .emit();
    }
}
