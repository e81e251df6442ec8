//! Parallel column storage for the secondary values of a sorted buffer.
//!
//! The x column is owned by the buffer itself; a [`ColumnSet`] holds every
//! other per-sample field and is always kept at the same length as x.
//! Columns are ring buffers so that evicting the oldest entries is cheap.

use std::collections::VecDeque;
use std::fmt::Debug;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Secondary columns belonging to a sorted buffer.
pub trait ColumnSet: Clone + Debug + Default + PartialEq + Send {
    /// One entry across all columns.
    type Row: Clone + Debug + PartialEq;

    fn with_capacity(capacity: usize) -> Self;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Length of the first column not holding `expected` entries. Column
    /// sets built field by field can be ragged.
    fn mismatched_len(&self, expected: usize) -> Option<usize>;
    fn push(&mut self, row: Self::Row);
    fn insert(&mut self, index: usize, row: Self::Row);
    fn remove(&mut self, index: usize);
    fn drain_front(&mut self, count: usize);
    fn row(&self, index: usize) -> Self::Row;
    fn slice(&self, range: Range<usize>) -> Self;
    fn clear(&mut self);

    /// Row stored for an explicit gap, for column sets that support gaps.
    fn gap_row() -> Option<Self::Row> {
        None
    }

    fn is_gap(&self, _index: usize) -> bool {
        false
    }

    /// Vertical extent of an entry, if it has one.
    fn y_extent(&self, _index: usize) -> Option<(f64, f64)> {
        None
    }
}

macro_rules! column_set {
    (
        $(#[$meta:meta])*
        $columns:ident / $row:ident { $($field:ident / $row_field:ident : $ty:ty),+ $(,)? }
        $($extra:tt)*
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
        pub struct $columns {
            $(pub $field: VecDeque<$ty>,)+
        }

        #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
        pub struct $row {
            $(pub $row_field: $ty,)+
        }

        impl ColumnSet for $columns {
            type Row = $row;

            fn with_capacity(capacity: usize) -> Self {
                Self {
                    $($field: VecDeque::with_capacity(capacity),)+
                }
            }

            fn len(&self) -> usize {
                [$(self.$field.len()),+][0]
            }

            fn mismatched_len(&self, expected: usize) -> Option<usize> {
                [$(self.$field.len()),+].into_iter().find(|len| *len != expected)
            }

            fn push(&mut self, row: $row) {
                $(self.$field.push_back(row.$row_field);)+
            }

            fn insert(&mut self, index: usize, row: $row) {
                $(self.$field.insert(index, row.$row_field);)+
            }

            fn remove(&mut self, index: usize) {
                $(self.$field.remove(index);)+
            }

            fn drain_front(&mut self, count: usize) {
                $(self.$field.drain(..count);)+
            }

            fn row(&self, index: usize) -> $row {
                $row {
                    $($row_field: self.$field[index].clone(),)+
                }
            }

            fn slice(&self, range: Range<usize>) -> Self {
                Self {
                    $($field: self.$field.range(range.clone()).cloned().collect(),)+
                }
            }

            fn clear(&mut self) {
                $(self.$field.clear();)+
            }

            $($extra)*
        }
    };
}

column_set! {
    /// Curve samples: y only. A `NaN` y breaks the line.
    CurveColumns / CurveRow { y / y: f64 }

    fn gap_row() -> Option<CurveRow> {
        Some(CurveRow { y: f64::NAN })
    }

    fn is_gap(&self, index: usize) -> bool {
        self.y[index].is_nan()
    }

    fn y_extent(&self, index: usize) -> Option<(f64, f64)> {
        let y = self.y[index];
        (!y.is_nan()).then_some((y, y))
    }
}

column_set! {
    BarColumns / BarRow { y / y: f64, heights / height: f64 }

    fn y_extent(&self, index: usize) -> Option<(f64, f64)> {
        bar_extent(self.y[index], self.heights[index])
    }
}

column_set! {
    InjectionBarColumns / InjectionBarRow {
        y / y: f64,
        heights / height: f64,
        widths / width: f64,
        labels / label: String,
    }

    fn y_extent(&self, index: usize) -> Option<(f64, f64)> {
        bar_extent(self.y[index], self.heights[index])
    }
}

column_set! {
    TimestampMarkerColumns / TimestampMarkerRow { colors / color: String, labels / label: String }
}

fn bar_extent(y: f64, height: f64) -> Option<(f64, f64)> {
    if y.is_nan() {
        return None;
    }
    let half = if height.is_nan() { 0.0 } else { height.abs() / 2.0 };
    Some((y - half, y + half))
}
