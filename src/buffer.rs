//! Capacity bounded buffer kept sorted by x.
//!
//! Samples may arrive in any x order (live data interleaved with replayed
//! history); every insertion places the sample at its sorted position and
//! evicts the oldest entries once the capacity is exceeded. Equal x values
//! keep their arrival order, which also decides eviction among them.

use std::collections::VecDeque;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::clipping::calc_intersection;
use crate::data_types::{ColumnSet, CurveColumns, CurveData, PointData};
use crate::error::{DataModelError, Result};

/// One sample every 5 seconds over 24 hours.
pub const DEFAULT_BUFFER_SIZE: usize = 17280;

/// Batches at least this large are sorted in parallel.
const PARALLEL_SORT_THRESHOLD: usize = 8192;

/// Slice of a buffer returned by a window query.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Subset<C: ColumnSet> {
    pub x: Vec<f64>,
    pub columns: C,
    /// Entries at the front that lie before the requested window.
    pub leading: usize,
    /// Entries at the back that lie after the requested window.
    pub trailing: usize,
}

impl<C: ColumnSet> Subset<C> {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Index range of the entries lying inside the window.
    pub fn window_range(&self) -> std::ops::Range<usize> {
        self.leading..self.x.len() - self.trailing
    }
}

#[derive(Clone, Debug)]
pub struct SortedDataBuffer<C: ColumnSet> {
    x: VecDeque<f64>,
    columns: C,
    max_size: usize,
}

impl<C: ColumnSet> SortedDataBuffer<C> {
    pub fn new(max_size: usize) -> Result<Self> {
        validate_capacity(max_size)?;
        Ok(Self {
            x: VecDeque::new(),
            columns: C::default(),
            max_size,
        })
    }

    pub fn capacity(&self) -> usize {
        self.max_size
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn x(&self) -> &VecDeque<f64> {
        &self.x
    }

    pub fn columns(&self) -> &C {
        &self.columns
    }

    pub fn get(&self, index: usize) -> Option<(f64, C::Row)> {
        self.x.get(index).map(|x| (*x, self.columns.row(index)))
    }

    /// Copy of the whole buffer.
    pub fn snapshot(&self) -> (Vec<f64>, C) {
        (self.x.iter().copied().collect(), self.columns.clone())
    }

    /// Largest stored x.
    pub fn latest_x(&self) -> Option<f64> {
        self.x.back().copied()
    }

    /// Inserts one entry at its sorted position, after any entries with the
    /// same x. A `NaN` x can not be ordered: the entry is appended at the
    /// current end, taking the latest x as its position.
    pub fn insert_one(&mut self, x: f64, row: C::Row) {
        if x.is_nan() {
            match self.latest_x() {
                Some(last) => {
                    self.x.push_back(last);
                    self.columns.push(row);
                }
                None => debug!("dropping entry without x value inserted into an empty buffer"),
            }
        } else if self.latest_x().map_or(true, |last| x >= last) {
            self.x.push_back(x);
            self.columns.push(row);
        } else {
            let index = self.x.partition_point(|v| *v <= x);
            self.x.insert(index, x);
            self.columns.insert(index, row);
        }
        self.evict();
    }

    /// Appends a gap so the next entry is not connected to the previous one.
    /// Returns `false` if nothing was added: the column set has no gap
    /// representation, there is nothing to separate yet, or the buffer
    /// already ends in a gap.
    pub fn insert_gap(&mut self) -> bool {
        match (C::gap_row(), self.latest_x()) {
            (Some(row), Some(last)) => {
                if self.columns.is_gap(self.len() - 1) {
                    return false;
                }
                self.x.push_back(last);
                self.columns.push(row);
                self.evict();
                true
            }
            _ => false,
        }
    }

    /// Merges a batch in one pass. The batch does not have to be sorted;
    /// entries with a `NaN` x stay behind the entry preceding them in the
    /// batch.
    pub fn insert_batch(&mut self, xs: Vec<f64>, rows: C) -> Result<()> {
        if let Some(found) = rows.mismatched_len(xs.len()) {
            return Err(DataModelError::LengthMismatch {
                expected: xs.len(),
                found,
            });
        }
        if xs.is_empty() {
            return Ok(());
        }
        let Some(positions) = self.batch_positions(&xs) else {
            debug!("dropping batch without any x value inserted into an empty buffer");
            return Ok(());
        };

        let mut order: Vec<usize> = (0..positions.len()).collect();
        if order.len() >= PARALLEL_SORT_THRESHOLD {
            order.par_sort_by(|a, b| positions[*a].total_cmp(&positions[*b]));
        } else {
            order.sort_by(|a, b| positions[*a].total_cmp(&positions[*b]));
        }

        let first_new = positions[order[0]];
        if self.latest_x().map_or(true, |last| first_new >= last) {
            self.x.reserve(order.len());
            for i in order {
                self.x.push_back(positions[i]);
                self.columns.push(rows.row(i));
            }
        } else {
            self.merge(&positions, &order, &rows);
        }
        self.evict();
        Ok(())
    }

    /// Sort keys for a batch, or `None` if nothing in it can be placed.
    fn batch_positions(&self, xs: &[f64]) -> Option<Vec<f64>> {
        let first_valid = xs
            .iter()
            .copied()
            .find(|x| !x.is_nan())
            .or_else(|| self.latest_x())?;
        let mut previous = first_valid;
        Some(
            xs.iter()
                .map(|x| {
                    if !x.is_nan() {
                        previous = *x;
                    }
                    previous
                })
                .collect(),
        )
    }

    fn merge(&mut self, positions: &[f64], order: &[usize], rows: &C) {
        let total = self.x.len() + order.len();
        let mut x = VecDeque::with_capacity(total);
        let mut columns = C::with_capacity(total);
        let (mut i, mut j) = (0, 0);
        while i < self.x.len() || j < order.len() {
            let take_existing =
                j >= order.len() || (i < self.x.len() && self.x[i] <= positions[order[j]]);
            if take_existing {
                x.push_back(self.x[i]);
                columns.push(self.columns.row(i));
                i += 1;
            } else {
                x.push_back(positions[order[j]]);
                columns.push(rows.row(order[j]));
                j += 1;
            }
        }
        self.x = x;
        self.columns = columns;
    }

    fn evict(&mut self) {
        if self.x.len() > self.max_size {
            let excess = self.x.len() - self.max_size;
            self.x.drain(..excess);
            self.columns.drain_front(excess);
            debug!(evicted = excess, capacity = self.max_size, "buffer overflow");
        }
    }

    pub fn clear(&mut self) {
        self.x.clear();
        self.columns.clear();
    }

    /// Replaces the whole content.
    pub fn replace(&mut self, xs: Vec<f64>, rows: C) -> Result<()> {
        self.clear();
        self.insert_batch(xs, rows)
    }

    /// Removes the given positions; out of range indices are ignored.
    pub fn remove_indices(&mut self, indices: &[usize]) {
        let mut indices: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|i| *i < self.x.len())
            .collect();
        indices.sort_unstable();
        indices.dedup();
        for index in indices.into_iter().rev() {
            self.x.remove(index);
            self.columns.remove(index);
        }
    }

    /// Shrinking evicts the oldest entries immediately.
    pub fn set_capacity(&mut self, max_size: usize) -> Result<()> {
        validate_capacity(max_size)?;
        info!(old = self.max_size, new = max_size, "buffer capacity changed");
        self.max_size = max_size;
        self.evict();
        Ok(())
    }

    /// Index range of entries with `start <= x <= end`, without gaps at
    /// either edge.
    fn window(&self, start: f64, end: f64) -> Option<(usize, usize)> {
        if start.is_nan() || end.is_nan() || start > end {
            return None;
        }
        let mut lo = self.x.partition_point(|v| *v < start);
        let mut hi = self.x.partition_point(|v| *v <= end);
        while lo < hi && self.columns.is_gap(lo) {
            lo += 1;
        }
        while hi > lo && self.columns.is_gap(hi - 1) {
            hi -= 1;
        }
        Some((lo, hi))
    }

    /// Entries with `start <= x <= end`.
    pub fn subset_for_xrange(&self, start: f64, end: f64) -> Subset<C> {
        self.subset_for_xrange_padded(start, end, 0, 0)
    }

    /// Entries with `start <= x <= end`, widened by up to `before` entries
    /// preceding the window and `after` entries following it. Widening stops
    /// at a gap.
    pub fn subset_for_xrange_padded(
        &self,
        start: f64,
        end: f64,
        before: usize,
        after: usize,
    ) -> Subset<C> {
        let Some((lo, hi)) = self.window(start, end) else {
            return Subset::default();
        };
        let mut from = lo;
        while lo - from < before && from > 0 && !self.columns.is_gap(from - 1) {
            from -= 1;
        }
        let mut to = hi;
        while to - hi < after && to < self.x.len() && !self.columns.is_gap(to) {
            to += 1;
        }
        Subset {
            x: self.x.range(from..to).copied().collect(),
            columns: self.columns.slice(from..to),
            leading: lo - from,
            trailing: to - hi,
        }
    }

    /// Smallest positive distance between neighbouring x values.
    pub fn min_dx(&self) -> f64 {
        self.x
            .iter()
            .zip(self.x.iter().skip(1))
            .map(|(a, b)| b - a)
            .filter(|d| *d > f64::EPSILON)
            .fold(f64::INFINITY, f64::min)
    }

    /// Spacing to base bar widths on; 1.0 until two distinct x values exist.
    pub fn suggested_x_spacing(&self) -> f64 {
        let dx = self.min_dx();
        if dx.is_finite() {
            dx
        } else {
            1.0
        }
    }

    /// Returns the bounds of the data as (x_min, x_max, y_min, y_max).
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let (x_min, x_max) = (*self.x.front()?, *self.x.back()?);
        let (y_min, y_max) = self.y_range(x_min, x_max)?;
        Some((x_min, x_max, y_min, y_max))
    }

    /// Y-range within a specific X-window (for auto-scaling Y).
    pub fn y_range(&self, x_min: f64, x_max: f64) -> Option<(f64, f64)> {
        let (lo, hi) = self.window(x_min, x_max)?;
        (lo..hi)
            .filter_map(|i| self.columns.y_extent(i))
            .fold(None, |acc, (lo, hi)| match acc {
                None => Some((lo, hi)),
                Some((a, b)) => Some((f64::min(a, lo), f64::max(b, hi))),
            })
    }
}

impl SortedDataBuffer<CurveColumns> {
    /// Curve inside `[start, end]` with interpolated points added exactly on
    /// the boundaries where the line crosses them. Segments touching a gap
    /// are not interpolated.
    pub fn subset_for_xrange_interpolated(&self, start: f64, end: f64) -> CurveData {
        let Some((lo, hi)) = self.window(start, end) else {
            return CurveData::default();
        };
        let len = self.x.len();
        let point = |i: usize| PointData::new(self.x[i], self.columns.y[i]);

        let mut x = Vec::with_capacity(hi - lo + 2);
        let mut y = Vec::with_capacity(hi - lo + 2);
        if 0 < lo && lo < len && self.x[lo] != start {
            let (before, after) = (point(lo - 1), point(lo));
            if !before.is_nan() && !after.is_nan() {
                if let Some(p) = calc_intersection(before, after, start) {
                    x.push(p.x);
                    y.push(p.y);
                }
            }
        }
        x.extend(self.x.range(lo..hi));
        y.extend(self.columns.y.range(lo..hi));
        if 0 < hi && hi < len && self.x[hi - 1] != end {
            let (before, after) = (point(hi - 1), point(hi));
            if !before.is_nan() && !after.is_nan() {
                if let Some(p) = calc_intersection(before, after, end) {
                    x.push(p.x);
                    y.push(p.y);
                }
            }
        }
        CurveData { x, y }
    }
}

fn validate_capacity(max_size: usize) -> Result<()> {
    if max_size == 0 {
        return Err(DataModelError::InvalidConfiguration(
            "buffer capacity must hold at least one entry".into(),
        ));
    }
    Ok(())
}
