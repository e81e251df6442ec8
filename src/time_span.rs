//! Time windows relative to the most recent known timestamp.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DataModelError, Result};

/// Window of the form `[now - left, now - right]`, `now` being the most
/// recent timestamp known to a plot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TimeSpanRepr", into = "TimeSpanRepr")]
pub struct TimeSpan {
    left_boundary_offset: f64,
    right_boundary_offset: f64,
}

impl TimeSpan {
    /// `NaN` and negative infinity on the left mean "unbounded past"; a `NaN`
    /// or infinite right boundary falls back to 0.
    pub fn new(left: f64, right: f64) -> Result<Self> {
        let left = if left.is_nan() || left == f64::NEG_INFINITY {
            f64::INFINITY
        } else {
            left
        };
        let right = if right.is_finite() { right } else { 0.0 };
        if left < right {
            return Err(DataModelError::InvalidConfiguration(format!(
                "the left boundary (now - {left}) points to a more recent time stamp than the right boundary (now - {right})"
            )));
        }
        Ok(Self {
            left_boundary_offset: left,
            right_boundary_offset: right,
        })
    }

    /// The last `seconds` up to now.
    pub fn last(seconds: f64) -> Result<Self> {
        Self::new(seconds, 0.0)
    }

    /// Sixty seconds, the window a new plot starts with.
    pub fn default_window() -> Self {
        Self {
            left_boundary_offset: 60.0,
            right_boundary_offset: 0.0,
        }
    }

    /// Everything up to now.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn left_boundary_offset(&self) -> f64 {
        self.left_boundary_offset
    }

    pub fn right_boundary_offset(&self) -> f64 {
        self.right_boundary_offset
    }

    pub fn size(&self) -> f64 {
        (self.right_boundary_offset - self.left_boundary_offset).abs()
    }

    /// Whether the left boundary is defined.
    pub fn finite(&self) -> bool {
        self.left_boundary_offset.is_finite()
    }

    pub fn start(&self, latest: f64) -> f64 {
        latest - self.left_boundary_offset
    }

    pub fn end(&self, latest: f64) -> f64 {
        latest - self.right_boundary_offset
    }

    /// Absolute `(start, end)` of the window; start is `-inf` when unbounded.
    pub fn window(&self, latest: f64) -> (f64, f64) {
        (self.start(latest), self.end(latest))
    }
}

impl Default for TimeSpan {
    fn default() -> Self {
        Self {
            left_boundary_offset: f64::INFINITY,
            right_boundary_offset: 0.0,
        }
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[now - {}, now - {}]",
            self.left_boundary_offset, self.right_boundary_offset
        )
    }
}

/// JSON form: a number of seconds, `null` for unbounded, or an object with
/// optional `left`/`right` offsets.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum TimeSpanRepr {
    Seconds(f64),
    Bounds {
        #[serde(default)]
        left: Option<f64>,
        #[serde(default)]
        right: Option<f64>,
    },
    Unbounded,
}

impl TryFrom<TimeSpanRepr> for TimeSpan {
    type Error = DataModelError;

    fn try_from(repr: TimeSpanRepr) -> Result<Self> {
        match repr {
            TimeSpanRepr::Seconds(left) => TimeSpan::new(left, 0.0),
            TimeSpanRepr::Bounds { left, right } => TimeSpan::new(
                left.unwrap_or(f64::INFINITY),
                right.unwrap_or(0.0),
            ),
            TimeSpanRepr::Unbounded => Ok(TimeSpan::default()),
        }
    }
}

impl From<TimeSpan> for TimeSpanRepr {
    fn from(span: TimeSpan) -> Self {
        TimeSpanRepr::Bounds {
            left: span.finite().then_some(span.left_boundary_offset),
            right: Some(span.right_boundary_offset),
        }
    }
}

/// Cycle bookkeeping for sliding pointer (cyclic) plots.
///
/// Every cycle covers `size` seconds and is drawn into the same x range,
/// the one of the first cycle. The first timestamp seen anchors the cycles
/// unless a start was given explicitly.
#[derive(Clone, Debug, PartialEq)]
pub struct SlidingPointerTimeSpan {
    start: f64,
    end: f64,
    size: f64,
    number: f64,
    anchored: bool,
}

impl SlidingPointerTimeSpan {
    pub fn new(size: f64) -> Result<Self> {
        Self::with_start(0.0, size)
    }

    /// A start of 0 (or `NaN`) is replaced by the first timestamp.
    pub fn with_start(start: f64, size: f64) -> Result<Self> {
        if !size.is_finite() || size <= 0.0 {
            return Err(DataModelError::InvalidConfiguration(format!(
                "cycle size must be a positive finite number of seconds, got {size}"
            )));
        }
        let start = if start.is_nan() { 0.0 } else { start };
        Ok(Self {
            start,
            end: start + size,
            size,
            number: 0.0,
            anchored: start != 0.0,
        })
    }

    /// Moves the cycle pointer to the cycle containing `timestamp`.
    pub fn update(&mut self, timestamp: f64) {
        if !self.anchored {
            self.anchored = true;
            self.start = self.x_pos(timestamp);
            self.end = self.start + self.size * (self.number + 1.0);
        }
        self.number = ((timestamp - self.start).trunc() / self.size).floor();
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    /// Index of the current cycle, starting at 0.
    pub fn number(&self) -> f64 {
        self.number
    }

    /// Position of `timestamp` inside the fixed cycle range.
    pub fn x_pos(&self, timestamp: f64) -> f64 {
        timestamp - self.curr_offset()
    }

    pub fn curr_start(&self) -> f64 {
        self.start + self.number * self.size
    }

    pub fn prev_start(&self) -> f64 {
        self.start + (self.number - 1.0) * self.size
    }

    pub fn curr_end(&self) -> f64 {
        self.end + self.number * self.size
    }

    pub fn prev_end(&self) -> f64 {
        self.end + (self.number - 1.0) * self.size
    }

    pub fn curr_offset(&self) -> f64 {
        self.size * self.number
    }

    pub fn prev_offset(&self) -> f64 {
        self.size * (self.number - 1.0)
    }
}
