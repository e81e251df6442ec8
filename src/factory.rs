//! Turns loosely shaped inbound values into typed records.
//!
//! Producers hand over positional JSON values, the way a control system
//! callback delivers them. Every [`DataKind`] has one transformation which
//! interprets those values; anything it can not interpret is reported as
//! [`DataModelError::UnsupportedDataShape`]. `null` stands for a missing
//! number.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::data_types::*;
use crate::error::{DataModelError, Result};

/// Header keys carrying the acquisition time of a value.
pub const TIMESTAMP_KEYS: [&str; 3] = ["acqStamp", "acq_stamp", "timestamp"];

/// Source of "now", in seconds since the epoch.
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        to_seconds(Utc::now())
    }
}

/// Always reports the same time.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub f64);

impl Clock for FixedClock {
    fn now(&self) -> f64 {
        self.0
    }
}

fn to_seconds(time: DateTime<Utc>) -> f64 {
    time.timestamp_micros() as f64 / 1e6
}

/// Positional arguments plus the time to use when no x is given.
pub type Transformation = fn(&[Value], f64) -> Result<PlottingItemData>;

#[derive(Clone)]
pub struct PlottingItemDataFactory {
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for PlottingItemDataFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlottingItemDataFactory").finish_non_exhaustive()
    }
}

impl Default for PlottingItemDataFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl PlottingItemDataFactory {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            clock: Arc::new(clock),
        }
    }

    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Builds a record of the given kind.
    ///
    /// A trailing header object with one of [`TIMESTAMP_KEYS`] replaces the
    /// wall clock as default x. Arguments wrapped into one extra sequence are
    /// unwrapped first, and a single JSON object is read as the record
    /// itself.
    pub fn transform(&self, kind: DataKind, args: &[Value]) -> Result<PlottingItemData> {
        let mut args = args.to_vec();
        let mut header = extract_header(&mut args)?;
        if Self::should_unwrap(&args, kind) {
            if let Some(Value::Array(inner)) = args.pop() {
                args = inner;
            }
            if header.is_none() {
                header = extract_header(&mut args)?;
            }
        }
        if let [Value::Object(_)] = args.as_slice() {
            return from_structured(kind, args.remove(0));
        }
        let now = header.unwrap_or_else(|| self.clock.now());
        (Self::get_transformation(kind))(&args, now)
    }

    /// Whether `args` is the real argument list wrapped into one more
    /// sequence. For scalar kinds any single array argument is unwrapped;
    /// for collections only a single array made of arrays, since a single
    /// array of numbers already is a column.
    pub fn should_unwrap(args: &[Value], kind: DataKind) -> bool {
        match args {
            [Value::Array(inner)] if kind.is_collection() => {
                !inner.is_empty() && inner.iter().all(Value::is_array)
            }
            [Value::Array(_)] => true,
            _ => false,
        }
    }

    pub fn get_transformation(kind: DataKind) -> Transformation {
        match kind {
            DataKind::Point => to_point,
            DataKind::Bar => to_bar,
            DataKind::InjectionBar => to_injection_bar,
            DataKind::TimestampMarker => to_timestamp_marker,
            DataKind::Curve => to_curve,
            DataKind::BarCollection => to_bar_collection,
            DataKind::InjectionBarCollection => to_injection_bar_collection,
            DataKind::TimestampMarkerCollection => to_timestamp_marker_collection,
        }
    }
}

/// Pops a trailing header and returns its timestamp.
fn extract_header(args: &mut Vec<Value>) -> Result<Option<f64>> {
    let Some(Value::Object(map)) = args.last() else {
        return Ok(None);
    };
    let Some(stamp) = TIMESTAMP_KEYS.iter().find_map(|key| map.get(*key)) else {
        return Ok(None);
    };
    let seconds = match stamp {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| to_seconds(t.with_timezone(&Utc))),
        _ => None,
    }
    .ok_or_else(|| unsupported(format!("header timestamp {stamp} is not a time")))?;
    args.pop();
    Ok(Some(seconds))
}

fn from_structured(kind: DataKind, value: Value) -> Result<PlottingItemData> {
    fn read<T: DeserializeOwned>(kind: DataKind, value: Value) -> Result<T> {
        serde_json::from_value(value)
            .map_err(|e| unsupported(format!("object is not a {kind:?} record: {e}")))
    }
    let record: PlottingItemData = match kind {
        DataKind::Point => read::<PointData>(kind, value)?.into(),
        DataKind::Bar => {
            let b: BarData = read(kind, value)?;
            BarData::new(b.x, b.y, b.height).into()
        }
        DataKind::InjectionBar => read::<InjectionBarData>(kind, value)?.into(),
        DataKind::TimestampMarker => {
            let m: TimestampMarkerData = read(kind, value)?;
            TimestampMarkerData::new(m.x, &m.color, m.label).into()
        }
        DataKind::Curve => {
            let c: CurveData = read(kind, value)?;
            CurveData::new(c.x, c.y)?.into()
        }
        DataKind::BarCollection => {
            let c: BarCollectionData = read(kind, value)?;
            BarCollectionData::new(c.x, c.y, c.heights)?.into()
        }
        DataKind::InjectionBarCollection => {
            let c: InjectionBarCollectionData = read(kind, value)?;
            InjectionBarCollectionData::new(c.x, c.y, c.heights, c.widths, c.labels)?.into()
        }
        DataKind::TimestampMarkerCollection => {
            let c: TimestampMarkerCollectionData = read(kind, value)?;
            TimestampMarkerCollectionData::new(c.x, c.colors, c.labels)?.into()
        }
    };
    Ok(record)
}

fn unsupported(message: impl Into<String>) -> DataModelError {
    DataModelError::UnsupportedDataShape(message.into())
}

fn arity_error(kind: &str, found: usize) -> DataModelError {
    unsupported(format!("{found} arguments can not be turned into {kind}"))
}

fn number(value: &Value) -> Result<f64> {
    match value {
        Value::Null => Ok(f64::NAN),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| unsupported(format!("{n} is not representable as a float"))),
        other => Err(unsupported(format!("expected a number, got {other}"))),
    }
}

fn text(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Null => Ok(String::new()),
        other => Err(unsupported(format!("expected a string, got {other}"))),
    }
}

/// A numeric column; a bare number is a column of one.
fn numbers(value: &Value) -> Result<Vec<f64>> {
    match value {
        Value::Array(items) => items.iter().map(number).collect(),
        other => Ok(vec![number(other)?]),
    }
}

fn texts(value: &Value) -> Result<Vec<String>> {
    match value {
        Value::Array(items) => items.iter().map(text).collect(),
        other => Ok(vec![text(other)?]),
    }
}

fn is_text_column(value: &Value) -> bool {
    match value {
        Value::String(_) => true,
        Value::Array(items) => !items.is_empty() && items.iter().all(Value::is_string),
        _ => false,
    }
}

fn index_column(len: usize) -> Vec<f64> {
    (0..len).map(|i| i as f64).collect()
}

/// Splits arguments into numeric ones and at most one label, which may sit
/// at any position.
fn split_label<'a>(args: &'a [Value], kind: &str) -> Result<(Vec<&'a Value>, Option<&'a Value>)> {
    let (labels, values): (Vec<&Value>, Vec<&Value>) = args.iter().partition(|v| is_text_column(v));
    if labels.len() > 1 {
        return Err(unsupported(format!("{kind} takes at most one label argument")));
    }
    if values.is_empty() || values.len() > 4 {
        return Err(arity_error(kind, args.len()));
    }
    Ok((values, labels.first().copied()))
}

fn to_point(args: &[Value], now: f64) -> Result<PlottingItemData> {
    let (y, x) = match args {
        [y] => (number(y)?, now),
        [y, x] => (number(y)?, number(x)?),
        _ => return Err(arity_error("PointData", args.len())),
    };
    Ok(PointData::new(x, y).into())
}

fn to_bar(args: &[Value], now: f64) -> Result<PlottingItemData> {
    let (height, y, x) = match args {
        [h] => (number(h)?, 0.0, now),
        [h, y] => (number(h)?, number(y)?, now),
        [h, y, x] => (number(h)?, number(y)?, number(x)?),
        _ => return Err(arity_error("BarData", args.len())),
    };
    Ok(BarData::new(x, y, height).into())
}

fn to_injection_bar(args: &[Value], now: f64) -> Result<PlottingItemData> {
    let (values, label) = split_label(args, "InjectionBarData")?;
    let values = values.into_iter().map(number).collect::<Result<Vec<_>>>()?;
    let label = label.map(text).transpose()?.unwrap_or_default();
    let nth = |i: usize, default: f64| values.get(i).copied().unwrap_or(default);
    Ok(InjectionBarData::new(
        nth(3, now),
        nth(1, f64::NAN),
        nth(0, f64::NAN),
        nth(2, f64::NAN),
        label,
    )
    .into())
}

fn to_timestamp_marker(args: &[Value], now: f64) -> Result<PlottingItemData> {
    let marker = match args {
        [] => TimestampMarkerData::new(now, DEFAULT_COLOR, ""),
        [x] => TimestampMarkerData::new(number(x)?, DEFAULT_COLOR, ""),
        [x, label] => TimestampMarkerData::new(number(x)?, DEFAULT_COLOR, text(label)?),
        [x, label, color] => TimestampMarkerData::new(number(x)?, &text(color)?, text(label)?),
        _ => return Err(arity_error("TimestampMarkerData", args.len())),
    };
    Ok(marker.into())
}

fn to_curve(args: &[Value], _now: f64) -> Result<PlottingItemData> {
    let (x, y) = match args {
        [ys] => {
            let y = numbers(ys)?;
            (index_column(y.len()), y)
        }
        [ys, xs] => (numbers(xs)?, numbers(ys)?),
        _ => return Err(arity_error("CurveData", args.len())),
    };
    Ok(CurveData::new(x, y)?.into())
}

fn to_bar_collection(args: &[Value], _now: f64) -> Result<PlottingItemData> {
    let (heights, y, x) = match args {
        [hs] => {
            let heights = numbers(hs)?;
            let n = heights.len();
            (heights, vec![0.0; n], index_column(n))
        }
        [hs, ys] => {
            let heights = numbers(hs)?;
            let n = heights.len();
            (heights, numbers(ys)?, index_column(n))
        }
        [hs, ys, xs] => (numbers(hs)?, numbers(ys)?, numbers(xs)?),
        _ => return Err(arity_error("BarCollectionData", args.len())),
    };
    Ok(BarCollectionData::new(x, y, heights)?.into())
}

fn to_injection_bar_collection(args: &[Value], _now: f64) -> Result<PlottingItemData> {
    let (values, labels) = split_label(args, "InjectionBarCollectionData")?;
    let columns = values
        .into_iter()
        .map(numbers)
        .collect::<Result<Vec<_>>>()?;
    let n = columns[0].len();
    let column = |i: usize, default: Vec<f64>| columns.get(i).cloned().unwrap_or(default);
    let labels = match labels {
        Some(labels) => texts(labels)?,
        None => vec![String::new(); n],
    };
    Ok(InjectionBarCollectionData::new(
        column(3, index_column(n)),
        column(1, vec![f64::NAN; n]),
        column(0, Vec::new()),
        column(2, vec![0.0; n]),
        labels,
    )?
    .into())
}

fn to_timestamp_marker_collection(args: &[Value], _now: f64) -> Result<PlottingItemData> {
    let (x, labels, colors) = match args {
        [xs] => {
            let x = numbers(xs)?;
            let n = x.len();
            (x, vec![String::new(); n], vec![DEFAULT_COLOR.to_string(); n])
        }
        [xs, ls] => {
            let x = numbers(xs)?;
            let n = x.len();
            (x, texts(ls)?, vec![DEFAULT_COLOR.to_string(); n])
        }
        [xs, ls, cs] => (numbers(xs)?, texts(ls)?, texts(cs)?),
        _ => return Err(arity_error("TimestampMarkerCollectionData", args.len())),
    };
    Ok(TimestampMarkerCollectionData::new(x, colors, labels)?.into())
}
