//! Typed records emitted by update sources.
//!
//! Each plotting style has a scalar record (one entry) and a collection
//! record (parallel arrays). Missing numeric values are `NaN`; when records
//! travel through JSON, `null` stands for `NaN`.

use serde::{Deserialize, Deserializer, Serialize};

use super::color::{validated_color, DEFAULT_COLOR};
use crate::error::{DataModelError, Result};

mod nan_as_null {
    use super::*;

    pub fn scalar<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }

    pub fn vec<'de, D>(deserializer: D) -> std::result::Result<Vec<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let values = Vec::<Option<f64>>::deserialize(deserializer)?;
        Ok(values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }

    pub fn nan() -> f64 {
        f64::NAN
    }
}

fn check_len(expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(DataModelError::LengthMismatch { expected, found });
    }
    Ok(())
}

fn nan_to_zero(values: Vec<f64>) -> Vec<f64> {
    values
        .into_iter()
        .map(|v| if v.is_nan() { 0.0 } else { v })
        .collect()
}

/// A single curve sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointData {
    #[serde(deserialize_with = "nan_as_null::scalar", default = "nan_as_null::nan")]
    pub x: f64,
    #[serde(deserialize_with = "nan_as_null::scalar", default = "nan_as_null::nan")]
    pub y: f64,
}

impl PointData {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// A point with both coordinates `NaN`, used to break a curve.
    pub fn gap() -> Self {
        Self {
            x: f64::NAN,
            y: f64::NAN,
        }
    }

    /// A point without a usable x can not be placed, unless it is a gap.
    pub fn is_valid(&self) -> bool {
        !(self.x.is_nan() && !self.y.is_nan())
    }

    pub fn is_gap(&self) -> bool {
        self.x.is_nan() && self.y.is_nan()
    }

    pub fn is_nan(&self) -> bool {
        self.x.is_nan() || self.y.is_nan()
    }
}

/// A batch of curve samples.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CurveData {
    #[serde(deserialize_with = "nan_as_null::vec")]
    pub x: Vec<f64>,
    #[serde(deserialize_with = "nan_as_null::vec")]
    pub y: Vec<f64>,
}

impl CurveData {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Self> {
        check_len(x.len(), y.len())?;
        Ok(Self { x, y })
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn point(&self, index: usize) -> PointData {
        PointData::new(self.x[index], self.y[index])
    }

    /// Per-entry validity, following the rules of [`PointData::is_valid`].
    pub fn validity(&self) -> Vec<bool> {
        self.x
            .iter()
            .zip(&self.y)
            .map(|(x, y)| PointData::new(*x, *y).is_valid())
            .collect()
    }
}

/// A single bar. `y` is the vertical center of the bar.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BarData {
    #[serde(deserialize_with = "nan_as_null::scalar", default = "nan_as_null::nan")]
    pub x: f64,
    #[serde(deserialize_with = "nan_as_null::scalar", default)]
    pub y: f64,
    #[serde(deserialize_with = "nan_as_null::scalar", default = "nan_as_null::nan")]
    pub height: f64,
}

impl BarData {
    /// A `NaN` center is replaced with 0, otherwise the bar could not be drawn.
    pub fn new(x: f64, y: f64, height: f64) -> Self {
        Self {
            x,
            y: if y.is_nan() { 0.0 } else { y },
            height,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.x.is_nan() && !self.height.is_nan()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BarCollectionData {
    #[serde(deserialize_with = "nan_as_null::vec")]
    pub x: Vec<f64>,
    #[serde(deserialize_with = "nan_as_null::vec")]
    pub y: Vec<f64>,
    #[serde(deserialize_with = "nan_as_null::vec")]
    pub heights: Vec<f64>,
}

impl BarCollectionData {
    pub fn new(x: Vec<f64>, y: Vec<f64>, heights: Vec<f64>) -> Result<Self> {
        check_len(x.len(), y.len())?;
        check_len(x.len(), heights.len())?;
        Ok(Self {
            x,
            y: nan_to_zero(y),
            heights,
        })
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn bar(&self, index: usize) -> BarData {
        BarData::new(self.x[index], self.y[index], self.heights[index])
    }

    pub fn validity(&self) -> Vec<bool> {
        self.x
            .iter()
            .zip(&self.y)
            .zip(&self.heights)
            .map(|((x, y), height)| BarData::new(*x, *y, *height).is_valid())
            .collect()
    }
}

/// A bar with an error-bar style shape and a text label.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InjectionBarData {
    #[serde(deserialize_with = "nan_as_null::scalar", default = "nan_as_null::nan")]
    pub x: f64,
    #[serde(deserialize_with = "nan_as_null::scalar", default = "nan_as_null::nan")]
    pub y: f64,
    #[serde(deserialize_with = "nan_as_null::scalar", default = "nan_as_null::nan")]
    pub height: f64,
    #[serde(deserialize_with = "nan_as_null::scalar", default = "nan_as_null::nan")]
    pub width: f64,
    #[serde(default)]
    pub label: String,
}

impl InjectionBarData {
    pub fn new(x: f64, y: f64, height: f64, width: f64, label: impl Into<String>) -> Self {
        Self {
            x,
            y,
            height,
            width,
            label: label.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.x.is_nan() && !self.y.is_nan()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InjectionBarCollectionData {
    #[serde(deserialize_with = "nan_as_null::vec")]
    pub x: Vec<f64>,
    #[serde(deserialize_with = "nan_as_null::vec")]
    pub y: Vec<f64>,
    #[serde(deserialize_with = "nan_as_null::vec")]
    pub heights: Vec<f64>,
    #[serde(deserialize_with = "nan_as_null::vec")]
    pub widths: Vec<f64>,
    pub labels: Vec<String>,
}

impl InjectionBarCollectionData {
    /// `NaN` heights and widths are replaced with 0.
    pub fn new(
        x: Vec<f64>,
        y: Vec<f64>,
        heights: Vec<f64>,
        widths: Vec<f64>,
        labels: Vec<String>,
    ) -> Result<Self> {
        let n = x.len();
        check_len(n, y.len())?;
        check_len(n, heights.len())?;
        check_len(n, widths.len())?;
        check_len(n, labels.len())?;
        Ok(Self {
            x,
            y,
            heights: nan_to_zero(heights),
            widths: nan_to_zero(widths),
            labels,
        })
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn bar(&self, index: usize) -> InjectionBarData {
        InjectionBarData::new(
            self.x[index],
            self.y[index],
            self.heights[index],
            self.widths[index],
            self.labels[index].clone(),
        )
    }

    pub fn validity(&self) -> Vec<bool> {
        self.x
            .iter()
            .zip(&self.y)
            .map(|(x, y)| !x.is_nan() && !y.is_nan())
            .collect()
    }
}

/// A vertical line marking a point in time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimestampMarkerData {
    #[serde(deserialize_with = "nan_as_null::scalar", default = "nan_as_null::nan")]
    pub x: f64,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub label: String,
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

impl TimestampMarkerData {
    /// Colors that can not be interpreted fall back to [`DEFAULT_COLOR`].
    pub fn new(x: f64, color: &str, label: impl Into<String>) -> Self {
        Self {
            x,
            color: validated_color(color),
            label: label.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.x.is_nan()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimestampMarkerCollectionData {
    #[serde(deserialize_with = "nan_as_null::vec")]
    pub x: Vec<f64>,
    pub colors: Vec<String>,
    pub labels: Vec<String>,
}

impl TimestampMarkerCollectionData {
    pub fn new(x: Vec<f64>, colors: Vec<String>, labels: Vec<String>) -> Result<Self> {
        check_len(x.len(), colors.len())?;
        check_len(x.len(), labels.len())?;
        Ok(Self {
            x,
            colors: colors.iter().map(|c| validated_color(c)).collect(),
            labels,
        })
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn validity(&self) -> Vec<bool> {
        self.x.iter().map(|x| !x.is_nan()).collect()
    }
}

/// Identifies the record type a raw value should be turned into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataKind {
    Point,
    Bar,
    InjectionBar,
    TimestampMarker,
    Curve,
    BarCollection,
    InjectionBarCollection,
    TimestampMarkerCollection,
}

impl DataKind {
    pub fn is_collection(self) -> bool {
        matches!(
            self,
            DataKind::Curve
                | DataKind::BarCollection
                | DataKind::InjectionBarCollection
                | DataKind::TimestampMarkerCollection
        )
    }
}

/// Every record shape a data model can receive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PlottingItemData {
    Point(PointData),
    Curve(CurveData),
    Bar(BarData),
    BarCollection(BarCollectionData),
    InjectionBar(InjectionBarData),
    InjectionBarCollection(InjectionBarCollectionData),
    TimestampMarker(TimestampMarkerData),
    TimestampMarkerCollection(TimestampMarkerCollectionData),
    /// Do not connect the next curve sample to the previous one.
    Gap,
}

impl PlottingItemData {
    pub fn type_name(&self) -> &'static str {
        match self {
            PlottingItemData::Point(_) => "PointData",
            PlottingItemData::Curve(_) => "CurveData",
            PlottingItemData::Bar(_) => "BarData",
            PlottingItemData::BarCollection(_) => "BarCollectionData",
            PlottingItemData::InjectionBar(_) => "InjectionBarData",
            PlottingItemData::InjectionBarCollection(_) => "InjectionBarCollectionData",
            PlottingItemData::TimestampMarker(_) => "TimestampMarkerData",
            PlottingItemData::TimestampMarkerCollection(_) => "TimestampMarkerCollectionData",
            PlottingItemData::Gap => "Gap",
        }
    }
}

macro_rules! impl_from_record {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for PlottingItemData {
                fn from(data: $ty) -> Self {
                    PlottingItemData::$variant(data)
                }
            }
        )*
    };
}

impl_from_record!(
    Point(PointData),
    Curve(CurveData),
    Bar(BarData),
    BarCollection(BarCollectionData),
    InjectionBar(InjectionBarData),
    InjectionBarCollection(InjectionBarCollectionData),
    TimestampMarker(TimestampMarkerData),
    TimestampMarkerCollection(TimestampMarkerCollectionData),
);
