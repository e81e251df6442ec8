//! live_chart_model crate: data buffering and windowing for live charts

pub mod buffer;
pub mod clipping;
pub mod config;
pub mod data_types;
pub mod error;
pub mod factory;
pub mod history;
pub mod model;
pub mod source;
pub mod time_span;

pub use buffer::{SortedDataBuffer, Subset, DEFAULT_BUFFER_SIZE};
pub use config::{PlotConfiguration, PlottingStyle};
pub use data_types::*;
pub use error::{DataModelError, DataWarning, Result};
pub use factory::{Clock, FixedClock, PlottingItemDataFactory, SystemClock};
pub use history::{History, MAX_ROLLBACK};
pub use model::*;
pub use source::{SourceEvent, Subscription, UpdateSource};
pub use time_span::{SlidingPointerTimeSpan, TimeSpan};
