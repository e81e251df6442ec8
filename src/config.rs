//! Plot level configuration loaded from JSON.

use serde::{Deserialize, Serialize};

use crate::buffer::DEFAULT_BUFFER_SIZE;
use crate::error::{DataModelError, Result};
use crate::time_span::TimeSpan;

/// How a plot treats newly arriving data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlottingStyle {
    /// The window follows the latest timestamp.
    #[default]
    ScrollingPlot,
    /// Cycles of fixed length are drawn over each other.
    CyclicPlot,
    /// Each update replaces everything shown.
    StaticPlot,
    /// Static data that the user can edit and send back.
    EditablePlot,
}

impl PlottingStyle {
    pub fn is_live(self) -> bool {
        matches!(self, PlottingStyle::ScrollingPlot | PlottingStyle::CyclicPlot)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfiguration {
    pub plotting_style: PlottingStyle,
    pub time_span: TimeSpan,
    pub buffer_size: usize,
    time_progress_line: bool,
}

impl Default for PlotConfiguration {
    fn default() -> Self {
        Self {
            plotting_style: PlottingStyle::ScrollingPlot,
            time_span: TimeSpan::default_window(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            time_progress_line: false,
        }
    }
}

impl PlotConfiguration {
    pub fn new(plotting_style: PlottingStyle) -> Self {
        Self {
            plotting_style,
            ..Self::default()
        }
    }

    pub fn with_time_span(mut self, time_span: TimeSpan) -> Self {
        self.time_span = time_span;
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn with_time_progress_line(mut self, shown: bool) -> Self {
        self.time_progress_line = shown;
        self
    }

    /// Static plots have no notion of "now", so they never show the line.
    pub fn time_progress_line(&self) -> bool {
        self.time_progress_line && self.plotting_style != PlottingStyle::StaticPlot
    }

    /// Parses and validates a configuration. Time spans are validated while
    /// parsing.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        tracing::debug!(
            style = ?config.plotting_style,
            time_span = %config.time_span,
            "plot configuration loaded"
        );
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(DataModelError::InvalidConfiguration(
                "buffer size must hold at least one entry".into(),
            ));
        }
        if self.plotting_style == PlottingStyle::CyclicPlot && !self.time_span.finite() {
            return Err(DataModelError::InvalidConfiguration(
                "a cyclic plot needs a finite time span".into(),
            ));
        }
        Ok(())
    }
}
