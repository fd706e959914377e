use analysis_core::{AnalysisError, PriceSeries};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::indicators::{macd, rolling_mean, rsi};

/// Derived columns the pipeline can attach to a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
    MovingAverage,
    Rsi,
    Macd,
    SignalLine,
    MacdHistogram,
}

impl Column {
    /// Header used in exports.
    pub fn name(&self) -> &'static str {
        match self {
            Column::MovingAverage => "Moving_Average",
            Column::Rsi => "RSI",
            Column::Macd => "MACD",
            Column::SignalLine => "Signal_Line",
            Column::MacdHistogram => "MACD_Histogram",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacdSpans {
    pub short: usize,
    pub long: usize,
    pub signal: usize,
}

impl Default for MacdSpans {
    fn default() -> Self {
        Self { short: 12, long: 26, signal: 9 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorSettings {
    pub ma_window: usize,
    pub rsi_window: usize,
    pub macd: MacdSpans,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            ma_window: 5,
            rsi_window: 14,
            macd: MacdSpans::default(),
        }
    }
}

/// A price series plus derived columns aligned 1:1 with its bars.
///
/// The bars are never modified. Each `with_*` call consumes the frame and
/// returns it with its columns attached; applying the same operation again
/// replaces the earlier output instead of duplicating it.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorFrame {
    series: PriceSeries,
    columns: Vec<(Column, Vec<Option<f64>>)>,
}

impl IndicatorFrame {
    pub fn new(series: PriceSeries) -> Self {
        Self {
            series,
            columns: Vec::new(),
        }
    }

    pub fn series(&self) -> &PriceSeries {
        &self.series
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn column(&self, column: Column) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, values)| values.as_slice())
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.column(column).is_some()
    }

    /// Present columns in the order they were first attached.
    pub fn columns(&self) -> impl Iterator<Item = (Column, &[Option<f64>])> {
        self.columns.iter().map(|(c, v)| (*c, v.as_slice()))
    }

    /// Drops every derived column, returning the bare series.
    pub fn into_series(self) -> PriceSeries {
        self.series
    }

    /// Attach `Moving_Average`: trailing mean of `window` closes.
    pub fn with_moving_average(mut self, window: usize) -> Result<Self, AnalysisError> {
        require_window("moving average window", window)?;
        let closes = self.series.closes()?;

        self.set(Column::MovingAverage, rolling_mean(&closes, window));
        Ok(self)
    }

    /// Attach `RSI`, neutral (50) wherever the ratio is undefined.
    pub fn with_rsi(mut self, window: usize) -> Result<Self, AnalysisError> {
        require_window("RSI window", window)?;
        let closes = self.series.closes()?;

        let values = rsi(&closes, window).into_iter().map(Some).collect();
        self.set(Column::Rsi, values);
        Ok(self)
    }

    /// Attach `MACD`, `Signal_Line` and `MACD_Histogram`.
    pub fn with_macd(mut self, spans: MacdSpans) -> Result<Self, AnalysisError> {
        require_window("MACD short span", spans.short)?;
        require_window("MACD long span", spans.long)?;
        require_window("MACD signal span", spans.signal)?;
        let closes = self.series.closes()?;

        let result = macd(&closes, spans.short, spans.long, spans.signal);
        self.set(Column::Macd, result.macd_line.into_iter().map(Some).collect());
        self.set(Column::SignalLine, result.signal_line.into_iter().map(Some).collect());
        self.set(Column::MacdHistogram, result.histogram.into_iter().map(Some).collect());
        Ok(self)
    }

    /// Moving average, RSI and MACD in one pass.
    pub fn with_all(self, settings: &IndicatorSettings) -> Result<Self, AnalysisError> {
        self.with_moving_average(settings.ma_window)?
            .with_rsi(settings.rsi_window)?
            .with_macd(settings.macd)
    }

    fn set(&mut self, column: Column, values: Vec<Option<f64>>) {
        debug_assert_eq!(values.len(), self.series.len());
        match self.columns.iter_mut().find(|(c, _)| *c == column) {
            Some((_, existing)) => *existing = values,
            None => self.columns.push((column, values)),
        }
    }
}

fn require_window(what: &str, value: usize) -> Result<(), AnalysisError> {
    if value == 0 {
        return Err(AnalysisError::InvalidInput(format!("{} must be at least 1", what)));
    }
    Ok(())
}
