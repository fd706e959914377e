use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::AnalysisError;

/// OHLCV bar data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    /// Non-finite when the source delivered no close for this bar.
    pub close: f64,
    pub volume: f64,
    #[serde(default)]
    pub vwap: Option<f64>,
}

/// Time-ordered daily bars for one ticker, as delivered by a `PriceSource`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    pub bars: Vec<Bar>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Self {
        Self {
            symbol: symbol.into(),
            bars,
        }
    }

    pub fn empty(symbol: impl Into<String>) -> Self {
        Self::new(symbol, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// The closing-price column, validated for indicator work.
    ///
    /// Fails when the series is empty or any bar lacks a usable close.
    pub fn closes(&self) -> Result<Vec<f64>, AnalysisError> {
        if self.bars.is_empty() {
            return Err(AnalysisError::InvalidInput(format!(
                "price series for {} is empty",
                self.symbol
            )));
        }

        if let Some(bar) = self.bars.iter().find(|b| !b.close.is_finite()) {
            return Err(AnalysisError::InvalidInput(format!(
                "close price missing for {} on {}",
                self.symbol,
                bar.timestamp.format("%Y-%m-%d")
            )));
        }

        Ok(self.bars.iter().map(|b| b.close).collect())
    }

    /// True when timestamps are strictly increasing.
    pub fn has_ordered_dates(&self) -> bool {
        self.bars
            .windows(2)
            .all(|w| w[0].timestamp < w[1].timestamp)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.timestamp.date_naive())
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.timestamp.date_naive())
    }
}

/// Lookback period codes accepted when no explicit date range is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    Day1,
    Day5,
    Month1,
    Month3,
    Month6,
    Year1,
    Year2,
    Year5,
    Year10,
    YearToDate,
    Max,
}

impl Period {
    pub const ALL: [Period; 11] = [
        Period::Day1,
        Period::Day5,
        Period::Month1,
        Period::Month3,
        Period::Month6,
        Period::Year1,
        Period::Year2,
        Period::Year5,
        Period::Year10,
        Period::YearToDate,
        Period::Max,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Period::Day1 => "1d",
            Period::Day5 => "5d",
            Period::Month1 => "1mo",
            Period::Month3 => "3mo",
            Period::Month6 => "6mo",
            Period::Year1 => "1y",
            Period::Year2 => "2y",
            Period::Year5 => "5y",
            Period::Year10 => "10y",
            Period::YearToDate => "ytd",
            Period::Max => "max",
        }
    }

    /// First calendar day covered when the period ends on `today`.
    pub fn start_from(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            Period::Day1 => today.checked_sub_days(Days::new(1)),
            Period::Day5 => today.checked_sub_days(Days::new(5)),
            Period::Month1 => today.checked_sub_months(Months::new(1)),
            Period::Month3 => today.checked_sub_months(Months::new(3)),
            Period::Month6 => today.checked_sub_months(Months::new(6)),
            Period::Year1 => today.checked_sub_months(Months::new(12)),
            Period::Year2 => today.checked_sub_months(Months::new(24)),
            Period::Year5 => today.checked_sub_months(Months::new(60)),
            Period::Year10 => today.checked_sub_months(Months::new(120)),
            Period::YearToDate => NaiveDate::from_ymd_opt(today.year(), 1, 1),
            Period::Max => NaiveDate::from_ymd_opt(1970, 1, 1),
        }
    }
}

impl FromStr for Period {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_lowercase();
        Period::ALL
            .iter()
            .copied()
            .find(|p| p.code() == code)
            .ok_or_else(|| AnalysisError::InvalidInput(format!("unknown period '{}'", s.trim())))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

pub const DEFAULT_PERIOD: &str = "1mo";

/// What to fetch: a ticker plus either a period code or an explicit date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub ticker: String,
    pub period: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl FetchRequest {
    pub fn for_period(ticker: impl Into<String>, period: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            period: Some(period.into()),
            start: None,
            end: None,
        }
    }

    pub fn for_range(ticker: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            ticker: ticker.into(),
            period: None,
            start: Some(start),
            end: Some(end),
        }
    }

    /// Inclusive date range to request.
    ///
    /// An explicit start/end pair takes precedence over the period code.
    /// Returns `None` for an unknown period or a reversed range.
    pub fn resolve(&self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            return (start <= end).then_some((start, end));
        }

        let code = self.period.as_deref().unwrap_or(DEFAULT_PERIOD);
        let period: Period = code.parse().ok()?;
        let start = period.start_from(today)?;
        Some((start, today))
    }

    /// Label used in artifact names: the period code, or `{start}_{end}`.
    pub fn label(&self) -> String {
        match (self.start, self.end) {
            (Some(start), Some(end)) => format!("{}_{}", start, end),
            _ => self
                .period
                .clone()
                .unwrap_or_else(|| DEFAULT_PERIOD.to_string()),
        }
    }
}
