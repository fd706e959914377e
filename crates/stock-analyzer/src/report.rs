//! Console summaries: average close and price-fluctuation alert.

use analysis_core::PriceSeries;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum AverageCloseReport {
    Average(f64),
    MissingClose,
}

impl fmt::Display for AverageCloseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AverageCloseReport::Average(avg) => {
                write!(f, "Average closing price for the period: {:.2}", avg)
            }
            AverageCloseReport::MissingClose => {
                write!(f, "Close prices are missing from the data.")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FluctuationReport {
    Exceeded { max: f64, min: f64, percent: f64 },
    WithinLimits { percent: f64 },
    /// Minimum close is zero, so the relative swing has no finite value.
    Undefined { max: f64 },
    MissingClose,
}

impl FluctuationReport {
    pub fn exceeded(&self) -> bool {
        matches!(self, FluctuationReport::Exceeded { .. })
    }
}

impl fmt::Display for FluctuationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FluctuationReport::Exceeded { max, min, percent } => write!(
                f,
                "Significant fluctuation detected! Max price: {:.2}, min price: {:.2}. Change: {:.2}%",
                max, min, percent
            ),
            FluctuationReport::WithinLimits { percent } => write!(
                f,
                "Price fluctuation is within acceptable limits ({:.2}%).",
                percent
            ),
            FluctuationReport::Undefined { max } => write!(
                f,
                "Cannot measure fluctuation: minimum close is zero (max {:.2}).",
                max
            ),
            FluctuationReport::MissingClose => {
                write!(f, "Close prices are missing or empty in the data.")
            }
        }
    }
}

pub fn average_close(series: &PriceSeries) -> AverageCloseReport {
    match series.closes() {
        Ok(closes) => {
            AverageCloseReport::Average(closes.iter().sum::<f64>() / closes.len() as f64)
        }
        Err(e) => {
            tracing::debug!("average close unavailable: {}", e);
            AverageCloseReport::MissingClose
        }
    }
}

/// `(max - min) / min * 100`, compared strictly against `threshold_percent`.
pub fn fluctuation(series: &PriceSeries, threshold_percent: f64) -> FluctuationReport {
    let closes = match series.closes() {
        Ok(closes) => closes,
        Err(e) => {
            tracing::debug!("fluctuation unavailable: {}", e);
            return FluctuationReport::MissingClose;
        }
    };

    let max = closes.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = closes.iter().copied().fold(f64::INFINITY, f64::min);

    if min == 0.0 {
        return FluctuationReport::Undefined { max };
    }

    let percent = (max - min) / min * 100.0;
    if percent > threshold_percent {
        FluctuationReport::Exceeded { max, min, percent }
    } else {
        FluctuationReport::WithinLimits { percent }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::Bar;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone, Utc};

    fn series_from(closes: &[f64]) -> PriceSeries {
        let start = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: start + Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 500.0,
                vwap: None,
            })
            .collect();
        PriceSeries::new("TEST", bars)
    }

    #[test]
    fn test_average_close() {
        let report = average_close(&series_from(&[100.0, 110.0, 90.0]));

        assert_eq!(report, AverageCloseReport::Average(100.0));
        assert_eq!(report.to_string(), "Average closing price for the period: 100.00");
    }

    #[test]
    fn test_average_close_empty() {
        let report = average_close(&PriceSeries::empty("TEST"));
        assert_eq!(report, AverageCloseReport::MissingClose);
    }

    #[test]
    fn test_fluctuation_exceeds_threshold() {
        let report = fluctuation(&series_from(&[100.0, 110.0, 90.0]), 15.0);

        match &report {
            FluctuationReport::Exceeded { max, min, percent } => {
                assert_eq!(*max, 110.0);
                assert_eq!(*min, 90.0);
                assert_relative_eq!(*percent, 22.222, epsilon = 1e-3);
            }
            other => panic!("expected exceeded, got {:?}", other),
        }
        assert!(report.exceeded());
        assert!(report.to_string().contains("22.22%"));
    }

    #[test]
    fn test_fluctuation_within_threshold() {
        let report = fluctuation(&series_from(&[100.0, 110.0, 90.0]), 25.0);

        assert!(!report.exceeded());
        assert_eq!(report.to_string(), "Price fluctuation is within acceptable limits (22.22%).");
    }

    #[test]
    fn test_fluctuation_equal_to_threshold_is_within() {
        let report = fluctuation(&series_from(&[100.0, 150.0]), 50.0);
        assert!(!report.exceeded());
    }

    #[test]
    fn test_fluctuation_missing_data() {
        assert_eq!(fluctuation(&PriceSeries::empty("X"), 5.0), FluctuationReport::MissingClose);
        assert_eq!(
            fluctuation(&series_from(&[1.0, f64::NAN]), 5.0),
            FluctuationReport::MissingClose
        );
    }

    #[test]
    fn test_fluctuation_zero_minimum() {
        let report = fluctuation(&series_from(&[0.0, 5.0]), 5.0);
        assert_eq!(report, FluctuationReport::Undefined { max: 5.0 });
    }
}
