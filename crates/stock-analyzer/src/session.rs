//! One interactive run: prompt, fetch, annotate, report, export, chart.

use analysis_core::PriceSource;
use anyhow::Result;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use technical_analysis::IndicatorFrame;

use crate::chart::{self, ChartStyle};
use crate::config::AnalyzerConfig;
use crate::export;
use crate::prompt::Prompter;
use crate::report;

const EXAMPLE_TICKERS: &str =
    "AAPL (Apple Inc), GOOGL (Alphabet Inc), MSFT (Microsoft Corporation), AMZN (Amazon.com Inc), TSLA (Tesla Inc)";

/// What a session produced.
#[derive(Debug, Default)]
pub struct SessionOutcome {
    pub bars: usize,
    pub csv: Option<PathBuf>,
    pub chart: Option<PathBuf>,
}

pub async fn run<S, R, W>(
    source: &S,
    config: &AnalyzerConfig,
    prompter: &mut Prompter<R, W>,
) -> Result<SessionOutcome>
where
    S: PriceSource + ?Sized,
    R: BufRead,
    W: Write,
{
    let mut outcome = SessionOutcome::default();
    print_banner(&mut prompter.out)?;

    let ticker = prompter
        .ask("Enter a stock ticker (e.g. 'AAPL' for Apple Inc): ")?
        .to_uppercase();
    if ticker.is_empty() {
        writeln!(prompter.out, "No ticker entered.")?;
        return Ok(outcome);
    }

    let request = prompter.ask_fetch_request(&ticker)?;
    let label = request.label();

    let series = source.fetch(&request).await;
    if series.is_empty() {
        writeln!(prompter.out, "Could not fetch stock price data for {}.", ticker)?;
        return Ok(outcome);
    }
    outcome.bars = series.len();
    if let (Some(first), Some(last)) = (series.first_date(), series.last_date()) {
        tracing::info!("{}: {} bars for {} ({} to {})", ticker, series.len(), label, first, last);
    }

    let settings = &config.indicators;
    let mut frame = IndicatorFrame::new(series);
    frame = match frame.clone().with_moving_average(settings.ma_window) {
        Ok(with_ma) => with_ma,
        Err(e) => {
            writeln!(prompter.out, "Moving average skipped: {}", e)?;
            frame
        }
    };

    writeln!(prompter.out, "{}", report::average_close(frame.series()))?;

    let threshold = prompter.ask_threshold(config.default_threshold)?;
    let fluctuation = report::fluctuation(frame.series(), threshold);
    if fluctuation.exceeded() {
        tracing::warn!("{}: fluctuation above {}% threshold", ticker, threshold);
    }
    writeln!(prompter.out, "{}", fluctuation)?;

    let csv_path = config.output_dir.join(export::default_filename(&ticker, &label));
    match export::export_csv(&frame, &csv_path) {
        Ok(path) => {
            writeln!(prompter.out, "Data exported to {}", path.display())?;
            outcome.csv = Some(path);
        }
        Err(e) => {
            tracing::warn!("CSV export failed: {}", e);
            writeln!(prompter.out, "Failed to export data to CSV: {}", e)?;
        }
    }

    frame = match frame.clone().with_rsi(settings.rsi_window) {
        Ok(with_rsi) => with_rsi,
        Err(e) => {
            writeln!(prompter.out, "RSI skipped: {}", e)?;
            frame
        }
    };
    frame = match frame.clone().with_macd(settings.macd) {
        Ok(with_macd) => with_macd,
        Err(e) => {
            writeln!(prompter.out, "MACD skipped: {}", e)?;
            frame
        }
    };

    let style = prompter.ask_style()?;
    let chart_path = config.output_dir.join(chart::default_filename(&ticker, &label));
    match chart::render_and_save(
        &frame,
        &ticker,
        &label,
        style,
        Some(&chart_path),
        (config.chart_width, config.chart_height),
    ) {
        Ok(path) => {
            writeln!(prompter.out, "Chart saved as {}", path.display())?;
            outcome.chart = Some(path);
        }
        Err(e) => {
            tracing::warn!("chart rendering failed: {}", e);
            writeln!(prompter.out, "Could not draw the chart: {}", e)?;
        }
    }

    Ok(outcome)
}

fn print_banner<W: Write>(out: &mut W) -> std::io::Result<()> {
    let periods: Vec<&str> = analysis_core::Period::ALL.iter().map(|p| p.code()).collect();

    writeln!(out, "Welcome to the stock data retrieval and charting tool.")?;
    writeln!(out, "Some example tickers you might consider: {}.", EXAMPLE_TICKERS)?;
    writeln!(out, "Common data periods: {}.", periods.join(", "))?;
    writeln!(out, "You can also give explicit start and end dates in YYYY-MM-DD format.")?;
    writeln!(out, "Available chart styles: {}", ChartStyle::names().join(", "))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::{Bar, FetchRequest, PriceSeries};
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use std::io::Cursor;
    use std::sync::Mutex;
    use technical_analysis::IndicatorSettings;

    /// Serves canned closes and records what was asked for.
    struct StubSource {
        closes: Vec<f64>,
        requests: Mutex<Vec<FetchRequest>>,
    }

    impl StubSource {
        fn new(closes: Vec<f64>) -> Self {
            Self {
                closes,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PriceSource for StubSource {
        async fn fetch(&self, request: &FetchRequest) -> PriceSeries {
            self.requests.lock().unwrap().push(request.clone());
            let start = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
            let bars = self
                .closes
                .iter()
                .enumerate()
                .map(|(i, &close)| Bar {
                    timestamp: start + Duration::days(i as i64),
                    open: close,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 10_000.0,
                    vwap: None,
                })
                .collect();
            PriceSeries::new(request.ticker.clone(), bars)
        }
    }

    fn test_config(dir: PathBuf) -> AnalyzerConfig {
        AnalyzerConfig {
            polygon_api_key: "test".into(),
            polygon_base_url: "http://localhost".into(),
            http_timeout_secs: 5,
            indicators: IndicatorSettings::default(),
            default_threshold: 5.0,
            output_dir: dir,
            chart_width: 400,
            chart_height: 480,
        }
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("stock-analyzer-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_full_session_exports_csv() {
        let dir = scratch_dir("session");
        let source = StubSource::new(vec![100.0, 110.0, 90.0, 95.0, 97.0, 101.0, 99.0]);
        let mut prompter = Prompter::new(
            Cursor::new(b"aapl\nn\n1mo\n15\nggplot\n".to_vec()),
            Vec::new(),
        );

        let outcome = run(&source, &test_config(dir.clone()), &mut prompter).await.unwrap();
        let text = String::from_utf8(prompter.out).unwrap();

        assert_eq!(outcome.bars, 7);
        let csv = outcome.csv.expect("csv written");
        assert_eq!(csv, dir.join("AAPL_1mo_stock_data.csv"));
        let exported = std::fs::read_to_string(&csv).unwrap();
        assert!(exported.starts_with("Date,Open,High,Low,Close,Volume,Moving_Average\n"));

        assert!(text.contains("Average closing price for the period: 98.86"));
        assert!(text.contains("Significant fluctuation detected!"));
        assert!(text.contains("Chart saved as"));
        let chart = outcome.chart.expect("chart written");
        assert_eq!(chart, dir.join("AAPL_1mo_stock_price_chart.png"));
        assert!(std::fs::metadata(&chart).unwrap().len() > 0);

        let requests = source.requests.lock().unwrap();
        assert_eq!(requests[0].ticker, "AAPL");
        assert_eq!(requests[0].period.as_deref(), Some("1mo"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_session_stops_without_data() {
        let dir = scratch_dir("empty");
        let source = StubSource::new(vec![]);
        let mut prompter = Prompter::new(
            Cursor::new(b"ZZZZ\ny\n2024-01-01\n2024-02-01\n".to_vec()),
            Vec::new(),
        );

        let outcome = run(&source, &test_config(dir.clone()), &mut prompter).await.unwrap();
        let text = String::from_utf8(prompter.out).unwrap();

        assert_eq!(outcome.bars, 0);
        assert!(outcome.csv.is_none());
        assert!(outcome.chart.is_none());
        assert!(text.contains("Could not fetch stock price data for ZZZZ."));
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_session_reports_export_failure_and_continues() {
        let missing = std::env::temp_dir().join("stock-analyzer-no-such-dir").join("deeper");
        let source = StubSource::new(vec![10.0, 10.5, 10.2]);
        let mut prompter = Prompter::new(
            Cursor::new(b"IBM\nn\n5d\nnot-a-number\nunknown\n".to_vec()),
            Vec::new(),
        );

        let outcome = run(&source, &test_config(missing), &mut prompter).await.unwrap();
        let text = String::from_utf8(prompter.out).unwrap();

        assert!(outcome.csv.is_none());
        assert!(text.contains("Failed to export data to CSV"));
        assert!(text.contains("Invalid input. Using the default of 5%."));
        assert!(text.contains("Price fluctuation is within acceptable limits"));
        assert!(text.contains("Style 'unknown' is not supported"));
    }

    #[tokio::test]
    async fn test_empty_ticker_ends_session() {
        let source = StubSource::new(vec![1.0]);
        let mut prompter = Prompter::new(Cursor::new(b"\n".to_vec()), Vec::new());

        let outcome = run(&source, &test_config(PathBuf::from(".")), &mut prompter).await.unwrap();

        assert_eq!(outcome.bars, 0);
        assert!(source.requests.lock().unwrap().is_empty());
    }
}
