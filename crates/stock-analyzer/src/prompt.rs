use analysis_core::FetchRequest;
use chrono::NaiveDate;
use std::io::{self, BufRead, Write};

use crate::chart::ChartStyle;

/// Line-oriented question/answer over any reader and writer.
pub struct Prompter<R, W> {
    input: R,
    pub out: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, out: W) -> Self {
        Self { input, out }
    }

    /// Print `question` and read one trimmed line; EOF reads as empty.
    pub fn ask(&mut self, question: &str) -> io::Result<String> {
        write!(self.out, "{}", question)?;
        self.out.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim().to_string())
    }

    /// Ticker plus either an explicit date range or a period code.
    pub fn ask_fetch_request(&mut self, ticker: &str) -> io::Result<FetchRequest> {
        let custom = self.ask("Do you want to enter specific start and end dates? (y/n): ")?;

        if custom.eq_ignore_ascii_case("y") {
            let start_raw = self.ask("Enter the start date (YYYY-MM-DD): ")?;
            let end_raw = self.ask("Enter the end date (YYYY-MM-DD): ")?;
            let start = parse_date(&start_raw);
            let end = parse_date(&end_raw);

            if start.is_none() || end.is_none() {
                tracing::warn!("unparseable dates '{}' / '{}'", start_raw, end_raw);
                writeln!(
                    self.out,
                    "Dates must look like YYYY-MM-DD. Falling back to the default period."
                )?;
            }
            return Ok(FetchRequest {
                ticker: ticker.to_string(),
                period: None,
                start,
                end,
            });
        }

        let period = self.ask("Enter the data period (e.g. '1mo' for one month): ")?;
        Ok(FetchRequest {
            ticker: ticker.to_string(),
            period: (!period.is_empty()).then_some(period),
            start: None,
            end: None,
        })
    }

    /// Threshold percentage; non-numeric answers fall back to `default`.
    pub fn ask_threshold(&mut self, default: f64) -> io::Result<f64> {
        let answer = self.ask("Enter the price-change threshold in percent (e.g. 5 for 5%): ")?;
        match parse_threshold(&answer) {
            Some(value) => Ok(value),
            None => {
                writeln!(self.out, "Invalid input. Using the default of {}%.", default)?;
                Ok(default)
            }
        }
    }

    /// Chart style; unknown names fall back to the default style.
    pub fn ask_style(&mut self) -> io::Result<ChartStyle> {
        writeln!(self.out, "Available styles: {}", ChartStyle::names().join(", "))?;
        let answer = self.ask("Choose a chart style: ")?;
        match answer.parse::<ChartStyle>() {
            Ok(style) => Ok(style),
            Err(_) => {
                writeln!(
                    self.out,
                    "Style '{}' is not supported. Using '{}'.",
                    answer,
                    ChartStyle::default()
                )?;
                Ok(ChartStyle::default())
            }
        }
    }
}

pub fn parse_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").ok()
}

pub fn parse_threshold(input: &str) -> Option<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}
