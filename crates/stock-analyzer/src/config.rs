use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;
use technical_analysis::{IndicatorSettings, MacdSpans};

#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    // Data source
    pub polygon_api_key: String,
    pub polygon_base_url: String,
    pub http_timeout_secs: u64,

    // Indicator windows
    pub indicators: IndicatorSettings,

    // Reporting
    pub default_threshold: f64, // percent, used when the prompt answer is not a number

    // Artifacts
    pub output_dir: PathBuf,
    pub chart_width: u32,
    pub chart_height: u32,
}

impl AnalyzerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let config = Self {
            polygon_api_key: lookup("POLYGON_API_KEY").context("POLYGON_API_KEY not set")?,
            polygon_base_url: get("POLYGON_BASE_URL", polygon_client::BASE_URL),
            http_timeout_secs: get("HTTP_TIMEOUT_SECS", "30")
                .parse()
                .context("HTTP_TIMEOUT_SECS must be a whole number of seconds")?,

            indicators: IndicatorSettings {
                ma_window: get("MA_WINDOW", "5").parse().context("MA_WINDOW must be an integer")?,
                rsi_window: get("RSI_WINDOW", "14").parse().context("RSI_WINDOW must be an integer")?,
                macd: MacdSpans {
                    short: get("MACD_SHORT", "12").parse().context("MACD_SHORT must be an integer")?,
                    long: get("MACD_LONG", "26").parse().context("MACD_LONG must be an integer")?,
                    signal: get("MACD_SIGNAL", "9").parse().context("MACD_SIGNAL must be an integer")?,
                },
            },

            default_threshold: get("DEFAULT_THRESHOLD", "5.0")
                .parse()
                .context("DEFAULT_THRESHOLD must be a number")?,

            output_dir: PathBuf::from(get("OUTPUT_DIR", ".")),
            chart_width: get("CHART_WIDTH", "1000").parse().context("CHART_WIDTH must be an integer")?,
            chart_height: get("CHART_HEIGHT", "1200").parse().context("CHART_HEIGHT must be an integer")?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let ind = &self.indicators;
        for (name, value) in [
            ("MA_WINDOW", ind.ma_window),
            ("RSI_WINDOW", ind.rsi_window),
            ("MACD_SHORT", ind.macd.short),
            ("MACD_LONG", ind.macd.long),
            ("MACD_SIGNAL", ind.macd.signal),
        ] {
            if value == 0 {
                bail!("{} must be at least 1", name);
            }
        }

        if !self.default_threshold.is_finite() || self.default_threshold < 0.0 {
            bail!("DEFAULT_THRESHOLD must be a non-negative number, got {}", self.default_threshold);
        }
        if self.chart_width == 0 || self.chart_height == 0 {
            bail!("chart dimensions must be positive ({}x{})", self.chart_width, self.chart_height);
        }
        if self.http_timeout_secs == 0 {
            bail!("HTTP_TIMEOUT_SECS must be at least 1");
        }

        Ok(())
    }
}
