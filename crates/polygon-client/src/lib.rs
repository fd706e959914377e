use analysis_core::{AnalysisError, Bar, FetchRequest, PriceSeries, PriceSource};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub const BASE_URL: &str = "https://api.polygon.io";

#[derive(Clone)]
pub struct PolygonClient {
    api_key: String,
    base_url: String,
    client: Client,
}

impl PolygonClient {
    pub fn new(api_key: String) -> Self {
        Self::with_timeout(api_key, Duration::from_secs(30))
    }

    pub fn with_timeout(api_key: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_key,
            base_url: BASE_URL.to_string(),
            client,
        }
    }

    /// Point the client at another host (proxies, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Daily bars for `symbol` between `from` and `to`, oldest first.
    pub async fn get_daily_bars(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Bar>, AnalysisError> {
        let url = format!(
            "{}/v2/aggs/ticker/{}/range/1/day/{}/{}",
            self.base_url,
            symbol,
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d")
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("apiKey", self.api_key.as_str()),
                ("adjusted", "true"),
                ("sort", "asc"),
                ("limit", "50000"),
            ])
            .send()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AnalysisError::ApiError(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let agg_response: AggregateResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        bars_from_response(agg_response)
    }
}

#[async_trait]
impl PriceSource for PolygonClient {
    async fn fetch(&self, request: &FetchRequest) -> PriceSeries {
        let ticker = request.ticker.trim().to_uppercase();
        let today = Utc::now().date_naive();

        let Some((from, to)) = request.resolve(today) else {
            tracing::warn!(
                "No usable range for {} (period={:?}, start={:?}, end={:?})",
                ticker,
                request.period,
                request.start,
                request.end
            );
            return PriceSeries::empty(ticker);
        };

        tracing::debug!("Fetching {} daily bars {} -> {}", ticker, from, to);
        match self.get_daily_bars(&ticker, from, to).await {
            Ok(bars) => {
                tracing::info!("Fetched {} bars for {}", bars.len(), ticker);
                PriceSeries::new(ticker, bars)
            }
            Err(e) => {
                tracing::warn!("Failed to fetch {} bars: {}", ticker, e);
                PriceSeries::empty(ticker)
            }
        }
    }
}

fn bars_from_response(response: AggregateResponse) -> Result<Vec<Bar>, AnalysisError> {
    response
        .results
        .into_iter()
        .map(|r| {
            let timestamp = DateTime::from_timestamp_millis(r.t).ok_or_else(|| {
                AnalysisError::ApiError(format!("invalid bar timestamp {}", r.t))
            })?;
            Ok(Bar {
                timestamp,
                open: r.o,
                high: r.h,
                low: r.l,
                // A bar without a close stays NaN so series validation reports it.
                close: r.c.unwrap_or(f64::NAN),
                volume: r.v,
                vwap: r.vw,
            })
        })
        .collect()
}

// Polygon API response types

#[derive(Debug, Deserialize)]
struct AggregateResponse {
    #[serde(default)]
    results: Vec<AggregateResult>,
}

#[derive(Debug, Deserialize)]
struct AggregateResult {
    t: i64, // timestamp (ms)
    o: f64, // open
    h: f64, // high
    l: f64, // low
    #[serde(default)]
    c: Option<f64>, // close
    #[serde(default)]
    v: f64, // volume
    #[serde(default)]
    vw: Option<f64>,
}
