use async_trait::async_trait;
use crate::{FetchRequest, PriceSeries};

/// Source of historical daily bars.
///
/// Implementations never fail loudly: transport or decoding problems are
/// logged and surface as an empty series, which callers treat as "no data".
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> PriceSeries;
}
