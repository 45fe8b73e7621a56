//! Typed access to the screener REST backend.
//!
//! [`MarketApi`] is the seam the controllers depend on. [`RestApi`] is the
//! HTTP implementation; tests drive it through a scripted transport.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::cache::ResponseCache;
use crate::fetch::FetchError;
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::query::{history_query, profile_query, QueryParams};
use crate::{
    ClientConfig, CompanyKey, DatabaseStats, FilterOptions, FilteredStats, HistoryRequest,
    PriceHistory, SectorCounts, SectorIndustries, StockPage, StockProfile,
};

/// Boxed future returned by every [`MarketApi`] call.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, FetchError>> + Send + 'a>>;

/// Read-only operations offered by the backend.
pub trait MarketApi: Send + Sync {
    /// `GET /stocks/filter_options/`
    fn filter_options<'a>(&'a self) -> ApiFuture<'a, FilterOptions>;

    /// `GET /stocks/?<query>`
    fn list_stocks<'a>(&'a self, query: QueryParams) -> ApiFuture<'a, StockPage>;

    /// `GET /filtered-stats/?<query>`
    fn filtered_stats<'a>(&'a self, query: QueryParams) -> ApiFuture<'a, FilteredStats>;

    /// `GET /stocks/sector-industry-counts/?<query>`
    fn sector_counts<'a>(&'a self, query: QueryParams) -> ApiFuture<'a, Vec<SectorCounts>>;

    /// `GET /sectors/<name>/industries/`
    fn sector_industries<'a>(&'a self, sector: String) -> ApiFuture<'a, SectorIndustries>;

    /// `GET /stocks/profile/?ticker=&exchange=`
    fn stock_profile<'a>(&'a self, company: CompanyKey) -> ApiFuture<'a, StockProfile>;

    /// `GET /stocks/history/?ticker=&exchange=&window=`
    fn stock_history<'a>(&'a self, request: HistoryRequest) -> ApiFuture<'a, PriceHistory>;

    /// `GET /stats/`
    fn database_stats<'a>(&'a self) -> ApiFuture<'a, DatabaseStats>;
}

/// HTTP client for the backend.
///
/// Adds the configured dataset key to every request and serves repeated
/// URLs from the response cache while it is enabled.
#[derive(Clone)]
pub struct RestApi {
    config: ClientConfig,
    http_client: Arc<dyn HttpClient>,
    cache: ResponseCache,
}

impl RestApi {
    pub fn from_config(config: ClientConfig) -> Self {
        Self::with_http_client(config, Arc::new(ReqwestHttpClient::new()))
    }

    pub fn with_http_client(config: ClientConfig, http_client: Arc<dyn HttpClient>) -> Self {
        let cache = ResponseCache::new(config.cache_ttl);
        Self {
            config,
            http_client,
            cache,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Absolute URL for `path` (relative to the base URL, with leading and
    /// trailing slashes) and `query`.
    pub fn url(&self, path: &str, query: QueryParams) -> String {
        let query = query.with_dataset(self.config.dataset.as_deref());
        let mut url = format!("{}{}", self.config.base_url(), path);
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.to_query_string());
        }
        url
    }

    async fn get_json<T>(&self, path: &str, query: QueryParams) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
    {
        let url = self.url(path, query);

        if let Some(body) = self.cache.get(&url).await {
            tracing::debug!(url = %url, "serving response from cache");
            return decode(path, &body);
        }

        tracing::debug!(url = %url, "GET");
        let request = HttpRequest::get(url.as_str()).with_timeout_ms(self.config.timeout_ms);
        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|error| FetchError::from_http(&error))?;

        if !response.is_success() {
            return Err(FetchError::from_status(response.status, &response.body));
        }

        let value = decode(path, &response.body)?;
        self.cache.put(&url, &response.body).await;
        Ok(value)
    }
}

fn decode<T: DeserializeOwned>(path: &str, body: &str) -> Result<T, FetchError> {
    serde_json::from_str(body)
        .map_err(|error| FetchError::unexpected(format!("invalid response from {path}: {error}")))
}

impl MarketApi for RestApi {
    fn filter_options<'a>(&'a self) -> ApiFuture<'a, FilterOptions> {
        Box::pin(self.get_json("/stocks/filter_options/", QueryParams::new()))
    }

    fn list_stocks<'a>(&'a self, query: QueryParams) -> ApiFuture<'a, StockPage> {
        Box::pin(self.get_json("/stocks/", query))
    }

    fn filtered_stats<'a>(&'a self, query: QueryParams) -> ApiFuture<'a, FilteredStats> {
        Box::pin(self.get_json("/filtered-stats/", query))
    }

    fn sector_counts<'a>(&'a self, query: QueryParams) -> ApiFuture<'a, Vec<SectorCounts>> {
        Box::pin(self.get_json("/stocks/sector-industry-counts/", query))
    }

    fn sector_industries<'a>(&'a self, sector: String) -> ApiFuture<'a, SectorIndustries> {
        Box::pin(async move {
            let path = format!("/sectors/{}/industries/", urlencoding::encode(&sector));
            self.get_json(&path, QueryParams::new()).await
        })
    }

    fn stock_profile<'a>(&'a self, company: CompanyKey) -> ApiFuture<'a, StockProfile> {
        Box::pin(async move { self.get_json("/stocks/profile/", profile_query(&company)).await })
    }

    fn stock_history<'a>(&'a self, request: HistoryRequest) -> ApiFuture<'a, PriceHistory> {
        Box::pin(async move { self.get_json("/stocks/history/", history_query(&request)).await })
    }

    fn database_stats<'a>(&'a self) -> ApiFuture<'a, DatabaseStats> {
        Box::pin(self.get_json("/stats/", QueryParams::new()))
    }
}
