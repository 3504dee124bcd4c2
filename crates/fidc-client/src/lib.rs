#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/fidc-data/fidc-data/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Remote-registry client for FIDC monthly filings.
//!
//! The client covers the fetch half of the pipeline:
//!
//! - [`FnetClient::discover`] - list available documents for a fund
//! - [`FnetClient::filter_monthly`] - keep active monthly filings
//! - [`FnetClient::select_latest`] - pick the most recent reference period
//! - [`FnetClient::download`] - fetch and decode one filing's content
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use fidc_cache::DiskCache;
//! use fidc_client::FnetClient;
//! use fidc_core::FundId;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cache = Arc::new(DiskCache::new(".cache_api"));
//!     let client = FnetClient::new(cache);
//!
//!     let fund = FundId::new("51.199.121/0001-45");
//!     let discovered = client.discover(&fund).await?;
//!     let monthly = FnetClient::filter_monthly(&discovered.value)?;
//!     let latest = FnetClient::select_latest(&monthly)?;
//!     let xml = client.download(latest.id).await?;
//!     println!("filing {} is {} bytes", latest.id, xml.value.len());
//!     Ok(())
//! }
//! ```

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use fidc_core::convert::reference_date;
use fidc_core::{CacheStore, Error, FilingDescriptor, FundId, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Registry search endpoint.
const DEFAULT_SEARCH_URL: &str =
    "https://fnet.bmfbovespa.com.br/fnet/publico/pesquisarGerenciadorDocumentosDados";

/// Registry download endpoint.
const DEFAULT_DOWNLOAD_URL: &str =
    "https://fnet.bmfbovespa.com.br/fnet/publico/downloadDocumento";

/// Discovery responses are reusable for a day; document metadata moves slowly.
const DISCOVERY_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// HTTP statuses worth retrying; everything else fails immediately.
const RETRYABLE_STATUSES: &[StatusCode] = &[
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// Client configuration.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Search endpoint URL.
    pub search_url: String,
    /// Download endpoint URL.
    pub download_url: String,
    /// User agent sent on every request.
    pub user_agent: String,
    /// Per-request timeout for discovery calls.
    pub search_timeout: Duration,
    /// Per-request timeout for download calls.
    pub download_timeout: Duration,
    /// Maximum number of documents requested per discovery call.
    pub page_limit: u32,
    /// Total attempts per call, first try included.
    pub max_attempts: u32,
    /// Base delay for exponential backoff between attempts.
    pub backoff_base: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL.to_string(),
            download_url: DEFAULT_DOWNLOAD_URL.to_string(),
            user_agent: "fidc-data/0.1 (Mozilla/5.0 compatible)".to_string(),
            search_timeout: Duration::from_secs(10),
            download_timeout: Duration::from_secs(20),
            page_limit: 200,
            max_attempts: 3,
            backoff_base: Duration::from_secs(1),
        }
    }
}

/// A fetched value together with its provenance.
///
/// The pipeline uses `from_cache` to decide whether an identifier generated
/// real network traffic and therefore owes the upstream service a courtesy
/// delay.
#[derive(Clone, Debug, PartialEq)]
pub struct Fetched<T> {
    /// The fetched value.
    pub value: T,
    /// Whether the value was served from the cache without a network call.
    pub from_cache: bool,
}

/// Which call a transport failure belongs to, for terminal error mapping.
#[derive(Clone, Copy, Debug)]
enum Phase {
    Discovery,
    Download,
}

impl Phase {
    fn http_error(self, message: String) -> Error {
        match self {
            Self::Discovery => Error::Discovery(message),
            Self::Download => Error::Download(message),
        }
    }
}

/// Wire shape of the registry's search response.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<FilingDescriptor>,
}

/// Client for the fund registry's filing API.
///
/// The cache is injected, not owned globally: discovery responses are cached
/// under `docs_<fund id>` with a 24-hour expiry, downloaded content under
/// `xml_<filing id>` with no expiry since a document id's content is
/// immutable.
#[derive(Clone)]
pub struct FnetClient {
    client: reqwest::Client,
    config: ClientConfig,
    cache: Arc<dyn CacheStore>,
}

impl std::fmt::Debug for FnetClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnetClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FnetClient {
    /// Creates a client with the default configuration.
    #[must_use]
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self::with_config(ClientConfig::default(), cache)
    }

    /// Creates a client with a custom configuration.
    ///
    /// # Panics
    /// Panics if the underlying HTTP client cannot be constructed, which only
    /// happens with an unusable TLS backend.
    #[must_use]
    pub fn with_config(config: ClientConfig, cache: Arc<dyn CacheStore>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            config,
            cache,
        }
    }

    /// Lists the documents the registry knows for one fund identifier.
    ///
    /// An empty result is an explicit failure and is never cached; only
    /// non-empty successful responses enter the cache.
    ///
    /// # Errors
    /// [`Error::Discovery`] when the response is empty or an HTTP error
    /// exhausts the retry budget; [`Error::Timeout`] / [`Error::Connection`]
    /// for exhausted transport failures.
    pub async fn discover(&self, fund: &FundId) -> Result<Fetched<Vec<FilingDescriptor>>> {
        let cache_key = format!("docs_{fund}");
        if let Some(payload) = self.cache.get(&cache_key, Some(DISCOVERY_TTL)).await {
            match serde_json::from_slice::<Vec<FilingDescriptor>>(&payload) {
                Ok(descriptors) => {
                    debug!(%fund, count = descriptors.len(), "Discovery served from cache");
                    return Ok(Fetched {
                        value: descriptors,
                        from_cache: true,
                    });
                }
                Err(e) => warn!(%fund, error = %e, "Corrupt discovery cache entry, refetching"),
            }
        }

        let query = [
            ("d", "0".to_string()),
            ("s", "0".to_string()),
            ("l", self.config.page_limit.to_string()),
            ("cnpjFundo", fund.to_string()),
        ];
        let response = self
            .get_with_retry(
                &self.config.search_url,
                &query,
                self.config.search_timeout,
                Phase::Discovery,
            )
            .await?;

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| Error::Discovery(format!("Malformed search response: {e}")))?;

        if parsed.data.is_empty() {
            return Err(Error::Discovery(format!("No documents found for {fund}")));
        }

        if let Ok(serialized) = serde_json::to_vec(&parsed.data) {
            self.cache.set(&cache_key, &serialized).await;
        }

        debug!(%fund, count = parsed.data.len(), "Discovery fetched from registry");
        Ok(Fetched {
            value: parsed.data,
            from_cache: false,
        })
    }

    /// Keeps the descriptors that are active monthly filings.
    ///
    /// # Errors
    /// [`Error::NoMonthlyFiling`] when nothing survives the filter.
    pub fn filter_monthly(descriptors: &[FilingDescriptor]) -> Result<Vec<FilingDescriptor>> {
        let monthly: Vec<FilingDescriptor> = descriptors
            .iter()
            .filter(|d| {
                d.document_type.to_lowercase().contains("informe mensal") && d.is_active()
            })
            .cloned()
            .collect();

        if monthly.is_empty() {
            return Err(Error::NoMonthlyFiling(
                "No active monthly filing among discovered documents".to_string(),
            ));
        }
        Ok(monthly)
    }

    /// Picks the descriptor with the most recent reference period.
    ///
    /// Descriptors whose period does not parse are dropped silently.
    ///
    /// # Errors
    /// [`Error::NoValidDate`] when no descriptor has a parseable period.
    pub fn select_latest(descriptors: &[FilingDescriptor]) -> Result<FilingDescriptor> {
        descriptors
            .iter()
            .filter_map(|d| reference_date(&d.reference_period).map(|date| (date, d)))
            .max_by_key(|(date, _)| *date)
            .map(|(_, d)| d.clone())
            .ok_or_else(|| {
                Error::NoValidDate("No filing with a parseable reference period".to_string())
            })
    }

    /// Downloads one filing's content and decodes it from its transport
    /// encoding to raw bytes.
    ///
    /// Content for a given filing id is immutable, so cached entries never
    /// expire.
    ///
    /// # Errors
    /// [`Error::Download`] for terminal HTTP failures or an undecodable body;
    /// [`Error::Timeout`] / [`Error::Connection`] for exhausted transport
    /// failures.
    pub async fn download(&self, filing_id: u64) -> Result<Fetched<Vec<u8>>> {
        let cache_key = format!("xml_{filing_id}");
        if let Some(payload) = self.cache.get(&cache_key, None).await {
            debug!(filing_id, bytes = payload.len(), "Download served from cache");
            return Ok(Fetched {
                value: payload,
                from_cache: true,
            });
        }

        let query = [("id", filing_id.to_string())];
        let response = self
            .get_with_retry(
                &self.config.download_url,
                &query,
                self.config.download_timeout,
                Phase::Download,
            )
            .await?;

        let body = response
            .text()
            .await
            .map_err(|e| Error::Download(format!("Could not read body: {e}")))?;

        // The registry ships the document base64-encoded in the body.
        let content = BASE64
            .decode(body.trim())
            .map_err(|e| Error::Download(format!("Body is not valid base64: {e}")))?;

        self.cache.set(&cache_key, &content).await;

        debug!(filing_id, bytes = content.len(), "Download fetched from registry");
        Ok(Fetched {
            value: content,
            from_cache: false,
        })
    }

    /// Issues a GET with the bounded retry policy.
    ///
    /// Retries only connection failures, timeouts and the retryable HTTP
    /// statuses, with exponential backoff between attempts. Any other HTTP
    /// error fails immediately.
    async fn get_with_retry(
        &self,
        url: &str,
        query: &[(&str, String)],
        timeout: Duration,
        phase: Phase,
    ) -> Result<reqwest::Response> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1u32;
        loop {
            let outcome = self
                .client
                .get(url)
                .query(query)
                .timeout(timeout)
                .send()
                .await;

            let retryable_failure: Error = match outcome {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    let error = phase.http_error(format!("HTTP {status} from {url}"));
                    if !RETRYABLE_STATUSES.contains(&status) {
                        return Err(error);
                    }
                    error
                }
                Err(e) if e.is_timeout() => Error::Timeout(format!("{url}: {e}")),
                Err(e) if e.is_connect() => Error::Connection(format!("{url}: {e}")),
                Err(e) => return Err(phase.http_error(format!("Transport failure: {e}"))),
            };

            if attempt >= max_attempts {
                warn!(url, attempt, "Retry budget exhausted");
                return Err(retryable_failure);
            }

            let delay = self.config.backoff_base * 2u32.pow(attempt - 1);
            debug!(url, attempt, delay_ms = delay.as_millis() as u64, "Retrying request");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
