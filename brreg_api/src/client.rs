//! HTTP client for the Enhetsregisteret search API.

use std::time::Duration;

use serde::de::DeserializeOwned;
use url::Url;

use crate::{query::SearchQuery, types::SearchResponse, Error};

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://data.brreg.no/enhetsregisteret/api";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("brreg_api/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the registry.
///
/// Holds one pooled `reqwest::Client`; cloning the wrapper is not needed
/// because all methods take `&self`.
pub struct Client {
    http: reqwest::Client,
    /// Base URL for the API. Defaults to [`DEFAULT_BASE_URL`].
    base_api_url: String,
}

impl Client {
    /// Creates a client pointing at the production API.
    pub fn new() -> Result<Self, Error> {
        Self::with_options(DEFAULT_BASE_URL, true)
    }

    /// Creates a client with a custom base URL. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str) -> Result<Self, Error> {
        Self::with_options(base_url, true)
    }

    /// Creates a client with a custom base URL and TLS verification switch.
    ///
    /// `verify_tls = false` accepts any certificate; only meant for hosts
    /// behind an intercepting corporate proxy.
    pub fn with_options(base_url: &str, verify_tls: bool) -> Result<Self, Error> {
        if !verify_tls {
            tracing::warn!("TLS certificate verification is disabled for registry requests");
        }
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(!verify_tls)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::Network(e)
            })?;
        Ok(Self {
            http,
            base_api_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The configured API root.
    pub fn base_url(&self) -> &str {
        &self.base_api_url
    }

    fn get_url(&self, path: &str) -> Result<Url, Error> {
        Url::parse(&format!("{}{}", self.base_api_url, path)).map_err(|e| {
            tracing::error!("Invalid URL constructed: {}", e);
            Error::InvalidUrl(e.to_string())
        })
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        let resp = self
            .http
            .get(url)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Registry request failed: {}", e);
                Error::Network(e)
            })?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound);
        }

        let body = resp.text().await?;
        if !status.is_success() {
            let snippet = truncate_body(&body);
            tracing::error!("Request failed with status {}: {}", status, snippet);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }

        serde_json::from_str::<T>(&body).map_err(|e| {
            tracing::error!("Failed to parse resource: {} | body: {}", e, truncate_body(&body));
            Error::Parse(e.to_string())
        })
    }

    /// Searches registered entities by name.
    pub async fn search_enheter(&self, query: &SearchQuery) -> Result<SearchResponse, Error> {
        let url = query.add_to_url(&self.get_url("/enheter")?);
        tracing::debug!("GET {}", url);
        self.get::<SearchResponse>(url).await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 500;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...[truncated]", &body[..end])
}
