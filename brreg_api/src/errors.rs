//! Error types for the registry client.

/// Errors that can occur when querying the registry.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The base URL or a path joined onto it did not form a valid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// Transport-level failure (DNS, TLS, timeout, connection reset).
    #[error("Network error")]
    Network(#[from] reqwest::Error),
    /// The registry answered HTTP 429.
    #[error("Rate limited by registry (HTTP 429)")]
    RateLimited,
    /// The registry answered HTTP 404.
    #[error("Resource not found (HTTP 404)")]
    NotFound,
    /// Any other non-success status, with a body snippet.
    #[error("Request failed with status {status}")]
    HttpStatus { status: u16, body: String },
    /// The body was not the JSON shape we expect.
    #[error("Failed to parse response: {0}")]
    Parse(String),
}
