//! Transport provider error types.

use thiserror::Error;

/// Errors from proxy-pool acquisition and client construction
#[derive(Debug, Error)]
pub enum TransportError {
    /// Environment configuration could not be parsed
    #[error("transport configuration: {0}")]
    Config(String),

    /// The proxy pool endpoint could not be reached
    #[error("proxy pool request failed")]
    PoolRequest(#[source] reqwest::Error),

    /// The proxy pool endpoint answered with a non-success status
    #[error("proxy pool returned status {0}")]
    PoolStatus(u16),

    /// The proxy pool response did not contain a usable proxy
    #[error("malformed proxy pool response: {0}")]
    MalformedResponse(String),

    /// The HTTP client could not be built
    #[error("failed to build http client")]
    Build(#[source] reqwest::Error),
}
