//! Traits describing listing sources and their error type.

use async_trait::async_trait;
use reqwest::Error as ReqwestError;

use crate::model::{ListingPage, PageRange};
use crate::retry::Retryable;

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while talking to a listing backend.
pub enum PortError {
    /// Network layer failed.
    #[error("Network error: {0}")]
    Network(#[from] ReqwestError),
    /// Backend answered with a non-success status code.
    #[error("HTTP {status} for {url}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Requested URL, with credentials masked.
        url: String,
    },
    /// Response body was not valid JSON.
    #[error("Malformed response: {0}")]
    Decode(String),
}

impl Retryable for PortError {
    fn is_retryable(&self) -> bool {
        match self {
            // A connection dropped before or while answering surfaces as a
            // request or body error rather than a connect error.
            PortError::Network(err) => {
                err.is_timeout() || err.is_connect() || err.is_request() || err.is_body()
            }
            PortError::Status { status, .. } => (500..600).contains(status),
            PortError::Decode(_) => true,
        }
    }
}

#[derive(Debug, Clone)]
/// Static description of a listing source.
pub struct SourceMeta {
    /// Dataset name used by the backend.
    pub dataset: String,
}

#[async_trait]
/// Trait for backends that serve reservation listings page by page.
pub trait ListingPort: Send + Sync {
    /// Metadata describing the source handled by this port.
    fn source(&self) -> &SourceMeta;

    /// Fetch a single page of listings, making exactly one request.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the request fails, the backend rejects it,
    /// or the body cannot be decoded.
    async fn fetch_page(&self, range: PageRange) -> Result<ListingPage, PortError>;
}
