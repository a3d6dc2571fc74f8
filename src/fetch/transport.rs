//! Network transport used by the fetcher

use crate::error::TransportError;
use std::time::Duration;

const HTTP_TIMEOUT_SECS: u64 = 300;

/// Capability to retrieve the raw bytes behind a URL.
///
/// Only [`HttpTransport`] ships with the crate; the trait exists so the cache
/// can be driven without a network in tests.
pub trait Transport {
    /// Perform one GET and return the body. Non-success statuses are errors.
    fn get(&self, url: &str) -> Result<Vec<u8>, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        (**self).get(url)
    }
}

/// Blocking HTTP transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .user_agent(concat!("estat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                TransportError::Network(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let response = self.client.get(url).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.bytes()?;
        Ok(body.to_vec())
    }
}
