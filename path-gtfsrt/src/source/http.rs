//! HTTP transport used by the gateways.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use super::error::SourceError;

/// Fetches the raw body at a URL.
///
/// The gateways only need `GET`, so this is the whole seam between them and
/// the network. Tests substitute a canned implementation.
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn get(&self, url: &str, timeout: Duration) -> Result<Bytes, SourceError>;
}

/// `reqwest` backed fetcher.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    http: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("path-gtfsrt/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetcher {
    async fn get(&self, url: &str, timeout: Duration) -> Result<Bytes, SourceError> {
        let response = self.http.get(url).timeout(timeout).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                message: body.chars().take(500).collect(),
            });
        }

        Ok(response.bytes().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        assert!(ReqwestFetcher::new().is_ok());
    }
}
