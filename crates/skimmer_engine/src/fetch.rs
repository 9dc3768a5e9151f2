use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::{StreamExt, TryStreamExt};

use crate::types::TransferError;

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    /// Whole-request deadline. `None` leaves large transfers unbounded.
    pub request_timeout: Option<Duration>,
    pub redirect_limit: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
            redirect_limit: 5,
        }
    }
}

/// A successfully opened response body, consumed chunk by chunk.
pub struct FetchedBody {
    stream: BoxStream<'static, Result<Bytes, TransferError>>,
    pub content_length: Option<u64>,
    pub final_url: String,
}

impl std::fmt::Debug for FetchedBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchedBody")
            .field("content_length", &self.content_length)
            .field("final_url", &self.final_url)
            .finish_non_exhaustive()
    }
}

impl FetchedBody {
    /// Wraps an in-memory payload; used by fake fetchers in tests.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let len = bytes.len() as u64;
        Self {
            stream: futures_util::stream::iter(vec![Ok(Bytes::from(bytes))]).boxed(),
            content_length: Some(len),
            final_url: String::new(),
        }
    }

    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, TransferError> {
        self.stream.next().await.transpose()
    }
}

#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Opens a streaming GET for `url`. A non-success status is an error
    /// here; no body handle is produced for it.
    async fn fetch(&self, url: &str) -> Result<FetchedBody, TransferError>;
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestFetcher {
    settings: FetchSettings,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, TransferError> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .redirect(reqwest::redirect::Policy::limited(
                self.settings.redirect_limit,
            ));
        if let Some(timeout) = self.settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        builder
            .build()
            .map_err(|err| TransferError::Network(err.to_string()))
    }

    /// Buffers a whole response as text; used for the listing page itself.
    pub async fn fetch_text(&self, url: &str) -> Result<String, TransferError> {
        let mut body = self.fetch(url).await?;
        let mut bytes = Vec::new();
        while let Some(chunk) = body.next_chunk().await? {
            bytes.extend_from_slice(&chunk);
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedBody, TransferError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| TransferError::InvalidUrl(err.to_string()))?;
        let client = self.build_client()?;

        let response = client
            .get(parsed)
            .send()
            .await
            .map_err(TransferError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::HttpStatus {
                status: status.as_u16(),
                reason: status
                    .canonical_reason()
                    .unwrap_or("Unknown Status")
                    .to_string(),
            });
        }

        let final_url = response.url().to_string();
        let content_length = response.content_length();
        let stream = response
            .bytes_stream()
            .map_err(TransferError::from_reqwest)
            .boxed();

        Ok(FetchedBody {
            stream,
            content_length,
            final_url,
        })
    }
}
