// Subscription HTTP client
//
// A subscription is a plain GET returning the feed document. The client
// only enforces a success status and hands the raw body back; decoding is
// the core crate's job.

use bytes::Bytes;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Raw HTTP client for subscription feeds.
pub struct SubscriptionClient {
    http: reqwest::Client,
}

impl SubscriptionClient {
    /// Create a new client from a `TransportConfig`.
    pub fn new(transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
        })
    }

    /// Fetch the raw body of a subscription.
    ///
    /// Fails with [`Error::Status`] on any non-2xx response and with
    /// [`Error::Transport`] when the request or body read fails.
    pub async fn fetch(&self, url: &Url) -> Result<Bytes, Error> {
        debug!(source = %redact(url), "GET subscription");

        let resp = self.http.get(url.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().await?;
        trace!(source = %redact(url), bytes = body.len(), "subscription body received");
        Ok(body)
    }

    /// Parse `raw` and fetch it.
    pub async fn fetch_str(&self, raw: &str) -> Result<Bytes, Error> {
        let url: Url = raw.parse()?;
        self.fetch(&url).await
    }
}

/// Render a URL without path, query or credentials.
///
/// Subscription URLs embed access tokens, so logs only ever see the
/// scheme, host and port.
pub fn redact(url: &Url) -> String {
    let host = url.host_str().unwrap_or("?");
    match url.port() {
        Some(port) => format!("{}://{host}:{port}", url.scheme()),
        None => format!("{}://{host}", url.scheme()),
    }
}
