use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::errors::{ProviderError, Result};

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36";
pub const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
pub const ACCEPT_LANGUAGE_VALUE: &str = "en-US,en;q=0.9";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// thin wrapper over a pooled reqwest client.
///
/// every request goes through [`HttpClient::send`], which attaches the context
/// used in error messages and enforces a success status.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// builds a client whose every request is bounded by `timeout`.
    pub fn new(timeout: Duration) -> std::result::Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.client.post(url)
    }

    /// sends `request` and fails unless the status is in the 2xx range.
    pub async fn send(&self, request: RequestBuilder, context: &str) -> Result<Response> {
        let resp = request.send().await.map_err(|source| ProviderError::Request {
            context: context.to_string(),
            source,
        })?;

        ensure_success(resp, context)
    }

    pub async fn get_text(&self, url: &str, headers: HeaderMap, context: &str) -> Result<String> {
        debug!(%url, "fetching text");
        let resp = self.send(self.get(url).headers(headers), context).await?;
        read_text(resp, context).await
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: HeaderMap,
        context: &str,
    ) -> Result<T> {
        let body = self.get_text(url, headers, context).await?;
        parse_json(&body, context)
    }
}

pub fn ensure_success(response: Response, context: &str) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    Err(ProviderError::HttpStatus {
        context: context.to_string(),
        status: response.status(),
    })
}

pub async fn read_text(response: Response, context: &str) -> Result<String> {
    response
        .text()
        .await
        .map_err(|source| ProviderError::ResponseBody {
            context: context.to_string(),
            source,
        })
}

pub fn parse_json<T: DeserializeOwned>(body: &str, context: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|source| ProviderError::Json {
        context: context.to_string(),
        source,
    })
}

/// `scheme://host[:port]` of `url`.
pub fn origin_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    let scheme = parsed.scheme();
    match parsed.port() {
        Some(port) => Some(format!("{scheme}://{host}:{port}")),
        None => Some(format!("{scheme}://{host}")),
    }
}
