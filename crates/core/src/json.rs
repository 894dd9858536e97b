use reqwest::header::{HeaderMap, HeaderValue, REFERER, USER_AGENT};
use serde_json::Value;
use tracing::{debug, info};

use crate::errors::{ProviderError, Result};
use crate::http::{BROWSER_USER_AGENT, HttpClient, origin_from_url};

/// fetches a json document and reads a single string field out of it.
pub struct JsonFieldFetcher<'a> {
    http: &'a HttpClient,
}

impl<'a> JsonFieldFetcher<'a> {
    pub fn new(http: &'a HttpClient) -> Self {
        Self { http }
    }

    fn headers(url: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));

        if let Some(origin) = origin_from_url(url)
            && let Ok(v) = HeaderValue::from_str(&format!("{origin}/"))
        {
            headers.insert(REFERER, v);
        }

        headers
    }

    /// returns the value of `field`, which may be a dotted path such as `data.url`.
    pub async fn fetch_field(&self, url: &str, field: &str) -> Result<String> {
        info!(%url, field, "fetching json field");
        let context = format!("loading json source {url}");
        let doc: Value = self
            .http
            .get_json(url, Self::headers(url), &context)
            .await?;

        let value = read_field(&doc, field).ok_or_else(|| ProviderError::ExtractionFailed {
            what: format!("field `{field}`"),
            context: url.to_string(),
        })?;

        debug!(%url, field, "json field found");
        Ok(value)
    }
}

/// walks a dotted path and returns a non-empty string leaf.
pub fn read_field(doc: &Value, field: &str) -> Option<String> {
    field
        .split('.')
        .try_fold(doc, |node, key| node.get(key))?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
