use reqwest::header::HeaderMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::errors::{ProviderError, Result};
use crate::http::{HttpClient, parse_json};
use crate::types::StreamRecord;

/// base url of the default torrent index.
pub const DEFAULT_TORRENT_INDEX: &str = "https://torrentio.strem.fun";

/// sort/language/limit preferences embedded in the index url path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorrentPreferences {
    pub sort: Option<String>,
    pub languages: Vec<String>,
    pub limit: Option<u32>,
}

impl Default for TorrentPreferences {
    fn default() -> Self {
        Self {
            sort: None,
            languages: vec!["hindi".to_string()],
            limit: Some(3),
        }
    }
}

impl TorrentPreferences {
    /// renders `sort=..|language=..|limit=..` with the separators percent-encoded.
    pub fn options(&self) -> String {
        let mut parts = Vec::new();

        if let Some(sort) = &self.sort {
            parts.push(format!("sort={}", urlencoding::encode(sort)));
        }

        if !self.languages.is_empty() {
            let langs = self
                .languages
                .iter()
                .map(|l| urlencoding::encode(l).into_owned())
                .collect::<Vec<_>>()
                .join(",");
            parts.push(format!("language={langs}"));
        }

        if let Some(limit) = self.limit {
            parts.push(format!("limit={limit}"));
        }

        parts.join("%7C")
    }
}

/// one normalized file/torrent offered by the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorrentCandidate {
    /// upstream file index, or the 1-based position in the response.
    pub file_index: u32,
    pub title: String,
    pub file_name: String,
    /// direct url or synthesized magnet uri.
    pub link: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IndexResponse {
    List(Vec<Value>),
    Wrapped { streams: Vec<Value> },
}

/// `magnet:?xt=urn:btih:<hash>` followed by one encoded `tr` per tracker.
pub fn magnet_uri(info_hash: &str, trackers: &[String]) -> String {
    let mut link = format!("magnet:?xt=urn:btih:{info_hash}");
    for tracker in trackers {
        link.push_str("&tr=");
        link.push_str(&urlencoding::encode(tracker));
    }
    link
}

/// strips a leading `{ "trackers": [...] }` element off a bare candidate list.
fn split_trackers(mut items: Vec<Value>) -> (Vec<String>, Vec<Value>) {
    let trackers = match items.first().and_then(|first| first.get("trackers")) {
        Some(Value::Array(list)) => list
            .iter()
            .filter_map(Value::as_str)
            .map(String::from)
            .collect(),
        _ => return (Vec::new(), items),
    };

    items.remove(0);
    (trackers, items)
}

/// trimmed string at `field`; anything that is not a non-empty string reads as absent.
fn str_field<'v>(item: &'v Value, field: &str) -> Option<&'v str> {
    item.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// upstream file index, accepting a number or a numeric string.
fn file_index(item: &Value) -> Option<u32> {
    match item.get("fileIdx")? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// normalizes a raw index document into candidates.
///
/// candidates without a url or info hash, and elements that are not
/// candidate objects at all, are skipped.
pub fn parse_candidates(doc: Value) -> Result<Vec<TorrentCandidate>> {
    let response: IndexResponse =
        serde_json::from_value(doc).map_err(|source| ProviderError::Json {
            context: "reading torrent index response".to_string(),
            source,
        })?;

    let (trackers, items) = match response {
        IndexResponse::List(items) => split_trackers(items),
        IndexResponse::Wrapped { streams } => (Vec::new(), streams),
    };

    let candidates = items
        .into_iter()
        .enumerate()
        .filter_map(|(idx, item)| {
            if !item.is_object() {
                debug!(index = idx, "skipping non-object index entry");
                return None;
            }

            let link = match (str_field(&item, "url"), str_field(&item, "infoHash")) {
                (Some(url), _) => url.to_string(),
                (None, Some(hash)) => magnet_uri(hash, &trackers),
                (None, None) => {
                    debug!(index = idx, "skipping candidate without url or info hash");
                    return None;
                }
            };

            let title = str_field(&item, "title")
                .or_else(|| str_field(&item, "name"))
                .unwrap_or_default()
                .to_string();
            let file_name = item
                .get("behaviorHints")
                .and_then(|hints| str_field(hints, "filename"))
                .map(String::from)
                .unwrap_or_else(|| title.clone());

            Some(TorrentCandidate {
                file_index: file_index(&item).unwrap_or(idx as u32 + 1),
                title,
                file_name,
                link,
            })
        })
        .collect();

    Ok(candidates)
}

/// queries the torrent index and turns every usable candidate into a record.
pub struct TorrentIndexFetcher<'a> {
    http: &'a HttpClient,
}

impl<'a> TorrentIndexFetcher<'a> {
    pub fn new(http: &'a HttpClient) -> Self {
        Self { http }
    }

    pub async fn fetch_candidates(&self, url: &str, label: &str) -> Result<Vec<StreamRecord>> {
        info!(%url, "querying torrent index");
        let context = format!("loading torrent index {url}");
        let body = self.http.get_text(url, HeaderMap::new(), &context).await?;
        let doc: Value = parse_json(&body, &context)?;

        let records = parse_candidates(doc)?
            .into_iter()
            .filter_map(|candidate| {
                debug!(
                    file_index = candidate.file_index,
                    title = %candidate.title,
                    file_name = %candidate.file_name,
                    "torrent candidate"
                );
                StreamRecord::new(label, candidate.link)
            })
            .collect::<Vec<_>>();

        debug!(%url, count = records.len(), "torrent index parsed");
        Ok(records)
    }
}
