use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// whether a request targets a movie or an episode of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Series,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Series => "series",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// one aggregation request: a content id plus the episode coordinates for series.
///
/// season and episode are only meaningful for [`MediaKind::Series`]; the accessors
/// fall back to `1` when they were not supplied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestSpec {
    content_id: String,
    kind: MediaKind,
    season: Option<u32>,
    episode: Option<u32>,
}

impl RequestSpec {
    pub fn movie(content_id: impl Into<String>) -> Self {
        Self {
            content_id: content_id.into(),
            kind: MediaKind::Movie,
            season: None,
            episode: None,
        }
    }

    pub fn series(content_id: impl Into<String>, season: Option<u32>, episode: Option<u32>) -> Self {
        Self {
            content_id: content_id.into(),
            kind: MediaKind::Series,
            season,
            episode,
        }
    }

    pub fn content_id(&self) -> &str {
        &self.content_id
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn is_series(&self) -> bool {
        self.kind == MediaKind::Series
    }

    /// season number, `None` for movies.
    pub fn season(&self) -> Option<u32> {
        self.is_series().then(|| self.season.unwrap_or(1))
    }

    /// episode number, `None` for movies.
    pub fn episode(&self) -> Option<u32> {
        self.is_series().then(|| self.episode.unwrap_or(1))
    }
}

/// format tag of a stream link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// hls master or media playlist.
    Playlist,
    /// progressive video file.
    Video,
    Magnet,
    Unknown,
}

impl MediaType {
    /// guesses the format from the link alone.
    pub fn infer(link: &str) -> Self {
        if link.starts_with("magnet:") {
            return Self::Magnet;
        }

        let path = link
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        if path.ends_with(".m3u8") || path.contains(".m3u8/") {
            Self::Playlist
        } else if [".mp4", ".mkv", ".webm"].iter().any(|ext| path.ends_with(ext)) {
            Self::Video
        } else {
            Self::Unknown
        }
    }
}

/// subtitle track attached to a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtitle {
    pub title: String,
    pub language: String,
    pub format: String,
    pub uri: String,
}

/// a single normalized stream link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamRecord {
    /// provider label, optionally suffixed with a language tag.
    pub server: String,
    /// media url, playlist url or magnet uri. never empty.
    pub link: String,
    pub media_type: MediaType,
    /// headers a player must send when fetching `link`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitles: Option<Vec<Subtitle>>,
}

impl StreamRecord {
    /// builds a record, returning `None` when `link` is blank.
    pub fn new(server: impl Into<String>, link: impl Into<String>) -> Option<Self> {
        let link = link.into().trim().to_string();
        if link.is_empty() {
            return None;
        }

        Some(Self {
            server: server.into(),
            media_type: MediaType::infer(&link),
            link,
            headers: None,
            subtitles: None,
        })
    }

    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = (!headers.is_empty()).then_some(headers);
        self
    }

    pub fn with_subtitles(mut self, subtitles: Vec<Subtitle>) -> Self {
        self.subtitles = (!subtitles.is_empty()).then_some(subtitles);
        self
    }
}

/// a `(label, link)` pair found in a player configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledLink {
    pub label: String,
    pub link: String,
}

impl LabeledLink {
    pub fn new(label: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            link: link.into(),
        }
    }

    /// converts into a record labelled `"<server> - <label>"`.
    pub fn into_record(self, server: &str) -> Option<StreamRecord> {
        let label = self.label.trim();
        let server = if label.is_empty() {
            server.to_string()
        } else {
            format!("{server} - {label}")
        };
        StreamRecord::new(server, self.link)
    }
}
