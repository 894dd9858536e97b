pub mod embed;
pub mod endpoint;
pub mod errors;
pub mod host;
pub mod http;
pub mod json;
pub mod pattern;
pub mod playlist;
pub mod torrent;
pub mod types;

pub use embed::{DecryptService, EmbedChainFetcher, Passphrase, extract_payload_blob};
pub use endpoint::{EndpointTemplate, TemplateVars};
pub use errors::{DecodeError, FailureKind, ProviderError, Result};
pub use host::decode_host;
pub use http::HttpClient;
pub use json::JsonFieldFetcher;
pub use pattern::{PatternFetcher, extract_labeled_links};
pub use playlist::{Resolution, fetch_resolutions};
pub use torrent::{TorrentCandidate, TorrentIndexFetcher, TorrentPreferences};
pub use types::{LabeledLink, MediaKind, MediaType, RequestSpec, StreamRecord, Subtitle};
