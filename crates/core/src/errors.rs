use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProviderError>;

/// failure of a single provider fetch.
///
/// every variant is recoverable at the aggregation boundary; [`ProviderError::kind`]
/// maps it onto the coarse taxonomy used for logging.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed while {context}: {source}")]
    Request {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read response body while {context}: {source}")]
    ResponseBody {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{context} returned {status}")]
    HttpStatus {
        context: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to decode JSON while {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no inline frame found on {page}")]
    NoEmbedFound { page: String },

    #[error("no `{name}` payload found in {frame}")]
    NoPayloadFound { name: String, frame: String },

    #[error("decryption failed: {reason}")]
    DecryptionFailed { reason: String },

    #[error("expected {what} missing from {context}")]
    ExtractionFailed { what: String, context: String },
}

/// failure decoding an obfuscated host token.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("token is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("token does not decode to utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("decoded value {0:?} is not a hostname")]
    InvalidHostname(String),
}

/// coarse classification of a [`ProviderError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// non-success status, network failure, timeout, or unreadable payload.
    UpstreamUnavailable,
    /// the response was fine but the expected pattern or field was absent.
    ExtractionFailed,
    /// the decryption service was unreachable or returned nothing usable.
    DecryptionFailed,
}

impl ProviderError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Request { .. }
            | Self::ResponseBody { .. }
            | Self::HttpStatus { .. }
            | Self::Json { .. } => FailureKind::UpstreamUnavailable,
            Self::NoEmbedFound { .. }
            | Self::NoPayloadFound { .. }
            | Self::ExtractionFailed { .. } => FailureKind::ExtractionFailed,
            Self::DecryptionFailed { .. } => FailureKind::DecryptionFailed,
        }
    }

    /// true when the request never reached a usable response, including timeouts.
    pub fn is_upstream_unavailable(&self) -> bool {
        self.kind() == FailureKind::UpstreamUnavailable
    }
}
