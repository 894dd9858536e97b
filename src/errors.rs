use thiserror::Error;

use streamlinks_core::{DecodeError, ProviderError};

pub type Result<T> = std::result::Result<T, StreamsError>;

#[derive(Debug, Error)]
pub enum StreamsError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("failed building reqwest client: {0}")]
    BuildClient(#[source] reqwest::Error),

    #[error("failed to decode provider host: {0}")]
    Decode(#[from] DecodeError),

    #[error("invalid provider configuration: {0}")]
    Config(String),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("{0}")]
    Message(String),
}

impl StreamsError {
    /// true for errors caused by the caller's input rather than by this process.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// http status an outer layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Provider(_) => 502,
            _ => 500,
        }
    }
}
