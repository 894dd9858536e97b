pub mod builder;
pub mod client;
pub mod errors;
pub mod providers;
pub mod request;

pub use builder::*;
pub use client::*;
pub use errors::*;
pub use providers::*;
pub use request::*;

pub mod prelude {
    pub use crate::builder::StreamsBuilder;
    pub use crate::client::StreamsClient;
    pub use crate::errors::{Result, StreamsError};
    pub use crate::providers::{Extraction, ProviderDescriptor, default_providers};
    pub use crate::request::{EpisodePolicy, RequestParams, parse_media_kind};
    pub use streamlinks_core::{
        EndpointTemplate, MediaKind, MediaType, RequestSpec, Resolution, StreamRecord, Subtitle,
        TorrentPreferences,
    };
}
