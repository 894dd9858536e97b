use std::time::Duration;

use clap::Args;
use streamlinks::prelude::*;

use crate::constants::*;

#[derive(Debug, Clone, Args)]
pub struct AppArgs {
    /// Logging verbosity (error, warn, info, debug)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Use interactive prompts to edit arguments before execution
    #[arg(short, long)]
    pub interactive: bool,
}

#[derive(Debug, Clone, Args)]
pub struct ProviderArgs {
    /// Decrypt service used by embed-chain providers
    #[arg(long, env = DECRYPT_URL_ENV)]
    pub decrypt_url: Option<String>,

    /// Passphrase sent to the decrypt service
    #[arg(long, env = DECRYPT_PASSPHRASE_ENV, hide_env_values = true)]
    pub decrypt_passphrase: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = TIMEOUT_ENV, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Base64 token of the embed host
    #[arg(long, env = HOST_TOKEN_ENV)]
    pub host_token: Option<String>,

    /// Base url of the torrent index
    #[arg(long, env = TORRENT_INDEX_ENV)]
    pub torrent_index: Option<String>,

    /// Torrent index language preference (repeatable)
    #[arg(long = "torrent-language")]
    pub torrent_languages: Vec<String>,

    /// Maximum number of torrent results
    #[arg(long)]
    pub torrent_limit: Option<u32>,

    /// Torrent index sort order (e.g. quality, seeders)
    #[arg(long)]
    pub torrent_sort: Option<String>,
}

impl ProviderArgs {
    pub fn builder(&self) -> StreamsBuilder {
        let mut builder =
            StreamsBuilder::new().timeout(Duration::from_secs(self.timeout_secs.max(1)));

        if let Some(token) = &self.host_token {
            builder = builder.host_token(token);
        }
        if let Some(index) = &self.torrent_index {
            builder = builder.torrent_index(index);
        }
        if let Some(url) = &self.decrypt_url {
            builder = builder.decrypt_endpoint(url);
        }
        if let Some(passphrase) = &self.decrypt_passphrase {
            builder = builder.decrypt_passphrase(passphrase);
        }

        builder.torrent_preferences(self.torrent_preferences())
    }

    pub fn torrent_preferences(&self) -> TorrentPreferences {
        let mut preferences = TorrentPreferences::default();
        if !self.torrent_languages.is_empty() {
            preferences.languages = self.torrent_languages.clone();
        }
        if self.torrent_limit.is_some() {
            preferences.limit = self.torrent_limit;
        }
        if self.torrent_sort.is_some() {
            preferences.sort = self.torrent_sort.clone();
        }
        preferences
    }
}

#[derive(Debug, Clone, Args)]
pub struct StreamsArgs {
    /// Content identifier (e.g. tt0133093)
    #[arg(short, long)]
    pub content_id: Option<String>,

    /// movie or series
    #[arg(short = 'k', long)]
    pub media_kind: Option<String>,

    /// Season number, series only
    #[arg(short, long)]
    pub season: Option<String>,

    /// Episode number, series only
    #[arg(short, long)]
    pub episode: Option<String>,

    /// Reject series requests without both season and episode
    #[arg(long)]
    pub strict_episodes: bool,

    /// Print `{"streams": [...]}` instead of a listing
    #[arg(long)]
    pub json: bool,

    /// Only print the resolved provider urls
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub provider: ProviderArgs,

    #[command(flatten)]
    pub app_args: AppArgs,
}

impl StreamsArgs {
    pub fn params(&self) -> RequestParams {
        RequestParams {
            content_id: self.content_id.clone(),
            media_kind: self.media_kind.clone(),
            season: self.season.clone(),
            episode: self.episode.clone(),
        }
    }

    pub fn policy(&self) -> EpisodePolicy {
        if self.strict_episodes {
            EpisodePolicy::Strict
        } else {
            EpisodePolicy::Lenient
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct QualitiesArgs {
    /// HLS master playlist url
    #[arg(short, long)]
    pub url: Option<String>,

    /// Print the resolutions as json
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub provider: ProviderArgs,

    #[command(flatten)]
    pub app_args: AppArgs,
}
