use std::collections::HashSet;
use std::time::Duration;

use reqwest::Url;
use streamlinks_core::host::DEFAULT_HOST_TOKEN;
use streamlinks_core::http::DEFAULT_TIMEOUT;
use streamlinks_core::torrent::DEFAULT_TORRENT_INDEX;
use streamlinks_core::{
    DecryptService, EndpointTemplate, HttpClient, Passphrase, RequestSpec, TemplateVars,
    TorrentPreferences, decode_host,
};
use tracing::warn;

use crate::client::StreamsClient;
use crate::errors::{Result, StreamsError};
use crate::providers::{Extraction, ProviderDescriptor, default_providers};

pub struct StreamsBuilder {
    host_token: String,
    host: Option<String>,
    timeout: Duration,
    torrent_index: String,
    decrypt_url: Option<String>,
    passphrase: Option<Passphrase>,
    torrent: TorrentPreferences,
    providers: Vec<ProviderDescriptor>,
    overrides: Vec<(String, EndpointTemplate)>,
}

impl Default for StreamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamsBuilder {
    /// creates a builder with the built-in provider table and no decrypt service.
    pub fn new() -> Self {
        Self {
            host_token: DEFAULT_HOST_TOKEN.to_string(),
            host: None,
            timeout: DEFAULT_TIMEOUT,
            torrent_index: DEFAULT_TORRENT_INDEX.to_string(),
            decrypt_url: None,
            passphrase: None,
            torrent: TorrentPreferences::default(),
            providers: default_providers(),
            overrides: Vec::new(),
        }
    }

    /// sets the obfuscated token the embed host is decoded from.
    pub fn host_token(mut self, token: &str) -> Self {
        self.host_token = token.to_string();
        self
    }

    /// sets the embed host directly, bypassing the token.
    pub fn host(mut self, host: &str) -> Self {
        self.host = Some(host.to_string());
        self
    }

    /// bounds every outbound request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// base url substituted for `{index}` in torrent-index templates.
    pub fn torrent_index(mut self, url: &str) -> Self {
        self.torrent_index = url.trim().trim_end_matches('/').to_string();
        self
    }

    pub fn decrypt_endpoint(mut self, url: &str) -> Self {
        self.decrypt_url = Some(url.to_string());
        self
    }

    pub fn decrypt_passphrase(mut self, passphrase: &str) -> Self {
        self.passphrase = Some(Passphrase::new(passphrase));
        self
    }

    pub fn torrent_preferences(mut self, preferences: TorrentPreferences) -> Self {
        self.torrent = preferences;
        self
    }

    /// replaces the whole provider table.
    pub fn providers(mut self, providers: Vec<ProviderDescriptor>) -> Self {
        self.providers = providers;
        self
    }

    /// overrides the endpoint template of the provider with `id`.
    pub fn endpoint(mut self, id: &str, template: EndpointTemplate) -> Self {
        self.overrides.push((id.to_string(), template));
        self
    }

    fn decrypt_service(&self) -> Option<DecryptService> {
        let url = self.decrypt_url.clone()?;
        let passphrase = self.passphrase.clone().filter(|p| !p.is_empty())?;
        Some(DecryptService { url, passphrase })
    }

    fn check_templates(provider: &ProviderDescriptor, vars: TemplateVars<'_>) -> Result<()> {
        let samples = [
            RequestSpec::movie("tt0000001"),
            RequestSpec::series("tt0000001", Some(1), Some(1)),
        ];

        for spec in &samples {
            let url = provider.endpoint.resolve(spec, vars);
            Url::parse(&url).map_err(|err| {
                StreamsError::Config(format!(
                    "{} {} template resolves to invalid url {url}: {err}",
                    provider.id,
                    spec.kind()
                ))
            })?;
        }

        Ok(())
    }

    /// builds a [`StreamsClient`] using the configured options.
    ///
    /// embed-chain providers are left out when no decrypt service is configured.
    pub fn build(self) -> Result<StreamsClient> {
        let host = match &self.host {
            Some(host) => host.clone(),
            None => decode_host(&self.host_token)?,
        };
        let options = self.torrent.options();
        let decrypt = self.decrypt_service();

        let mut providers = self.providers.clone();
        for (id, template) in &self.overrides {
            let provider = providers
                .iter_mut()
                .find(|p| &p.id == id)
                .ok_or_else(|| StreamsError::Config(format!("no provider with id `{id}`")))?;
            provider.endpoint = template.clone();
        }

        let mut seen = HashSet::new();
        for provider in &providers {
            if !seen.insert(provider.id.as_str()) {
                return Err(StreamsError::Config(format!(
                    "duplicate provider id `{}`",
                    provider.id
                )));
            }
        }

        if decrypt.is_none() {
            providers.retain(|p| {
                let keep = !matches!(p.extraction, Extraction::EmbedChain { .. });
                if !keep {
                    warn!(provider = %p.id, "no decrypt service configured; embed-chain provider disabled");
                }
                keep
            });
        }

        let vars = TemplateVars {
            host: &host,
            index: &self.torrent_index,
            options: &options,
        };
        for provider in &providers {
            Self::check_templates(provider, vars)?;
        }

        let http = HttpClient::new(self.timeout).map_err(StreamsError::BuildClient)?;

        Ok(StreamsClient::new(
            http,
            host,
            self.torrent_index,
            options,
            decrypt,
            providers,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_build_decodes_host_and_disables_embed_chain() {
        let client = StreamsBuilder::new().build().expect("default build");
        assert_eq!(client.host(), "autoembed.cc");
        assert!(
            client
                .providers()
                .iter()
                .all(|p| !matches!(p.extraction, Extraction::EmbedChain { .. }))
        );
    }

    #[test]
    fn decrypt_service_enables_embed_chain() {
        let client = StreamsBuilder::new()
            .decrypt_endpoint("https://decrypt.example/api")
            .decrypt_passphrase("s3cret")
            .build()
            .expect("build");
        assert_eq!(client.providers().len(), default_providers().len());
    }

    #[test]
    fn malformed_host_token_fails_build() {
        let err = StreamsBuilder::new()
            .host_token("%%%")
            .build()
            .err()
            .expect("bad token");
        assert!(matches!(err, StreamsError::Decode(_)));
    }

    #[test]
    fn unknown_override_is_a_configuration_error() {
        let err = StreamsBuilder::new()
            .endpoint("nope", EndpointTemplate::new("https://a/{id}", "https://a/{id}"))
            .build()
            .err()
            .expect("unknown id");
        assert!(matches!(err, StreamsError::Config(_)));
    }

    #[test]
    fn template_without_scheme_is_a_configuration_error() {
        let err = StreamsBuilder::new()
            .endpoint(
                "server1",
                EndpointTemplate::new("{host}/embed?id={id}", "{host}/embed?id={id}"),
            )
            .build()
            .err()
            .expect("invalid template");
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn torrent_index_base_is_configurable() {
        let client = StreamsBuilder::new()
            .torrent_index("http://mirror.example:7000/")
            .build()
            .expect("build");
        let urls = client.resolve_endpoints(&RequestSpec::movie("tt0133093"));
        let (_, torrent) = urls
            .iter()
            .find(|(id, _)| id == "torrentio")
            .expect("torrent index provider");
        assert_eq!(
            torrent,
            "http://mirror.example:7000/language=hindi%7Climit=3/stream/movie/tt0133093.json"
        );
    }

    #[test]
    fn relative_torrent_index_is_a_configuration_error() {
        let err = StreamsBuilder::new()
            .torrent_index("mirror.example")
            .build()
            .err()
            .expect("index without scheme");
        assert!(matches!(err, StreamsError::Config(_)));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut providers = default_providers();
        providers.push(providers[0].clone());
        let err = StreamsBuilder::new()
            .providers(providers)
            .build()
            .err()
            .expect("duplicate");
        assert!(err.to_string().contains("duplicate provider id"));
    }
}
