use std::time::Instant;

use futures::future::join_all;
use streamlinks_core::{
    DecryptService, EmbedChainFetcher, HttpClient, JsonFieldFetcher, PatternFetcher,
    ProviderError, RequestSpec, Resolution, StreamRecord, TemplateVars, TorrentIndexFetcher,
    fetch_resolutions,
};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::builder::StreamsBuilder;
use crate::errors::{Result, StreamsError};
use crate::providers::{Extraction, ProviderDescriptor};

/// aggregates stream links from every configured provider.
pub struct StreamsClient {
    http: HttpClient,
    host: String,
    index: String,
    options: String,
    decrypt: Option<DecryptService>,
    providers: Vec<ProviderDescriptor>,
}

impl StreamsClient {
    pub(crate) fn new(
        http: HttpClient,
        host: String,
        index: String,
        options: String,
        decrypt: Option<DecryptService>,
        providers: Vec<ProviderDescriptor>,
    ) -> Self {
        Self {
            http,
            host,
            index,
            options,
            decrypt,
            providers,
        }
    }

    pub fn builder() -> StreamsBuilder {
        StreamsBuilder::new()
    }

    /// decoded embed host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// active providers in output order.
    pub fn providers(&self) -> &[ProviderDescriptor] {
        &self.providers
    }

    /// concrete url `provider` will be queried with for `spec`.
    pub fn resolve(&self, provider: &ProviderDescriptor, spec: &RequestSpec) -> String {
        provider.endpoint.resolve(
            spec,
            TemplateVars {
                host: &self.host,
                index: &self.index,
                options: &self.options,
            },
        )
    }

    /// `(provider id, url)` for every active provider, in priority order.
    pub fn resolve_endpoints(&self, spec: &RequestSpec) -> Vec<(String, String)> {
        self.providers
            .iter()
            .map(|p| (p.id.clone(), self.resolve(p, spec)))
            .collect()
    }

    async fn fetch_provider(
        &self,
        provider: &ProviderDescriptor,
        url: &str,
    ) -> std::result::Result<Vec<StreamRecord>, ProviderError> {
        match &provider.extraction {
            Extraction::Pattern => Ok(PatternFetcher::new(&self.http)
                .extract(url)
                .await?
                .into_iter()
                .filter_map(|pair| pair.into_record(&provider.label))
                .collect()),
            Extraction::JsonField { field } => {
                let link = JsonFieldFetcher::new(&self.http)
                    .fetch_field(url, field)
                    .await?;
                Ok(StreamRecord::new(&provider.label, link).into_iter().collect())
            }
            Extraction::EmbedChain { payload_var } => {
                let decrypt = self
                    .decrypt
                    .as_ref()
                    .ok_or_else(|| ProviderError::DecryptionFailed {
                        reason: "no decrypt service configured".to_string(),
                    })?;
                let record = EmbedChainFetcher::new(&self.http, decrypt, payload_var)
                    .fetch(url, &provider.label)
                    .await?;
                Ok(vec![record])
            }
            Extraction::TorrentIndex => {
                TorrentIndexFetcher::new(&self.http)
                    .fetch_candidates(url, &provider.label)
                    .await
            }
        }
    }

    /// queries every provider concurrently and concatenates their records.
    ///
    /// a failing provider is logged and contributes nothing; output order is
    /// the provider table order no matter which provider answers first.
    pub async fn aggregate(&self, spec: &RequestSpec) -> Result<Vec<StreamRecord>> {
        if spec.content_id().trim().is_empty() {
            return Err(StreamsError::Validation("contentId is required".to_string()));
        }

        let request_span = info_span!(
            "aggregate",
            content_id = %spec.content_id(),
            kind = %spec.kind(),
            season = spec.season(),
            episode = spec.episode()
        );

        let fetches = self.providers.iter().map(|provider| {
            let url = self.resolve(provider, spec);
            let span = info_span!(
                parent: &request_span,
                "provider",
                id = %provider.id,
                label = %provider.label,
                %url
            );

            async move {
                let started = Instant::now();
                match self.fetch_provider(provider, &url).await {
                    Ok(records) => {
                        info!(
                            count = records.len(),
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "provider finished"
                        );
                        records
                    }
                    Err(err) => {
                        warn!(
                            kind = ?err.kind(),
                            error = %err,
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "provider failed; contributing no records"
                        );
                        Vec::new()
                    }
                }
            }
            .instrument(span)
        });

        let streams = join_all(fetches)
            .await
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();

        request_span.in_scope(|| info!(total = streams.len(), "aggregation finished"));
        Ok(streams)
    }

    /// lists the resolution ladder of a master playlist.
    pub async fn fetch_resolutions(&self, url: &str) -> Result<Vec<Resolution>> {
        debug!(%url, "fetching resolution ladder");
        Ok(fetch_resolutions(&self.http, url).await?)
    }
}
