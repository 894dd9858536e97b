use streamlinks_core::EndpointTemplate;
use streamlinks_core::embed::DEFAULT_PAYLOAD_VAR;

/// how a provider's response is turned into stream records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// `"title"`/`"file"` pairs scraped from the raw page.
    Pattern,
    /// a single string field of a json document.
    JsonField { field: String },
    /// landing page, iframe, encrypted payload, decrypt service.
    EmbedChain { payload_var: String },
    /// torrent index json with magnet synthesis.
    TorrentIndex,
}

/// one row of the provider table. order in the table is output order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDescriptor {
    pub id: String,
    pub label: String,
    pub endpoint: EndpointTemplate,
    pub extraction: Extraction,
}

impl ProviderDescriptor {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        endpoint: EndpointTemplate,
        extraction: Extraction,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            endpoint,
            extraction,
        }
    }
}

/// the built-in provider table, highest priority first.
pub fn default_providers() -> Vec<ProviderDescriptor> {
    vec![
        ProviderDescriptor::new(
            "server1",
            "Server 1",
            EndpointTemplate::new(
                "https://{host}/embed/oplayer.php?id={id}",
                "https://{host}/embed/oplayer.php?id={id}&s={season}&e={episode}",
            ),
            Extraction::Pattern,
        ),
        ProviderDescriptor::new(
            "server2",
            "Server 2",
            EndpointTemplate::new(
                "https://{host}/embed/movie/{id}",
                "https://{host}/embed/tv/{id}/{season}/{episode}",
            ),
            Extraction::EmbedChain {
                payload_var: DEFAULT_PAYLOAD_VAR.to_string(),
            },
        ),
        ProviderDescriptor::new(
            "server3",
            "Server 3",
            EndpointTemplate::new(
                "https://viet.{host}/movie/{id}",
                "https://viet.{host}/tv/{id}/{season}/{episode}",
            ),
            Extraction::Pattern,
        ),
        ProviderDescriptor::new(
            "server4",
            "Server 4",
            EndpointTemplate::new(
                "https://{host}/embed/player.php?id={id}",
                "https://{host}/embed/player.php?id={id}&s={season}&e={episode}",
            ),
            Extraction::Pattern,
        ),
        ProviderDescriptor::new(
            "server5",
            "Server 5",
            EndpointTemplate::new(
                "https://{host}/api/getVideoSource?type=movie&id={id}",
                "https://{host}/api/getVideoSource?type=tv&id={id}&s={season}/{episode}",
            ),
            Extraction::JsonField {
                field: "videoSource".to_string(),
            },
        ),
        ProviderDescriptor::new(
            "torrentio",
            "Torrentio",
            EndpointTemplate::new(
                "{index}/{options}/stream/movie/{id}.json",
                "{index}/{options}/stream/series/{id}.json?season={season}&episode={episode}",
            ),
            Extraction::TorrentIndex,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn default_ids_are_unique_and_torrent_index_is_last() {
        let providers = default_providers();
        let ids: HashSet<_> = providers.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids.len(), providers.len());
        assert_eq!(
            providers.last().map(|p| &p.extraction),
            Some(&Extraction::TorrentIndex)
        );
    }

    #[test]
    fn movie_templates_never_reference_episode_coordinates() {
        for provider in default_providers() {
            assert!(!provider.endpoint.movie.contains("{season}"), "{}", provider.id);
            assert!(!provider.endpoint.movie.contains("{episode}"), "{}", provider.id);
        }
    }
}
