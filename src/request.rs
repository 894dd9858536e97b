use streamlinks_core::{MediaKind, RequestSpec};

use crate::errors::{Result, StreamsError};

/// how strictly series requests must spell out season and episode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EpisodePolicy {
    /// missing season/episode default to 1.
    #[default]
    Lenient,
    /// series requests must carry both season and episode.
    Strict,
}

/// raw request parameters as received from an outer layer.
#[derive(Debug, Clone, Default)]
pub struct RequestParams {
    pub content_id: Option<String>,
    pub media_kind: Option<String>,
    pub season: Option<String>,
    pub episode: Option<String>,
}

/// parses a media kind tag; only `movie` and `series` are accepted.
pub fn parse_media_kind(raw: &str) -> Result<MediaKind> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "movie" => Ok(MediaKind::Movie),
        "series" => Ok(MediaKind::Series),
        other => Err(StreamsError::Validation(format!(
            "unknown mediaKind `{other}`; expected movie or series"
        ))),
    }
}

fn parse_number(name: &str, raw: Option<&str>) -> Result<Option<u32>> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(None);
    };

    match raw.parse::<u32>() {
        Ok(n) if n > 0 => Ok(Some(n)),
        _ => Err(StreamsError::Validation(format!(
            "{name} must be a positive integer, got `{raw}`"
        ))),
    }
}

impl RequestParams {
    pub fn new(content_id: impl Into<String>, media_kind: impl Into<String>) -> Self {
        Self {
            content_id: Some(content_id.into()),
            media_kind: Some(media_kind.into()),
            ..Self::default()
        }
    }

    pub fn season(mut self, season: impl Into<String>) -> Self {
        self.season = Some(season.into());
        self
    }

    pub fn episode(mut self, episode: impl Into<String>) -> Self {
        self.episode = Some(episode.into());
        self
    }

    /// turns raw parameters into a [`RequestSpec`] or a validation error.
    pub fn validate(&self, policy: EpisodePolicy) -> Result<RequestSpec> {
        let content_id = self
            .content_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| StreamsError::Validation("contentId is required".to_string()))?;

        let kind = self
            .media_kind
            .as_deref()
            .ok_or_else(|| StreamsError::Validation("mediaKind is required".to_string()))
            .and_then(parse_media_kind)?;

        match kind {
            MediaKind::Movie => Ok(RequestSpec::movie(content_id)),
            MediaKind::Series => {
                let season = parse_number("season", self.season.as_deref())?;
                let episode = parse_number("episode", self.episode.as_deref())?;

                if policy == EpisodePolicy::Strict && (season.is_none() || episode.is_none()) {
                    return Err(StreamsError::Validation(
                        "season and episode are required for series".to_string(),
                    ));
                }

                Ok(RequestSpec::series(content_id, season, episode))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_content_id_is_rejected() {
        let params = RequestParams {
            media_kind: Some("movie".into()),
            ..RequestParams::default()
        };
        let err = params.validate(EpisodePolicy::Lenient).unwrap_err();
        assert!(err.is_validation());

        let err = RequestParams::new("  ", "movie")
            .validate(EpisodePolicy::Lenient)
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn unknown_media_kind_is_rejected() {
        let err = RequestParams::new("tt1", "anime")
            .validate(EpisodePolicy::Lenient)
            .unwrap_err();
        assert!(err.to_string().contains("unknown mediaKind"));
    }

    #[test]
    fn lenient_series_defaults_to_first_episode() {
        let spec = RequestParams::new("tt1", "Series")
            .validate(EpisodePolicy::Lenient)
            .unwrap();
        assert_eq!(spec.season(), Some(1));
        assert_eq!(spec.episode(), Some(1));
    }

    #[test]
    fn strict_series_requires_both_coordinates() {
        let err = RequestParams::new("tt1", "series")
            .season("2")
            .validate(EpisodePolicy::Strict)
            .unwrap_err();
        assert!(err.is_validation());

        let spec = RequestParams::new("tt1", "series")
            .season("2")
            .episode("5")
            .validate(EpisodePolicy::Strict)
            .unwrap();
        assert_eq!((spec.season(), spec.episode()), (Some(2), Some(5)));
    }

    #[test]
    fn movie_ignores_season_and_episode() {
        let spec = RequestParams::new("tt1", "movie")
            .season("abc")
            .validate(EpisodePolicy::Strict)
            .unwrap();
        assert_eq!(spec.season(), None);
    }

    #[test]
    fn non_numeric_episode_is_rejected() {
        let err = RequestParams::new("tt1", "series")
            .episode("0")
            .validate(EpisodePolicy::Lenient)
            .unwrap_err();
        assert!(err.to_string().contains("episode must be a positive integer"));
    }
}
