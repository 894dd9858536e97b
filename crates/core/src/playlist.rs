use std::sync::LazyLock;

use regex::Regex;
use reqwest::header::HeaderMap;
use serde::Serialize;
use tracing::info;

use crate::errors::{ProviderError, Result};
use crate::http::HttpClient;

static STREAM_INF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#EXT-X-STREAM-INF:.*RESOLUTION=(\d+)x(\d+)")
        .expect("stream inf regex must compile")
});

/// one rung of a playlist's resolution ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

/// every `RESOLUTION=WxH` variant declared in a master playlist, in order.
pub fn parse_resolutions(playlist: &str) -> Vec<Resolution> {
    STREAM_INF_RE
        .captures_iter(playlist)
        .filter_map(|caps| {
            Some(Resolution {
                width: caps.get(1)?.as_str().parse().ok()?,
                height: caps.get(2)?.as_str().parse().ok()?,
            })
        })
        .collect()
}

/// fetches a master playlist and lists its resolution variants.
pub async fn fetch_resolutions(http: &HttpClient, url: &str) -> Result<Vec<Resolution>> {
    info!(%url, "inspecting playlist");
    let body = http
        .get_text(url, HeaderMap::new(), &format!("loading playlist {url}"))
        .await?;

    let resolutions = parse_resolutions(&body);
    if resolutions.is_empty() {
        return Err(ProviderError::ExtractionFailed {
            what: "stream resolutions".to_string(),
            context: url.to_string(),
        });
    }

    Ok(resolutions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FailureKind;
    use std::time::Duration;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MASTER: &str = "#EXTM3U\n\
        #EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=640x360\n360.m3u8\n\
        #EXT-X-STREAM-INF:BANDWIDTH=5000000,RESOLUTION=1920x1080,CODECS=\"avc1\"\n1080.m3u8\n";

    #[test]
    fn parses_ladder_in_order() {
        assert_eq!(
            parse_resolutions(MASTER),
            vec![
                Resolution { width: 640, height: 360 },
                Resolution { width: 1920, height: 1080 },
            ]
        );
    }

    #[tokio::test]
    async fn media_playlist_has_no_resolutions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("#EXTM3U\n#EXTINF:4,\nseg0.ts\n"))
            .mount(&server)
            .await;

        let http = HttpClient::new(Duration::from_secs(5)).unwrap();
        let err = fetch_resolutions(&http, &format!("{}/index.m3u8", server.uri()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::ExtractionFailed);
    }
}
