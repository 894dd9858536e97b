use std::sync::LazyLock;

use regex::Regex;
use reqwest::header::HeaderMap;
use tracing::{debug, info};

use crate::errors::Result;
use crate::http::HttpClient;
use crate::types::LabeledLink;

/// `"title": "<label>", "file": "<link>"` as found in player configurations.
static LABELED_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""title":\s*"([^"]+)",\s*"file":\s*"([^"]+)""#)
        .expect("labeled link regex must compile")
});

/// scans `body` for every label/link pair, in document order.
pub fn extract_labeled_links(body: &str) -> Vec<LabeledLink> {
    LABELED_LINK_RE
        .captures_iter(body)
        .filter_map(|caps| {
            let label = caps.get(1)?.as_str();
            let link = caps.get(2)?.as_str().replace("\\/", "/");
            Some(LabeledLink::new(label, link))
        })
        .collect()
}

/// fetches raw text and pulls label/link pairs out of it.
pub struct PatternFetcher<'a> {
    http: &'a HttpClient,
}

impl<'a> PatternFetcher<'a> {
    pub fn new(http: &'a HttpClient) -> Self {
        Self { http }
    }

    /// a page without any pair is not an error; it just yields nothing.
    pub async fn extract(&self, url: &str) -> Result<Vec<LabeledLink>> {
        info!(%url, "extracting labeled links");
        let body = self
            .http
            .get_text(url, HeaderMap::new(), &format!("loading player page {url}"))
            .await?;

        let links = extract_labeled_links(&body);
        debug!(%url, count = links.len(), "labeled links extracted");
        Ok(links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FailureKind;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn extracts_pairs_in_document_order() {
        let body = r#"player({"title": "En", "file": "http://a"}, {"title": "Fr", "file": "http://b"})"#;
        assert_eq!(
            extract_labeled_links(body),
            vec![
                LabeledLink::new("En", "http://a"),
                LabeledLink::new("Fr", "http://b"),
            ]
        );
    }

    #[test]
    fn label_must_precede_link() {
        let body = r#"{"file": "http://a", "title": "En"}"#;
        assert!(extract_labeled_links(body).is_empty());
    }

    #[test]
    fn unescapes_json_slashes() {
        let body = r#"{"title":"English","file":"https:\/\/cdn.example\/a.m3u8"}"#;
        assert_eq!(
            extract_labeled_links(body),
            vec![LabeledLink::new("English", "https://cdn.example/a.m3u8")]
        );
    }

    #[tokio::test]
    async fn empty_page_yields_no_links() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/embed/oplayer.php"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let http = HttpClient::new(Duration::from_secs(5)).unwrap();
        let links = PatternFetcher::new(&http)
            .extract(&format!("{}/embed/oplayer.php?id=tt1", server.uri()))
            .await
            .expect("empty page is not an error");
        assert!(links.is_empty());
    }

    #[tokio::test]
    async fn non_success_status_is_upstream_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let http = HttpClient::new(Duration::from_secs(5)).unwrap();
        let err = PatternFetcher::new(&http)
            .extract(&format!("{}/embed/player.php?id=tt1", server.uri()))
            .await
            .expect_err("503 should fail");
        assert_eq!(err.kind(), FailureKind::UpstreamUnavailable);
    }
}
