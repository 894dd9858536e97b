use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use reqwest::Url;
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, HeaderMap, HeaderValue, REFERER, USER_AGENT,
};
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::{debug, info};

use crate::errors::{ProviderError, Result};
use crate::http::{
    ACCEPT_LANGUAGE_VALUE, BROWSER_USER_AGENT, HTML_ACCEPT, HttpClient, origin_from_url,
    parse_json, read_text,
};
use crate::types::{StreamRecord, Subtitle};

/// query parameter carrying the passphrase on decrypt requests.
pub const PASSPHRASE_PARAM: &str = "passphrase";

/// variable name of the encrypted player payload in embed frames.
pub const DEFAULT_PAYLOAD_VAR: &str = "encryptedSource";

static IFRAME_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("iframe[src]").expect("iframe selector must parse"));

/// secret passed to the decryption service. never printed.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Passphrase(String);

impl Passphrase {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Passphrase(<redacted>)")
    }
}

/// location of the decryption microservice.
#[derive(Debug, Clone)]
pub struct DecryptService {
    pub url: String,
    pub passphrase: Passphrase,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DecryptedPayload {
    #[serde(default, alias = "video_url")]
    video_url: Option<String>,
    #[serde(default)]
    subtitles: Vec<DecryptedSubtitle>,
}

#[derive(Debug, Deserialize)]
struct DecryptedSubtitle {
    #[serde(default, alias = "label")]
    title: Option<String>,
    #[serde(default, alias = "lang")]
    language: Option<String>,
    #[serde(default)]
    format: Option<String>,
    #[serde(default, alias = "file", alias = "url")]
    uri: Option<String>,
}

impl DecryptedSubtitle {
    fn into_subtitle(self) -> Option<Subtitle> {
        let uri = self.uri.filter(|u| !u.trim().is_empty())?;
        let language = self
            .language
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| "und".to_string());
        let title = self
            .title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| language.clone());
        let format = self
            .format
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| subtitle_format(&uri).to_string());

        Some(Subtitle {
            title,
            language,
            format,
            uri,
        })
    }
}

fn subtitle_format(uri: &str) -> &'static str {
    let path = uri.split(['?', '#']).next().unwrap_or_default().to_ascii_lowercase();
    if path.ends_with(".srt") {
        "srt"
    } else if path.ends_with(".ass") {
        "ass"
    } else {
        "vtt"
    }
}

/// source of the first `<iframe>` on the page, resolved against `page_url`.
pub fn first_iframe_src(html: &str, page_url: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let src = doc
        .select(&IFRAME_SEL)
        .filter_map(|el| el.value().attr("src"))
        .map(str::trim)
        .find(|src| !src.is_empty())?;

    match Url::parse(page_url) {
        Ok(base) => base.join(src).ok().map(String::from),
        Err(_) => Url::parse(src).ok().map(String::from),
    }
}

/// finds `<name> = { ... }` in `html` and returns the object literal.
///
/// this is the single place that knows how the embed frame lays out its
/// payload; the literal is located by balanced-brace scanning so nested
/// objects and braces inside strings are handled.
pub fn extract_payload_blob<'h>(html: &'h str, name: &str) -> Option<&'h str> {
    if name.is_empty() {
        return None;
    }

    let mut from = 0;
    while let Some(pos) = html[from..].find(name) {
        let start = from + pos;
        let end = start + name.len();
        from = end;

        let bounded = html[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !(c.is_alphanumeric() || c == '_' || c == '$'));
        if !bounded {
            continue;
        }

        let rest = html[end..].trim_start();
        let Some(value) = rest.strip_prefix('=') else {
            continue;
        };
        if value.starts_with('=') {
            continue;
        }

        let value = value.trim_start();
        if value.starts_with('{')
            && let Some(len) = object_literal_len(value)
        {
            return Some(&value[..len]);
        }
    }

    None
}

/// byte length of the object literal at the start of `s`, including both braces.
fn object_literal_len(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (idx, c) in s.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx + c.len_utf8());
                }
            }
            _ => {}
        }
    }

    None
}

/// playback headers for links served from `frame_url`'s host.
fn playback_headers(frame_url: &str) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    headers.insert("User-Agent".to_string(), BROWSER_USER_AGENT.to_string());
    headers.insert("Accept".to_string(), "*/*".to_string());
    headers.insert("Accept-Language".to_string(), ACCEPT_LANGUAGE_VALUE.to_string());

    if let Some(origin) = origin_from_url(frame_url) {
        headers.insert("Referer".to_string(), format!("{origin}/"));
        headers.insert("Origin".to_string(), origin);
    }

    headers
}

/// landing page -> iframe -> encrypted payload -> decrypt service -> record.
pub struct EmbedChainFetcher<'a> {
    http: &'a HttpClient,
    decrypt: &'a DecryptService,
    payload_var: &'a str,
}

impl<'a> EmbedChainFetcher<'a> {
    pub fn new(http: &'a HttpClient, decrypt: &'a DecryptService, payload_var: &'a str) -> Self {
        Self {
            http,
            decrypt,
            payload_var,
        }
    }

    fn page_headers(referer: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static(HTML_ACCEPT));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));

        if let Some(referer) = referer
            && let Ok(v) = HeaderValue::from_str(referer)
        {
            headers.insert(REFERER, v);
        }

        headers
    }

    async fn fetch_frame_url(&self, landing_url: &str) -> Result<String> {
        let html = self
            .http
            .get_text(
                landing_url,
                Self::page_headers(None),
                &format!("loading landing page {landing_url}"),
            )
            .await?;

        first_iframe_src(&html, landing_url).ok_or_else(|| ProviderError::NoEmbedFound {
            page: landing_url.to_string(),
        })
    }

    async fn fetch_payload(&self, frame_url: &str, landing_url: &str) -> Result<String> {
        let referer = origin_from_url(landing_url).map(|origin| format!("{origin}/"));
        let html = self
            .http
            .get_text(
                frame_url,
                Self::page_headers(referer.as_deref()),
                &format!("loading embed frame {frame_url}"),
            )
            .await?;

        extract_payload_blob(&html, self.payload_var)
            .map(String::from)
            .ok_or_else(|| ProviderError::NoPayloadFound {
                name: self.payload_var.to_string(),
                frame: frame_url.to_string(),
            })
    }

    async fn decrypt(&self, blob: String) -> Result<DecryptedPayload> {
        let request = self
            .http
            .post(&self.decrypt.url)
            .query(&[(PASSPHRASE_PARAM, self.decrypt.passphrase.expose())])
            .header(CONTENT_TYPE, "application/json")
            .body(blob);

        let context = "posting payload to decrypt service";
        let decrypted = async {
            let resp = self.http.send(request, context).await?;
            let body = read_text(resp, context).await?;
            parse_json::<DecryptedPayload>(&body, context)
        }
        .await
        .map_err(|err| ProviderError::DecryptionFailed {
            reason: err.to_string(),
        })?;

        Ok(decrypted)
    }

    /// runs the four hops and returns the single record for this provider.
    pub async fn fetch(&self, landing_url: &str, label: &str) -> Result<StreamRecord> {
        info!(%landing_url, "resolving embed chain");

        let frame_url = self.fetch_frame_url(landing_url).await?;
        debug!(%frame_url, "found embed frame");

        let blob = self.fetch_payload(&frame_url, landing_url).await?;
        debug!(%frame_url, bytes = blob.len(), "extracted encrypted payload");

        let payload = self.decrypt(blob).await?;
        let video_url = payload
            .video_url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| ProviderError::DecryptionFailed {
                reason: "decrypted payload has no video url".to_string(),
            })?;

        let subtitles = payload
            .subtitles
            .into_iter()
            .filter_map(DecryptedSubtitle::into_subtitle)
            .collect::<Vec<_>>();

        let record = StreamRecord::new(label, video_url)
            .ok_or_else(|| ProviderError::DecryptionFailed {
                reason: "decrypted payload has no video url".to_string(),
            })?
            .with_headers(playback_headers(&frame_url))
            .with_subtitles(subtitles);

        info!(%landing_url, link = %record.link, "resolved embed chain");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FailureKind;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_string, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FRAME_HTML: &str = r#"<html><script>
        var other = {"a": 1};
        var encryptedSource = {"ct": "abc}def", "iv": "00", "meta": {"s": "x"}};
        player.init(encryptedSource);
    </script></html>"#;

    #[test]
    fn payload_blob_handles_nested_objects_and_braces_in_strings() {
        let blob = extract_payload_blob(FRAME_HTML, "encryptedSource").expect("blob");
        assert_eq!(blob, r#"{"ct": "abc}def", "iv": "00", "meta": {"s": "x"}}"#);
    }

    #[test]
    fn payload_blob_requires_assignment_to_the_exact_name() {
        let html = r#"var myencryptedSource = {"a": 1}; if (encryptedSource == {}) {}"#;
        assert_eq!(extract_payload_blob(html, "encryptedSource"), None);
        assert_eq!(extract_payload_blob("const x = 1;", "encryptedSource"), None);
        assert_eq!(extract_payload_blob(FRAME_HTML, ""), None);
    }

    #[test]
    fn payload_blob_rejects_unterminated_literals() {
        assert_eq!(
            extract_payload_blob(r#"encryptedSource = {"a": {"b": 1}"#, "encryptedSource"),
            None
        );
    }

    #[test]
    fn iframe_src_is_resolved_against_page() {
        let html = r#"<div><iframe src="/e/abc?x=1"></iframe><iframe src="https://b/2"></iframe></div>"#;
        assert_eq!(
            first_iframe_src(html, "https://host.example/embed/movie/tt1").as_deref(),
            Some("https://host.example/e/abc?x=1")
        );

        let html = r#"<iframe src="//player.example/e/abc"></iframe>"#;
        assert_eq!(
            first_iframe_src(html, "https://host.example/embed").as_deref(),
            Some("https://player.example/e/abc")
        );

        assert_eq!(first_iframe_src("<p>nothing</p>", "https://host.example/"), None);
    }

    #[test]
    fn passphrase_is_redacted_in_debug_output() {
        let service = DecryptService {
            url: "https://decrypt.example".into(),
            passphrase: Passphrase::new("hunter2"),
        };
        assert!(!format!("{service:?}").contains("hunter2"));
    }

    #[test]
    fn subtitle_defaults_are_filled_in() {
        let sub = DecryptedSubtitle {
            title: None,
            language: Some("en".into()),
            format: None,
            uri: Some("https://s.example/en.srt?sig=1".into()),
        }
        .into_subtitle()
        .expect("subtitle");
        assert_eq!(sub.title, "en");
        assert_eq!(sub.format, "srt");

        let missing = DecryptedSubtitle {
            title: Some("English".into()),
            language: None,
            format: None,
            uri: None,
        };
        assert!(missing.into_subtitle().is_none());
    }

    async fn mount_chain(server: &MockServer) {
        let frame = format!(r#"<iframe src="{}/frame/abc"></iframe>"#, server.uri());
        Mock::given(method("GET"))
            .and(path("/embed/movie/tt1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(frame))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/frame/abc"))
            .and(header("referer", format!("{}/", server.uri()).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_string(FRAME_HTML))
            .mount(server)
            .await;
    }

    fn fetcher_parts(server: &MockServer) -> (HttpClient, DecryptService) {
        let http = HttpClient::new(Duration::from_secs(5)).unwrap();
        let decrypt = DecryptService {
            url: format!("{}/decrypt", server.uri()),
            passphrase: Passphrase::new("s3cret"),
        };
        (http, decrypt)
    }

    #[tokio::test]
    async fn resolves_full_chain_into_record() {
        let server = MockServer::start().await;
        mount_chain(&server).await;

        Mock::given(method("POST"))
            .and(path("/decrypt"))
            .and(query_param(PASSPHRASE_PARAM, "s3cret"))
            .and(body_string(r#"{"ct": "abc}def", "iv": "00", "meta": {"s": "x"}}"#))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "videoUrl": "https://cdn.example/master.m3u8",
                "subtitles": [
                    { "label": "English", "lang": "en", "file": "https://s.example/en.vtt" },
                    { "label": "Broken" }
                ]
            })))
            .mount(&server)
            .await;

        let (http, decrypt) = fetcher_parts(&server);
        let landing = format!("{}/embed/movie/tt1", server.uri());
        let record = EmbedChainFetcher::new(&http, &decrypt, DEFAULT_PAYLOAD_VAR)
            .fetch(&landing, "Server 2")
            .await
            .expect("chain should resolve");

        assert_eq!(record.server, "Server 2");
        assert_eq!(record.link, "https://cdn.example/master.m3u8");

        let headers = record.headers.expect("playback headers");
        assert_eq!(headers["Origin"], server.uri());
        assert_eq!(headers["Referer"], format!("{}/", server.uri()));
        assert_eq!(headers["User-Agent"], BROWSER_USER_AGENT);
        assert!(headers.contains_key("Accept"));
        assert!(headers.contains_key("Accept-Language"));

        let subtitles = record.subtitles.expect("subtitles");
        assert_eq!(subtitles.len(), 1);
        assert_eq!(subtitles[0].title, "English");
        assert_eq!(subtitles[0].language, "en");
        assert_eq!(subtitles[0].format, "vtt");
    }

    #[tokio::test]
    async fn landing_page_without_iframe_is_no_embed_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>nothing</html>"))
            .mount(&server)
            .await;

        let (http, decrypt) = fetcher_parts(&server);
        let err = EmbedChainFetcher::new(&http, &decrypt, DEFAULT_PAYLOAD_VAR)
            .fetch(&format!("{}/embed/movie/tt1", server.uri()), "Server 2")
            .await
            .expect_err("no iframe");
        assert!(matches!(err, ProviderError::NoEmbedFound { .. }));
    }

    #[tokio::test]
    async fn frame_without_payload_is_no_payload_found() {
        let server = MockServer::start().await;
        let frame = format!(r#"<iframe src="{}/frame/abc"></iframe>"#, server.uri());
        Mock::given(method("GET"))
            .and(path("/embed/movie/tt1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(frame))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/frame/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<script>var x = 1;</script>"))
            .mount(&server)
            .await;

        let (http, decrypt) = fetcher_parts(&server);
        let err = EmbedChainFetcher::new(&http, &decrypt, DEFAULT_PAYLOAD_VAR)
            .fetch(&format!("{}/embed/movie/tt1", server.uri()), "Server 2")
            .await
            .expect_err("no payload");
        assert!(matches!(err, ProviderError::NoPayloadFound { .. }));
    }

    #[tokio::test]
    async fn decrypt_errors_become_decryption_failed() {
        let server = MockServer::start().await;
        mount_chain(&server).await;
        Mock::given(method("POST"))
            .and(path("/decrypt"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (http, decrypt) = fetcher_parts(&server);
        let err = EmbedChainFetcher::new(&http, &decrypt, DEFAULT_PAYLOAD_VAR)
            .fetch(&format!("{}/embed/movie/tt1", server.uri()), "Server 2")
            .await
            .expect_err("decrypt service is down");
        assert_eq!(err.kind(), FailureKind::DecryptionFailed);
    }

    #[tokio::test]
    async fn payload_without_video_url_is_decryption_failed() {
        let server = MockServer::start().await;
        mount_chain(&server).await;
        Mock::given(method("POST"))
            .and(path("/decrypt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "subtitles": [] })))
            .mount(&server)
            .await;

        let (http, decrypt) = fetcher_parts(&server);
        let err = EmbedChainFetcher::new(&http, &decrypt, DEFAULT_PAYLOAD_VAR)
            .fetch(&format!("{}/embed/movie/tt1", server.uri()), "Server 2")
            .await
            .expect_err("no video url");
        assert!(matches!(err, ProviderError::DecryptionFailed { .. }));
    }
}
