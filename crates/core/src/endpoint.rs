use crate::types::RequestSpec;

/// movie and series url templates for one provider.
///
/// supported placeholders: `{host}`, `{index}`, `{id}`, `{season}`, `{episode}`
/// and `{options}`.
/// `{id}` is percent-encoded; the others are substituted verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointTemplate {
    pub movie: String,
    pub series: String,
}

/// values substituted into a template besides the request itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateVars<'a> {
    pub host: &'a str,
    /// torrent index base url, without a trailing slash.
    pub index: &'a str,
    pub options: &'a str,
}

impl EndpointTemplate {
    pub fn new(movie: impl Into<String>, series: impl Into<String>) -> Self {
        Self {
            movie: movie.into(),
            series: series.into(),
        }
    }

    /// resolves the concrete url for `spec`.
    ///
    /// movie requests use the movie template, so season and episode never leak
    /// into them even if the template author referenced them.
    pub fn resolve(&self, spec: &RequestSpec, vars: TemplateVars<'_>) -> String {
        let template = if spec.is_series() {
            &self.series
        } else {
            &self.movie
        };

        let id = urlencoding::encode(spec.content_id());
        let mut url = template
            .replace("{host}", vars.host)
            .replace("{index}", vars.index)
            .replace("{options}", vars.options)
            .replace("{id}", &id);

        match (spec.season(), spec.episode()) {
            (Some(season), Some(episode)) => {
                url = url
                    .replace("{season}", &season.to_string())
                    .replace("{episode}", &episode.to_string());
            }
            _ => {
                url = url.replace("{season}", "").replace("{episode}", "");
            }
        }

        url
    }
}
