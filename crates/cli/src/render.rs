use owo_colors::OwoColorize;
use serde_json::{Value, json};
use streamlinks::prelude::*;

fn media_tag(media_type: MediaType) -> &'static str {
    match media_type {
        MediaType::Playlist => "hls",
        MediaType::Video => "video",
        MediaType::Magnet => "magnet",
        MediaType::Unknown => "?",
    }
}

/// the `{ "streams": [...] }` envelope returned to callers.
pub fn streams_document(streams: &[StreamRecord]) -> Value {
    json!({ "streams": streams })
}

pub fn render_streams_json(streams: &[StreamRecord]) -> Result<String> {
    serde_json::to_string_pretty(&streams_document(streams))
        .map_err(|err| StreamsError::Message(format!("failed to serialize streams: {err}")))
}

pub fn render_streams(streams: &[StreamRecord]) -> String {
    let mut out = String::new();

    for (i, stream) in streams.iter().enumerate() {
        let tag = format!("[{}]", media_tag(stream.media_type));
        out.push_str(&format!(
            "{:>3}. {} {}\n     {}\n",
            i + 1,
            stream.server.bold(),
            tag.dimmed(),
            stream.link.yellow()
        ));

        if let Some(subtitles) = &stream.subtitles {
            let langs = subtitles
                .iter()
                .map(|s| s.language.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&format!("     subtitles: {}\n", langs.cyan()));
        }

        if let Some(headers) = &stream.headers {
            for (name, value) in headers {
                out.push_str(&format!("     {}: {}\n", name.dimmed(), value));
            }
        }
    }

    out
}

pub fn render_resolutions_json(resolutions: &[Resolution]) -> Result<String> {
    serde_json::to_string_pretty(&json!({ "resolutions": resolutions }))
        .map_err(|err| StreamsError::Message(format!("failed to serialize resolutions: {err}")))
}
