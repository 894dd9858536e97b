use inquire::{InquireError, Select, Text};
use streamlinks::prelude::*;

use crate::constants::MEDIA_KINDS;

fn prompt_error(what: &str) -> impl FnOnce(InquireError) -> StreamsError + '_ {
    move |err| StreamsError::Message(format!("failed to read {what}: {err}"))
}

/// lets the user fill in or edit the request before it is validated.
pub fn prompt_for_params(params: RequestParams) -> Result<RequestParams> {
    let content_id = Text::new("content id:")
        .with_help_message("e.g. tt0133093")
        .with_initial_value(params.content_id.as_deref().unwrap_or_default())
        .prompt()
        .map_err(prompt_error("content id"))?;

    let cursor = params
        .media_kind
        .as_deref()
        .and_then(|kind| {
            MEDIA_KINDS
                .iter()
                .position(|k| k.eq_ignore_ascii_case(kind.trim()))
        })
        .unwrap_or(0);
    let media_kind = Select::new("media kind:", MEDIA_KINDS.to_vec())
        .with_starting_cursor(cursor)
        .prompt()
        .map_err(prompt_error("media kind"))?;

    let mut prompted = RequestParams::new(content_id, media_kind);
    if media_kind == "series" {
        let season = Text::new("season:")
            .with_help_message("leave empty for season 1")
            .with_initial_value(params.season.as_deref().unwrap_or_default())
            .prompt()
            .map_err(prompt_error("season"))?;
        let episode = Text::new("episode:")
            .with_help_message("leave empty for episode 1")
            .with_initial_value(params.episode.as_deref().unwrap_or_default())
            .prompt()
            .map_err(prompt_error("episode"))?;

        prompted = prompted.season(season).episode(episode);
    }

    Ok(prompted)
}

pub fn prompt_for_playlist(url: Option<String>) -> Result<String> {
    Text::new("playlist url:")
        .with_help_message("an HLS master playlist (.m3u8)")
        .with_initial_value(url.as_deref().unwrap_or_default())
        .prompt()
        .map_err(prompt_error("playlist url"))
}
