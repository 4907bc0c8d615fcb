//! Plain-text lines printed for the operator.

use std::fmt::Display;

use boundaries_sync::RemoteUrl;

/// A URL as shown to the operator, without any embedded credentials.
pub fn shown_url(url: &str) -> String {
    RemoteUrl::parse(url)
        .map(|remote| remote.url.to_string())
        .unwrap_or_else(|_| url.to_string())
}

/// One entry's notes: slug, source, each note, then a blank line.
pub fn note_block(slug: &str, source_url: Option<&str>, notes: &[String]) -> String {
    let mut block = format!("{slug}\n");
    if let Some(source) = source_url {
        block.push_str(&format!("Source: {source}\n"));
    }
    for note in notes {
        block.push_str(note);
        block.push('\n');
    }
    block.push('\n');
    block
}

/// A per-entry failure that does not stop the run.
pub fn failure(slug: &str, url: &str, err: &dyn Display) -> String {
    format!("{slug} {err}: {}\n", shown_url(url))
}
