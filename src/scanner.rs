use regex::Captures;

use crate::codec::{self, MARKER_PATTERN};
use crate::config::Config;
use crate::locate;
use crate::types::{Backlink, ReferenceLocation, Variant};

/// Extract every backlink written in one document, in document order.
/// Markers whose token fails to decode are logged and skipped.
pub fn extract_backlinks(content: &str, source: &str, config: &Config) -> Vec<Backlink> {
    let mut backlinks = Vec::new();
    for cap in MARKER_PATTERN.captures_iter(content) {
        let Some(backlink) = parse_marker_capture(&cap, content, source, config) else {
            continue;
        };
        backlinks.push(backlink);
    }
    return backlinks;
}

/// Turn one marker match into a backlink.
/// Returns `None` when the token is malformed.
fn parse_marker_capture(
    cap: &Captures<'_>,
    content: &str,
    source: &str,
    config: &Config,
) -> Option<Backlink> {
    let whole = cap.get(0)?;
    let token = cap.get(1)?.as_str();

    let referenced = match codec::decode(token) {
        Ok(location) => location,
        Err(e) => {
            tracing::warn!(source, "skipping marker: {e}");
            return None;
        },
    };

    // Offsets come from this match, not from searching for the text again,
    // so identical markers on one page stay distinct.
    let (prefix, suffix) =
        locate::surrounding_context(content, whole.start(), whole.end(), config.context_chars);
    let referencing = ReferenceLocation {
        filename: source.to_string(),
        from: whole.start(),
        prefix,
        suffix,
        text: whole.as_str().to_string(),
        to: whole.end(),
        variant: Variant::Plain,
    };

    let portal_text = (referenced.variant == Variant::Portal)
        .then(|| return portal_preview(content, whole.start(), config.portal_chars));

    return Some(Backlink {
        data_string: token.to_string(),
        portal_text,
        referenced_location: referenced,
        referencing_location: referencing,
    });
}

/// The referencing line with every marker removed, truncated to `chars` characters.
fn portal_preview(content: &str, at: usize, chars: usize) -> String {
    let line = locate::line_at(content, at);
    let stripped = MARKER_PATTERN.replace_all(line, "");
    return stripped.trim().chars().take(chars).collect();
}
