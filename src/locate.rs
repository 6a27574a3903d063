//! Finding referenced text again, and capturing the context that makes it findable.

use std::ops::Range;

/// How well an occurrence's surroundings match the expected context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum ContextMatch {
    /// Neither side matches.
    None,
    /// Exactly one side matches.
    Partial,
    /// Both prefix and suffix match.
    Full,
}

/// Locate `text` in `document`, preferring the occurrence whose surroundings
/// match `prefix` and `suffix`. Ties go to the occurrence starting nearest `hint`.
/// Returns `None` if `text` does not occur at all.
pub fn locate(
    document: &str,
    text: &str,
    prefix: &str,
    suffix: &str,
    hint: usize,
) -> Option<Range<usize>> {
    if text.is_empty() {
        return None;
    }

    // Every occurrence, overlapping ones included.
    let starts = std::iter::successors(document.find(text), |&start| {
        let next = start.saturating_add(document.get(start..)?.chars().next()?.len_utf8());
        return document.get(next..)?.find(text).map(|offset| return next.saturating_add(offset));
    });

    return starts
        .map(|start| return start..start.saturating_add(text.len()))
        .max_by_key(|range| {
            let quality = context_match(document, range, prefix, suffix);
            // Reverse distance so that the nearest occurrence is the maximum.
            let distance = range.start.abs_diff(hint);
            return (quality, std::cmp::Reverse(distance));
        });
}

/// Grade one occurrence against the expected context.
fn context_match(document: &str, range: &Range<usize>, prefix: &str, suffix: &str) -> ContextMatch {
    let before = document.get(..range.start).unwrap_or("");
    let after = document.get(range.end..).unwrap_or("");
    let prefix_ok = before.ends_with(prefix);
    let suffix_ok = after.starts_with(suffix);

    return match (prefix_ok, suffix_ok) {
        (true, true) => ContextMatch::Full,
        (false, false) => ContextMatch::None,
        (true, false) | (false, true) => ContextMatch::Partial,
    };
}

/// Capture up to `chars` characters before `from` and after `to`.
/// Offsets that do not fall on character boundaries yield empty context.
pub fn surrounding_context(document: &str, from: usize, to: usize, chars: usize) -> (String, String) {
    let before = document.get(..from).unwrap_or("");
    let after = document.get(to..).unwrap_or("");

    let mut prefix: Vec<char> = before.chars().rev().take(chars).collect();
    prefix.reverse();
    let suffix: String = after.chars().take(chars).collect();

    return (prefix.into_iter().collect(), suffix);
}

/// The full line of `document` containing byte offset `at`, without its newline.
pub fn line_at(document: &str, at: usize) -> &str {
    let before = document.get(..at).unwrap_or("");
    let start = before.rfind('\n').map_or(0, |newline| return newline.saturating_add(1));
    let rest = document.get(start..).unwrap_or("");
    return rest.split('\n').next().unwrap_or("");
}
