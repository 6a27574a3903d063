//! Reference token codec.
//!
//! A token names a byte range in a target document plus enough context to
//! find the text again after edits:
//!
//! ```text
//! ref://notes/b.md#120-135/pre-,"hello world",-post;portal
//! ```
//!
//! Segments of the path, the prefix, the text, and the suffix are
//! percent-encoded. Inside a document a token is written as a markdown
//! link, `[↗](ref://...)`.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::Error;
use crate::types::{ReferenceLocation, Variant};

/// Scheme every token starts with.
pub const SCHEME: &str = "ref://";

/// Link text of an embedded marker.
pub const MARKER_GLYPH: &str = "↗";

/// Matches an embedded marker; capture 1 is the token.
#[allow(clippy::expect_used, reason = "hardcoded pattern, checked by tests")]
pub static MARKER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"\[↗\]\((ref://[^)\n]+)\)").expect("valid marker regex");
});

/// Decode a token into its location.
///
/// # Errors
///
/// Returns `Error::Decode` naming the violated part of the grammar.
pub fn decode(token: &str) -> Result<ReferenceLocation, Error> {
    let rest = token
        .strip_prefix(SCHEME)
        .ok_or_else(|| return Error::decode(token, "missing `ref://` scheme"))?;
    let (raw_file, rest) = rest
        .split_once('#')
        .ok_or_else(|| return Error::decode(token, "missing `#` before range"))?;
    let (raw_range, rest) = rest
        .split_once('/')
        .ok_or_else(|| return Error::decode(token, "missing `/` after range"))?;
    let (from, to) = parse_range(token, raw_range)?;

    let (raw_prefix, rest) = rest
        .split_once('"')
        .ok_or_else(|| return Error::decode(token, "missing opening quote"))?;
    let (raw_text, tail) = rest
        .split_once('"')
        .ok_or_else(|| return Error::decode(token, "missing closing quote"))?;

    let raw_prefix = if raw_prefix.is_empty() {
        raw_prefix
    } else {
        raw_prefix
            .strip_suffix("-,")
            .ok_or_else(|| return Error::decode(token, "prefix must end with `-,`"))?
    };

    let (raw_suffix, variant) = match tail.split_once(';') {
        None => (tail, Variant::Plain),
        Some((suffix, variant)) => (suffix, parse_variant(token, variant)?),
    };
    let raw_suffix = if raw_suffix.is_empty() {
        raw_suffix
    } else {
        raw_suffix
            .strip_prefix(",-")
            .ok_or_else(|| return Error::decode(token, "suffix must start with `,-`"))?
    };

    let filename = percent_decode(token, raw_file)?;
    if filename.is_empty() {
        return Err(Error::decode(token, "empty file name"));
    }
    let text = percent_decode(token, raw_text)?;
    if text.is_empty() {
        return Err(Error::decode(token, "empty quoted text"));
    }

    return Ok(ReferenceLocation {
        filename,
        from,
        prefix: percent_decode(token, raw_prefix)?,
        suffix: percent_decode(token, raw_suffix)?,
        text,
        to,
        variant,
    });
}

/// Encode a location as a token. The plain variant is left implicit.
pub fn encode(location: &ReferenceLocation) -> String {
    let file = location
        .filename
        .split('/')
        .map(|segment| return urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");

    let mut token = format!("{SCHEME}{file}#{}-{}/", location.from, location.to);
    if !location.prefix.is_empty() {
        token.push_str(&urlencoding::encode(&location.prefix));
        token.push_str("-,");
    }
    token.push('"');
    token.push_str(&urlencoding::encode(&location.text));
    token.push('"');
    if !location.suffix.is_empty() {
        token.push_str(",-");
        token.push_str(&urlencoding::encode(&location.suffix));
    }
    if location.variant == Variant::Portal {
        token.push(';');
        token.push_str(Variant::Portal.as_str());
    }
    return token;
}

/// Render the markdown marker that embeds a location in a document.
pub fn marker(location: &ReferenceLocation) -> String {
    return format!("[{MARKER_GLYPH}]({})", encode(location));
}

/// Parse `from-to` into a non-empty byte range.
///
/// # Errors
///
/// Returns `Error::Decode` for non-numeric bounds or `from >= to`.
fn parse_range(token: &str, raw: &str) -> Result<(usize, usize), Error> {
    let (raw_from, raw_to) = raw
        .split_once('-')
        .ok_or_else(|| return Error::decode(token, "range must be `from-to`"))?;
    let from: usize = raw_from
        .parse()
        .map_err(|_err| return Error::decode(token, "range start is not a number"))?;
    let to: usize = raw_to
        .parse()
        .map_err(|_err| return Error::decode(token, "range end is not a number"))?;
    if from >= to {
        return Err(Error::decode(token, "range start must precede range end"));
    }
    return Ok((from, to));
}

/// Parse the keyword after `;`.
///
/// # Errors
///
/// Returns `Error::Decode` for unknown keywords.
fn parse_variant(token: &str, raw: &str) -> Result<Variant, Error> {
    return match raw {
        "plain" => Ok(Variant::Plain),
        "portal" => Ok(Variant::Portal),
        _ => Err(Error::decode(token, &format!("unknown variant `{raw}`"))),
    };
}

/// Percent-decode one token component.
///
/// # Errors
///
/// Returns `Error::Decode` if the escapes do not form valid UTF-8.
fn percent_decode(token: &str, raw: &str) -> Result<String, Error> {
    return urlencoding::decode(raw)
        .map(std::borrow::Cow::into_owned)
        .map_err(|_err| return Error::decode(token, "percent escapes are not valid UTF-8"));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> ReferenceLocation {
        return ReferenceLocation {
            filename: "notes/a b.md".to_string(),
            from: 120,
            prefix: "said \"quote\", then".to_string(),
            suffix: "; and (more)".to_string(),
            text: "hello, world-\"x\"".to_string(),
            to: 135,
            variant: Variant::Portal,
        };
    }

    #[test]
    fn decodes_literal_token() {
        let decoded = decode("ref://fileB#120-135/\"hello world\"").unwrap();
        assert_eq!(decoded.filename, "fileB");
        assert_eq!(decoded.range(), 120..135);
        assert_eq!(decoded.text, "hello world");
        assert_eq!(decoded.prefix, "");
        assert_eq!(decoded.suffix, "");
        assert_eq!(decoded.variant, Variant::Plain);
    }

    #[test]
    fn decode_inverts_encode_with_delimiters_in_every_component() {
        let original = location();
        let token = encode(&original);
        assert!(!token.contains(')'), "token must stay inside a markdown link: {token}");
        assert_eq!(decode(&token).unwrap(), original);
    }

    #[test]
    fn reencoding_keeps_file_and_range() {
        let token = "ref://dir/fileB.md#7-19/pre-,\"hello world\",-post";
        let reencoded = encode(&decode(token).unwrap());
        let again = decode(&reencoded).unwrap();
        assert_eq!(again.filename, "dir/fileB.md");
        assert_eq!((again.from, again.to), (7, 19));
        assert!(reencoded.starts_with("ref://dir/fileB.md#7-19/"), "{reencoded}");
    }

    #[test]
    fn rejects_malformed_tokens() {
        for bad in [
            "http://fileB#1-2/\"x\"",
            "ref://fileB/\"x\"",
            "ref://fileB#5-5/\"x\"",
            "ref://fileB#9-2/\"x\"",
            "ref://fileB#a-2/\"x\"",
            "ref://fileB#1-2/x",
            "ref://fileB#1-2/\"x",
            "ref://fileB#1-2/pre\"x\"",
            "ref://fileB#1-2/\"x\";mirror",
            "ref://#1-2/\"x\"",
            "ref://fileB#1-2/\"\"",
        ] {
            assert!(matches!(decode(bad), Err(Error::Decode { .. })), "accepted {bad}");
        }
    }

    #[test]
    fn marker_pattern_captures_token() {
        let line = format!("see {} here", marker(&location()));
        let captures = MARKER_PATTERN.captures(&line).unwrap();
        assert_eq!(&captures[1], encode(&location()));
    }
}
