//! Freshness checking: does each reference still point at its text?

use crate::corpus::Corpus;
use crate::error::Error;
use crate::locate;
use crate::types::ReferenceLocation;

/// Result of checking one reference against its target document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckResult {
    /// The target file or the referenced text is gone.
    Broken(&'static str),
    /// The text still sits at the recorded offset.
    Fresh,
    /// The text was found elsewhere; carries the byte offset it now starts at.
    Moved(usize),
}

/// Compare one referenced location against the current target text.
///
/// # Errors
///
/// Returns read errors other than a missing file, which counts as broken.
pub fn check_location(corpus: &dyn Corpus, location: &ReferenceLocation) -> Result<CheckResult, Error> {
    let document = match corpus.read(&location.filename) {
        Err(Error::MissingFile { .. }) => return Ok(CheckResult::Broken("file not found")),
        Err(e) => return Err(e),
        Ok(d) => d,
    };

    if document
        .get(location.from..)
        .is_some_and(|rest| return rest.starts_with(&location.text))
    {
        return Ok(CheckResult::Fresh);
    }

    return match locate::locate(
        &document,
        &location.text,
        &location.prefix,
        &location.suffix,
        location.from,
    ) {
        None => Ok(CheckResult::Broken("text not found")),
        Some(found) => Ok(CheckResult::Moved(found.start)),
    };
}
