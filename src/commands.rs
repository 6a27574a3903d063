//! Core CLI commands for backref: index, backlinks, check, decode, encode.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use serde::Serialize;

use crate::check::{CheckResult, check_location};
use crate::codec;
use crate::config::Config;
use crate::corpus::FsCorpus;
use crate::error;
use crate::index::{BacklinkIndex, IndexedBacklink};
use crate::types::{Backlink, BacklinkId, ReferenceLocation};

/// One backlink as printed by `--json`.
#[derive(Serialize)]
struct BacklinkRecord<'a> {
    /// The backlink's fields, inlined.
    #[serde(flatten)]
    backlink: &'a Backlink,
    /// Content-derived id.
    id: &'a BacklinkId,
}

/// List the backlinks pointing at one document.
///
/// # Errors
///
/// Returns errors from config loading, scanning, or JSON output.
pub fn backlinks(file: &str, json: bool) -> Result<(), error::Error> {
    let root = PathBuf::from(".");
    let (_, index) = load_index(&root)?;
    let entries = index.backlinks_to(file);

    if entries.is_empty() && !json {
        eprintln!("No backlinks to `{file}`.");
        return Ok(());
    }
    return print_entries(entries, json);
}

/// Verify every reference still matches its target text.
///
/// # Errors
///
/// Returns errors from config loading, scanning, or reading targets.
pub fn check() -> Result<ExitCode, error::Error> {
    let root = PathBuf::from(".");
    let (config, index) = load_index(&root)?;
    let corpus = FsCorpus::new(&root, &config);
    let mut broken_count = 0_u32;
    let mut moved_count = 0_u32;

    for entry in index.iter() {
        let referenced = &entry.backlink.referenced_location;
        match check_location(&corpus, referenced)? {
            CheckResult::Broken(reason) => {
                broken_count = broken_count.saturating_add(1);
                println!("BROKEN  {} ({reason})", describe(&entry.backlink));
            },
            CheckResult::Fresh => {},
            CheckResult::Moved(at) => {
                moved_count = moved_count.saturating_add(1);
                println!("MOVED   {} (now at {at})", describe(&entry.backlink));
            },
        }
    }

    // Exit code priority: broken (2) > moved (1) > fresh (0).
    if broken_count > 0 {
        println!();
        println!("{broken_count} broken, {moved_count} moved");
        return Ok(ExitCode::from(2));
    } else if moved_count > 0 {
        println!();
        println!("{moved_count} moved");
        return Ok(ExitCode::from(1));
    } else {
        let total = index.len();
        println!("All {total} references fresh");
        return Ok(ExitCode::SUCCESS);
    }
}

/// Print a token's decoded location as JSON.
///
/// # Errors
///
/// Returns `Error::Decode` for a malformed token.
pub fn decode(token: &str) -> Result<(), error::Error> {
    let location = codec::decode(token)?;
    println!("{}", serde_json::to_string_pretty(&location)?);
    return Ok(());
}

/// Print the token for a location.
///
/// # Errors
///
/// Returns `Error::Decode` if the location would not survive a round trip,
/// such as an empty range or empty text.
pub fn encode(location: &ReferenceLocation) -> Result<(), error::Error> {
    let token = codec::encode(location);
    codec::decode(&token)?;
    println!("{token}");
    return Ok(());
}

/// Rebuild and list every backlink in the vault.
///
/// # Errors
///
/// Returns errors from config loading, scanning, or JSON output.
pub fn index(json: bool) -> Result<(), error::Error> {
    let root = PathBuf::from(".");
    let (_, index) = load_index(&root)?;
    print_entries(index.iter().collect(), json)?;
    if !json {
        eprintln!("Indexed {} backlinks", index.len());
    }
    return Ok(());
}

/// One-line summary of a backlink: where it is written and what it points at.
pub(crate) fn describe(backlink: &Backlink) -> String {
    let referencing = &backlink.referencing_location;
    let referenced = &backlink.referenced_location;
    return format!(
        "{}@{} -> {}#{}-{} \"{}\"",
        referencing.filename,
        referencing.from,
        referenced.filename,
        referenced.from,
        referenced.to,
        referenced.text
    );
}

/// Load config and build the index for the vault at `root`.
///
/// # Errors
///
/// Returns errors from config loading or scanning.
fn load_index(root: &Path) -> Result<(Config, BacklinkIndex), error::Error> {
    let config = Config::load(root)?;
    let mut index = BacklinkIndex::default();
    index.rebuild_all(&FsCorpus::new(root, &config), &config)?;
    return Ok((config, index));
}

/// Print entries one per line, or as a JSON array.
///
/// # Errors
///
/// Returns `Error::Json` if serialization fails.
fn print_entries(entries: Vec<&IndexedBacklink>, json: bool) -> Result<(), error::Error> {
    if json {
        let records: Vec<BacklinkRecord<'_>> = entries
            .into_iter()
            .map(|entry| {
                return BacklinkRecord {
                    backlink: &entry.backlink,
                    id: &entry.id,
                };
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    for entry in entries {
        println!("{}", describe(&entry.backlink));
    }
    return Ok(());
}
