//! Document corpus: where the backlink index reads markdown from.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::Config;
use crate::error::Error;

/// Read access to every document in a vault.
pub trait Corpus {
    /// Vault-relative paths of every document, `/`-separated.
    ///
    /// # Errors
    ///
    /// Returns an error if the corpus cannot be enumerated.
    fn documents(&self) -> Result<Vec<String>, Error>;

    /// Full text of one document.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingFile` if the document no longer exists,
    /// or another error if it cannot be read.
    fn read(&self, path: &str) -> Result<String, Error>;
}

/// Markdown files under a directory, filtered by the config's include/exclude prefixes.
pub struct FsCorpus<'a> {
    /// Filters applied to relative paths.
    config: &'a Config,
    /// Vault root.
    root: PathBuf,
}

impl<'a> FsCorpus<'a> {
    /// Corpus rooted at `root`.
    pub fn new(root: &Path, config: &'a Config) -> Self {
        return Self {
            config,
            root: root.to_path_buf(),
        };
    }

    /// Convert an absolute or root-relative path into a vault path, if it is
    /// a markdown document this corpus would scan.
    pub fn vault_path(&self, path: &Path) -> Option<String> {
        if !path.extension().is_some_and(|ext| return ext == "md") {
            return None;
        }
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let joined = relative
            .components()
            .filter_map(|c| {
                return match c {
                    std::path::Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                    _ => None,
                };
            })
            .collect::<Vec<_>>()
            .join("/");
        if joined.is_empty() || !self.config.should_scan(&joined) {
            return None;
        }
        return Some(joined);
    }
}

impl Corpus for FsCorpus<'_> {
    fn documents(&self) -> Result<Vec<String>, Error> {
        let mut paths = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry.map_err(|e| return Error::Io(std::io::Error::other(e)))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(path) = self.vault_path(entry.path()) {
                paths.push(path);
            }
        }
        return Ok(paths);
    }

    fn read(&self, path: &str) -> Result<String, Error> {
        return match std::fs::read_to_string(self.root.join(path)) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::MissingFile {
                path: PathBuf::from(path),
            }),
            Err(e) => Err(Error::Io(e)),
            Ok(content) => Ok(content),
        };
    }
}

/// In-memory corpus for hosts that already hold document text.
#[derive(Debug, Clone, Default)]
pub struct MemoryCorpus {
    /// Document text by vault path.
    documents: BTreeMap<String, String>,
}

impl MemoryCorpus {
    /// Remove a document.
    pub fn remove(&mut self, path: &str) {
        self.documents.remove(path);
    }

    /// Insert or replace a document.
    pub fn write(&mut self, path: &str, content: &str) {
        self.documents.insert(path.to_string(), content.to_string());
    }
}

impl Corpus for MemoryCorpus {
    fn documents(&self) -> Result<Vec<String>, Error> {
        return Ok(self.documents.keys().cloned().collect());
    }

    fn read(&self, path: &str) -> Result<String, Error> {
        return self
            .documents
            .get(path)
            .cloned()
            .ok_or_else(|| return Error::MissingFile { path: PathBuf::from(path) });
    }
}
