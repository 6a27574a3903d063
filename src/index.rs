//! Backlink index: incoming references per document, rebuilt from the corpus.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::Config;
use crate::corpus::Corpus;
use crate::error::Error;
use crate::hasher;
use crate::scanner;
use crate::types::{Backlink, BacklinkId};

/// A backlink together with its content-derived identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedBacklink {
    /// The backlink itself.
    pub backlink: Backlink,
    /// Identity used for markers.
    pub id: BacklinkId,
}

/// Ids that appeared or disappeared in one index update.
/// Marker layout recreates exactly these and leaves the rest in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexDelta {
    /// Ids present after the update but not before, sorted.
    pub added: Vec<BacklinkId>,
    /// Ids present before the update but not after, sorted.
    pub removed: Vec<BacklinkId>,
}

impl IndexDelta {
    /// Whether nothing changed.
    pub fn is_empty(&self) -> bool {
        return self.added.is_empty() && self.removed.is_empty();
    }

    /// Fold a later delta into this one.
    pub fn merge(&mut self, later: Self) {
        let mut added: BTreeSet<BacklinkId> = self.added.drain(..).collect();
        let mut removed: BTreeSet<BacklinkId> = self.removed.drain(..).collect();
        for id in later.removed {
            if !added.remove(&id) {
                removed.insert(id);
            }
        }
        for id in later.added {
            if !removed.remove(&id) {
                added.insert(id);
            }
        }
        self.added = added.into_iter().collect();
        self.removed = removed.into_iter().collect();
    }
}

/// Backlinks keyed by the document that writes them, in document order.
#[derive(Debug, Clone, Default)]
pub struct BacklinkIndex {
    /// Entries per referencing document.
    by_source: BTreeMap<String, Vec<IndexedBacklink>>,
}

impl BacklinkIndex {
    /// Every backlink whose referenced document is `target`, ordered by
    /// referencing path and then document order.
    pub fn backlinks_to(&self, target: &str) -> Vec<&IndexedBacklink> {
        return self
            .by_source
            .values()
            .flatten()
            .filter(|entry| return entry.backlink.referenced_location.filename == target)
            .collect();
    }

    /// Backlinks written in `source`, in document order.
    pub fn backlinks_from(&self, source: &str) -> &[IndexedBacklink] {
        return self.by_source.get(source).map(Vec::as_slice).unwrap_or_default();
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.by_source.clear();
    }

    /// Look a backlink up by id.
    pub fn get(&self, id: &BacklinkId) -> Option<&IndexedBacklink> {
        return self.by_source.values().flatten().find(|entry| return &entry.id == id);
    }

    /// Whether the index holds no backlinks.
    pub fn is_empty(&self) -> bool {
        return self.by_source.values().all(Vec::is_empty);
    }

    /// All entries, ordered by referencing path then document order.
    pub fn iter(&self) -> impl Iterator<Item = &IndexedBacklink> {
        return self.by_source.values().flatten();
    }

    /// Number of backlinks.
    pub fn len(&self) -> usize {
        return self.by_source.values().map(Vec::len).sum();
    }

    /// Recompute the backlinks written in one document and merge them in,
    /// leaving every other document's entries untouched. A document that no
    /// longer exists loses its entries.
    ///
    /// # Errors
    ///
    /// Returns read errors other than `Error::MissingFile`.
    pub fn recompute_file(
        &mut self,
        corpus: &dyn Corpus,
        path: &str,
        config: &Config,
    ) -> Result<IndexDelta, Error> {
        let before = self.ids();
        match corpus.read(path) {
            Err(Error::MissingFile { .. }) => {
                tracing::debug!(path, "document gone, dropping its backlinks");
                self.by_source.remove(path);
            },
            Err(e) => return Err(e),
            Ok(content) => {
                self.by_source.insert(path.to_string(), index_document(&content, path, config));
            },
        }
        return Ok(diff(&before, &self.ids()));
    }

    /// Replace the whole index with a fresh scan of every document.
    /// Documents that vanish between listing and reading are skipped.
    ///
    /// # Errors
    ///
    /// Returns enumeration errors and read errors other than `Error::MissingFile`.
    pub fn rebuild_all(&mut self, corpus: &dyn Corpus, config: &Config) -> Result<IndexDelta, Error> {
        let before = self.ids();
        let mut by_source = BTreeMap::new();

        for path in corpus.documents()? {
            let content = match corpus.read(&path) {
                Err(Error::MissingFile { .. }) => {
                    tracing::warn!(path, "document vanished during rebuild");
                    continue;
                },
                Err(e) => return Err(e),
                Ok(content) => content,
            };
            by_source.insert(path.clone(), index_document(&content, &path, config));
        }

        self.by_source = by_source;
        let delta = diff(&before, &self.ids());
        tracing::debug!(
            backlinks = self.len(),
            added = delta.added.len(),
            removed = delta.removed.len(),
            "rebuilt backlink index"
        );
        return Ok(delta);
    }

    /// Current id set.
    fn ids(&self) -> BTreeSet<BacklinkId> {
        return self.iter().map(|entry| return entry.id.clone()).collect();
    }
}

/// Compare two id sets.
fn diff(before: &BTreeSet<BacklinkId>, after: &BTreeSet<BacklinkId>) -> IndexDelta {
    return IndexDelta {
        added: after.difference(before).cloned().collect(),
        removed: before.difference(after).cloned().collect(),
    };
}

/// Extract and identify the backlinks written in one document.
fn index_document(content: &str, path: &str, config: &Config) -> Vec<IndexedBacklink> {
    return scanner::extract_backlinks(content, path, config)
        .into_iter()
        .map(|backlink| {
            return IndexedBacklink {
                id: hasher::backlink_id(&backlink),
                backlink,
            };
        })
        .collect();
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
mod tests {
    use super::*;
    use crate::corpus::MemoryCorpus;

    const TOKEN: &str = "[↗](ref://target.md#0-5/\"hello\")";

    fn corpus() -> MemoryCorpus {
        let mut corpus = MemoryCorpus::default();
        corpus.write("target.md", "hello world");
        corpus.write("a.md", &format!("from a {TOKEN}"));
        corpus.write("b.md", &format!("b says {TOKEN} too"));
        return corpus;
    }

    #[test]
    fn two_documents_referencing_one_location() {
        let mut index = BacklinkIndex::default();
        let delta = index.rebuild_all(&corpus(), &Config::default()).unwrap();
        assert_eq!(delta.added.len(), 2);

        let found = index.backlinks_to("target.md");
        assert_eq!(found.len(), 2);
        assert_eq!(
            found[0].backlink.referenced_location,
            found[1].backlink.referenced_location
        );
        assert_ne!(
            found[0].backlink.referencing_location,
            found[1].backlink.referencing_location
        );
        assert_eq!(found[0].backlink.referencing_location.filename, "a.md");
        assert_eq!(found[1].backlink.referencing_location.filename, "b.md");
        assert!(index.backlinks_to("a.md").is_empty());
    }

    #[test]
    fn rebuilding_unchanged_text_keeps_ids() {
        let mut index = BacklinkIndex::default();
        index.rebuild_all(&corpus(), &Config::default()).unwrap();
        let first: Vec<BacklinkId> = index.iter().map(|e| e.id.clone()).collect();

        let delta = index.rebuild_all(&corpus(), &Config::default()).unwrap();
        let second: Vec<BacklinkId> = index.iter().map(|e| e.id.clone()).collect();

        assert!(delta.is_empty(), "{delta:?}");
        assert_eq!(first, second);
    }

    #[test]
    fn recompute_merges_one_document() {
        let mut corpus = corpus();
        let mut index = BacklinkIndex::default();
        index.rebuild_all(&corpus, &Config::default()).unwrap();
        let untouched = index.backlinks_from("b.md").to_vec();

        corpus.write("a.md", "no references any more");
        let delta = index.recompute_file(&corpus, "a.md", &Config::default()).unwrap();

        assert_eq!(delta.removed.len(), 1);
        assert!(delta.added.is_empty());
        assert_eq!(index.backlinks_from("b.md"), untouched.as_slice());
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn recompute_of_deleted_document_drops_entries() {
        let mut corpus = corpus();
        let mut index = BacklinkIndex::default();
        index.rebuild_all(&corpus, &Config::default()).unwrap();

        corpus.remove("b.md");
        let delta = index.recompute_file(&corpus, "b.md", &Config::default()).unwrap();
        assert_eq!(delta.removed.len(), 1);
        assert_eq!(index.backlinks_to("target.md").len(), 1);
    }

    #[test]
    fn lookup_by_id() {
        let mut index = BacklinkIndex::default();
        index.rebuild_all(&corpus(), &Config::default()).unwrap();
        let first = index.iter().next().unwrap().clone();
        assert_eq!(index.get(&first.id), Some(&first));
        assert_eq!(index.get(&BacklinkId("backlink-none".to_string())), None);
    }

    #[test]
    fn merged_deltas_cancel_out() {
        let a = BacklinkId("a".to_string());
        let mut delta = IndexDelta {
            added: vec![a.clone()],
            removed: Vec::new(),
        };
        delta.merge(IndexDelta {
            added: Vec::new(),
            removed: vec![a],
        });
        assert!(delta.is_empty());
    }
}
