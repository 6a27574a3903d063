//! In-memory host used by controller and event tests.

use std::collections::BTreeMap;
use std::ops::Range;

use crate::error::Error;
use crate::host::{EditorSurface, OpenedLeaf, Workspace};
use crate::locate;
use crate::types::{ElementId, LeafId, ScrollInfo, SessionKind};

/// One pane.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FakeLeaf {
    /// Vault path shown.
    pub file: String,
    /// Ranges currently highlighted.
    pub highlights: Vec<Range<usize>>,
    /// Current opacity.
    pub opacity: f32,
    /// Vertical scroll offset.
    pub scroll_top: f64,
    /// Document text.
    pub text: String,
}

/// Panes, markers, and files, with a record of the calls that matter.
#[derive(Debug, Default)]
pub(crate) struct FakeHost {
    /// Focused leaf.
    pub active: Option<LeafId>,
    /// Leaves closed so far, in order.
    pub detached: Vec<LeafId>,
    /// Which leaf each marker element sits in.
    pub elements: BTreeMap<ElementId, LeafId>,
    /// Vault files that can be opened.
    pub files: BTreeMap<String, String>,
    /// Open leaves.
    pub leaves: BTreeMap<LeafId, FakeLeaf>,
    /// Counter for temporary leaf ids.
    next_leaf: usize,
    /// Leaves revealed so far, in order.
    pub revealed: Vec<LeafId>,
}

impl FakeHost {
    /// Highlights on a leaf; empty if the leaf is gone.
    pub fn highlights(&self, leaf: &LeafId) -> Vec<Range<usize>> {
        return self.leaves.get(leaf).map(|l| return l.highlights.clone()).unwrap_or_default();
    }

    /// Open a persistent leaf showing a vault file.
    pub fn open_leaf(&mut self, id: &str, file: &str, scroll_top: f64) -> LeafId {
        let leaf = LeafId(id.to_string());
        let text = self.files.get(file).cloned().unwrap_or_default();
        self.leaves.insert(
            leaf.clone(),
            FakeLeaf {
                file: file.to_string(),
                highlights: Vec::new(),
                opacity: 1.0,
                scroll_top,
                text,
            },
        );
        self.active = Some(leaf.clone());
        return leaf;
    }

    /// Put a marker element inside a leaf.
    pub fn place_marker(&mut self, element: &str, leaf: &LeafId) -> ElementId {
        let element = ElementId(element.to_string());
        self.elements.insert(element.clone(), leaf.clone());
        return element;
    }

    /// Scroll offset of a leaf.
    pub fn scroll_top(&self, leaf: &LeafId) -> Option<f64> {
        return self.leaves.get(leaf).map(|l| return l.scroll_top);
    }

    /// Add a vault file.
    pub fn with_file(mut self, path: &str, text: &str) -> Self {
        self.files.insert(path.to_string(), text.to_string());
        return self;
    }
}

impl Workspace for FakeHost {
    fn active_leaf(&self) -> Option<LeafId> {
        return self.active.clone();
    }

    fn detach_leaf(&mut self, leaf: &LeafId) {
        if self.leaves.remove(leaf).is_some() {
            self.detached.push(leaf.clone());
        }
    }

    fn has_leaf(&self, leaf: &LeafId) -> bool {
        return self.leaves.contains_key(leaf);
    }

    fn leaf_containing(&self, element: &ElementId) -> Option<LeafId> {
        return self.elements.get(element).filter(|leaf| return self.has_leaf(leaf)).cloned();
    }

    fn leaf_showing(&self, file: &str, _near: &LeafId) -> Option<LeafId> {
        return self
            .leaves
            .iter()
            .find(|(_, leaf)| return leaf.file == file)
            .map(|(id, _)| return id.clone());
    }

    fn open_in_adjacent_tab(
        &mut self,
        origin: &LeafId,
        file: &str,
        _kind: SessionKind,
    ) -> Result<OpenedLeaf, Error> {
        if !self.has_leaf(origin) {
            return Err(Error::LeafNotFound {
                leaf: origin.to_string(),
            });
        }
        let text = self.files.get(file).cloned().ok_or_else(|| {
            return Error::MissingFile {
                path: file.into(),
            };
        })?;
        self.next_leaf = self.next_leaf.saturating_add(1);
        let leaf = LeafId(format!("temp-{}", self.next_leaf));
        self.leaves.insert(
            leaf.clone(),
            FakeLeaf {
                file: file.to_string(),
                highlights: Vec::new(),
                opacity: 1.0,
                scroll_top: 0.0,
                text,
            },
        );
        return Ok(OpenedLeaf {
            is_temporary: true,
            leaf,
        });
    }

    fn open_files(&self) -> Vec<String> {
        let mut files: Vec<String> = self.leaves.values().map(|l| return l.file.clone()).collect();
        files.sort();
        files.dedup();
        return files;
    }

    fn reveal_leaf(&mut self, leaf: &LeafId) {
        self.revealed.push(leaf.clone());
        self.active = Some(leaf.clone());
    }

    fn set_leaf_opacity(&mut self, leaf: &LeafId, opacity: f32) {
        if let Some(l) = self.leaves.get_mut(leaf) {
            l.opacity = opacity;
        }
    }
}

impl EditorSurface for FakeHost {
    fn find_text_positions(
        &self,
        leaf: &LeafId,
        text: &str,
        prefix: &str,
        suffix: &str,
    ) -> Option<Range<usize>> {
        let leaf = self.leaves.get(leaf)?;
        return locate::locate(&leaf.text, text, prefix, suffix, 0);
    }

    fn highlight_range(&mut self, leaf: &LeafId, range: Range<usize>) -> Result<(), Error> {
        let l = self.leaves.get_mut(leaf).ok_or_else(|| {
            return Error::LeafNotFound {
                leaf: leaf.to_string(),
            };
        })?;
        l.highlights.push(range);
        return Ok(());
    }

    fn remove_highlights(&mut self, leaf: &LeafId) {
        if let Some(l) = self.leaves.get_mut(leaf) {
            l.highlights.clear();
        }
    }

    fn scroll_info(&self, leaf: &LeafId) -> Option<ScrollInfo> {
        return self.leaves.get(leaf).map(|l| {
            return ScrollInfo {
                left: 0.0,
                top: l.scroll_top,
            };
        });
    }

    fn scroll_into_view(&mut self, leaf: &LeafId, range: Range<usize>, _animate: bool) {
        if let Some(l) = self.leaves.get_mut(leaf) {
            // One pixel per byte is enough to tell positions apart.
            l.scroll_top = f64::from(u32::try_from(range.start).unwrap_or(u32::MAX));
        }
    }

    fn scroll_to(&mut self, leaf: &LeafId, top: f64) {
        if let Some(l) = self.leaves.get_mut(leaf) {
            l.scroll_top = top;
        }
    }
}
