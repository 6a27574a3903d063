//! Collaborator interfaces the host application implements.
//!
//! The controller never touches panes or editor widgets directly; it asks
//! the host through these two traits. Calls are synchronous: a host whose
//! own APIs are asynchronous completes them before returning.

use std::ops::Range;

use crate::error::Error;
use crate::types::{ElementId, LeafId, ScrollInfo, SessionKind};

/// A leaf handed back by the workspace when a file is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedLeaf {
    /// The leaf now showing the file.
    pub leaf: LeafId,
    /// The leaf was created for this preview and should close when it ends.
    pub is_temporary: bool,
}

/// Pane layout: which leaf shows what, opening and closing leaves.
pub trait Workspace {
    /// The leaf that currently has focus.
    fn active_leaf(&self) -> Option<LeafId>;

    /// Detach (close) a leaf.
    fn detach_leaf(&mut self, leaf: &LeafId);

    /// Whether the leaf still exists.
    fn has_leaf(&self, leaf: &LeafId) -> bool;

    /// The leaf in the current tab group whose view contains `element`.
    fn leaf_containing(&self, element: &ElementId) -> Option<LeafId>;

    /// A leaf already showing `file`, searched from `near`'s tab group outward.
    fn leaf_showing(&self, file: &str, near: &LeafId) -> Option<LeafId>;

    /// Open `file` in the tab group adjacent to `origin`.
    ///
    /// # Errors
    ///
    /// Returns `Error::LeafNotFound` if no leaf could be produced,
    /// or `Error::MissingFile` if the file does not exist.
    fn open_in_adjacent_tab(
        &mut self,
        origin: &LeafId,
        file: &str,
        kind: SessionKind,
    ) -> Result<OpenedLeaf, Error>;

    /// Vault paths of every document currently open in a leaf.
    fn open_files(&self) -> Vec<String>;

    /// Bring a leaf to the front of its tab group.
    fn reveal_leaf(&mut self, leaf: &LeafId);

    /// Dim or restore a leaf; `1.0` is fully opaque.
    fn set_leaf_opacity(&mut self, leaf: &LeafId, opacity: f32);
}

/// The text-editing component inside a leaf.
pub trait EditorSurface {
    /// Find `text` in the leaf's document, disambiguated by its surroundings.
    fn find_text_positions(
        &self,
        leaf: &LeafId,
        text: &str,
        prefix: &str,
        suffix: &str,
    ) -> Option<Range<usize>>;

    /// Mark a range as highlighted.
    ///
    /// # Errors
    ///
    /// Returns `Error::LeafNotFound` if the leaf has no editor view.
    fn highlight_range(&mut self, leaf: &LeafId, range: Range<usize>) -> Result<(), Error>;

    /// Remove every highlight previously applied to the leaf.
    fn remove_highlights(&mut self, leaf: &LeafId);

    /// Current scroll position, if the leaf has an editor view.
    fn scroll_info(&self, leaf: &LeafId) -> Option<ScrollInfo>;

    /// Scroll so that `range` is visible.
    fn scroll_into_view(&mut self, leaf: &LeafId, range: Range<usize>, animate: bool);

    /// Scroll vertically to `top`.
    fn scroll_to(&mut self, leaf: &LeafId, top: f64);
}
