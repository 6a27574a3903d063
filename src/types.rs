/// Core domain types: locations, backlinks, leaves, and preview sessions.
use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Whether a reference asks for an inline preview of its referencing line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Plain reference, rendered as an icon only.
    #[default]
    Plain,
    /// Portal reference, rendered with a text preview.
    Portal,
}

impl Variant {
    /// Grammar keyword for this variant.
    pub const fn as_str(self) -> &'static str {
        return match self {
            Variant::Plain => "plain",
            Variant::Portal => "portal",
        };
    }
}

/// A character range in a document plus the context needed to find it again.
/// Produced by decoding a reference token; `from < to` holds by construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceLocation {
    /// Vault-relative path of the document.
    pub filename: String,
    /// Byte offset where the range starts.
    pub from: usize,
    /// Text immediately preceding `text`, used to disambiguate duplicates.
    pub prefix: String,
    /// Text immediately following `text`.
    pub suffix: String,
    /// The referenced text itself.
    pub text: String,
    /// Byte offset one past the end of the range.
    pub to: usize,
    /// Requested rendering variant.
    pub variant: Variant,
}

impl ReferenceLocation {
    /// The `[from, to)` byte range.
    pub const fn range(&self) -> Range<usize> {
        return self.from..self.to;
    }
}

/// A pairing of a token's target with the place the token itself sits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backlink {
    /// The original token text; stable identity of the reference.
    pub data_string: String,
    /// Referencing line with markers stripped, for portal tokens only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portal_text: Option<String>,
    /// Where the token points.
    pub referenced_location: ReferenceLocation,
    /// Where the token is written.
    pub referencing_location: ReferenceLocation,
}

/// Content-derived identity of a backlink, stable while its content is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BacklinkId(
    /// `backlink-` followed by 64 lowercase hex chars.
    pub String,
);

impl fmt::Display for BacklinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(&self.0);
    }
}

/// Host identity of a pane holding one document view.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LeafId(
    /// Opaque id assigned by the host.
    pub String,
);

impl fmt::Display for LeafId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(&self.0);
    }
}

/// Host identity of the UI element (marker) that triggered an interaction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(
    /// Opaque id assigned by the host.
    pub String,
);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(&self.0);
    }
}

/// Scroll position of an editor view.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrollInfo {
    /// Horizontal offset in pixels.
    pub left: f64,
    /// Vertical offset in pixels.
    pub top: f64,
}

/// The three interaction slots. At most one session per kind is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKind {
    /// Pointer resting on a backlink marker.
    BacklinkHover,
    /// Text cursor inside a reference token.
    Cursor,
    /// Pointer resting on a reference marker.
    Hover,
}

impl SessionKind {
    /// The kind whose session may share visuals with this one.
    pub const fn complement(self) -> Self {
        return match self {
            SessionKind::BacklinkHover | SessionKind::Hover => SessionKind::Cursor,
            SessionKind::Cursor => SessionKind::Hover,
        };
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionKind::BacklinkHover => "backlink-hover",
            SessionKind::Cursor => "cursor",
            SessionKind::Hover => "hover",
        };
        return f.write_str(name);
    }
}

/// Lifecycle phase of an occupied session slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    /// Fully populated; visuals applied.
    Active,
    /// Slot claimed, target view not yet resolved.
    #[default]
    Starting,
}

/// An in-progress preview interaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    /// Token of the reference being previewed.
    pub data_string: String,
    /// The target leaf was opened for this preview and is closed on end.
    pub is_temporary_view: bool,
    /// Leaf the interaction started from.
    pub original_leaf: Option<LeafId>,
    /// Scroll offset of `original_leaf` when the session started.
    pub original_scroll_top: f64,
    /// Current phase.
    pub phase: Phase,
    /// Viewport of the target leaf before it was scrolled to the reference.
    pub saved_viewport: Option<ScrollInfo>,
    /// Leaf showing the previewed location.
    pub target_leaf: Option<LeafId>,
}

impl Session {
    /// Whether the session has finished starting.
    pub fn is_active(&self) -> bool {
        return self.phase == Phase::Active;
    }
}

/// Partial session fields merged into a slot by `SessionStore::set`.
/// `None` leaves the existing value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionPatch {
    /// Replacement token.
    pub data_string: Option<String>,
    /// Replacement temporary flag.
    pub is_temporary_view: Option<bool>,
    /// Replacement originating leaf.
    pub original_leaf: Option<LeafId>,
    /// Replacement original scroll offset.
    pub original_scroll_top: Option<f64>,
    /// Replacement phase.
    pub phase: Option<Phase>,
    /// Replacement saved viewport.
    pub saved_viewport: Option<ScrollInfo>,
    /// Replacement target leaf.
    pub target_leaf: Option<LeafId>,
}

impl SessionPatch {
    /// Merge the present fields into `session`.
    pub fn apply(self, session: &mut Session) {
        if let Some(data_string) = self.data_string {
            session.data_string = data_string;
        }
        if let Some(temporary) = self.is_temporary_view {
            session.is_temporary_view = temporary;
        }
        if self.original_leaf.is_some() {
            session.original_leaf = self.original_leaf;
        }
        if let Some(top) = self.original_scroll_top {
            session.original_scroll_top = top;
        }
        if let Some(phase) = self.phase {
            session.phase = phase;
        }
        if self.saved_viewport.is_some() {
            session.saved_viewport = self.saved_viewport;
        }
        if self.target_leaf.is_some() {
            session.target_leaf = self.target_leaf;
        }
    }
}

impl From<Session> for SessionPatch {
    fn from(session: Session) -> Self {
        return Self {
            data_string: Some(session.data_string),
            is_temporary_view: Some(session.is_temporary_view),
            original_leaf: session.original_leaf,
            original_scroll_top: Some(session.original_scroll_top),
            phase: Some(session.phase),
            saved_viewport: session.saved_viewport,
            target_leaf: session.target_leaf,
        };
    }
}
