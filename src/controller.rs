//! Preview session state machine.
//!
//! Every start claims its slot before doing anything else and either
//! finishes with an `Active` session or rolls back and empties the slot.
//! Every end empties its slot on every path. Hover and cursor sessions on
//! the same reference share one set of visuals; whichever ends last tears
//! them down.

use std::path::PathBuf;

use crate::codec;
use crate::error::Error;
use crate::host::{EditorSurface, OpenedLeaf, Workspace};
use crate::index::BacklinkIndex;
use crate::store::SessionStore;
use crate::types::{
    BacklinkId, ElementId, LeafId, Phase, ReferenceLocation, ScrollInfo, Session, SessionKind,
    SessionPatch,
};

/// What a start request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A session of this kind was already running; nothing happened.
    Busy,
    /// The complementary session already previews this reference; its state was copied.
    Reused,
    /// A new preview was opened.
    Started,
}

/// What an end request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndOutcome {
    /// No session was running.
    Idle,
    /// The complementary session still needs the visuals; only the slot was cleared.
    Shared,
    /// Highlights removed and views restored or closed.
    Restored,
}

/// Drives hover, cursor, and backlink-hover previews against a host.
#[derive(Debug, Clone)]
pub struct SessionController {
    /// Session slots.
    store: SessionStore,
    /// Opacity for preview-only leaves.
    temporary_view_opacity: f32,
}

impl SessionController {
    /// Controller with empty slots.
    pub fn new(temporary_view_opacity: f32) -> Self {
        return Self {
            store: SessionStore::default(),
            temporary_view_opacity,
        };
    }

    /// End a session of `kind`, restoring whatever its start changed.
    ///
    /// # Errors
    ///
    /// Returns `Error::LeafNotFound` when a leaf the restore depends on has
    /// gone, or a decode/highlight error while re-applying the complementary
    /// session's highlight. The slot is cleared regardless.
    pub fn end<H>(&mut self, kind: SessionKind, host: &mut H) -> Result<EndOutcome, Error>
    where
        H: Workspace + EditorSurface,
    {
        let Some(session) = self.store.get(kind).filter(|s| return s.is_active()).cloned() else {
            self.store.clear(kind);
            return Ok(EndOutcome::Idle);
        };

        if self.store.active_on(kind.complement(), &session.data_string) {
            tracing::debug!(%kind, "complementary session still previews this reference");
            self.store.clear(kind);
            return Ok(EndOutcome::Shared);
        }

        let result = self.tear_down(kind, host, &session);
        self.store.clear(kind);
        tracing::debug!(%kind, ok = result.is_ok(), "session ended");
        return result.map(|()| return EndOutcome::Restored);
    }

    /// End every session, cursor last so that shared visuals are torn down once.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by an individual end; every slot is cleared regardless.
    pub fn end_all<H>(&mut self, host: &mut H) -> Result<(), Error>
    where
        H: Workspace + EditorSurface,
    {
        let mut first_error = None;
        for kind in [SessionKind::Hover, SessionKind::BacklinkHover, SessionKind::Cursor] {
            if let Err(e) = self.end(kind, host)
                && first_error.is_none()
            {
                first_error = Some(e);
            }
        }
        return first_error.map_or(Ok(()), Err);
    }

    /// End the backlink-hover session.
    ///
    /// # Errors
    ///
    /// See [`SessionController::end`].
    pub fn end_backlink<H>(&mut self, host: &mut H) -> Result<EndOutcome, Error>
    where
        H: Workspace + EditorSurface,
    {
        return self.end(SessionKind::BacklinkHover, host);
    }

    /// End the cursor session.
    ///
    /// # Errors
    ///
    /// See [`SessionController::end`].
    pub fn end_cursor<H>(&mut self, host: &mut H) -> Result<EndOutcome, Error>
    where
        H: Workspace + EditorSurface,
    {
        return self.end(SessionKind::Cursor, host);
    }

    /// End the hover session.
    ///
    /// # Errors
    ///
    /// See [`SessionController::end`].
    pub fn end_hover<H>(&mut self, host: &mut H) -> Result<EndOutcome, Error>
    where
        H: Workspace + EditorSurface,
    {
        return self.end(SessionKind::Hover, host);
    }

    /// Turn the active preview of `kind` into a regular view: it stays open
    /// and scrolled where it is when the session ends. A cursor session on
    /// the same reference is released, since the pinned view now owns the
    /// visuals. Returns `false` if no active session of that kind exists.
    pub fn open<H>(&mut self, kind: SessionKind, host: &mut H) -> bool
    where
        H: Workspace + EditorSurface,
    {
        let Some(session) = self.store.get_mut(kind).filter(|s| return s.is_active()) else {
            return false;
        };
        session.is_temporary_view = false;
        session.saved_viewport = None;
        let data_string = session.data_string.clone();
        let target = session.target_leaf.clone();

        if let Some(leaf) = target.filter(|leaf| return host.has_leaf(leaf)) {
            host.set_leaf_opacity(&leaf, 1.0);
            host.reveal_leaf(&leaf);
        }
        if kind != SessionKind::Cursor && self.store.active_on(SessionKind::Cursor, &data_string) {
            self.store.clear(SessionKind::Cursor);
        }
        tracing::debug!(%kind, "preview pinned");
        return true;
    }

    /// Start a backlink-hover preview for the backlink marker `element`.
    ///
    /// Highlights the referenced text in the leaf holding the marker, then
    /// opens the document that writes the reference and highlights the
    /// marker there.
    ///
    /// # Errors
    ///
    /// Returns `Error::BacklinkNotFound`, `Error::LeafNotFound`,
    /// `Error::PositionNotFound`, or an error from the workspace. The slot
    /// is released and partial visuals are undone before returning.
    pub fn start_backlink<H>(
        &mut self,
        host: &mut H,
        index: &BacklinkIndex,
        element: &ElementId,
        id: &BacklinkId,
    ) -> Result<StartOutcome, Error>
    where
        H: Workspace + EditorSurface,
    {
        return self.claimed(SessionKind::BacklinkHover, host, |this, host| {
            return this.begin_backlink(host, index, element, id);
        });
    }

    /// Start a cursor preview of `token`.
    ///
    /// # Errors
    ///
    /// See [`SessionController::start_hover`].
    pub fn start_cursor<H>(
        &mut self,
        host: &mut H,
        element: &ElementId,
        token: &str,
    ) -> Result<StartOutcome, Error>
    where
        H: Workspace + EditorSurface,
    {
        return self.claimed(SessionKind::Cursor, host, |this, host| {
            return this.begin_reference(SessionKind::Cursor, host, element, token);
        });
    }

    /// Start a hover preview of `token`, the reference under marker `element`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Decode`, `Error::LeafNotFound`,
    /// `Error::PositionNotFound`, or an error from the workspace. The slot
    /// is released and partial visuals are undone before returning.
    pub fn start_hover<H>(
        &mut self,
        host: &mut H,
        element: &ElementId,
        token: &str,
    ) -> Result<StartOutcome, Error>
    where
        H: Workspace + EditorSurface,
    {
        return self.claimed(SessionKind::Hover, host, |this, host| {
            return this.begin_reference(SessionKind::Hover, host, element, token);
        });
    }

    /// Read-only view of the session slots.
    pub const fn store(&self) -> &SessionStore {
        return &self.store;
    }

    /// Body of a backlink start, run with the slot claimed.
    ///
    /// # Errors
    ///
    /// See [`SessionController::start_backlink`].
    fn begin_backlink<H>(
        &mut self,
        host: &mut H,
        index: &BacklinkIndex,
        element: &ElementId,
        id: &BacklinkId,
    ) -> Result<StartOutcome, Error>
    where
        H: Workspace + EditorSurface,
    {
        let kind = SessionKind::BacklinkHover;
        let backlink = index
            .get(id)
            .map(|entry| return entry.backlink.clone())
            .ok_or_else(|| return Error::BacklinkNotFound { id: id.to_string() })?;

        if self.reuse_complement(kind, &backlink.data_string) {
            return Ok(StartOutcome::Reused);
        }

        let origin = self.record_origin(kind, host, element, &backlink.data_string)?;

        let referenced = &backlink.referenced_location;
        host.highlight_range(&origin, referenced.range())?;
        if host
            .find_text_positions(&origin, &referenced.text, &referenced.prefix, &referenced.suffix)
            .is_none()
        {
            return Err(position_not_found(referenced));
        }

        let referencing = &backlink.referencing_location;
        let opened = self.open_target(kind, host, &origin, &referencing.filename)?;
        let saved_viewport = host.scroll_info(&opened.leaf);
        reveal_location(host, &opened.leaf, referencing)?;

        self.activate(kind, saved_viewport);
        tracing::debug!(%kind, leaf = %opened.leaf, temporary = opened.is_temporary, "session started");
        return Ok(StartOutcome::Started);
    }

    /// Body of a hover or cursor start, run with the slot claimed.
    ///
    /// # Errors
    ///
    /// See [`SessionController::start_hover`].
    fn begin_reference<H>(
        &mut self,
        kind: SessionKind,
        host: &mut H,
        element: &ElementId,
        token: &str,
    ) -> Result<StartOutcome, Error>
    where
        H: Workspace + EditorSurface,
    {
        let location = codec::decode(token)?;

        if self.reuse_complement(kind, token) {
            return Ok(StartOutcome::Reused);
        }

        let origin = self.record_origin(kind, host, element, token)?;
        let opened = self.open_target(kind, host, &origin, &location.filename)?;
        let saved_viewport = host.scroll_info(&opened.leaf);
        reveal_location(host, &opened.leaf, &location)?;

        self.activate(kind, saved_viewport);
        tracing::debug!(%kind, leaf = %opened.leaf, temporary = opened.is_temporary, "session started");
        return Ok(StartOutcome::Started);
    }

    /// Mark a started session active with the viewport captured before scrolling.
    fn activate(&mut self, kind: SessionKind, saved_viewport: Option<ScrollInfo>) {
        self.store.set(
            kind,
            SessionPatch {
                phase: Some(Phase::Active),
                saved_viewport,
                ..SessionPatch::default()
            },
        );
    }

    /// Claim the slot, run `body`, and roll back on error.
    ///
    /// # Errors
    ///
    /// Returns whatever `body` returns.
    fn claimed<H, F>(&mut self, kind: SessionKind, host: &mut H, body: F) -> Result<StartOutcome, Error>
    where
        H: Workspace + EditorSurface,
        F: FnOnce(&mut Self, &mut H) -> Result<StartOutcome, Error>,
    {
        if !self.store.claim(kind) {
            tracing::debug!(%kind, "session already running, ignoring start");
            return Ok(StartOutcome::Busy);
        }

        let result = body(self, host);
        if let Err(e) = &result {
            tracing::debug!(%kind, "start failed, rolling back: {e}");
            self.rollback(kind, host);
        }
        return result;
    }

    /// Resolve or open the leaf that will show `file`, and record it.
    ///
    /// # Errors
    ///
    /// Returns errors from `Workspace::open_in_adjacent_tab`.
    fn open_target<H>(
        &mut self,
        kind: SessionKind,
        host: &mut H,
        origin: &LeafId,
        file: &str,
    ) -> Result<OpenedLeaf, Error>
    where
        H: Workspace + EditorSurface,
    {
        let opened = match host.leaf_showing(file, origin) {
            Some(leaf) => OpenedLeaf {
                is_temporary: false,
                leaf,
            },
            None => host.open_in_adjacent_tab(origin, file, kind)?,
        };

        self.store.set(
            kind,
            SessionPatch {
                is_temporary_view: Some(opened.is_temporary),
                target_leaf: Some(opened.leaf.clone()),
                ..SessionPatch::default()
            },
        );
        if opened.is_temporary {
            host.set_leaf_opacity(&opened.leaf, self.temporary_view_opacity);
        }
        return Ok(opened);
    }

    /// Record the triggering leaf and its scroll offset.
    ///
    /// # Errors
    ///
    /// Returns `Error::LeafNotFound` if no leaf contains `element`.
    fn record_origin<H>(
        &mut self,
        kind: SessionKind,
        host: &H,
        element: &ElementId,
        data_string: &str,
    ) -> Result<LeafId, Error>
    where
        H: Workspace + EditorSurface,
    {
        let origin = host.leaf_containing(element).ok_or_else(|| {
            return Error::LeafNotFound {
                leaf: element.to_string(),
            };
        })?;
        let original_scroll_top = host.scroll_info(&origin).map_or(0.0, |info| return info.top);

        self.store.set(
            kind,
            SessionPatch {
                data_string: Some(data_string.to_string()),
                original_leaf: Some(origin.clone()),
                original_scroll_top: Some(original_scroll_top),
                ..SessionPatch::default()
            },
        );
        return Ok(origin);
    }

    /// Re-apply the complementary session's highlight if its leaf is one of
    /// the `cleared` leaves this session just stripped.
    ///
    /// # Errors
    ///
    /// Returns decode or highlight errors for the complementary session.
    fn restore_complement<H>(
        &self,
        kind: SessionKind,
        host: &mut H,
        data_string: &str,
        cleared: &[LeafId],
    ) -> Result<(), Error>
    where
        H: Workspace + EditorSurface,
    {
        let Some(other) = self
            .store
            .get(kind.complement())
            .filter(|other| return other.is_active() && other.data_string != data_string)
        else {
            return Ok(());
        };
        let Some(leaf) = other
            .target_leaf
            .as_ref()
            .filter(|leaf| return cleared.contains(leaf) && host.has_leaf(leaf))
        else {
            return Ok(());
        };

        let location = codec::decode(&other.data_string)?;
        host.reveal_leaf(leaf);
        host.highlight_range(leaf, location.range())?;
        tracing::debug!(kind = %kind.complement(), %leaf, "re-applied complementary highlight");
        return Ok(());
    }

    /// Copy the complementary session into this slot if it already previews `data_string`.
    fn reuse_complement(&mut self, kind: SessionKind, data_string: &str) -> bool {
        let Some(other) = self
            .store
            .get(kind.complement())
            .filter(|other| return other.is_active() && other.data_string == data_string)
            .cloned()
        else {
            return false;
        };
        self.store.set(kind, SessionPatch::from(other));
        tracing::debug!(%kind, "reusing complementary session");
        return true;
    }

    /// Undo whatever a failed start managed to do and release the slot.
    fn rollback<H>(&mut self, kind: SessionKind, host: &mut H)
    where
        H: Workspace + EditorSurface,
    {
        let Some(partial) = self.store.take(kind) else {
            return;
        };
        let mut cleared = Vec::new();
        if let Some(leaf) = partial.target_leaf.as_ref().filter(|leaf| return host.has_leaf(leaf)) {
            host.remove_highlights(leaf);
            if partial.is_temporary_view {
                host.detach_leaf(leaf);
            } else {
                cleared.push(leaf.clone());
            }
        }
        if kind == SessionKind::BacklinkHover
            && let Some(leaf) = partial.original_leaf.as_ref().filter(|leaf| return host.has_leaf(leaf))
        {
            host.remove_highlights(leaf);
            cleared.push(leaf.clone());
        }
        if let Err(e) = self.restore_complement(kind, host, &partial.data_string, &cleared) {
            tracing::warn!(%kind, "could not restore complementary highlight: {e}");
        }
    }

    /// Remove the session's visuals and restore the views it changed.
    ///
    /// # Errors
    ///
    /// Returns `Error::LeafNotFound` if the original leaf is required but gone,
    /// or errors from restoring the complementary session.
    fn tear_down<H>(&self, kind: SessionKind, host: &mut H, session: &Session) -> Result<(), Error>
    where
        H: Workspace + EditorSurface,
    {
        let mut outcome = Ok(());
        let mut cleared = Vec::new();
        let target = session.target_leaf.as_ref().filter(|leaf| return host.has_leaf(leaf));
        match target {
            None => {
                tracing::warn!(%kind, "target leaf already gone");
            },
            Some(leaf) => {
                host.remove_highlights(leaf);
                cleared.push(leaf.clone());
            },
        }

        // Backlink previews also light up the leaf holding the marker.
        if kind == SessionKind::BacklinkHover {
            match existing_leaf(host, session.original_leaf.as_ref()) {
                Err(e) => outcome = Err(e),
                Ok(original) => {
                    host.remove_highlights(&original);
                    cleared.push(original);
                },
            }
        }

        let distinct_original = session
            .original_leaf
            .as_ref()
            .filter(|original| return session.target_leaf.as_ref() != Some(*original));

        if session.is_temporary_view {
            if let Some(leaf) = target {
                host.detach_leaf(leaf);
            }
            if let Some(original) = distinct_original {
                let original = existing_leaf(host, Some(original))?;
                host.reveal_leaf(&original);
            }
        } else if let (Some(viewport), Some(leaf)) = (session.saved_viewport, target) {
            host.scroll_to(leaf, viewport.top);
            if let Some(original) = distinct_original.filter(|original| return host.has_leaf(original)) {
                host.scroll_to(original, session.original_scroll_top);
            }
        }
        outcome?;
        return self.restore_complement(kind, host, &session.data_string, &cleared);
    }
}

/// The leaf if it still exists.
///
/// # Errors
///
/// Returns `Error::LeafNotFound` for an unset or vanished leaf.
fn existing_leaf<H: Workspace>(host: &H, leaf: Option<&LeafId>) -> Result<LeafId, Error> {
    return leaf
        .filter(|leaf| return host.has_leaf(leaf))
        .cloned()
        .ok_or_else(|| {
            return Error::LeafNotFound {
                leaf: leaf.map_or_else(|| return "<unset>".to_string(), ToString::to_string),
            };
        });
}

/// The error for text that cannot be found where a location says it is.
fn position_not_found(location: &ReferenceLocation) -> Error {
    return Error::PositionNotFound {
        file: PathBuf::from(&location.filename),
        text: location.text.clone(),
    };
}

/// Highlight a location's range and scroll the leaf to where its text actually is.
///
/// # Errors
///
/// Returns `Error::PositionNotFound` if the text cannot be found,
/// or highlight errors from the editor.
fn reveal_location<H: EditorSurface>(
    host: &mut H,
    leaf: &LeafId,
    location: &ReferenceLocation,
) -> Result<(), Error> {
    host.highlight_range(leaf, location.range())?;
    let found = host
        .find_text_positions(leaf, &location.text, &location.prefix, &location.suffix)
        .ok_or_else(|| return position_not_found(location))?;
    host.scroll_into_view(leaf, found, true);
    return Ok(());
}
