//! Per-kind session slots.
//!
//! Each slot is either empty or holds one session. Claiming a slot writes a
//! `Starting` session into it and fails if the slot is already occupied;
//! that claim is the only exclusion between overlapping starts of one kind.

use crate::types::{Phase, Session, SessionKind, SessionPatch};

/// Owns every session. Only the controller mutates it.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    /// Backlink-hover slot.
    backlink_hover: Option<Session>,
    /// Cursor slot.
    cursor: Option<Session>,
    /// Hover slot.
    hover: Option<Session>,
}

impl SessionStore {
    /// Whether `kind` holds an active session on the reference `data_string`.
    pub fn active_on(&self, kind: SessionKind, data_string: &str) -> bool {
        return self
            .get(kind)
            .is_some_and(|session| return session.is_active() && session.data_string == data_string);
    }

    /// Claim the slot for a new session. Returns `false` if it is occupied.
    pub fn claim(&mut self, kind: SessionKind) -> bool {
        let slot = self.slot_mut(kind);
        if slot.is_some() {
            return false;
        }
        *slot = Some(Session {
            phase: Phase::Starting,
            ..Session::default()
        });
        return true;
    }

    /// Empty the slot, releasing the claim.
    pub fn clear(&mut self, kind: SessionKind) {
        *self.slot_mut(kind) = None;
    }

    /// The session in a slot, if any.
    pub fn get(&self, kind: SessionKind) -> Option<&Session> {
        return match kind {
            SessionKind::BacklinkHover => self.backlink_hover.as_ref(),
            SessionKind::Cursor => self.cursor.as_ref(),
            SessionKind::Hover => self.hover.as_ref(),
        };
    }

    /// Mutable access to the session in a slot, if any.
    pub fn get_mut(&mut self, kind: SessionKind) -> Option<&mut Session> {
        return self.slot_mut(kind).as_mut();
    }

    /// Whether every slot is empty.
    pub fn is_idle(&self) -> bool {
        return self.backlink_hover.is_none() && self.cursor.is_none() && self.hover.is_none();
    }

    /// Merge `patch` into the slot's session, creating one if the slot is empty.
    pub fn set(&mut self, kind: SessionKind, patch: SessionPatch) {
        let session = self.slot_mut(kind).get_or_insert_with(Session::default);
        patch.apply(session);
    }

    /// Empty the slot and return what it held.
    pub fn take(&mut self, kind: SessionKind) -> Option<Session> {
        return self.slot_mut(kind).take();
    }

    /// The slot for a kind.
    fn slot_mut(&mut self, kind: SessionKind) -> &mut Option<Session> {
        return match kind {
            SessionKind::BacklinkHover => &mut self.backlink_hover,
            SessionKind::Cursor => &mut self.cursor,
            SessionKind::Hover => &mut self.hover,
        };
    }
}
