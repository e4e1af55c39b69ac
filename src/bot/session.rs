//! Per-user conversation state.
//!
//! The store is a capability injected into the conversation controller, so a
//! persistent or expiring implementation could replace the in-memory map
//! without touching extraction logic.

use crate::extractor::{ExtractionOutcome, RollNumber};
use dashmap::DashMap;

/// Transient state for one user: their last successful lookup and whether we
/// are waiting on a PDF yes/no. Cleared after the PDF decision, overwritten
/// by a new query. Never persisted; a restart clears everything.
#[derive(Debug, Clone)]
pub struct Session {
    pub roll: RollNumber,
    pub outcome: ExtractionOutcome,
    pub awaiting_pdf: bool,
}

/// Get/set/clear session state by user identity.
pub trait SessionStore: Send + Sync {
    fn get(&self, user_id: u64) -> Option<Session>;
    fn set(&self, user_id: u64, session: Session);
    fn clear(&self, user_id: u64);
}

/// In-memory session store. No expiry: volume is low and entries are
/// overwritten or explicitly cleared.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: DashMap<u64, Session>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, user_id: u64) -> Option<Session> {
        self.entries.get(&user_id).map(|entry| entry.value().clone())
    }

    fn set(&self, user_id: u64, session: Session) {
        self.entries.insert(user_id, session);
    }

    fn clear(&self, user_id: u64) {
        self.entries.remove(&user_id);
    }
}
