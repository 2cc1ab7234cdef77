//! In-memory session store backing the relay
//!
//! Sessions live in a sharded [`DashMap`]. An upsert holds the entry guard of
//! its session for the whole compare-then-write, so concurrent writers to the
//! same slot are serialized while unrelated sessions proceed in parallel.
//! Reads clone the slot under a shard read guard.
//!
//! Each slot keeps only the latest `sdp` and the latest `candidate`. A poller
//! that is slower than the writer misses intermediate values.

use crate::candidate::{CandidateFilter, Rejection};
use crate::message::SdpType;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Latest description and candidate written by one side of a session
///
/// Serialized form is the relay's `GET` response body. Unset members are the
/// empty string, and relays that omit them deserialize the same way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    #[serde(default = "empty_value")]
    pub sdp: Value,
    #[serde(default = "empty_value")]
    pub candidate: Value,
}

fn empty_value() -> Value {
    Value::String(String::new())
}

impl Default for Slot {
    fn default() -> Self {
        Self {
            sdp: empty_value(),
            candidate: empty_value(),
        }
    }
}

impl Slot {
    pub fn has_sdp(&self) -> bool {
        !is_blank(&self.sdp)
    }

    pub fn has_candidate(&self) -> bool {
        !is_blank(&self.candidate)
    }
}

/// True for values that count as "not provided": null, `""`, `false`, `{}`, `[]`
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Number(_) => false,
    }
}

#[derive(Debug, Default)]
struct Session {
    offer: Option<Slot>,
    answer: Option<Slot>,
}

impl Session {
    fn slot(&self, kind: SdpType) -> Option<&Slot> {
        match kind {
            SdpType::Offer => self.offer.as_ref(),
            SdpType::Answer => self.answer.as_ref(),
        }
    }

    fn slot_mut(&mut self, kind: SdpType) -> &mut Slot {
        let slot = match kind {
            SdpType::Offer => &mut self.offer,
            SdpType::Answer => &mut self.answer,
        };
        slot.get_or_insert_with(Slot::default)
    }
}

/// What an upsert did to one field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOutcome {
    /// Field was not part of the write
    Absent,
    /// Value equals the stored one; nothing written
    Unchanged,
    /// Value replaced the stored one
    Stored,
    /// Candidate refused by the filter; nothing written
    Rejected(Rejection),
}

/// Result of [`SessionStore::upsert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// The session did not exist before this write
    pub session_created: bool,
    pub sdp: FieldOutcome,
    pub candidate: FieldOutcome,
}

/// Concurrency-safe map from session id to its offer/answer slots
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    filter: CandidateFilter,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the session and slot if needed, then write the provided fields
    ///
    /// Blank values are treated as not provided. Each field is only written
    /// when it differs from the stored value; candidates must also pass the
    /// [`CandidateFilter`].
    pub fn upsert(
        &self,
        session_id: &str,
        kind: SdpType,
        sdp: Option<Value>,
        candidate: Option<Value>,
    ) -> UpsertOutcome {
        let mut session_created = false;
        let mut session = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                session_created = true;
                Session::default()
            });
        let slot = session.slot_mut(kind);

        let sdp = match sdp.filter(|v| !is_blank(v)) {
            None => FieldOutcome::Absent,
            Some(value) if slot.sdp == value => FieldOutcome::Unchanged,
            Some(value) => {
                slot.sdp = value;
                FieldOutcome::Stored
            }
        };

        let candidate = match candidate.filter(|v| !is_blank(v)) {
            None => FieldOutcome::Absent,
            Some(value) => match self.filter.check(&value) {
                Err(rejection) => FieldOutcome::Rejected(rejection),
                Ok(()) if slot.candidate == value => FieldOutcome::Unchanged,
                Ok(()) => {
                    slot.candidate = value;
                    FieldOutcome::Stored
                }
            },
        };

        UpsertOutcome {
            session_created,
            sdp,
            candidate,
        }
    }

    /// Current slot contents, `None` if the session or the slot was never written
    pub fn get(&self, session_id: &str, kind: SdpType) -> Option<Slot> {
        self.sessions
            .get(session_id)
            .and_then(|session| session.slot(kind).cloned())
    }

    /// Remove a session with all its slots; returns whether it existed
    pub fn delete(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    /// Ids of live sessions, sorted
    pub fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
