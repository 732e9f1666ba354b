//! Session store port
//!
//! Durable, append-only conversation log keyed by `(user, session)`.
//! Every mutation is atomic per session: readers see either the state
//! before or after an append or clear, never a partial write.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use crew_domain::{NewTurn, SessionId, SessionKey, SessionSummary, Turn, UserId};
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Mutex;
use thiserror::Error;

/// Errors from a session store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Session store unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt session record {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Per-session bookkeeping persisted next to the turns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub created_at: DateTime<Utc>,
    /// Last append, or last clear when there are no turns
    pub last_activity: DateTime<Utc>,
    /// Timestamp of the newest turn, used to keep timestamps non-decreasing
    pub last_turn_at: Option<DateTime<Utc>>,
    /// Sequence number the next append receives; survives clears
    pub next_sequence: u64,
    pub turn_count: usize,
}

impl SessionRecord {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            last_activity: now,
            last_turn_at: None,
            next_sequence: 0,
            turn_count: 0,
        }
    }

    /// Seal `turn` as the next turn of this session and update the record.
    pub fn seal_next(&mut self, turn: NewTurn) -> Turn {
        let sealed = turn.seal(self.next_sequence, self.last_turn_at);
        self.next_sequence += 1;
        self.turn_count += 1;
        self.last_turn_at = Some(sealed.timestamp);
        self.last_activity = self.last_activity.max(sealed.timestamp);
        sealed
    }

    /// Reset after a clear; sequence numbers keep counting.
    pub fn cleared(&mut self, now: DateTime<Utc>) {
        self.turn_count = 0;
        self.last_turn_at = None;
        self.last_activity = now;
    }

    pub fn summary(&self, key: SessionKey) -> SessionSummary {
        SessionSummary {
            key,
            created_at: self.created_at,
            last_activity: self.last_activity,
            turn_count: self.turn_count,
        }
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Append a turn, assigning its sequence number.
    async fn append(&self, key: &SessionKey, turn: NewTurn) -> Result<Turn, StoreError>;

    /// All turns of a session in append order; empty for unknown sessions.
    async fn read_all(&self, key: &SessionKey) -> Result<Vec<Turn>, StoreError>;

    /// Remove every turn of a session. Idempotent; the session stays usable.
    async fn clear(&self, key: &SessionKey) -> Result<(), StoreError>;

    /// Lazily enumerate the sessions of `user`, ordered by id.
    ///
    /// Each call starts a fresh enumeration.
    fn list_sessions(&self, user: &UserId) -> BoxStream<'static, Result<SessionId, StoreError>>;

    /// Delete sessions of `user` whose last activity is before `cutoff`.
    async fn delete_inactive_since(
        &self,
        user: &UserId,
        cutoff: DateTime<Utc>,
    ) -> Result<usize, StoreError>;

    async fn summary(&self, key: &SessionKey) -> Result<Option<SessionSummary>, StoreError>;

    /// Delete sessions of `user` idle for longer than `age`.
    ///
    /// An age reaching past the earliest representable time deletes nothing.
    async fn delete_older_than(&self, user: &UserId, age: Duration) -> Result<usize, StoreError> {
        let cutoff = Utc::now()
            .checked_sub_signed(age)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.delete_inactive_since(user, cutoff).await
    }
}

#[derive(Debug, Default)]
struct MemorySession {
    record: Option<SessionRecord>,
    turns: Vec<Turn>,
}

/// Ephemeral store, used by tests
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<BTreeMap<SessionKey, MemorySession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_sessions<T>(
        &self,
        f: impl FnOnce(&mut BTreeMap<SessionKey, MemorySession>) -> T,
    ) -> Result<T, StoreError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))?;
        Ok(f(&mut sessions))
    }

    /// Insert a session whose activity happened at `at` (test setup helper)
    pub fn seed(&self, key: &SessionKey, at: DateTime<Utc>, turns: Vec<NewTurn>) -> Result<(), StoreError> {
        self.with_sessions(|sessions| {
            let session = sessions.entry(key.clone()).or_default();
            let record = session.record.get_or_insert_with(|| SessionRecord::new(at));
            for turn in turns {
                let sealed = record.seal_next(turn.at(at));
                session.turns.push(sealed);
            }
            record.last_activity = at;
        })
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn append(&self, key: &SessionKey, turn: NewTurn) -> Result<Turn, StoreError> {
        self.with_sessions(|sessions| {
            let at = turn.timestamp;
            let session = sessions.entry(key.clone()).or_default();
            let record = session.record.get_or_insert_with(|| SessionRecord::new(at));
            let sealed = record.seal_next(turn);
            session.turns.push(sealed.clone());
            sealed
        })
    }

    async fn read_all(&self, key: &SessionKey) -> Result<Vec<Turn>, StoreError> {
        self.with_sessions(|sessions| {
            sessions
                .get(key)
                .map(|s| s.turns.clone())
                .unwrap_or_default()
        })
    }

    async fn clear(&self, key: &SessionKey) -> Result<(), StoreError> {
        self.with_sessions(|sessions| {
            if let Some(session) = sessions.get_mut(key)
                && let Some(record) = session.record.as_mut()
            {
                session.turns.clear();
                record.cleared(Utc::now());
            }
        })
    }

    fn list_sessions(&self, user: &UserId) -> BoxStream<'static, Result<SessionId, StoreError>> {
        let listed = self.with_sessions(|sessions| {
            sessions
                .keys()
                .filter(|k| &k.user == user)
                .map(|k| k.session.clone())
                .collect::<Vec<_>>()
        });
        match listed {
            Ok(ids) => stream::iter(ids.into_iter().map(Ok)).boxed(),
            Err(e) => stream::once(async move { Err(e) }).boxed(),
        }
    }

    async fn delete_inactive_since(
        &self,
        user: &UserId,
        cutoff: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        self.with_sessions(|sessions| {
            let before = sessions.len();
            sessions.retain(|key, session| {
                &key.user != user
                    || session
                        .record
                        .as_ref()
                        .is_some_and(|r| r.last_activity >= cutoff)
            });
            before - sessions.len()
        })
    }

    async fn summary(&self, key: &SessionKey) -> Result<Option<SessionSummary>, StoreError> {
        self.with_sessions(|sessions| {
            sessions
                .get(key)
                .and_then(|s| s.record.as_ref())
                .map(|r| r.summary(key.clone()))
        })
    }
}
