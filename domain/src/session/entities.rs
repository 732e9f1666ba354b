//! Session domain entities

use super::identifiers::{SessionId, SessionKey, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One persisted exchange within a session (Entity)
///
/// Immutable once appended. `sequence_no` is assigned by the store and
/// increases by one for every append to the same session, across clears.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub sequence_no: u64,
    pub query: String,
    /// Rendered markdown of the synthesized response the user saw
    pub response: String,
    pub timestamp: DateTime<Utc>,
    /// Names of the agents whose output made it into the response
    pub contributing_agents: Vec<String>,
}

/// A turn that has not been appended yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTurn {
    pub query: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
    pub contributing_agents: Vec<String>,
}

impl NewTurn {
    pub fn new(
        query: impl Into<String>,
        response: impl Into<String>,
        contributing_agents: Vec<String>,
    ) -> Self {
        Self {
            query: query.into(),
            response: response.into(),
            timestamp: Utc::now(),
            contributing_agents,
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Seal the turn with its sequence number.
    ///
    /// `not_before` is the timestamp of the session's last turn; the sealed
    /// turn never predates it, so history stays time-ordered even if the
    /// wall clock steps backwards.
    pub fn seal(self, sequence_no: u64, not_before: Option<DateTime<Utc>>) -> Turn {
        let timestamp = match not_before {
            Some(last) if last > self.timestamp => last,
            _ => self.timestamp,
        };
        Turn {
            sequence_no,
            query: self.query,
            response: self.response,
            timestamp,
            contributing_agents: self.contributing_agents,
        }
    }
}

/// Per-session statistics kept alongside the turns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub key: SessionKey,
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last turn, or of the last clear when it has none
    pub last_activity: DateTime<Utc>,
    pub turn_count: usize,
}

/// Context handed to every agent invocation.
///
/// Carries the session-specific instructions so agents themselves stay
/// free of per-session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMetadata {
    pub user: UserId,
    pub session: SessionId,
    pub now: DateTime<Utc>,
    /// 1-based number of the turn being produced
    pub turn_number: usize,
}

impl SessionMetadata {
    pub fn new(key: &SessionKey, turn_number: usize) -> Self {
        Self {
            user: key.user.clone(),
            session: key.session.clone(),
            now: Utc::now(),
            turn_number,
        }
    }
}

/// The most recent `window` turns, oldest first.
pub fn recent_turns(turns: &[Turn], window: usize) -> &[Turn] {
    let start = turns.len().saturating_sub(window);
    &turns[start..]
}
