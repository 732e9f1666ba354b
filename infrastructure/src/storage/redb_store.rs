//! Session store backed by redb.
//!
//! Two tables, values JSON-encoded:
//!
//! | table | key | value |
//! |-------|-----|-------|
//! | `sessions` | `(user, session)` | [`SessionRecord`] |
//! | `turns` | `(user, session, sequence_no)` | [`Turn`] |
//!
//! Every mutation of a session runs in one write transaction, so a reader
//! never observes a turn without its record update. redb calls block, so
//! each operation runs on the blocking thread pool.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crew_application::ports::session_store::{SessionRecord, SessionStore, StoreError};
use crew_domain::{NewTurn, SessionId, SessionKey, SessionSummary, Turn, UserId};
use futures::stream::{self, BoxStream, StreamExt};
use redb::{Database, ReadableTable, Table, TableDefinition};
use std::ops::Bound;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

const SESSIONS: TableDefinition<(&str, &str), &str> = TableDefinition::new("sessions");
const TURNS: TableDefinition<(&str, &str, u64), &str> = TableDefinition::new("turns");

/// Session ids fetched per read transaction while listing
const LIST_PAGE: usize = 64;

/// Durable session store using redb.
#[derive(Clone)]
pub struct RedbSessionStore {
    db: Arc<Database>,
}

fn unavailable(e: impl Into<redb::Error>) -> StoreError {
    StoreError::Unavailable(e.into().to_string())
}

fn corrupt(key: impl std::fmt::Display, e: serde_json::Error) -> StoreError {
    StoreError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    }
}

fn encode<T: serde::Serialize>(key: impl std::fmt::Display, value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|e| corrupt(key, e))
}

fn decode<T: serde::de::DeserializeOwned>(
    key: impl std::fmt::Display,
    raw: &str,
) -> Result<T, StoreError> {
    serde_json::from_str(raw).map_err(|e| corrupt(key, e))
}

impl RedbSessionStore {
    /// Open or create the database at `path`, creating parent directories
    /// and both tables.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Unavailable(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }
        let db = Database::create(path).map_err(|e| {
            StoreError::Unavailable(format!("failed to open redb at {}: {}", path.display(), e))
        })?;

        let txn = db.begin_write().map_err(unavailable)?;
        txn.open_table(SESSIONS).map_err(unavailable)?;
        txn.open_table(TURNS).map_err(unavailable)?;
        txn.commit().map_err(unavailable)?;

        info!("Session store opened at {}", path.display());
        Ok(Self { db: Arc::new(db) })
    }

    /// Run a blocking redb closure on the blocking pool.
    async fn blocking<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T, StoreError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| StoreError::Unavailable(format!("store task failed: {}", e)))?
    }

    fn read_record(
        table: &impl ReadableTable<(&'static str, &'static str), &'static str>,
        key: &SessionKey,
    ) -> Result<Option<SessionRecord>, StoreError> {
        let raw = table
            .get((key.user.as_str(), key.session.as_str()))
            .map_err(unavailable)?;
        raw.map(|guard| decode(key, guard.value())).transpose()
    }

    fn remove_turns(
        turns: &mut Table<'_, (&'static str, &'static str, u64), &'static str>,
        key: &SessionKey,
    ) -> Result<usize, StoreError> {
        let (user, session) = (key.user.as_str(), key.session.as_str());
        let sequence_nos = turns
            .range((user, session, 0u64)..=(user, session, u64::MAX))
            .map_err(unavailable)?
            .map(|entry| entry.map(|(k, _)| k.value().2).map_err(unavailable))
            .collect::<Result<Vec<u64>, StoreError>>()?;
        for sequence_no in &sequence_nos {
            turns
                .remove((user, session, *sequence_no))
                .map_err(unavailable)?;
        }
        Ok(sequence_nos.len())
    }

    /// One page of session ids of `user` strictly after `after`.
    fn list_page(
        db: &Database,
        user: &UserId,
        after: Option<&SessionId>,
    ) -> Result<Vec<SessionId>, StoreError> {
        let txn = db.begin_read().map_err(unavailable)?;
        let table = txn.open_table(SESSIONS).map_err(unavailable)?;
        let user = user.as_str();
        let lower = match after {
            Some(last) => Bound::Excluded((user, last.as_str())),
            None => Bound::Included((user, "")),
        };

        let mut page = Vec::new();
        for entry in table
            .range((lower, Bound::Unbounded))
            .map_err(unavailable)?
        {
            let (k, _) = entry.map_err(unavailable)?;
            let (owner, session) = k.value();
            if owner != user {
                break;
            }
            let id = SessionId::new(session).map_err(|e| StoreError::Corrupt {
                key: format!("{}/{}", owner, session),
                reason: e.to_string(),
            })?;
            page.push(id);
            if page.len() == LIST_PAGE {
                break;
            }
        }
        Ok(page)
    }
}

impl std::fmt::Debug for RedbSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbSessionStore").finish()
    }
}

#[async_trait]
impl SessionStore for RedbSessionStore {
    async fn append(&self, key: &SessionKey, turn: NewTurn) -> Result<Turn, StoreError> {
        let key = key.clone();
        self.blocking(move |db| {
            let txn = db.begin_write().map_err(unavailable)?;
            let sealed = {
                let mut sessions = txn.open_table(SESSIONS).map_err(unavailable)?;
                let mut record = Self::read_record(&sessions, &key)?
                    .unwrap_or_else(|| SessionRecord::new(turn.timestamp));
                let sealed = record.seal_next(turn);

                let (user, session) = (key.user.as_str(), key.session.as_str());
                let mut turns = txn.open_table(TURNS).map_err(unavailable)?;
                turns
                    .insert((user, session, sealed.sequence_no), encode(&key, &sealed)?.as_str())
                    .map_err(unavailable)?;
                sessions
                    .insert((user, session), encode(&key, &record)?.as_str())
                    .map_err(unavailable)?;
                sealed
            };
            txn.commit().map_err(unavailable)?;
            debug!("Appended turn {} to {}", sealed.sequence_no, key);
            Ok(sealed)
        })
        .await
    }

    async fn read_all(&self, key: &SessionKey) -> Result<Vec<Turn>, StoreError> {
        let key = key.clone();
        self.blocking(move |db| {
            let txn = db.begin_read().map_err(unavailable)?;
            let table = txn.open_table(TURNS).map_err(unavailable)?;
            let (user, session) = (key.user.as_str(), key.session.as_str());

            let mut turns = Vec::new();
            for entry in table
                .range((user, session, 0u64)..=(user, session, u64::MAX))
                .map_err(unavailable)?
            {
                let (_, value) = entry.map_err(unavailable)?;
                turns.push(decode(&key, value.value())?);
            }
            Ok(turns)
        })
        .await
    }

    async fn clear(&self, key: &SessionKey) -> Result<(), StoreError> {
        let key = key.clone();
        self.blocking(move |db| {
            let txn = db.begin_write().map_err(unavailable)?;
            {
                let mut sessions = txn.open_table(SESSIONS).map_err(unavailable)?;
                let Some(mut record) = Self::read_record(&sessions, &key)? else {
                    return Ok(());
                };
                let mut turns = txn.open_table(TURNS).map_err(unavailable)?;
                let removed = Self::remove_turns(&mut turns, &key)?;
                record.cleared(Utc::now());
                sessions
                    .insert(
                        (key.user.as_str(), key.session.as_str()),
                        encode(&key, &record)?.as_str(),
                    )
                    .map_err(unavailable)?;
                debug!("Cleared {} turns of {}", removed, key);
            }
            txn.commit().map_err(unavailable)?;
            Ok(())
        })
        .await
    }

    fn list_sessions(&self, user: &UserId) -> BoxStream<'static, Result<SessionId, StoreError>> {
        struct Cursor {
            db: Arc<Database>,
            user: UserId,
            after: Option<SessionId>,
            buffered: std::vec::IntoIter<SessionId>,
            exhausted: bool,
        }

        let cursor = Cursor {
            db: Arc::clone(&self.db),
            user: user.clone(),
            after: None,
            buffered: Vec::new().into_iter(),
            exhausted: false,
        };

        stream::unfold(cursor, |mut cursor| async move {
            loop {
                if let Some(id) = cursor.buffered.next() {
                    cursor.after = Some(id.clone());
                    return Some((Ok(id), cursor));
                }
                if cursor.exhausted {
                    return None;
                }

                let db = Arc::clone(&cursor.db);
                let user = cursor.user.clone();
                let after = cursor.after.clone();
                let page = tokio::task::spawn_blocking(move || {
                    Self::list_page(&db, &user, after.as_ref())
                })
                .await
                .map_err(|e| StoreError::Unavailable(format!("store task failed: {}", e)))
                .and_then(|page| page);

                match page {
                    Ok(page) => {
                        cursor.exhausted = page.len() < LIST_PAGE;
                        cursor.buffered = page.into_iter();
                    }
                    Err(e) => {
                        cursor.exhausted = true;
                        return Some((Err(e), cursor));
                    }
                }
            }
        })
        .boxed()
    }

    async fn delete_inactive_since(
        &self,
        user: &UserId,
        cutoff: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let user = user.clone();
        self.blocking(move |db| {
            let txn = db.begin_write().map_err(unavailable)?;
            let deleted = {
                let mut sessions = txn.open_table(SESSIONS).map_err(unavailable)?;
                let mut stale = Vec::new();
                for entry in sessions
                    .range((user.as_str(), "")..)
                    .map_err(unavailable)?
                {
                    let (k, v) = entry.map_err(unavailable)?;
                    let (owner, session) = k.value();
                    if owner != user.as_str() {
                        break;
                    }
                    let key = SessionKey::new(
                        user.clone(),
                        SessionId::new(session).map_err(|e| StoreError::Corrupt {
                            key: format!("{}/{}", owner, session),
                            reason: e.to_string(),
                        })?,
                    );
                    let record: SessionRecord = decode(&key, v.value())?;
                    if record.last_activity < cutoff {
                        stale.push(key);
                    }
                }

                let mut turns = txn.open_table(TURNS).map_err(unavailable)?;
                for key in &stale {
                    Self::remove_turns(&mut turns, key)?;
                    sessions
                        .remove((key.user.as_str(), key.session.as_str()))
                        .map_err(unavailable)?;
                }
                stale.len()
            };
            txn.commit().map_err(unavailable)?;
            info!("Deleted {} inactive session(s) of {}", deleted, user);
            Ok(deleted)
        })
        .await
    }

    async fn summary(&self, key: &SessionKey) -> Result<Option<SessionSummary>, StoreError> {
        let key = key.clone();
        self.blocking(move |db| {
            let txn = db.begin_read().map_err(unavailable)?;
            let table = txn.open_table(SESSIONS).map_err(unavailable)?;
            Ok(Self::read_record(&table, &key)?.map(|r| r.summary(key.clone())))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use tempfile::TempDir;

    fn key(user: &str, session: &str) -> SessionKey {
        SessionKey::new(UserId::new(user).unwrap(), SessionId::new(session).unwrap())
    }

    fn open(dir: &TempDir) -> RedbSessionStore {
        RedbSessionStore::open(&dir.path().join("nested").join("sessions.redb")).unwrap()
    }

    #[tokio::test]
    async fn test_append_and_read_back_in_order() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        let k = key("ana", "ana_etl");

        for i in 0..3 {
            store
                .append(&k, NewTurn::new(format!("q{}", i), "r", vec!["RAG Agent".to_string()]))
                .await
                .unwrap();
        }

        let turns = store.read_all(&k).await.unwrap();
        let queries: Vec<&str> = turns.iter().map(|t| t.query.as_str()).collect();
        assert_eq!(queries, vec!["q0", "q1", "q2"]);
        assert!(turns.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[tokio::test]
    async fn test_clock_step_back_keeps_timestamps_ordered() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        let k = key("ana", "ana_etl");
        let now = Utc::now();

        store.append(&k, NewTurn::new("q0", "r", vec![]).at(now)).await.unwrap();
        let second = store
            .append(&k, NewTurn::new("q1", "r", vec![]).at(now - chrono::Duration::hours(1)))
            .await
            .unwrap();
        assert_eq!(second.timestamp, now);
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let k = key("ana", "ana_etl");
        {
            let store = open(&dir);
            store.append(&k, NewTurn::new("q", "r", vec![])).await.unwrap();
        }
        let store = open(&dir);
        assert_eq!(store.read_all(&k).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_clear_keeps_session_usable() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        let k = key("ana", "ana_etl");

        store.append(&k, NewTurn::new("q0", "r", vec![])).await.unwrap();
        store.append(&k, NewTurn::new("q1", "r", vec![])).await.unwrap();
        store.clear(&k).await.unwrap();
        store.clear(&k).await.unwrap();
        assert!(store.read_all(&k).await.unwrap().is_empty());

        let next = store.append(&k, NewTurn::new("q2", "r", vec![])).await.unwrap();
        assert_eq!(next.sequence_no, 2);
        assert_eq!(store.summary(&k).await.unwrap().unwrap().turn_count, 1);

        // Unknown sessions are left alone
        store.clear(&key("ana", "ana_other")).await.unwrap();
        assert!(store.summary(&key("ana", "ana_other")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sessions_are_isolated_per_user() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        store
            .append(&key("ana", "ana_a"), NewTurn::new("q", "r", vec![]))
            .await
            .unwrap();
        store
            .append(&key("bob", "bob_a"), NewTurn::new("q", "r", vec![]))
            .await
            .unwrap();

        let ana: Vec<SessionId> = store
            .list_sessions(&UserId::new("ana").unwrap())
            .try_collect()
            .await
            .unwrap();
        assert_eq!(ana, vec![SessionId::new("ana_a").unwrap()]);
        assert!(store.read_all(&key("bob", "ana_a")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_listing_spans_pages_and_restarts() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        let total = LIST_PAGE + 6;
        for i in 0..total {
            store
                .append(&key("ana", &format!("ana_{:03}", i)), NewTurn::new("q", "r", vec![]))
                .await
                .unwrap();
        }

        let user = UserId::new("ana").unwrap();
        let first: Vec<SessionId> = store.list_sessions(&user).try_collect().await.unwrap();
        assert_eq!(first.len(), total);
        assert_eq!(first[LIST_PAGE].as_str(), format!("ana_{:03}", LIST_PAGE));

        let again: Vec<SessionId> = store.list_sessions(&user).take(2).try_collect().await.unwrap();
        assert_eq!(again, first[..2].to_vec());
    }
}
