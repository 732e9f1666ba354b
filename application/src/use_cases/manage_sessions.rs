//! Session lifecycle use case
//!
//! Creates and resolves session identifiers and forwards clear, list,
//! prune and inspect requests to the [`SessionStore`].
//!
//! ```ignore
//! let sessions = SessionLifecycle::new(store);
//! let key = sessions.resolve(&user, Some("etl"))?;   // ana_etl
//! let fresh = sessions.new_session(&user);           // ana_20250101_120000_3fa9c1d2
//! let removed = sessions.prune(&user, 30).await?;
//! ```

use crate::ports::session_store::{SessionStore, StoreError};
use chrono::{Duration, Utc};
use crew_domain::{DomainError, SessionId, SessionKey, SessionSummary, UserId};
use futures::TryStreamExt;
use futures::stream::BoxStream;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Default age after which `cleanup-sessions` removes a session
pub const DEFAULT_RETENTION_DAYS: u32 = 30;

#[derive(Error, Debug)]
pub enum SessionLifecycleError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

pub struct SessionLifecycle<S: SessionStore> {
    store: Arc<S>,
}

impl<S: SessionStore> SessionLifecycle<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// A fresh session key for `user`, stamped with the current time
    pub fn new_session(&self, user: &UserId) -> SessionKey {
        let session = SessionId::generate(user, Utc::now(), &mut rand::thread_rng());
        SessionKey::new(user.clone(), session)
    }

    /// Key for an explicitly named session, or a fresh one when none is given
    pub fn resolve(
        &self,
        user: &UserId,
        requested: Option<&str>,
    ) -> Result<SessionKey, SessionLifecycleError> {
        match requested {
            Some(name) => Ok(SessionKey::new(
                user.clone(),
                SessionId::resolve(user, name)?,
            )),
            None => Ok(self.new_session(user)),
        }
    }

    pub async fn clear(&self, key: &SessionKey) -> Result<(), SessionLifecycleError> {
        self.store.clear(key).await?;
        info!("Cleared history of {}", key);
        Ok(())
    }

    /// Lazy listing of `user`'s sessions
    pub fn list_stream(&self, user: &UserId) -> BoxStream<'static, Result<SessionId, StoreError>> {
        self.store.list_sessions(user)
    }

    pub async fn list(&self, user: &UserId) -> Result<Vec<SessionId>, SessionLifecycleError> {
        Ok(self.list_stream(user).try_collect().await?)
    }

    /// Delete sessions of `user` inactive for more than `older_than_days`
    pub async fn prune(
        &self,
        user: &UserId,
        older_than_days: u32,
    ) -> Result<usize, SessionLifecycleError> {
        let removed = self
            .store
            .delete_older_than(user, Duration::days(i64::from(older_than_days)))
            .await?;
        info!(
            "Removed {} session(s) of {} older than {} days",
            removed, user, older_than_days
        );
        Ok(removed)
    }

    pub async fn inspect(
        &self,
        key: &SessionKey,
    ) -> Result<Option<SessionSummary>, SessionLifecycleError> {
        Ok(self.store.summary(key).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::session_store::InMemorySessionStore;
    use crew_domain::NewTurn;

    fn user() -> UserId {
        UserId::new("ana").unwrap()
    }

    fn lifecycle() -> (Arc<InMemorySessionStore>, SessionLifecycle<InMemorySessionStore>) {
        let store = Arc::new(InMemorySessionStore::new());
        (store.clone(), SessionLifecycle::new(store))
    }

    #[test]
    fn test_new_session_is_prefixed_by_user() {
        let (_, sessions) = lifecycle();
        let key = sessions.new_session(&user());
        let id = key.session.as_str();
        assert!(id.starts_with("ana_"));
        let suffix = id.rsplit('_').next().unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_resolve_named_session() {
        let (_, sessions) = lifecycle();
        let key = sessions.resolve(&user(), Some("etl")).unwrap();
        assert_eq!(key.session.as_str(), "ana_etl");

        let key = sessions.resolve(&user(), Some("ana_etl")).unwrap();
        assert_eq!(key.session.as_str(), "ana_etl");

        assert!(matches!(
            sessions.resolve(&user(), Some("bad name")),
            Err(SessionLifecycleError::Domain(DomainError::InvalidIdentifier { .. }))
        ));
    }

    #[tokio::test]
    async fn test_prune_then_list() {
        let (store, sessions) = lifecycle();
        let now = Utc::now();
        for (name, age) in [("a", 40), ("b", 35), ("c", 2), ("d", 1), ("e", 0)] {
            let key = SessionKey::new(user(), SessionId::new(format!("ana_{}", name)).unwrap());
            store
                .seed(&key, now - Duration::days(age), vec![NewTurn::new("q", "r", vec![])])
                .unwrap();
        }

        assert_eq!(sessions.prune(&user(), DEFAULT_RETENTION_DAYS).await.unwrap(), 2);
        let remaining: Vec<String> = sessions
            .list(&user())
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.as_str().to_string())
            .collect();
        assert_eq!(remaining, vec!["ana_c", "ana_d", "ana_e"]);
    }

    #[tokio::test]
    async fn test_prune_with_huge_retention_removes_nothing() {
        let (store, sessions) = lifecycle();
        let key = SessionKey::new(user(), SessionId::new("ana_old").unwrap());
        store
            .seed(&key, Utc::now() - Duration::days(4000), vec![NewTurn::new("q", "r", vec![])])
            .unwrap();

        assert_eq!(sessions.prune(&user(), u32::MAX).await.unwrap(), 0);
        assert_eq!(sessions.list(&user()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_inspect_and_clear() {
        let (store, sessions) = lifecycle();
        let key = sessions.resolve(&user(), Some("etl")).unwrap();
        assert!(sessions.inspect(&key).await.unwrap().is_none());

        store
            .append(&key, NewTurn::new("q1", "r1", vec!["RAG Agent".to_string()]))
            .await
            .unwrap();
        let summary = sessions.inspect(&key).await.unwrap().unwrap();
        assert_eq!(summary.turn_count, 1);

        sessions.clear(&key).await.unwrap();
        assert!(store.read_all(&key).await.unwrap().is_empty());
    }
}
