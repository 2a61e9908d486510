//! In-memory session registry.
//!
//! Each session sits behind its own `tokio::sync::Mutex`, so concurrent
//! requests against one session id serialize at turn granularity (lock
//! acquisition order) instead of interleaving history writes. Across
//! sessions there is no ordering guarantee.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use stackforge_core::{ForgeError, Session};

pub type SharedSession = Arc<Mutex<Session>>;

/// Registry of live sessions keyed by opaque id.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SharedSession>>,
    persona: String,
}

impl SessionStore {
    /// `persona` seeds every new session's system message.
    pub fn new(persona: impl Into<String>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            persona: persona.into(),
        }
    }

    /// Create a fresh session and return its id.
    pub async fn create(&self) -> String {
        let id = Uuid::new_v4().to_string();
        let session = Session::new(id.clone(), self.persona.clone());
        self.sessions
            .write()
            .await
            .insert(id.clone(), Arc::new(Mutex::new(session)));
        debug!(session_id = %id, "session created");
        id
    }

    /// Look up a session handle; callers lock it for the duration of a turn.
    pub async fn get(&self, id: &str) -> Result<SharedSession, ForgeError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ForgeError::SessionNotFound(id.to_string()))
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Remove sessions idle past `max_idle`. Sessions currently locked by a
    /// request are in use and are skipped. Returns the number evicted.
    pub async fn evict_idle(&self, max_idle: chrono::Duration) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => session.idle_for(now) <= max_idle,
            Err(_) => true,
        });

        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, remaining = sessions.len(), "evicted idle sessions");
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackforge_core::ChatMessage;

    #[tokio::test]
    async fn create_then_get_roundtrip() {
        let store = SessionStore::new("persona");
        let id = store.create().await;
        let handle = store.get(&id).await.unwrap();
        let session = handle.lock().await;
        assert_eq!(session.id, id);
        assert_eq!(session.messages[0].content, "persona");
    }

    #[tokio::test]
    async fn unknown_id_is_session_not_found() {
        let store = SessionStore::new("persona");
        let err = store.get("no-such-id").await.unwrap_err();
        assert!(matches!(err, ForgeError::SessionNotFound(id) if id == "no-such-id"));
    }

    #[tokio::test]
    async fn evicts_only_idle_sessions() {
        let store = SessionStore::new("persona");
        let stale = store.create().await;
        let fresh = store.create().await;

        // Age the first session's activity timestamp by hand.
        {
            let handle = store.get(&stale).await.unwrap();
            let mut session = handle.lock().await;
            session.last_active = Utc::now() - chrono::Duration::hours(2);
        }
        {
            let handle = store.get(&fresh).await.unwrap();
            let mut session = handle.lock().await;
            session.push(ChatMessage::user("still here"));
        }

        let evicted = store.evict_idle(chrono::Duration::hours(1)).await;
        assert_eq!(evicted, 1);
        assert!(store.get(&stale).await.is_err());
        assert!(store.get(&fresh).await.is_ok());
    }

    #[tokio::test]
    async fn locked_sessions_survive_eviction() {
        let store = SessionStore::new("persona");
        let id = store.create().await;
        let handle = store.get(&id).await.unwrap();
        let mut session = handle.lock().await;
        session.last_active = Utc::now() - chrono::Duration::hours(2);

        // Still locked: the sweep must leave it alone.
        let evicted = store.evict_idle(chrono::Duration::hours(1)).await;
        assert_eq!(evicted, 0);
        drop(session);
        assert!(store.get(&id).await.is_ok());
    }
}
