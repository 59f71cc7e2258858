use std::collections::HashMap;
use std::sync::OnceLock;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::DbCredentials;

/// Name of the session cookie set by login and logout.
pub const SESSION_COOKIE: &str = "portal_session";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Success,
    Error,
    Warning,
}

/// One-shot user-facing notification, drained when the next page renders.
#[derive(Debug, Clone)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Warning,
            message: message.into(),
        }
    }
}

/// Snapshot of an authenticated session, injected into request extensions by
/// the auth middleware. Credentials travel with the request, never through
/// process-global state.
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub id: Uuid,
    pub username: String,
    pub credentials: DbCredentials,
}

struct SessionEntry {
    // None for anonymous sessions, which exist only to carry flashes across
    // the logout redirect.
    username: Option<String>,
    credentials: Option<DbCredentials>,
    flashes: Vec<Flash>,
}

/// In-process server-side session map.
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
}

impl SessionStore {
    pub fn instance() -> &'static SessionStore {
        static INSTANCE: OnceLock<SessionStore> = OnceLock::new();
        INSTANCE.get_or_init(SessionStore::new)
    }

    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Create a session holding the credentials the user just logged in with.
    pub async fn create_authenticated(
        &self,
        username: String,
        credentials: DbCredentials,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let entry = SessionEntry {
            username: Some(username),
            credentials: Some(credentials),
            flashes: Vec::new(),
        };
        self.sessions.write().await.insert(id, entry);
        id
    }

    /// Create a session with no identity. Used after logout so the login
    /// page can still show a flash.
    pub async fn create_anonymous(&self) -> Uuid {
        let id = Uuid::new_v4();
        let entry = SessionEntry {
            username: None,
            credentials: None,
            flashes: Vec::new(),
        };
        self.sessions.write().await.insert(id, entry);
        id
    }

    /// Resolve a session id to its authenticated snapshot, if any.
    pub async fn authenticated(&self, id: Uuid) -> Option<CurrentSession> {
        let sessions = self.sessions.read().await;
        let entry = sessions.get(&id)?;
        Some(CurrentSession {
            id,
            username: entry.username.clone()?,
            credentials: entry.credentials.clone()?,
        })
    }

    pub async fn remove(&self, id: Uuid) {
        self.sessions.write().await.remove(&id);
    }

    /// Attach a flash to a session. Unknown ids are ignored.
    pub async fn push_flash(&self, id: Uuid, flash: Flash) {
        if let Some(entry) = self.sessions.write().await.get_mut(&id) {
            entry.flashes.push(flash);
        }
    }

    /// Drain pending flashes; each is delivered exactly once.
    pub async fn take_flashes(&self, id: Uuid) -> Vec<Flash> {
        match self.sessions.write().await.get_mut(&id) {
            Some(entry) => std::mem::take(&mut entry.flashes),
            None => Vec::new(),
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn authenticated_sessions_resolve_until_removed() {
        let store = SessionStore::new();
        let id = store
            .create_authenticated("root".into(), DbCredentials::new("root", "root"))
            .await;

        let current = store.authenticated(id).await.expect("session resolves");
        assert_eq!(current.username, "root");
        assert_eq!(current.credentials.user, "root");

        store.remove(id).await;
        assert!(store.authenticated(id).await.is_none());
    }

    #[tokio::test]
    async fn anonymous_sessions_never_authenticate() {
        let store = SessionStore::new();
        let id = store.create_anonymous().await;
        assert!(store.authenticated(id).await.is_none());
    }

    #[tokio::test]
    async fn flashes_drain_exactly_once() {
        let store = SessionStore::new();
        let id = store.create_anonymous().await;

        store.push_flash(id, Flash::success("Logged out")).await;
        store.push_flash(id, Flash::error("oops")).await;

        let flashes = store.take_flashes(id).await;
        assert_eq!(flashes.len(), 2);
        assert_eq!(flashes[0].level, FlashLevel::Success);
        assert_eq!(flashes[0].message, "Logged out");

        assert!(store.take_flashes(id).await.is_empty());
    }

    #[tokio::test]
    async fn flash_on_unknown_session_is_ignored() {
        let store = SessionStore::new();
        store.push_flash(Uuid::new_v4(), Flash::success("x")).await;
        assert!(store.take_flashes(Uuid::new_v4()).await.is_empty());
    }
}
