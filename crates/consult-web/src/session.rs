//! In-memory browser sessions
//!
//! A session is keyed by the random id in the `consult_session` cookie. It
//! holds the provider override chosen in the sidebar and the last inputs and
//! report, and disappears after a period of inactivity.

use chrono::{DateTime, Duration, Utc};
use consult_analysis::{AnalysisReport, BusinessInputs};
use consult_llm::ProviderSettings;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "consult_session";

/// Idle time after which a session is dropped
pub const DEFAULT_SESSION_TTL_SECS: i64 = 60 * 60;

#[derive(Debug, Clone)]
pub struct Session {
    /// Provider chosen in the sidebar; `None` uses the startup settings
    pub settings: Option<ProviderSettings>,
    pub last_inputs: Option<BusinessInputs>,
    pub last_report: Option<AnalysisReport>,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            settings: None,
            last_inputs: None,
            last_report: None,
            created_at: now,
            last_active: now,
        }
    }

    pub fn update_activity(&mut self) {
        self.last_active = Utc::now();
    }

    pub fn is_expired(&self, max_age_seconds: i64) -> bool {
        Utc::now() - self.last_active > Duration::seconds(max_age_seconds)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared session table
///
/// Cloning is cheap; clones share the same table.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
    ttl_seconds: i64,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl_seconds: DEFAULT_SESSION_TTL_SECS,
        }
    }

    pub fn with_ttl(mut self, ttl_seconds: i64) -> Self {
        self.ttl_seconds = ttl_seconds;
        self
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Look up a live session, refreshing its activity time
    pub fn get(&self, id: Uuid) -> Option<Session> {
        let mut sessions = self.sessions.write().ok()?;
        let session = sessions.get_mut(&id)?;
        if session.is_expired(self.ttl_seconds) {
            sessions.remove(&id);
            return None;
        }
        session.update_activity();
        Some(session.clone())
    }

    /// Resolve the caller's session, starting a fresh one when the id is
    /// missing, unknown or expired
    pub fn get_or_create(&self, id: Option<Uuid>) -> (Uuid, Session) {
        if let Some(found) = id.and_then(|id| self.get(id).map(|session| (id, session))) {
            return found;
        }

        let id = Uuid::new_v4();
        let session = Session::new();
        if let Ok(mut sessions) = self.sessions.write() {
            sessions.insert(id, session.clone());
        }
        (id, session)
    }

    /// Apply a change to a session; returns false when it no longer exists
    pub fn update(&self, id: Uuid, change: impl FnOnce(&mut Session)) -> bool {
        let Ok(mut sessions) = self.sessions.write() else {
            return false;
        };
        match sessions.get_mut(&id) {
            Some(session) => {
                change(session);
                session.update_activity();
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, id: Uuid) -> bool {
        self.sessions
            .write()
            .ok()
            .and_then(|mut sessions| sessions.remove(&id))
            .is_some()
    }

    /// Drop idle sessions, returning how many were removed
    pub fn cleanup_expired(&self) -> usize {
        let Ok(mut sessions) = self.sessions.write() else {
            return 0;
        };
        let initial_count = sessions.len();
        sessions.retain(|_, session| !session.is_expired(self.ttl_seconds));
        initial_count - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Pull the session id out of a `Cookie` header value
pub fn session_id_from_cookies(cookie_header: &str) -> Option<Uuid> {
    cookie_header.split(';').find_map(|cookie| {
        let (name, value) = cookie.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| Uuid::parse_str(value).ok())?
    })
}

/// `Set-Cookie` value for a session id
pub fn session_cookie(id: Uuid, max_age_seconds: i64) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_seconds}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_reuses_session() {
        let store = SessionStore::new();
        let (id, _) = store.get_or_create(None);
        let (again, _) = store.get_or_create(Some(id));

        assert_eq!(id, again);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_unknown_id_starts_new_session() {
        let store = SessionStore::new();
        let stale = Uuid::new_v4();
        let (id, _) = store.get_or_create(Some(stale));

        assert_ne!(id, stale);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_update_persists() {
        let store = SessionStore::new();
        let (id, _) = store.get_or_create(None);

        assert!(store.update(id, |s| s.last_inputs = Some(BusinessInputs::sample())));
        assert!(store.get(id).unwrap().last_inputs.is_some());
        assert!(!store.update(Uuid::new_v4(), |_| {}));
    }

    #[test]
    fn test_expired_sessions_are_dropped() {
        let store = SessionStore::new().with_ttl(60);
        let (id, _) = store.get_or_create(None);
        store.update(id, |_| {});

        if let Ok(mut sessions) = store.sessions.write() {
            sessions.get_mut(&id).unwrap().last_active = Utc::now() - Duration::seconds(120);
        }

        assert!(store.get(id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_cleanup_expired() {
        let store = SessionStore::new().with_ttl(60);
        let (old, _) = store.get_or_create(None);
        store.get_or_create(None);

        if let Ok(mut sessions) = store.sessions.write() {
            sessions.get_mut(&old).unwrap().last_active = Utc::now() - Duration::seconds(61);
        }

        assert_eq!(store.cleanup_expired(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_cookie_parsing() {
        let id = Uuid::new_v4();
        let header = format!("theme=dark; {SESSION_COOKIE}={id}; other=1");
        assert_eq!(session_id_from_cookies(&header), Some(id));

        assert_eq!(session_id_from_cookies("consult_session=not-a-uuid"), None);
        assert_eq!(session_id_from_cookies("theme=dark"), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let id = Uuid::new_v4();
        let cookie = session_cookie(id, 3600);
        assert!(cookie.starts_with(&format!("consult_session={id};")));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=3600"));
    }
}
