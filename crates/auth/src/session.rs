//! Session store: opaque token → user mapping.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};

use onboard_core::UserId;

/// A login session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: String, user_id: UserId, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            token,
            user_id,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Session storage abstraction.
///
/// Each method is a single atomic operation on the underlying map. Expired
/// sessions are never returned; `get` evicts them on sight.
pub trait SessionStore: Send + Sync {
    fn insert(&self, session: Session);
    fn get(&self, token: &str, now: DateTime<Utc>) -> Option<Session>;
    /// Remove a session. Returns whether it existed.
    fn remove(&self, token: &str) -> bool;
    /// Drop every expired session, returning how many were removed.
    fn purge_expired(&self, now: DateTime<Utc>) -> usize;
}

impl<S> SessionStore for Arc<S>
where
    S: SessionStore + ?Sized,
{
    fn insert(&self, session: Session) {
        (**self).insert(session)
    }

    fn get(&self, token: &str, now: DateTime<Utc>) -> Option<Session> {
        (**self).get(token, now)
    }

    fn remove(&self, token: &str) -> bool {
        (**self).remove(token)
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        (**self).purge_expired(now)
    }
}

/// Process-local session store.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    inner: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Every write is a single map operation, so a poisoned map is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Session>> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Session>> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStore for InMemorySessionStore {
    fn insert(&self, session: Session) {
        self.write().insert(session.token.clone(), session);
    }

    fn get(&self, token: &str, now: DateTime<Utc>) -> Option<Session> {
        match self.read().get(token) {
            None => return None,
            Some(s) if !s.is_expired(now) => return Some(s.clone()),
            Some(_) => {}
        }

        // Expired: evict under the write lock, re-checking in case it was replaced.
        let mut map = self.write();
        if map.get(token).is_some_and(|s| s.is_expired(now)) {
            map.remove(token);
            tracing::debug!("evicted expired session");
        }
        None
    }

    fn remove(&self, token: &str) -> bool {
        self.write().remove(token).is_some()
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut map = self.write();
        let before = map.len();
        map.retain(|_, s| !s.is_expired(now));
        before - map.len()
    }
}
