//! Thread-safe session handles.
//!
//! A `SquatSession` is strictly sequential. When several callers (e.g. request
//! handlers) can reach the same session, they go through `SharedSession`, which
//! serializes every frame behind one mutex. Distinct sessions never share a lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use crate::config::SquatConfig;
use crate::pose::Landmark;
use crate::squat::session::{Metrics, SessionState, SquatSession};

#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<SquatSession>>,
}

impl SharedSession {
    pub fn new(config: &SquatConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SquatSession::new(config))),
        }
    }

    // A panic mid-frame cannot leave the counter half-updated, so a poisoned
    // lock is taken over instead of propagated.
    fn lock(&self) -> MutexGuard<'_, SquatSession> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn process_frame(&self, landmarks: Option<&[Landmark]>) -> Metrics {
        self.lock().process_frame(landmarks)
    }

    pub fn process_frame_at(&self, landmarks: Option<&[Landmark]>, now: Instant) -> Metrics {
        self.lock().process_frame_at(landmarks, now)
    }

    pub fn reset(&self) {
        self.lock().reset();
    }

    pub fn state(&self) -> SessionState {
        self.lock().state()
    }
}

/// Independent sessions keyed by caller-chosen id.
pub struct SessionRegistry {
    config: SquatConfig,
    sessions: Mutex<HashMap<String, SharedSession>>,
}

impl SessionRegistry {
    pub fn new(config: SquatConfig) -> Self {
        Self {
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<String, SharedSession>> {
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the session for `id`, creating it on first use.
    pub fn get_or_create(&self, id: &str) -> SharedSession {
        self.sessions()
            .entry(id.to_string())
            .or_insert_with(|| {
                log::info!("session {} started", id);
                SharedSession::new(&self.config)
            })
            .clone()
    }

    pub fn get(&self, id: &str) -> Option<SharedSession> {
        self.sessions().get(id).cloned()
    }

    /// Resets one session. Returns false if it does not exist.
    pub fn reset(&self, id: &str) -> bool {
        match self.get(id) {
            Some(session) => {
                session.reset();
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, id: &str) -> Option<SharedSession> {
        let removed = self.sessions().remove(id);
        if removed.is_some() {
            log::info!("session {} ended", id);
        }
        removed
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions().is_empty()
    }
}
