//! Cookie-keyed, in-memory storage of the last submission per browser.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use cantus_filter_core::CollectedValues;
use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "filter_session";

/// What one form submission leaves behind for the export view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub name: String,
    pub values: CollectedValues,
}

struct Entry {
    submission: Submission,
    touched: Instant,
}

#[derive(Clone)]
pub struct SessionStore {
    entries: Arc<Mutex<HashMap<Uuid, Entry>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Session id carried by the request's cookie, if any.
    pub fn session_id(headers: &HeaderMap) -> Option<Uuid> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
    }

    pub fn load(&self, id: Uuid) -> Option<Submission> {
        let mut entries = self.entries.lock();
        self.purge_expired(&mut entries);
        entries.get_mut(&id).map(|entry| {
            entry.touched = Instant::now();
            entry.submission.clone()
        })
    }

    /// Replaces whatever the session held before.
    pub fn store(&self, id: Uuid, submission: Submission) {
        let mut entries = self.entries.lock();
        self.purge_expired(&mut entries);
        entries.insert(
            id,
            Entry {
                submission,
                touched: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn purge_expired(&self, entries: &mut HashMap<Uuid, Entry>) {
        let before = entries.len();
        let ttl = self.ttl;
        entries.retain(|_, entry| entry.touched.elapsed() < ttl);
        let purged = before - entries.len();
        if purged > 0 {
            debug!(purged, "expired sessions removed");
        }
    }
}

/// `Set-Cookie` value binding the browser to `id` for its session lifetime.
pub fn session_cookie(id: Uuid) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax")
}
