//! In-memory store of authenticated Instagram sessions

use instagram::{Connector, InstagramApi};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{GiveawayError, GiveawayResult};
use crate::models::LoginResponse;

/// Default session lifetime, counted from login
pub const SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// Session entry
struct SessionEntry {
    /// Authenticated client, only handed out while the session is live
    client: Arc<dyn InstagramApi>,
    /// Account the cookie resolved to
    username: String,
    /// Login time; expiry is measured from here
    created_at: Instant,
    /// Last successful lookup
    last_used: Instant,
}

/// Session store
#[derive(Clone)]
pub struct SessionStore {
    /// Builds clients from session cookies
    connector: Arc<dyn Connector>,
    /// Absolute session lifetime
    ttl: Duration,
    /// Live sessions keyed by session id
    sessions: Arc<Mutex<HashMap<String, SessionEntry>>>,
}

impl SessionStore {
    /// Create a new session store
    pub fn new(connector: Arc<dyn Connector>, ttl: Duration) -> Self {
        Self {
            connector,
            ttl,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Log in with a browser `sessionid` cookie and open a session
    pub async fn login(&self, session_cookie: &str) -> GiveawayResult<LoginResponse> {
        let client = self
            .connector
            .connect(session_cookie)
            .map_err(|e| GiveawayError::LoginFailed {
                reason: e.message().to_string(),
            })?;

        // Resolve the account before taking the lock
        let username = match client.current_username().await {
            Ok(Some(username)) => username,
            Ok(None) => {
                return Err(GiveawayError::LoginFailed {
                    reason: "the cookie does not belong to a logged-in account".to_string(),
                });
            }
            Err(e) => {
                warn!("Cookie login could not reach Instagram: {}", e);
                return Err(GiveawayError::LoginFailed {
                    reason: e.message().to_string(),
                });
            }
        };

        let session_id = Uuid::new_v4().to_string();
        let now = Instant::now();

        self.sessions.lock().await.insert(
            session_id.clone(),
            SessionEntry {
                client,
                username: username.clone(),
                created_at: now,
                last_used: now,
            },
        );

        info!(
            "Cookie login successful for user {}, session_id={}",
            username, session_id
        );

        Ok(LoginResponse {
            session_id,
            username,
        })
    }

    /// Get the authenticated client of a live session
    pub async fn get_client(&self, session_id: &str) -> GiveawayResult<Arc<dyn InstagramApi>> {
        let mut sessions = self.sessions.lock().await;
        let entry = self.live_entry(&mut sessions, session_id)?;
        Ok(Arc::clone(&entry.client))
    }

    /// Get the account name of a live session without contacting Instagram
    pub async fn validate(&self, session_id: &str) -> GiveawayResult<String> {
        let mut sessions = self.sessions.lock().await;
        let entry = self.live_entry(&mut sessions, session_id)?;
        Ok(entry.username.clone())
    }

    /// Remove a session; unknown ids are ignored
    pub async fn remove(&self, session_id: &str) {
        let removed = self.sessions.lock().await.remove(session_id);
        if removed.is_some() {
            info!("Session {} removed (logout)", session_id);
        } else {
            debug!("Attempted to remove unknown session {}", session_id);
        }
    }

    /// Drop every session whose age reached the TTL
    pub async fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.lock().await;
        let now = Instant::now();
        let before = sessions.len();

        sessions.retain(|session_id, entry| {
            let live = now.duration_since(entry.created_at) < self.ttl;
            if !live {
                debug!(
                    session_id = session_id.as_str(),
                    idle_secs = now.duration_since(entry.last_used).as_secs(),
                    "Evicting expired session"
                );
            }
            live
        });

        let removed = before - sessions.len();
        if removed > 0 {
            info!("Cleaned up {} expired session(s)", removed);
        }
        removed
    }

    /// Number of stored sessions, expired ones included until swept
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Shared lookup: evicts an expired entry and touches a live one
    fn live_entry<'a>(
        &self,
        sessions: &'a mut HashMap<String, SessionEntry>,
        session_id: &str,
    ) -> GiveawayResult<&'a mut SessionEntry> {
        let now = Instant::now();

        let expired = match sessions.get(session_id) {
            Some(entry) => now.duration_since(entry.created_at) >= self.ttl,
            None => return Err(GiveawayError::SessionNotFound),
        };

        if expired {
            sessions.remove(session_id);
            info!("Session {} expired, removing", session_id);
            return Err(GiveawayError::SessionNotFound);
        }

        let entry = sessions
            .get_mut(session_id)
            .ok_or(GiveawayError::SessionNotFound)?;
        entry.last_used = now;
        Ok(entry)
    }
}
