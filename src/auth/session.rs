use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use super::gate::SessionDirective;

const TOKEN_BYTES: usize = 32;

struct Session {
    email: String,
    expires_at: DateTime<Utc>,
}

/// In-memory session bindings from an opaque bearer token to an account
/// email. Sessions do not survive a restart.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    ttl: Duration,
}

impl SessionStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Binds `email` to a new session and returns its token.
    pub fn bind(&self, email: &str) -> String {
        let token = generate_token();
        let now = Utc::now();

        let mut sessions = self.sessions();
        sessions.retain(|_, s| s.expires_at > now);
        sessions.insert(
            token.clone(),
            Session {
                email: email.to_string(),
                expires_at: now + self.ttl,
            },
        );
        token
    }

    /// Returns the email bound to `token`, dropping the session if it has
    /// expired.
    pub fn identity(&self, token: &str) -> Option<String> {
        let mut sessions = self.sessions();
        match sessions.get(token) {
            Some(session) if session.expires_at > Utc::now() => Some(session.email.clone()),
            Some(_) => {
                sessions.remove(token);
                None
            }
            None => None,
        }
    }

    pub fn clear(&self, token: &str) {
        self.sessions().remove(token);
    }

    /// Carries out a directive from the auth gate. Returns the new token when
    /// a session was bound.
    pub fn apply(&self, token: Option<&str>, directive: &SessionDirective) -> Option<String> {
        if let Some(token) = token {
            self.clear(token);
        }
        match directive {
            SessionDirective::Bind(email) => Some(self.bind(email)),
            SessionDirective::Clear => None,
        }
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}
