//! Session capability and the gate checked when a view mounts.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::notify::NotificationChannel;

/// Name of the durable client-side token cleared on logout.
pub const USER_TOKEN_KEY: &str = "user_id";

#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated { user_id: String },
}

impl Session {
    pub fn authenticated(user_id: impl Into<String>) -> Self {
        Self::Authenticated { user_id: user_id.into() }
    }

    /// The user id, when logged in with a non-empty id.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::Authenticated { user_id } if !user_id.is_empty() => Some(user_id),
            _ => None,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

#[derive(Debug, Default)]
pub struct MemTokenStore {
    tokens: Mutex<HashMap<String, String>>,
}

impl TokenStore for MemTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        self.tokens.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut tokens) = self.tokens.lock() {
            tokens.insert(key.to_string(), value.to_string());
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut tokens) = self.tokens.lock() {
            tokens.remove(key);
        }
    }
}

/// Holder of the current session; the single place login and logout happen.
pub struct SessionState {
    session: Session,
    tokens: Arc<dyn TokenStore>,
}

impl SessionState {
    pub fn new(tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            session: Session::Anonymous,
            tokens,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn login(&mut self, user_id: &str) {
        tracing::info!("Session opened for {}", user_id);
        self.session = Session::authenticated(user_id);
    }

    pub fn logout(&mut self) {
        self.session = Session::Anonymous;
        self.tokens.remove(USER_TOKEN_KEY);
    }
}

pub trait Navigator: Send + Sync {
    fn redirect(&self, route: &str);
}

/// Remembers the last redirect so the caller can act on it after the gate ran.
#[derive(Debug, Default)]
pub struct PendingRedirect {
    route: Mutex<Option<String>>,
}

impl PendingRedirect {
    pub fn take(&self) -> Option<String> {
        self.route.lock().ok()?.take()
    }
}

impl Navigator for PendingRedirect {
    fn redirect(&self, route: &str) {
        if let Ok(mut pending) = self.route.lock() {
            *pending = Some(route.to_string());
        }
    }
}

/// Checked once when a view mounts. It is not re-evaluated while the view stays
/// active, so a session dropped mid-view goes unnoticed until the next mount.
#[derive(Clone, Debug)]
pub struct AuthGate {
    login_route: String,
}

impl AuthGate {
    pub fn new(login_route: impl Into<String>) -> Self {
        Self { login_route: login_route.into() }
    }

    pub fn login_route(&self) -> &str {
        &self.login_route
    }

    /// Returns the user id when the session is ready. Otherwise notifies,
    /// redirects to the login route and returns `None`.
    pub fn admit(
        &self,
        session: &Session,
        notifier: &dyn NotificationChannel,
        navigator: &dyn Navigator,
    ) -> Option<String> {
        match session.user_id() {
            Some(user_id) => Some(user_id.to_string()),
            None => {
                tracing::warn!("Session missing, redirecting to {}", self.login_route);
                notifier.error("User not logged in. Redirecting...");
                navigator.redirect(&self.login_route);
                None
            }
        }
    }
}

impl Default for AuthGate {
    fn default() -> Self {
        Self::new("/login")
    }
}
