use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::errors::Error;

use super::{User, UserSession, UserStore};

/// Accounts kept in process memory, keyed by username.
#[derive(Debug, Default)]
pub struct MemUserStore {
    users: RwLock<HashMap<String, User>>,
    sessions: RwLock<HashMap<String, UserSession>>,
}

impl MemUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemUserStore {
    async fn insert_user(&self, user: &User) -> Result<(), Error> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(Error::Uniqueness { field: "email".to_string() });
        }
        if users.contains_key(&user.username) {
            return Err(Error::Uniqueness { field: "username".to_string() });
        }
        users.insert(user.username.clone(), user.clone());
        Ok(())
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, Error> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn insert_session(&self, session: &UserSession) -> Result<(), Error> {
        self.sessions
            .write()
            .await
            .insert(session.token.clone(), session.clone());
        Ok(())
    }

    async fn find_session(&self, token: &str) -> Result<Option<UserSession>, Error> {
        Ok(self.sessions.read().await.get(token).cloned())
    }

    async fn delete_session(&self, token: &str) -> Result<(), Error> {
        self.sessions.write().await.remove(token);
        Ok(())
    }
}
