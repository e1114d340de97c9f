use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// A login session. `token` is handed to the client, `expires_at` is in unix seconds.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct UserSession {
    pub token: String,
    pub user_id: String,
    pub expires_at: i64,
}

impl UserSession {
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at <= now
    }
}
