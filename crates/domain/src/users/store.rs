use async_trait::async_trait;

use crate::errors::Error;

use super::{User, UserSession};

/// Persistence for accounts and their login sessions.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Error::Uniqueness` when the username or the email is taken.
    async fn insert_user(&self, user: &User) -> Result<(), Error>;

    async fn find_user(&self, username: &str) -> Result<Option<User>, Error>;

    async fn insert_session(&self, session: &UserSession) -> Result<(), Error>;

    async fn find_session(&self, token: &str) -> Result<Option<UserSession>, Error>;

    /// Unknown tokens are ignored.
    async fn delete_session(&self, token: &str) -> Result<(), Error>;
}
