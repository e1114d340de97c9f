use chrono::{Duration, Utc};
use ulid::Ulid;
use uuid::Uuid;

use crate::errors::Error;
use crate::session::Session;

use super::inputs::{LoginInput, SignupInput};
use super::password::{hash_password, verify_password, MIN_PASSWORD_LENGTH};
use super::{User, UserSession, UserStore};

pub const SESSION_TTL_HOURS: i64 = 12;

/// Account service.
///
/// Registers users, checks their passwords and turns login tokens back into
/// a [`Session`].
pub struct Accounts<'a> {
    store: &'a dyn UserStore,
    ttl: Duration,
}

impl<'a> Accounts<'a> {
    pub fn new(store: &'a dyn UserStore) -> Self {
        Self {
            store,
            ttl: Duration::hours(SESSION_TTL_HOURS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Register a new user and return its id.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for a blank username, a malformed email or a
    /// short password, and `Error::Uniqueness` when the username or email is taken.
    pub async fn signup(&self, input: &SignupInput) -> Result<String, Error> {
        let username = input.username.trim();
        let email = input.email.trim().to_lowercase();
        validate_signup(username, &email, &input.password)?;

        let user = User {
            id: Ulid::new().to_string(),
            username: username.to_string(),
            email,
            password_hash: hash_password(&input.password)?,
        };
        self.store.insert_user(&user).await?;

        tracing::info!("User {} signed up as {}", user.id, user.username);
        Ok(user.id)
    }

    /// Check the password and open a session.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidCredentials` for an unknown user or a wrong
    /// password, without telling the two apart.
    pub async fn login(&self, input: &LoginInput) -> Result<UserSession, Error> {
        let user = self
            .store
            .find_user(input.username.trim())
            .await?
            .ok_or(Error::InvalidCredentials)?;
        verify_password(&input.password, &user.password_hash)?;

        let session = UserSession {
            token: Uuid::new_v4().to_string(),
            user_id: user.id,
            expires_at: (Utc::now() + self.ttl).timestamp(),
        };
        self.store.insert_session(&session).await?;

        tracing::info!("User {} logged in", session.user_id);
        Ok(session)
    }

    pub async fn logout(&self, token: &str) -> Result<(), Error> {
        self.store.delete_session(token).await
    }

    /// The session a request token stands for. Missing, unknown and expired
    /// tokens all resolve to `Session::Anonymous`.
    pub async fn session(&self, token: Option<&str>) -> Result<Session, Error> {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return Ok(Session::Anonymous);
        };

        match self.store.find_session(token).await? {
            Some(session) if !session.is_expired(Utc::now().timestamp()) => {
                Ok(Session::authenticated(session.user_id))
            }
            Some(_) => {
                self.store.delete_session(token).await?;
                Ok(Session::Anonymous)
            }
            None => Ok(Session::Anonymous),
        }
    }
}

fn validate_signup(username: &str, email: &str, password: &str) -> Result<(), Error> {
    if username.is_empty() {
        return Err(Error::Validation {
            message: "Username cannot be empty".to_string(),
        });
    }

    let well_formed = email
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
        .unwrap_or(false);
    if !well_formed {
        return Err(Error::Validation {
            message: format!("Invalid email address: {email}"),
        });
    }

    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(Error::Validation {
            message: format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::MemUserStore;

    fn signup_input(username: &str, email: &str) -> SignupInput {
        SignupInput {
            username: username.to_string(),
            password: "s3cret-pass".to_string(),
            email: email.to_string(),
        }
    }

    fn login_input(username: &str, password: &str) -> LoginInput {
        LoginInput {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn signup_then_login_yields_the_same_user() {
        let store = MemUserStore::new();
        let accounts = Accounts::new(&store);

        let user_id = accounts
            .signup(&signup_input("alice", "Alice@Example.com"))
            .await
            .expect("signup");
        let session = accounts
            .login(&login_input("alice", "s3cret-pass"))
            .await
            .expect("login");

        assert_eq!(session.user_id, user_id);
        assert_eq!(
            accounts.session(Some(&session.token)).await.expect("resolve"),
            Session::authenticated(user_id)
        );

        let stored = store.find_user("alice").await.expect("find").expect("stored");
        assert_eq!(stored.email, "alice@example.com");
        assert_ne!(stored.password_hash, "s3cret-pass");
    }

    #[tokio::test]
    async fn email_must_be_unique() {
        let store = MemUserStore::new();
        let accounts = Accounts::new(&store);
        accounts
            .signup(&signup_input("alice", "alice@example.com"))
            .await
            .expect("signup");

        let taken = accounts
            .signup(&signup_input("alicia", "ALICE@example.com"))
            .await;
        assert_eq!(taken, Err(Error::Uniqueness { field: "email".to_string() }));
    }

    #[tokio::test]
    async fn signup_rejects_bad_input() {
        let store = MemUserStore::new();
        let accounts = Accounts::new(&store);

        assert!(matches!(
            accounts.signup(&signup_input(" ", "a@example.com")).await,
            Err(Error::Validation { .. })
        ));
        assert!(matches!(
            accounts.signup(&signup_input("bob", "not-an-email")).await,
            Err(Error::Validation { .. })
        ));

        let mut short = signup_input("bob", "bob@example.com");
        short.password = "short".to_string();
        assert!(matches!(accounts.signup(&short).await, Err(Error::Validation { .. })));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_alike() {
        let store = MemUserStore::new();
        let accounts = Accounts::new(&store);
        accounts
            .signup(&signup_input("alice", "alice@example.com"))
            .await
            .expect("signup");

        let wrong = accounts.login(&login_input("alice", "guess-guess")).await;
        let unknown = accounts.login(&login_input("mallory", "s3cret-pass")).await;
        assert_eq!(wrong, Err(Error::InvalidCredentials));
        assert_eq!(unknown, Err(Error::InvalidCredentials));
    }

    #[tokio::test]
    async fn logout_and_expiry_end_the_session() {
        let store = MemUserStore::new();
        accounts_signup(&store).await;

        let accounts = Accounts::new(&store);
        let session = accounts
            .login(&login_input("alice", "s3cret-pass"))
            .await
            .expect("login");
        accounts.logout(&session.token).await.expect("logout");
        assert_eq!(
            accounts.session(Some(&session.token)).await.expect("resolve"),
            Session::Anonymous
        );

        let expiring = Accounts::new(&store).with_ttl(Duration::seconds(-1));
        let stale = expiring
            .login(&login_input("alice", "s3cret-pass"))
            .await
            .expect("login");
        assert_eq!(
            expiring.session(Some(&stale.token)).await.expect("resolve"),
            Session::Anonymous
        );
        assert!(store.find_session(&stale.token).await.expect("find").is_none());
    }

    #[tokio::test]
    async fn missing_or_forged_tokens_are_anonymous() {
        let store = MemUserStore::new();
        let accounts = Accounts::new(&store);

        assert_eq!(accounts.session(None).await, Ok(Session::Anonymous));
        assert_eq!(accounts.session(Some("")).await, Ok(Session::Anonymous));
        assert_eq!(accounts.session(Some("u1")).await, Ok(Session::Anonymous));
    }

    async fn accounts_signup(store: &MemUserStore) {
        Accounts::new(store)
            .signup(&signup_input("alice", "alice@example.com"))
            .await
            .expect("signup");
    }
}
