use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::operation::transact_write_items::TransactWriteItemsError;
use aws_sdk_dynamodb::types::{AttributeValue, Put, TransactWriteItem};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::errors::Error;

use super::{User, UserSession, UserStore};

type Item = HashMap<String, AttributeValue>;

/// Single-table layout, partition key `pk`:
/// `USER#<username>` holds the account, `EMAIL#<email>` claims an email for a
/// username and `SESSION#<token>` a login session. `expires_at` doubles as the
/// table's TTL attribute.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct StoredUser {
    pk: String,
    id: String,
    username: String,
    email: String,
    password_hash: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct EmailClaim {
    pk: String,
    username: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct StoredSession {
    pk: String,
    token: String,
    user_id: String,
    expires_at: i64,
}

fn user_key(username: &str) -> String {
    format!("USER#{username}")
}

fn email_key(email: &str) -> String {
    format!("EMAIL#{email}")
}

fn session_key(token: &str) -> String {
    format!("SESSION#{token}")
}

impl From<StoredUser> for User {
    fn from(stored: StoredUser) -> Self {
        Self {
            id: stored.id,
            username: stored.username,
            email: stored.email,
            password_hash: stored.password_hash,
        }
    }
}

impl From<StoredSession> for UserSession {
    fn from(stored: StoredSession) -> Self {
        Self {
            token: stored.token,
            user_id: stored.user_id,
            expires_at: stored.expires_at,
        }
    }
}

pub struct DynamoUserStore {
    client: aws_sdk_dynamodb::Client,
    table: String,
}

impl DynamoUserStore {
    pub fn new(client: aws_sdk_dynamodb::Client, config: &Config) -> Self {
        Self {
            client,
            table: config.users_table.clone(),
        }
    }

    fn guarded_put(&self, item: Item) -> Result<TransactWriteItem, Error> {
        let put = Put::builder()
            .table_name(&self.table)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(pk)")
            .build()
            .map_err(Error::remote)?;

        Ok(TransactWriteItem::builder().put(put).build())
    }

    async fn get(&self, pk: String) -> Result<Option<Item>, Error> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .key("pk", AttributeValue::S(pk))
            .send()
            .await
            .map_err(Error::remote)?;

        Ok(output.item().cloned())
    }
}

#[async_trait]
impl UserStore for DynamoUserStore {
    async fn insert_user(&self, user: &User) -> Result<(), Error> {
        let stored = StoredUser {
            pk: user_key(&user.username),
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
        };
        let claim = EmailClaim {
            pk: email_key(&user.email),
            username: user.username.clone(),
        };

        // Order matters: cancellation reasons come back in this order.
        let writes = vec![
            self.guarded_put(serde_dynamo::to_item(claim).map_err(Error::remote)?)?,
            self.guarded_put(serde_dynamo::to_item(stored).map_err(Error::remote)?)?,
        ];

        self.client
            .transact_write_items()
            .set_transact_items(Some(writes))
            .send()
            .await
            .map_err(|err| match err.as_service_error() {
                Some(TransactWriteItemsError::TransactionCanceledException(cancelled)) => {
                    let failed = cancelled
                        .cancellation_reasons()
                        .iter()
                        .position(|reason| reason.code() == Some("ConditionalCheckFailed"));
                    let field = match failed {
                        Some(0) => "email",
                        _ => "username",
                    };
                    Error::Uniqueness { field: field.to_string() }
                }
                _ => Error::remote(err),
            })?;
        Ok(())
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, Error> {
        self.get(user_key(username))
            .await?
            .map(|item| {
                let stored: StoredUser = serde_dynamo::from_item(item).map_err(Error::remote)?;
                Ok(User::from(stored))
            })
            .transpose()
    }

    async fn insert_session(&self, session: &UserSession) -> Result<(), Error> {
        let stored = StoredSession {
            pk: session_key(&session.token),
            token: session.token.clone(),
            user_id: session.user_id.clone(),
            expires_at: session.expires_at,
        };
        let item: Item = serde_dynamo::to_item(stored).map_err(Error::remote)?;

        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(item))
            .send()
            .await
            .map_err(Error::remote)?;
        Ok(())
    }

    async fn find_session(&self, token: &str) -> Result<Option<UserSession>, Error> {
        self.get(session_key(token))
            .await?
            .map(|item| {
                let stored: StoredSession = serde_dynamo::from_item(item).map_err(Error::remote)?;
                Ok(UserSession::from(stored))
            })
            .transpose()
    }

    async fn delete_session(&self, token: &str) -> Result<(), Error> {
        self.client
            .delete_item()
            .table_name(&self.table)
            .key("pk", AttributeValue::S(session_key(token)))
            .send()
            .await
            .map_err(Error::remote)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn items_are_keyed_by_kind() {
        let user: Item = serde_dynamo::to_item(StoredUser {
            pk: user_key("alice"),
            id: "01J".to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$...".to_string(),
        })
        .expect("serialize user");
        assert_eq!(user.get("pk"), Some(&AttributeValue::S("USER#alice".to_string())));

        let session: Item = serde_dynamo::to_item(StoredSession {
            pk: session_key("t-1"),
            token: "t-1".to_string(),
            user_id: "01J".to_string(),
            expires_at: 1_700_000_000,
        })
        .expect("serialize session");
        assert_eq!(session.get("expires_at"), Some(&AttributeValue::N("1700000000".to_string())));

        let back: StoredSession = serde_dynamo::from_item(session).expect("deserialize");
        assert_eq!(
            UserSession::from(back),
            UserSession {
                token: "t-1".to_string(),
                user_id: "01J".to_string(),
                expires_at: 1_700_000_000,
            }
        );
        assert_eq!(email_key("alice@example.com"), "EMAIL#alice@example.com");
    }
}
