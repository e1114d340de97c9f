use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Entity not found: {entity}")]
    NotFound { entity: String },

    #[error("Uniqueness conflict: {field}")]
    Uniqueness { field: String },

    #[error("Forbidden action")]
    Forbidden,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Remote call failed: {message}")]
    Remote { message: String },

    #[error("Persistence error: {message}")]
    Persistence { message: String },
}

impl Error {
    pub fn not_found(entity: &str) -> Self {
        Self::NotFound { entity: entity.to_string() }
    }

    pub fn remote(message: impl ToString) -> Self {
        Self::Remote { message: message.to_string() }
    }

    pub fn persistence(message: impl ToString) -> Self {
        Self::Persistence { message: message.to_string() }
    }
}
