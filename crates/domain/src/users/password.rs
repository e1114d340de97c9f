use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::errors::Error;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Hash a password using Argon2id, in PHC string format.
pub fn hash_password(password: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| Error::persistence("password hashing failed"))
}

pub fn verify_password(password: &str, hash: &str) -> Result<(), Error> {
    let parsed = PasswordHash::new(hash).map_err(|_| Error::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| Error::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_only_the_original_password() {
        let hash = hash_password("correct horse").expect("hash");

        assert!(hash.starts_with("$argon2id$"));
        assert_eq!(verify_password("correct horse", &hash), Ok(()));
        assert_eq!(verify_password("wrong horse", &hash), Err(Error::InvalidCredentials));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let first = hash_password("pa55word").expect("hash");
        let second = hash_password("pa55word").expect("hash");
        assert_ne!(first, second);
    }

    #[test]
    fn malformed_hash_is_rejected() {
        assert_eq!(verify_password("pa55word", "plain-text"), Err(Error::InvalidCredentials));
    }
}
