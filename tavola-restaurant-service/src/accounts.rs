use argon2::password_hash::{rand_core::OsRng, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Argon2, PasswordHash};
use chrono::{TimeDelta, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::models::{User, UserId};
use crate::store::{Store, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("{0}")]
    InvalidUsername(String),
    #[error("password required")]
    EmptyPassword,
    #[error("username {0} is already taken")]
    UsernameTaken(String),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("cannot hash password: {0}")]
    Hash(password_hash::Error),
    #[error("invalid token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub fn register(store: &dyn Store, username: &str, password: &str) -> Result<User, AccountError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AccountError::InvalidUsername("username required".to_string()));
    }
    if username.chars().count() > 150 {
        return Err(AccountError::InvalidUsername(
            "username must be at most 150 characters".to_string(),
        ));
    }
    if password.is_empty() {
        return Err(AccountError::EmptyPassword);
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(AccountError::Hash)?
        .to_string();
    let user = User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        password_hash,
        created_at: Utc::now(),
    };

    store.insert_user(&user).map_err(|err| match err {
        StoreError::Constraint(_) => AccountError::UsernameTaken(user.username.clone()),
        other => AccountError::Store(other),
    })?;
    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(user)
}

pub fn authenticate(
    store: &dyn Store,
    username: &str,
    password: &str,
) -> Result<User, AccountError> {
    let user = store
        .find_user_by_username(username.trim())?
        .ok_or(AccountError::InvalidCredentials)?;
    let verified = PasswordHash::new(&user.password_hash)
        .map(|hash| {
            Argon2::default()
                .verify_password(password.as_bytes(), &hash)
                .is_ok()
        })
        .unwrap_or(false);
    if verified {
        Ok(user)
    } else {
        Err(AccountError::InvalidCredentials)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub exp: usize,
    pub iat: usize,
    pub sub: String,
    pub name: String,
}

/// A verified login token.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub user_id: UserId,
    pub username: String,
}

pub struct TokenKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    pub access_token_expires: TimeDelta,
}

impl TokenKeys {
    pub fn new(secret_key: &str, access_token_expires: TimeDelta) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret_key.as_ref()),
            decoding_key: DecodingKey::from_secret(secret_key.as_ref()),
            access_token_expires,
        }
    }

    pub fn issue(&self, user: &User) -> Result<String, AccountError> {
        let now = Utc::now();
        let claims = Claims {
            exp: (now + self.access_token_expires).timestamp().max(0) as usize,
            iat: now.timestamp() as usize,
            sub: user.id.to_string(),
            name: user.username.clone(),
        };
        Ok(jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &self.encoding_key,
        )?)
    }

    pub fn verify(&self, token: &str) -> Result<Session, AccountError> {
        let data =
            jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &Validation::default())?;
        let user_id = data
            .claims
            .sub
            .parse::<Uuid>()
            .map_err(|_| AccountError::InvalidCredentials)?;
        Ok(Session {
            user_id: UserId(user_id),
            username: data.claims.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_register_and_authenticate() {
        let store = MemoryStore::new();
        let user = register(&store, " testuser ", "testpass123").unwrap();
        assert_eq!(user.username, "testuser");
        assert_ne!(user.password_hash, "testpass123");

        let found = authenticate(&store, "testuser", "testpass123").unwrap();
        assert_eq!(found.id, user.id);
        assert!(matches!(
            authenticate(&store, "testuser", "wrong"),
            Err(AccountError::InvalidCredentials)
        ));
        assert!(matches!(
            authenticate(&store, "nobody", "testpass123"),
            Err(AccountError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_register_rejects_duplicates_and_blanks() {
        let store = MemoryStore::new();
        register(&store, "alice", "secret").unwrap();
        assert!(matches!(
            register(&store, "alice", "other"),
            Err(AccountError::UsernameTaken(_))
        ));
        assert!(matches!(
            register(&store, "  ", "secret"),
            Err(AccountError::InvalidUsername(_))
        ));
        assert!(matches!(
            register(&store, "bob", ""),
            Err(AccountError::EmptyPassword)
        ));
    }

    #[test]
    fn test_token_round_trip() {
        let store = MemoryStore::new();
        let user = register(&store, "alice", "secret").unwrap();
        let keys = TokenKeys::new("test-secret", TimeDelta::hours(8));

        let token = keys.issue(&user).unwrap();
        let session = keys.verify(&token).unwrap();
        assert_eq!(session.user_id, user.user_id());
        assert_eq!(session.username, "alice");
    }

    #[test]
    fn test_token_rejected_with_other_key_or_expired() {
        let store = MemoryStore::new();
        let user = register(&store, "alice", "secret").unwrap();
        let keys = TokenKeys::new("test-secret", TimeDelta::hours(8));
        let other = TokenKeys::new("other-secret", TimeDelta::hours(8));
        let expired = TokenKeys::new("test-secret", TimeDelta::hours(-2));

        assert!(other.verify(&keys.issue(&user).unwrap()).is_err());
        assert!(keys.verify(&expired.issue(&user).unwrap()).is_err());
        assert!(keys.verify("not-a-token").is_err());
    }
}
