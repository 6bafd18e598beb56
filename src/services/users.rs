//! Dashboard accounts. There is no login flow; the service only keeps
//! accounts with hashed credentials.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tracing::{info, instrument};
use validator::Validate;

use crate::errors::ServiceError;
use crate::models::{HashedUser, NewUser, User, UserId};
use crate::store::SharedStore;

/// Hashes a password into an argon2 PHC string with a fresh salt.
pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::HashError(e.to_string()))
}

/// Checks a password against a stored PHC string.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, ServiceError> {
    let parsed =
        PasswordHash::new(password_hash).map_err(|e| ServiceError::HashError(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[derive(Clone)]
pub struct UserService {
    store: SharedStore,
}

impl UserService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    #[instrument(skip_all, fields(username = %new.username))]
    pub async fn create_user(&self, new: NewUser) -> Result<User, ServiceError> {
        new.validate()?;
        let password_hash = hash_password(&new.password)?;

        let mut store = self.store.write().await;
        if store.user_by_username(&new.username).is_some() {
            return Err(ServiceError::Conflict(format!(
                "User '{}' already exists",
                new.username
            )));
        }
        let user: User = store.create(HashedUser {
            username: new.username,
            password_hash,
            name: new.name,
            role: new.role,
        });
        info!(user_id = %user.id, "user created");
        Ok(user)
    }

    pub async fn get_user(&self, id: UserId) -> Result<User, ServiceError> {
        self.store
            .read()
            .await
            .get::<User>(id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("User", id))
    }

    pub async fn get_user_by_username(&self, username: &str) -> Option<User> {
        self.store.read().await.user_by_username(username).cloned()
    }

    /// True when the account exists and the password matches.
    pub async fn check_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<bool, ServiceError> {
        match self.get_user_by_username(username).await {
            Some(user) => verify_password(password, &user.password_hash),
            None => Ok(false),
        }
    }
}
