use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use utoipa::ToSchema;
use validator::Validate;

use super::UserId;
use crate::store::{Collection, Entity, EntityStore};

fn default_role() -> String {
    "user".to_string()
}

/// Dashboard account. The password is only ever held as an argon2 PHC string.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub role: String,
}

/// Account creation input, carrying the plain-text password until hashing.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default = "default_role")]
    pub role: String,
}

/// Already-hashed form stored by the entity store.
#[derive(Debug, Clone)]
pub struct HashedUser {
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub role: String,
}

impl Entity for User {
    type Id = UserId;
    type New = HashedUser;
    type Patch = Infallible;

    const LABEL: &'static str = "User";

    fn id(&self) -> UserId {
        self.id
    }

    fn from_new(id: UserId, new: HashedUser) -> Self {
        Self {
            id,
            username: new.username,
            password_hash: new.password_hash,
            name: new.name,
            role: new.role,
        }
    }

    fn apply_patch(&mut self, patch: Infallible) {
        match patch {}
    }

    fn collection(store: &EntityStore) -> &Collection<Self> {
        &store.users
    }

    fn collection_mut(store: &mut EntityStore) -> &mut Collection<Self> {
        &mut store.users
    }
}
