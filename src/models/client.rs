use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::{ClientId, StoreId};
use crate::services::catalog::CatalogEntity;
use crate::store::{Collection, Entity, EntityStore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub store_id: StoreId,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewClient {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    pub store_id: StoreId,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientPatch {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    pub store_id: Option<StoreId>,
}

impl Entity for Client {
    type Id = ClientId;
    type New = NewClient;
    type Patch = ClientPatch;

    const LABEL: &'static str = "Client";

    fn id(&self) -> ClientId {
        self.id
    }

    fn from_new(id: ClientId, new: NewClient) -> Self {
        Self {
            id,
            name: new.name,
            email: new.email,
            phone: new.phone,
            store_id: new.store_id,
        }
    }

    fn apply_patch(&mut self, patch: ClientPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if patch.email.is_some() {
            self.email = patch.email;
        }
        if patch.phone.is_some() {
            self.phone = patch.phone;
        }
        if let Some(store_id) = patch.store_id {
            self.store_id = store_id;
        }
    }

    fn collection(store: &EntityStore) -> &Collection<Self> {
        &store.clients
    }

    fn collection_mut(store: &mut EntityStore) -> &mut Collection<Self> {
        &mut store.clients
    }
}

impl CatalogEntity for Client {}
