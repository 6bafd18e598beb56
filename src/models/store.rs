use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::StoreId;
use crate::services::catalog::CatalogEntity;
use crate::store::{Collection, Entity, EntityStore};

/// A physical shop location. Names are unique across stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    pub location: Option<String>,
    pub manager: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewStore {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    #[validate(length(max = 100))]
    pub manager: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StorePatch {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    #[validate(length(max = 100))]
    pub manager: Option<String>,
}

impl Entity for Store {
    type Id = StoreId;
    type New = NewStore;
    type Patch = StorePatch;

    const LABEL: &'static str = "Store";

    fn id(&self) -> StoreId {
        self.id
    }

    fn from_new(id: StoreId, new: NewStore) -> Self {
        Self {
            id,
            name: new.name,
            location: new.location,
            manager: new.manager,
        }
    }

    fn apply_patch(&mut self, patch: StorePatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if patch.location.is_some() {
            self.location = patch.location;
        }
        if patch.manager.is_some() {
            self.manager = patch.manager;
        }
    }

    fn collection(store: &EntityStore) -> &Collection<Self> {
        &store.stores
    }

    fn collection_mut(store: &mut EntityStore) -> &mut Collection<Self> {
        &mut store.stores
    }
}

impl CatalogEntity for Store {
    fn unique_key(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn new_unique_key(new: &NewStore) -> Option<&str> {
        Some(&new.name)
    }

    fn patch_unique_key(patch: &StorePatch) -> Option<&str> {
        patch.name.as_deref()
    }
}
