use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::CaliberId;
use crate::services::catalog::CatalogEntity;
use crate::store::{Collection, Entity, EntityStore};

/// Size classification shared by products ("Calibre A", "Calibre B", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Caliber {
    pub id: CaliberId,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewCaliber {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CaliberPatch {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

impl Entity for Caliber {
    type Id = CaliberId;
    type New = NewCaliber;
    type Patch = CaliberPatch;

    const LABEL: &'static str = "Caliber";

    fn id(&self) -> CaliberId {
        self.id
    }

    fn from_new(id: CaliberId, new: NewCaliber) -> Self {
        Self {
            id,
            name: new.name,
            description: new.description,
        }
    }

    fn apply_patch(&mut self, patch: CaliberPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if patch.description.is_some() {
            self.description = patch.description;
        }
    }

    fn collection(store: &EntityStore) -> &Collection<Self> {
        &store.calibers
    }

    fn collection_mut(store: &mut EntityStore) -> &mut Collection<Self> {
        &mut store.calibers
    }
}

impl CatalogEntity for Caliber {
    fn unique_key(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn new_unique_key(new: &NewCaliber) -> Option<&str> {
        Some(&new.name)
    }

    fn patch_unique_key(patch: &CaliberPatch) -> Option<&str> {
        patch.name.as_deref()
    }
}
