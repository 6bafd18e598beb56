use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::{validate_non_negative, ToolId};
use crate::services::catalog::CatalogEntity;
use crate::store::{Collection, Entity, EntityStore};

/// A consuming tool with a ceiling on how much it may use per calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub id: ToolId,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    /// Daily ceiling, in the unit of the products it consumes.
    #[schema(value_type = String, example = "100")]
    pub max_daily_consumption: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewTool {
    #[validate(length(min = 1, max = 50))]
    pub code: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(custom = "validate_non_negative")]
    #[schema(value_type = String, example = "100")]
    pub max_daily_consumption: Decimal,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToolPatch {
    #[validate(length(min = 1, max = 50))]
    pub code: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(custom = "validate_non_negative")]
    #[schema(value_type = Option<String>)]
    pub max_daily_consumption: Option<Decimal>,
}

impl Entity for Tool {
    type Id = ToolId;
    type New = NewTool;
    type Patch = ToolPatch;

    const LABEL: &'static str = "Tool";

    fn id(&self) -> ToolId {
        self.id
    }

    fn from_new(id: ToolId, new: NewTool) -> Self {
        Self {
            id,
            code: new.code,
            name: new.name,
            description: new.description,
            max_daily_consumption: new.max_daily_consumption,
        }
    }

    fn apply_patch(&mut self, patch: ToolPatch) {
        if let Some(code) = patch.code {
            self.code = code;
        }
        if let Some(name) = patch.name {
            self.name = name;
        }
        if patch.description.is_some() {
            self.description = patch.description;
        }
        if let Some(max) = patch.max_daily_consumption {
            self.max_daily_consumption = max;
        }
    }

    fn collection(store: &EntityStore) -> &Collection<Self> {
        &store.tools
    }

    fn collection_mut(store: &mut EntityStore) -> &mut Collection<Self> {
        &mut store.tools
    }
}

impl CatalogEntity for Tool {
    fn unique_key(&self) -> Option<&str> {
        Some(&self.code)
    }

    fn new_unique_key(new: &NewTool) -> Option<&str> {
        Some(&new.code)
    }

    fn patch_unique_key(patch: &ToolPatch) -> Option<&str> {
        patch.code.as_deref()
    }
}
