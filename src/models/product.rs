use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::{validate_non_negative, CaliberId, ProductId, StoreId};
use crate::services::catalog::CatalogEntity;
use crate::store::{Collection, Entity, EntityStore};

fn default_unit() -> String {
    "kg".to_string()
}

/// A stocked item of a given caliber, held by one store.
///
/// `stock` is decremented by every recorded consumption and is allowed to go
/// below zero; low-stock alerts fire on the way down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub caliber_id: CaliberId,
    pub store_id: StoreId,
    pub description: Option<String>,
    pub unit: String,
    #[schema(value_type = String, example = "250")]
    pub stock: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub caliber_id: CaliberId,
    pub store_id: StoreId,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[serde(default = "default_unit")]
    #[validate(length(min = 1, max = 20))]
    pub unit: String,
    #[serde(default)]
    #[validate(custom = "validate_non_negative")]
    #[schema(value_type = String, example = "250")]
    pub stock: Decimal,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub caliber_id: Option<CaliberId>,
    pub store_id: Option<StoreId>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub unit: Option<String>,
    #[schema(value_type = Option<String>)]
    pub stock: Option<Decimal>,
}

impl Entity for Product {
    type Id = ProductId;
    type New = NewProduct;
    type Patch = ProductPatch;

    const LABEL: &'static str = "Product";

    fn id(&self) -> ProductId {
        self.id
    }

    fn from_new(id: ProductId, new: NewProduct) -> Self {
        Self {
            id,
            name: new.name,
            caliber_id: new.caliber_id,
            store_id: new.store_id,
            description: new.description,
            unit: new.unit,
            stock: new.stock,
        }
    }

    fn apply_patch(&mut self, patch: ProductPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(caliber_id) = patch.caliber_id {
            self.caliber_id = caliber_id;
        }
        if let Some(store_id) = patch.store_id {
            self.store_id = store_id;
        }
        if patch.description.is_some() {
            self.description = patch.description;
        }
        if let Some(unit) = patch.unit {
            self.unit = unit;
        }
        if let Some(stock) = patch.stock {
            self.stock = stock;
        }
    }

    fn collection(store: &EntityStore) -> &Collection<Self> {
        &store.products
    }

    fn collection_mut(store: &mut EntityStore) -> &mut Collection<Self> {
        &mut store.products
    }
}

impl CatalogEntity for Product {}
