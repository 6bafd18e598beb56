use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use utoipa::ToSchema;

use super::{ClientId, ConsumptionId, ProductId, StoreId, ToolId};
use crate::store::{Collection, Entity, EntityStore};

/// One usage event. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Consumption {
    pub id: ConsumptionId,
    pub date: DateTime<Utc>,
    pub client_id: ClientId,
    pub product_id: ProductId,
    pub tool_id: ToolId,
    pub store_id: StoreId,
    #[schema(value_type = String, example = "15")]
    pub quantity: Decimal,
}

/// A consumption whose date has already been resolved. Only the recorder
/// builds these.
#[derive(Debug, Clone)]
pub struct NewConsumption {
    pub date: DateTime<Utc>,
    pub client_id: ClientId,
    pub product_id: ProductId,
    pub tool_id: ToolId,
    pub store_id: StoreId,
    pub quantity: Decimal,
}

impl Entity for Consumption {
    type Id = ConsumptionId;
    type New = NewConsumption;
    type Patch = Infallible;

    const LABEL: &'static str = "Consumption";

    fn id(&self) -> ConsumptionId {
        self.id
    }

    fn from_new(id: ConsumptionId, new: NewConsumption) -> Self {
        Self {
            id,
            date: new.date,
            client_id: new.client_id,
            product_id: new.product_id,
            tool_id: new.tool_id,
            store_id: new.store_id,
            quantity: new.quantity,
        }
    }

    fn apply_patch(&mut self, patch: Infallible) {
        match patch {}
    }

    fn collection(store: &EntityStore) -> &Collection<Self> {
        &store.consumptions
    }

    fn collection_mut(store: &mut EntityStore) -> &mut Collection<Self> {
        &mut store.consumptions
    }
}
