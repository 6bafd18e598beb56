use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use strum::{Display, EnumString};
use utoipa::ToSchema;

use super::{ActivityId, EntityRef};
use crate::store::{Collection, Entity, EntityStore};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ActivityKind {
    Order,
    Consumption,
    Alert,
    Other,
}

/// Append-only audit log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: ActivityId,
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub message: String,
    #[serde(flatten, default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<EntityRef>,
}

#[derive(Debug, Clone)]
pub struct NewActivity {
    pub date: DateTime<Utc>,
    pub kind: ActivityKind,
    pub message: String,
    pub entity: Option<EntityRef>,
}

impl Entity for Activity {
    type Id = ActivityId;
    type New = NewActivity;
    type Patch = Infallible;

    const LABEL: &'static str = "Activity";

    fn id(&self) -> ActivityId {
        self.id
    }

    fn from_new(id: ActivityId, new: NewActivity) -> Self {
        Self {
            id,
            date: new.date,
            kind: new.kind,
            message: new.message,
            entity: new.entity,
        }
    }

    fn apply_patch(&mut self, patch: Infallible) {
        match patch {}
    }

    fn collection(store: &EntityStore) -> &Collection<Self> {
        &store.activities
    }

    fn collection_mut(store: &mut EntityStore) -> &mut Collection<Self> {
        &mut store.activities
    }
}
