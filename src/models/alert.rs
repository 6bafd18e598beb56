use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use strum::{Display, EnumString};
use utoipa::ToSchema;

use super::{AlertId, EntityRef};
use crate::store::{Collection, Entity, EntityStore};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AlertKind {
    Critical,
    Warning,
    Info,
}

/// Actionable notification. Resolution is one-way: there is no way back to
/// unresolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: AlertId,
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub message: String,
    pub resolved: bool,
    #[serde(flatten)]
    pub entity: EntityRef,
}

impl Alert {
    /// Marks the alert resolved; returns whether it was still open.
    pub fn resolve(&mut self) -> bool {
        !std::mem::replace(&mut self.resolved, true)
    }
}

#[derive(Debug, Clone)]
pub struct NewAlert {
    pub date: DateTime<Utc>,
    pub kind: AlertKind,
    pub message: String,
    pub entity: EntityRef,
}

impl Entity for Alert {
    type Id = AlertId;
    type New = NewAlert;
    type Patch = Infallible;

    const LABEL: &'static str = "Alert";

    fn id(&self) -> AlertId {
        self.id
    }

    fn from_new(id: AlertId, new: NewAlert) -> Self {
        Self {
            id,
            date: new.date,
            kind: new.kind,
            message: new.message,
            resolved: false,
            entity: new.entity,
        }
    }

    fn apply_patch(&mut self, patch: Infallible) {
        match patch {}
    }

    fn collection(store: &EntityStore) -> &Collection<Self> {
        &store.alerts
    }

    fn collection_mut(store: &mut EntityStore) -> &mut Collection<Self> {
        &mut store.alerts
    }
}
