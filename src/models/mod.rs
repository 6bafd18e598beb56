//! Domain records held by the entity store.
//!
//! Records never point at each other directly: every relation is an id newtype
//! that is resolved through [`crate::store::EntityStore`] at read time.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumString};
use utoipa::ToSchema;
use validator::ValidationError;

pub mod activity;
pub mod alert;
pub mod caliber;
pub mod client;
pub mod consumption;
pub mod product;
pub mod store;
pub mod tool;
pub mod user;

pub use activity::{Activity, ActivityKind, NewActivity};
pub use alert::{Alert, AlertKind, NewAlert};
pub use caliber::{Caliber, CaliberPatch, NewCaliber};
pub use client::{Client, ClientPatch, NewClient};
pub use consumption::{Consumption, NewConsumption};
pub use product::{NewProduct, Product, ProductPatch};
pub use store::{NewStore, Store, StorePatch};
pub use tool::{NewTool, Tool, ToolPatch};
pub use user::{HashedUser, NewUser, User};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for u64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Identifier of a [`Store`].
    StoreId
);
entity_id!(
    /// Identifier of a [`Caliber`].
    CaliberId
);
entity_id!(
    /// Identifier of a [`Tool`].
    ToolId
);
entity_id!(
    /// Identifier of a [`Product`].
    ProductId
);
entity_id!(
    /// Identifier of a [`Client`].
    ClientId
);
entity_id!(ConsumptionId);
entity_id!(AlertId);
entity_id!(ActivityId);
entity_id!(UserId);

/// Kinds of records an alert or an activity can point at.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EntityKind {
    Store,
    Caliber,
    Tool,
    Product,
    Client,
    Consumption,
    User,
}

/// Typed reference to another record.
///
/// Serialised as the `entityType` / `entityId` pair the dashboard consumes, but a
/// reference can only be built from an id of the matching kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(tag = "entityType", content = "entityId", rename_all = "lowercase")]
pub enum EntityRef {
    Store(StoreId),
    Caliber(CaliberId),
    Tool(ToolId),
    Product(ProductId),
    Client(ClientId),
    Consumption(ConsumptionId),
    User(UserId),
}

impl EntityRef {
    /// Builds a reference from an untyped pair, as submitted by API callers.
    pub fn new(kind: EntityKind, id: u64) -> Self {
        match kind {
            EntityKind::Store => Self::Store(StoreId(id)),
            EntityKind::Caliber => Self::Caliber(CaliberId(id)),
            EntityKind::Tool => Self::Tool(ToolId(id)),
            EntityKind::Product => Self::Product(ProductId(id)),
            EntityKind::Client => Self::Client(ClientId(id)),
            EntityKind::Consumption => Self::Consumption(ConsumptionId(id)),
            EntityKind::User => Self::User(UserId(id)),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Store(_) => EntityKind::Store,
            Self::Caliber(_) => EntityKind::Caliber,
            Self::Tool(_) => EntityKind::Tool,
            Self::Product(_) => EntityKind::Product,
            Self::Client(_) => EntityKind::Client,
            Self::Consumption(_) => EntityKind::Consumption,
            Self::User(_) => EntityKind::User,
        }
    }

    pub fn raw_id(&self) -> u64 {
        match *self {
            Self::Store(id) => id.get(),
            Self::Caliber(id) => id.get(),
            Self::Tool(id) => id.get(),
            Self::Product(id) => id.get(),
            Self::Client(id) => id.get(),
            Self::Consumption(id) => id.get(),
            Self::User(id) => id.get(),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind(), self.raw_id())
    }
}

/// Rejects negative quantities such as stock levels and daily caps.
pub fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("negative"));
    }
    Ok(())
}
