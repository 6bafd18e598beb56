//! In-memory entity store.
//!
//! One [`Collection`] per record type, each with its own id sequence. The
//! store is a plain value: callers own it (usually behind [`SharedStore`]) and
//! tests build isolated instances with `EntityStore::default()`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::clock::DayCalendar;
use crate::models::{
    Activity, Alert, AlertId, Caliber, CaliberId, Client, ClientId, Consumption, Product, ProductId, Store,
    StoreId, Tool, ToolId, User,
};

/// Handle shared by services and handlers. Every multi-step mutation holds the
/// write guard for its whole sequence.
pub type SharedStore = Arc<RwLock<EntityStore>>;

pub fn shared(store: EntityStore) -> SharedStore {
    Arc::new(RwLock::new(store))
}

/// A record type that lives in the [`EntityStore`].
pub trait Entity: Clone + Send + Sync + Sized + 'static {
    type Id: Copy + Ord + fmt::Display + From<u64> + Into<u64> + Send + Sync;
    /// Creation payload, without the id.
    type New;
    /// Partial update merged by [`EntityStore::update`].
    type Patch;

    const LABEL: &'static str;

    fn id(&self) -> Self::Id;
    fn from_new(id: Self::Id, new: Self::New) -> Self;
    fn apply_patch(&mut self, patch: Self::Patch);

    fn collection(store: &EntityStore) -> &Collection<Self>;
    fn collection_mut(store: &mut EntityStore) -> &mut Collection<Self>;
}

/// Records of one type keyed by id. Ids are handed out sequentially from 1 and
/// never reused, so iteration order is insertion order.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    records: BTreeMap<u64, T>,
    next_id: u64,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            records: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T: Entity> Collection<T> {
    fn insert(&mut self, new: T::New) -> T {
        let id = self.next_id;
        self.next_id += 1;
        let record = T::from_new(T::Id::from(id), new);
        self.records.insert(id, record.clone());
        record
    }

    pub fn get(&self, id: T::Id) -> Option<&T> {
        self.records.get(&id.into())
    }

    fn get_mut(&mut self, id: T::Id) -> Option<&mut T> {
        self.records.get_mut(&id.into())
    }

    fn remove(&mut self, id: T::Id) -> bool {
        self.records.remove(&id.into()).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    pub(crate) users: Collection<User>,
    pub(crate) calibers: Collection<Caliber>,
    pub(crate) stores: Collection<Store>,
    pub(crate) clients: Collection<Client>,
    pub(crate) tools: Collection<Tool>,
    pub(crate) products: Collection<Product>,
    pub(crate) consumptions: Collection<Consumption>,
    pub(crate) alerts: Collection<Alert>,
    pub(crate) activities: Collection<Activity>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns the next id of `T`'s collection and stores the record. Never
    /// fails; uniqueness is the caller's business.
    pub fn create<T: Entity>(&mut self, new: T::New) -> T {
        T::collection_mut(self).insert(new)
    }

    pub fn get<T: Entity>(&self, id: T::Id) -> Option<&T> {
        T::collection(self).get(id)
    }

    /// Merges `patch` into the stored record. `None` when the id is unknown.
    pub fn update<T: Entity>(&mut self, id: T::Id, patch: T::Patch) -> Option<T> {
        let record = T::collection_mut(self).get_mut(id)?;
        record.apply_patch(patch);
        Some(record.clone())
    }

    /// Returns whether a record existed.
    pub fn delete<T: Entity>(&mut self, id: T::Id) -> bool {
        T::collection_mut(self).remove(id)
    }

    pub fn list<T: Entity>(&self) -> Vec<T> {
        T::collection(self).iter().cloned().collect()
    }

    pub fn list_where<T, P>(&self, predicate: P) -> Vec<T>
    where
        T: Entity,
        P: Fn(&T) -> bool,
    {
        T::collection(self)
            .iter()
            .filter(|record| predicate(record))
            .cloned()
            .collect()
    }

    pub fn count<T: Entity>(&self) -> usize {
        T::collection(self).len()
    }

    /// Sets a product's stock to `stock - quantity`. Stock is allowed to go
    /// negative. Returns the new level, or `None` for an unknown product.
    pub(crate) fn decrement_stock(&mut self, id: ProductId, quantity: Decimal) -> Option<Decimal> {
        let product = self.products.get_mut(id)?;
        product.stock -= quantity;
        Some(product.stock)
    }

    pub(crate) fn resolve_alert(&mut self, id: AlertId) -> Option<(Alert, bool)> {
        let alert = self.alerts.get_mut(id)?;
        let changed = alert.resolve();
        Some((alert.clone(), changed))
    }

    /// Sum of quantities recorded against `tool` on `day` (in `calendar`'s offset).
    pub fn daily_consumption_by_tool(
        &self,
        tool: ToolId,
        day: NaiveDate,
        calendar: &DayCalendar,
    ) -> Decimal {
        self.consumptions
            .iter()
            .filter(|c| c.tool_id == tool && calendar.date_of(c.date) == day)
            .map(|c| c.quantity)
            .sum()
    }

    pub fn clients_by_store(&self, store: StoreId) -> Vec<Client> {
        self.list_where(|c: &Client| c.store_id == store)
    }

    pub fn products_by_store(&self, store: StoreId) -> Vec<Product> {
        self.list_where(|p: &Product| p.store_id == store)
    }

    pub fn products_by_caliber(&self, caliber: CaliberId) -> Vec<Product> {
        self.list_where(|p: &Product| p.caliber_id == caliber)
    }

    pub fn consumptions_by_client(&self, client: ClientId) -> Vec<Consumption> {
        self.list_where(|c: &Consumption| c.client_id == client)
    }

    pub fn consumptions_by_tool(&self, tool: ToolId) -> Vec<Consumption> {
        self.list_where(|c: &Consumption| c.tool_id == tool)
    }

    pub fn consumptions_by_store(&self, store: StoreId) -> Vec<Consumption> {
        self.list_where(|c: &Consumption| c.store_id == store)
    }

    pub fn consumptions_by_product(&self, product: ProductId) -> Vec<Consumption> {
        self.list_where(|c: &Consumption| c.product_id == product)
    }

    /// Consumptions dated within `[start, end]`, both ends inclusive.
    pub fn consumptions_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<Consumption> {
        self.list_where(|c: &Consumption| c.date >= start && c.date <= end)
    }

    pub fn user_by_username(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|u| u.username == username)
    }

    pub fn active_alerts(&self) -> Vec<Alert> {
        self.list_where(|a: &Alert| !a.resolved)
    }

    /// Activities newest first; equal timestamps fall back to the later id first.
    pub fn recent_activities(&self, limit: Option<usize>) -> Vec<Activity> {
        let mut activities = self.list::<Activity>();
        activities.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
        if let Some(limit) = limit {
            activities.truncate(limit);
        }
        activities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewCaliber, NewProduct, NewStore, NewTool, StorePatch};
    use chrono::{FixedOffset, TimeZone};
    use rust_decimal_macros::dec;

    fn new_store(name: &str) -> NewStore {
        NewStore {
            name: name.to_string(),
            location: None,
            manager: None,
        }
    }

    #[test]
    fn ids_are_sequential_per_collection() {
        let mut store = EntityStore::new();
        let first: Store = store.create(new_store("Magasin 1"));
        let second: Store = store.create(new_store("Magasin 2"));
        let caliber: Caliber = store.create(NewCaliber {
            name: "Calibre A".into(),
            description: None,
        });

        assert_eq!(first.id, StoreId(1));
        assert_eq!(second.id, StoreId(2));
        assert_eq!(caliber.id, CaliberId(1));
    }

    #[test]
    fn update_merges_and_reports_missing() {
        let mut store = EntityStore::new();
        let created: Store = store.create(NewStore {
            name: "Magasin 1".into(),
            location: Some("Paris".into()),
            manager: None,
        });

        let updated = store
            .update::<Store>(
                created.id,
                StorePatch {
                    manager: Some("Manager 1".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Magasin 1");
        assert_eq!(updated.location.as_deref(), Some("Paris"));
        assert_eq!(updated.manager.as_deref(), Some("Manager 1"));

        assert!(store
            .update::<Store>(StoreId(99), StorePatch::default())
            .is_none());
    }

    #[test]
    fn delete_reports_whether_record_existed() {
        let mut store = EntityStore::new();
        let created: Store = store.create(new_store("Magasin 1"));

        assert!(store.delete::<Store>(created.id));
        assert!(!store.delete::<Store>(created.id));
        assert!(store.get::<Store>(created.id).is_none());

        // deleted ids are not handed out again
        let next: Store = store.create(new_store("Magasin 2"));
        assert_eq!(next.id, StoreId(2));
    }

    #[test]
    fn repeated_lists_are_identical() {
        let mut store = EntityStore::new();
        for name in ["C", "A", "B"] {
            store.create::<Store>(new_store(name));
        }
        let first = store.list::<Store>();
        let second = store.list::<Store>();
        assert_eq!(first, second);
        let names: Vec<_> = first.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["C", "A", "B"]);
    }

    #[test]
    fn products_filter_by_store_and_caliber() {
        let mut store = EntityStore::new();
        let s1: Store = store.create(new_store("Magasin 1"));
        let s2: Store = store.create(new_store("Magasin 2"));
        let cal: Caliber = store.create(NewCaliber {
            name: "Calibre A".into(),
            description: None,
        });
        for (name, store_id) in [("A1", s1.id), ("A2", s2.id), ("A3", s1.id)] {
            store.create::<Product>(NewProduct {
                name: name.into(),
                caliber_id: cal.id,
                store_id,
                description: None,
                unit: "kg".into(),
                stock: dec!(10),
            });
        }

        let names: Vec<_> = store
            .products_by_store(s1.id)
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, ["A1", "A3"]);
        assert_eq!(store.products_by_caliber(cal.id).len(), 3);
        assert!(store.products_by_caliber(CaliberId(9)).is_empty());
    }

    #[test]
    fn daily_total_uses_calendar_date_of_the_offset() {
        let mut store = EntityStore::new();
        let tool: Tool = store.create(NewTool {
            code: "XYZ-123".into(),
            name: "Tool XYZ".into(),
            description: None,
            max_daily_consumption: dec!(100),
        });
        let at = |h: u32| Utc.with_ymd_and_hms(2024, 5, 1, h, 30, 0).unwrap();
        for (hour, qty) in [(1, dec!(10)), (12, dec!(20)), (23, dec!(5))] {
            store.create::<Consumption>(crate::models::NewConsumption {
                date: at(hour),
                client_id: ClientId(1),
                product_id: ProductId(1),
                tool_id: tool.id,
                store_id: StoreId(1),
                quantity: qty,
            });
        }

        let utc = DayCalendar::new(FixedOffset::east_opt(0).unwrap());
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(store.daily_consumption_by_tool(tool.id, day, &utc), dec!(35));

        // at UTC+2 the 23:30 record belongs to the next day
        let plus_two = DayCalendar::new(FixedOffset::east_opt(2 * 3600).unwrap());
        assert_eq!(store.daily_consumption_by_tool(tool.id, day, &plus_two), dec!(30));
        assert_eq!(
            store.daily_consumption_by_tool(tool.id, day.succ_opt().unwrap(), &plus_two),
            dec!(5)
        );
    }

    #[test]
    fn consumptions_between_is_inclusive() {
        let mut store = EntityStore::new();
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
        for date in [start, end, end + chrono::Duration::seconds(1)] {
            store.create::<Consumption>(crate::models::NewConsumption {
                date,
                client_id: ClientId(1),
                product_id: ProductId(1),
                tool_id: ToolId(1),
                store_id: StoreId(1),
                quantity: dec!(1),
            });
        }
        assert_eq!(store.consumptions_between(start, end).len(), 2);
    }
}
