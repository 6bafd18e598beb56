//! CRUD over the reference data: stores, calibers, clients, tools, products.

use tracing::{info, instrument};
use validator::Validate;

use crate::errors::ServiceError;
use crate::models::{CaliberId, Client, Product, StoreId};
use crate::store::{Entity, SharedStore};

/// Catalog record that may carry a natural key which must stay unique within
/// its collection (store name, caliber name, tool code).
pub trait CatalogEntity: Entity {
    fn unique_key(&self) -> Option<&str> {
        None
    }

    fn new_unique_key(_new: &Self::New) -> Option<&str> {
        None
    }

    fn patch_unique_key(_patch: &Self::Patch) -> Option<&str> {
        None
    }
}

#[derive(Clone)]
pub struct CatalogService {
    store: SharedStore,
}

impl CatalogService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn list<T: CatalogEntity>(&self) -> Vec<T> {
        self.store.read().await.list::<T>()
    }

    pub async fn get<T: CatalogEntity>(&self, id: T::Id) -> Result<T, ServiceError> {
        self.store
            .read()
            .await
            .get::<T>(id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found(T::LABEL, id))
    }

    #[instrument(skip_all, fields(entity = T::LABEL))]
    pub async fn create<T>(&self, new: T::New) -> Result<T, ServiceError>
    where
        T: CatalogEntity,
        T::New: Validate,
    {
        new.validate()?;
        let mut store = self.store.write().await;
        if let Some(key) = T::new_unique_key(&new) {
            ensure_unique::<T>(
                store.list_where(|existing: &T| existing.unique_key() == Some(key)),
                key,
                None,
            )?;
        }
        let created = store.create::<T>(new);
        info!(id = %created.id(), "{} created", T::LABEL);
        Ok(created)
    }

    #[instrument(skip_all, fields(entity = T::LABEL, id = %id))]
    pub async fn update<T>(&self, id: T::Id, patch: T::Patch) -> Result<T, ServiceError>
    where
        T: CatalogEntity,
        T::Patch: Validate,
    {
        patch.validate()?;
        let mut store = self.store.write().await;
        if store.get::<T>(id).is_none() {
            return Err(ServiceError::not_found(T::LABEL, id));
        }
        if let Some(key) = T::patch_unique_key(&patch) {
            ensure_unique::<T>(
                store.list_where(|existing: &T| existing.unique_key() == Some(key)),
                key,
                Some(id),
            )?;
        }
        store
            .update::<T>(id, patch)
            .ok_or_else(|| ServiceError::not_found(T::LABEL, id))
    }

    /// Returns whether a record was removed.
    #[instrument(skip_all, fields(entity = T::LABEL, id = %id))]
    pub async fn delete<T: CatalogEntity>(&self, id: T::Id) -> bool {
        let removed = self.store.write().await.delete::<T>(id);
        if removed {
            info!("{} deleted", T::LABEL);
        }
        removed
    }

    pub async fn clients(&self, store_id: Option<StoreId>) -> Vec<Client> {
        let store = self.store.read().await;
        match store_id {
            Some(store_id) => store.clients_by_store(store_id),
            None => store.list::<Client>(),
        }
    }

    /// `store_id` wins over `caliber_id` when both are given.
    pub async fn products(
        &self,
        store_id: Option<StoreId>,
        caliber_id: Option<CaliberId>,
    ) -> Vec<Product> {
        let store = self.store.read().await;
        match (store_id, caliber_id) {
            (Some(store_id), _) => store.products_by_store(store_id),
            (None, Some(caliber_id)) => store.products_by_caliber(caliber_id),
            (None, None) => store.list::<Product>(),
        }
    }
}

fn ensure_unique<T: CatalogEntity>(
    clashes: Vec<T>,
    key: &str,
    updating: Option<T::Id>,
) -> Result<(), ServiceError> {
    if clashes.iter().any(|existing| Some(existing.id()) != updating) {
        return Err(ServiceError::Conflict(format!(
            "{} '{}' already exists",
            T::LABEL,
            key
        )));
    }
    Ok(())
}
