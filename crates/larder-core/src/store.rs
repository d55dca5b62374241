use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;

use crate::{
    models::{FoodItem, ItemFilter, NewFoodItem},
    Error, Result,
};

/// Listing results are capped, matching the original search surface.
pub const LIST_LIMIT: usize = 50;

/// Persistence contract for saved food items - makes testing easier and
/// keeps the storage backend swappable.
///
/// The store is the sole arbiter of the per-owner uniqueness invariant:
/// `create` must check-and-insert atomically, so callers never do a racy
/// read-then-write of their own.
pub trait InventoryStore: Send + Sync {
    /// Insert a new item for an owner. Fails with [`Error::DuplicateItem`]
    /// when the owner already saved this product code. Returns the persisted
    /// record with its generated id and creation timestamp.
    fn create(&self, owner_id: &str, item: NewFoodItem) -> Result<FoodItem>;

    /// All items saved by an owner, in no particular order. Ordering is the
    /// expiring view's job.
    fn list_by_owner(&self, owner_id: &str) -> Result<Vec<FoodItem>>;

    /// Items saved by an owner, narrowed by the optional filters.
    fn find_by_owner(&self, owner_id: &str, filter: &ItemFilter) -> Result<Vec<FoodItem>>;

    /// Delete an item only if it belongs to the owner. A foreign or absent
    /// id fails with [`Error::NotFound`] - the two cases are deliberately
    /// indistinguishable so deletion never leaks what other users saved.
    fn delete_by_id(&self, id: &str, owner_id: &str) -> Result<()>;
}

/// In-memory store: a non-durable implementation of the same contract.
///
/// This is what the saved/expiring views run against in tests, and the
/// degenerate "local-only" backend. Same invariants as the SQLite store,
/// just without the durability.
pub struct MemoryInventoryStore {
    items: Mutex<HashMap<String, Vec<FoodItem>>>,
}

impl MemoryInventoryStore {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<FoodItem>>>> {
        self.items
            .lock()
            .map_err(|e| Error::Store(format!("lock poisoned: {e}")))
    }
}

impl Default for MemoryInventoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InventoryStore for MemoryInventoryStore {
    fn create(&self, owner_id: &str, item: NewFoodItem) -> Result<FoodItem> {
        let mut items = self.lock()?;
        let owned = items.entry(owner_id.to_string()).or_default();

        // Check-and-insert under the same lock: this is the store-side
        // uniqueness arbiter, not an application-layer pre-read.
        if owned.iter().any(|existing| existing.code == item.code) {
            return Err(Error::DuplicateItem);
        }

        let record = FoodItem {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            code: item.code,
            product_name: item.product_name,
            brands: item.brands,
            image_url: item.image_url,
            nutriscore_grade: item.nutriscore_grade,
            quantity: item.quantity,
            unit: item.unit,
            expiration_date: Some(item.expiration_date),
            created_at: Utc::now(),
        };

        owned.push(record.clone());
        Ok(record)
    }

    fn list_by_owner(&self, owner_id: &str) -> Result<Vec<FoodItem>> {
        let items = self.lock()?;
        Ok(items.get(owner_id).cloned().unwrap_or_default())
    }

    fn find_by_owner(&self, owner_id: &str, filter: &ItemFilter) -> Result<Vec<FoodItem>> {
        let items = self.lock()?;
        Ok(items
            .get(owner_id)
            .map(|owned| {
                owned
                    .iter()
                    .filter(|item| filter.matches(item))
                    .take(LIST_LIMIT)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn delete_by_id(&self, id: &str, owner_id: &str) -> Result<()> {
        let mut items = self.lock()?;
        let owned = items.get_mut(owner_id);

        match owned {
            Some(owned) => {
                let before = owned.len();
                owned.retain(|item| item.id != id);
                if owned.len() == before {
                    return Err(Error::NotFound(id.to_string()));
                }
                Ok(())
            }
            None => Err(Error::NotFound(id.to_string())),
        }
    }
}
