// Save reconciliation: raw lookup result + user choices -> persisted record
use chrono::NaiveDate;
use tracing::{debug, info};

use crate::{
    expiry::{expiring_within_window, ExpiringItem},
    models::{
        FoodItem, FoodProduct, ItemFilter, NewFoodItem, Unit, DEFAULT_BRAND, DEFAULT_PRODUCT_NAME,
    },
    store::InventoryStore,
    Error, Result,
};

/// What the user chose for a product they are saving.
///
/// The product half comes straight from a lookup and may be missing almost
/// everything; the reconciler fills defaults and enforces preconditions.
#[derive(Debug, Clone, Default)]
pub struct SaveRequest {
    pub product: FoodProduct,
    pub quantity: Option<u32>,
    pub unit: Option<Unit>,
    pub expiration_date: Option<NaiveDate>,
}

/// Outcome of a save, shaped for display.
///
/// A duplicate is not a failure from the user's point of view - the item is
/// in their inventory either way - so it comes back as a structured outcome
/// instead of an error.
#[derive(Debug, Clone)]
pub enum SaveOutcome {
    Saved(FoodItem),
    AlreadySaved,
}

/// Coordinates validation, normalization, and the store round-trip for a
/// user's inventory.
pub struct InventoryService<S> {
    store: S,
}

impl<S: InventoryStore> InventoryService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Validate and persist one product for one owner.
    ///
    /// Preconditions checked here, before the store is touched:
    /// - an expiration date is present (`MissingDate` otherwise);
    /// - the product has a usable code;
    /// - the quantity, if given, is at least 1 (absent means 1).
    ///
    /// Uniqueness is NOT checked here. The store's atomic constraint decides
    /// concurrent saves; this layer only translates its verdict.
    pub fn save(&self, owner_id: &str, request: SaveRequest) -> Result<SaveOutcome> {
        let expiration_date = request.expiration_date.ok_or(Error::MissingDate)?;

        let code = match request.product.code.as_deref() {
            Some(code) if !code.trim().is_empty() => code.trim().to_string(),
            _ => {
                return Err(Error::Validation(
                    "product has no barcode or catalog code".into(),
                ))
            }
        };

        let quantity = match request.quantity {
            None => 1,
            Some(0) => {
                return Err(Error::Validation(
                    "quantity must be a positive integer".into(),
                ))
            }
            Some(q) => q,
        };

        let candidate = NewFoodItem {
            code,
            product_name: non_empty(request.product.product_name)
                .unwrap_or_else(|| DEFAULT_PRODUCT_NAME.to_string()),
            brands: non_empty(request.product.brands)
                .unwrap_or_else(|| DEFAULT_BRAND.to_string()),
            image_url: request.product.image_small_url.unwrap_or_default(),
            nutriscore_grade: request.product.nutriscore_grade,
            quantity,
            unit: request.unit.unwrap_or_default(),
            expiration_date,
        };

        debug!(owner = owner_id, code = %candidate.code, "saving food item");
        match self.store.create(owner_id, candidate) {
            Ok(item) => {
                info!(owner = owner_id, code = %item.code, id = %item.id, "food item saved");
                Ok(SaveOutcome::Saved(item))
            }
            Err(Error::DuplicateItem) => {
                debug!(owner = owner_id, "item was already saved");
                Ok(SaveOutcome::AlreadySaved)
            }
            Err(e) => Err(e),
        }
    }

    /// Saved items for an owner, optionally narrowed by code or name.
    /// Capped at the listing limit; the expiring view reads the full
    /// inventory through [`Self::expiring_soon`] instead.
    pub fn list(&self, owner_id: &str, filter: &ItemFilter) -> Result<Vec<FoodItem>> {
        self.store.find_by_owner(owner_id, filter)
    }

    /// Remove a saved item the owner no longer wants tracked.
    pub fn remove(&self, owner_id: &str, id: &str) -> Result<()> {
        self.store.delete_by_id(id, owner_id)
    }

    /// The expiring-soon view: everything in the 14-day window, most urgent
    /// first. Computed fresh from the owner's full inventory on every call.
    pub fn expiring_soon(&self, owner_id: &str, today: NaiveDate) -> Result<Vec<ExpiringItem>> {
        let items = self.store.list_by_owner(owner_id)?;
        Ok(expiring_within_window(items, today))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
