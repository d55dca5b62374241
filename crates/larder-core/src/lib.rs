// Core business logic lives here - the brain of the operation
pub mod config;
pub mod error;
pub mod expiry;
pub mod export;
pub mod inventory;
pub mod lookup;
pub mod models;
pub mod providers;
pub mod store;

pub use config::Config;
pub use error::Error;
pub use expiry::{days_left, expiring_within_window, ExpiringItem, Urgency, EXPIRY_WINDOW_DAYS};
pub use export::{ExportFormat, Exporter};
pub use inventory::{InventoryService, SaveOutcome, SaveRequest};
pub use lookup::{LookupEngine, ProductLookup};
pub use models::{FoodItem, FoodProduct, ItemFilter, NewFoodItem, NutriScore, Unit};
pub use store::{InventoryStore, MemoryInventoryStore};

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
