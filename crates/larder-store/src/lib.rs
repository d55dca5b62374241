// SQLite persistence for saved inventory items
// Durable sibling of the in-memory store in larder-core

pub mod store;

pub use store::{SqliteInventoryStore, StoreError};
