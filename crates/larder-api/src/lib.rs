// API client for the external food database
pub mod openfoodfacts;
pub mod retry;

// Re-export common types
pub use openfoodfacts::{OffProduct, OpenFoodFactsClient, OpenFoodFactsError};
pub use retry::RetryConfig;
