// Provider implementations for external food databases
pub mod openfoodfacts;

pub use openfoodfacts::OpenFoodFactsProvider;
