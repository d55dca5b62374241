use crate::{models::FoodProduct, Result};

/// Trait for product lookup providers - makes testing easier and keeps
/// things flexible.
///
/// Open Food Facts is the only implementation today, but the seam means a
/// different food database can slot in without breaking everything.
#[async_trait::async_trait]
pub trait ProductLookup: Send + Sync {
    /// Exact lookup by barcode. Failing to find the product is an error;
    /// there is nothing useful to save without a match.
    async fn by_barcode(&self, barcode: &str) -> Result<FoodProduct>;

    /// Free-text name search. May legitimately return nothing.
    async fn by_name(&self, query: &str) -> Result<Vec<FoodProduct>>;
}

/// Coordinates lookups across registered providers.
pub struct LookupEngine {
    providers: Vec<Box<dyn ProductLookup>>,
}

impl LookupEngine {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    pub fn add_provider(&mut self, provider: Box<dyn ProductLookup>) {
        self.providers.push(provider);
    }

    /// Barcode lookups go to the primary provider - barcodes are global, so
    /// asking a second database for the same code buys nothing.
    pub async fn by_barcode(&self, barcode: &str) -> Result<FoodProduct> {
        let provider = self.providers.first().ok_or_else(|| {
            crate::Error::Config("No lookup providers configured".into())
        })?;
        provider.by_barcode(barcode).await
    }

    /// Name searches fan out to every provider in parallel.
    pub async fn by_name(&self, query: &str) -> Result<Vec<FoodProduct>> {
        use futures::future::join_all;

        let searches: Vec<_> = self
            .providers
            .iter()
            .map(|provider| provider.by_name(query))
            .collect();

        let results = join_all(searches).await;

        // Flatten all results, ignoring errors for now
        // TODO: Better error handling - maybe collect errors separately?
        let mut products = Vec::new();
        for result in results {
            if let Ok(mut p) = result {
                products.append(&mut p);
            }
        }

        Ok(products)
    }
}

impl Default for LookupEngine {
    fn default() -> Self {
        Self::new()
    }
}
