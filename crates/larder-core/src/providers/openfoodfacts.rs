// Open Food Facts provider - bridges the API client with the ProductLookup trait
use async_trait::async_trait;
use larder_api::{OffProduct, OpenFoodFactsClient, OpenFoodFactsError};

use crate::{lookup::ProductLookup, models::FoodProduct, Error, Result};

const NAME_SEARCH_PAGE_SIZE: u32 = 30;

/// Wrapper around OpenFoodFactsClient that implements ProductLookup
pub struct OpenFoodFactsProvider {
    client: OpenFoodFactsClient,
}

impl OpenFoodFactsProvider {
    pub fn new() -> Self {
        Self {
            client: OpenFoodFactsClient::new(),
        }
    }

    /// For self-hosted mirrors or testing with a custom API URL
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            client: OpenFoodFactsClient::with_base_url(base_url),
        }
    }
}

impl Default for OpenFoodFactsProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProductLookup for OpenFoodFactsProvider {
    async fn by_barcode(&self, barcode: &str) -> Result<FoodProduct> {
        let product = self
            .client
            .product_by_barcode(barcode)
            .await
            .map_err(|e| match e {
                OpenFoodFactsError::NotFound(code) => {
                    Error::LookupFailure(format!("product {} not found", code))
                }
                other => Error::LookupFailure(other.to_string()),
            })?;

        Ok(off_to_product(product))
    }

    async fn by_name(&self, query: &str) -> Result<Vec<FoodProduct>> {
        let products = self
            .client
            .search_by_name(query, NAME_SEARCH_PAGE_SIZE)
            .await
            .map_err(|e| Error::LookupFailure(e.to_string()))?;

        Ok(products.into_iter().map(off_to_product).collect())
    }
}

/// Convert an Open Food Facts product to our internal model
fn off_to_product(off: OffProduct) -> FoodProduct {
    FoodProduct {
        code: off.code,
        product_name: off.product_name,
        brands: off.brands,
        image_small_url: off.image_small_url,
        nutriscore_grade: off.nutriscore_grade,
    }
}
