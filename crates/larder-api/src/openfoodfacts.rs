use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::retry::{is_retryable_status, with_retry, RetryConfig};

const OFF_API_BASE: &str = "https://world.openfoodfacts.org";

#[derive(Error, Debug)]
pub enum OpenFoodFactsError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Product not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    ParseError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, OpenFoodFactsError>;

/// Client for the Open Food Facts database
///
/// No authentication needed - the whole database is public. Be a good
/// citizen anyway: identify yourself in the User-Agent and back off on
/// transient failures.
pub struct OpenFoodFactsClient {
    client: reqwest::Client,
    base_url: String,
    retry_config: RetryConfig,
}

impl OpenFoodFactsClient {
    pub fn new() -> Self {
        Self::with_base_url(OFF_API_BASE.to_string())
    }

    /// For self-hosted mirrors or testing with a custom API URL
    pub fn with_base_url(base_url: String) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("larder/0.1.0"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url,
            retry_config: RetryConfig::default(),
        }
    }

    /// Create client with custom retry configuration
    pub fn with_retry_config(retry_config: RetryConfig) -> Self {
        let mut client = Self::new();
        client.retry_config = retry_config;
        client
    }

    /// Look up a single product by barcode.
    ///
    /// The v0 endpoint answers 200 even for unknown codes and signals the
    /// miss with `status: 0` in the body, so both paths are checked.
    pub async fn product_by_barcode(&self, barcode: &str) -> Result<OffProduct> {
        let encoded = urlencoding::encode(barcode);
        let url = format!("{}/api/v0/product/{}.json", self.base_url, encoded);

        with_retry(&self.retry_config, || async {
            let response = self.client.get(&url).send().await?;

            if response.status() == 404 {
                return Err(OpenFoodFactsError::NotFound(barcode.to_string()));
            }

            if response.status() == 429 {
                return Err(OpenFoodFactsError::RateLimitExceeded);
            }

            let status = response.status();

            if status.is_client_error() && !is_retryable_status(status) {
                return Err(OpenFoodFactsError::RequestFailed(format!(
                    "Failed to fetch product: {}",
                    status
                )));
            }

            if !status.is_success() {
                return Err(OpenFoodFactsError::RequestFailed(format!(
                    "Failed to fetch product: {}",
                    status
                )));
            }

            let body: ProductResponse = response.json().await?;

            match (body.status, body.product) {
                (1, Some(mut product)) => {
                    // Some entries omit the code inside the product blob;
                    // the barcode we asked for is authoritative anyway.
                    if product.code.as_deref().map_or(true, |c| c.is_empty()) {
                        product.code = Some(barcode.to_string());
                    }
                    Ok(product)
                }
                _ => Err(OpenFoodFactsError::NotFound(barcode.to_string())),
            }
        })
        .await
    }

    /// Free-text product search by name.
    pub async fn search_by_name(&self, terms: &str, page_size: u32) -> Result<Vec<OffProduct>> {
        let url = format!("{}/cgi/search.pl", self.base_url);

        with_retry(&self.retry_config, || async {
            let response = self
                .client
                .get(&url)
                .query(&[
                    ("search_terms", terms),
                    ("search_simple", "1"),
                    ("action", "process"),
                    ("json", "1"),
                    ("page_size", &page_size.to_string()),
                ])
                .send()
                .await?;

            if response.status() == 429 {
                return Err(OpenFoodFactsError::RateLimitExceeded);
            }

            let status = response.status();

            if status.is_client_error() && !is_retryable_status(status) {
                let body = response.text().await.unwrap_or_default();
                return Err(OpenFoodFactsError::RequestFailed(format!(
                    "Status {}: {}",
                    status, body
                )));
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(OpenFoodFactsError::RequestFailed(format!(
                    "Status {}: {}",
                    status, body
                )));
            }

            let body: SearchResponse = response.json().await?;
            Ok(body.products)
        })
        .await
    }
}

impl Default for OpenFoodFactsClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Barcode lookup response envelope
#[derive(Debug, Deserialize)]
struct ProductResponse {
    #[serde(default)]
    status: i32,
    #[serde(default)]
    product: Option<OffProduct>,
}

/// Name search response envelope
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    products: Vec<OffProduct>,
}

/// Product representation as Open Food Facts reports it
///
/// Entries are crowd-sourced, so every display field can be absent, empty,
/// or junk. Only the fields larder consumes are modeled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OffProduct {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub brands: Option<String>,
    #[serde(default)]
    pub image_small_url: Option<String>,
    #[serde(default)]
    pub nutriscore_grade: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = OpenFoodFactsClient::new();
        assert_eq!(client.base_url, OFF_API_BASE);
    }

    #[test]
    fn test_client_with_custom_base_url() {
        let client = OpenFoodFactsClient::with_base_url("http://localhost:8080".to_string());
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_product_response_hit_parses() {
        let json = r#"{
            "code": "737628064502",
            "status": 1,
            "status_verbose": "product found",
            "product": {
                "code": "737628064502",
                "product_name": "Rice Noodles",
                "brands": "Thai Kitchen",
                "image_small_url": "https://images.openfoodfacts.org/foo.jpg",
                "nutriscore_grade": "b",
                "nutriments": {"energy": 1100}
            }
        }"#;

        let response: ProductResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.status, 1);
        let product = response.product.unwrap();
        assert_eq!(product.product_name.as_deref(), Some("Rice Noodles"));
        assert_eq!(product.nutriscore_grade.as_deref(), Some("b"));
    }

    #[test]
    fn test_product_response_miss_parses() {
        let json = r#"{"code": "000", "status": 0, "status_verbose": "product not found"}"#;

        let response: ProductResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.status, 0);
        assert!(response.product.is_none());
    }

    #[test]
    fn test_search_response_tolerates_sparse_products() {
        let json = r#"{
            "count": 2,
            "page": 1,
            "products": [
                {"code": "100", "product_name": "Tomato Soup"},
                {"code": "200"}
            ]
        }"#;

        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.products.len(), 2);
        assert!(response.products[1].product_name.is_none());
    }
}
