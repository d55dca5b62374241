use thiserror::Error;

/// All the ways things can go wrong in larder
///
/// We use thiserror here because it generates the boilerplate for us.
/// Life's too short to manually implement Display and Error traits.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Expiration date is missing or unparsable")]
    MissingDate,

    #[error("Invalid food item: {0}")]
    Validation(String),

    #[error("Food already saved")]
    DuplicateItem,

    #[error("Food item not found: {0}")]
    NotFound(String),

    #[error("Product lookup failed: {0}")]
    LookupFailure(String),

    #[error("Store operation failed: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
