use thiserror::Error;

/// Structural mismatch between model output and the menu shape.
///
/// Only the first violation found is reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("restaurant_name is missing or empty")]
    MissingRestaurantName,

    #[error("menu is not an array")]
    MenuNotArray,

    #[error("category {category} has no name")]
    CategoryMissingName { category: usize },

    #[error("items of category {category} is not an array")]
    ItemsNotArray { category: usize },

    #[error("item {item} of category {category} has no id")]
    ItemMissingId { category: usize, item: usize },

    #[error("item {item} of category {category} has no name")]
    ItemMissingName { category: usize, item: usize },

    #[error("price of item {item} in category {category} is not a number")]
    PriceNotNumber { category: usize, item: usize },
}

/// Failure of a single extraction attempt. Every variant is retryable.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("vision request failed: {0}")]
    Transport(#[source] anyhow::Error),

    #[error("no JSON object found in model output")]
    NoJsonFound,

    #[error("model output is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("extracted menu failed validation: {0}")]
    Validation(#[from] ValidationError),
}

/// Terminal failure: every attempt failed. Carries the last cause.
#[derive(Debug, Error)]
#[error("menu extraction failed after {attempts} attempts: {last}")]
pub struct ExtractionExhausted {
    pub attempts: u32,
    #[source]
    pub last: ExtractionError,
}
