//! The menu extraction pipeline.
//!
//! Photographs go to a vision model, the JSON object in its answer is parsed
//! and checked against the menu shape, and the whole attempt is retried a
//! bounded number of times. Successful results are reconciled with caller
//! overrides before they are stored.

pub mod json_extract;
pub mod orchestrator;
pub mod prompt;
pub mod reconcile;
pub mod retry;
pub mod validator;

pub use json_extract::find_json_object;
pub use orchestrator::{parse_model_output, MenuExtractor};
pub use prompt::MENU_EXTRACTION_PROMPT;
pub use reconcile::{reconcile, Overrides};
pub use retry::{with_retries, RetryExhausted, RetryPolicy, MAX_EXTRACTION_ATTEMPTS};
pub use validator::{validate, validate_categories};
