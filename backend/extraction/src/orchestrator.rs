use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, info, instrument};

use menuscan_core::{
    ExtractedMenu, ExtractionError, ExtractionExhausted, MenuImage, VisionClient, VisionRequest,
};
use menuscan_logging::redact_sensitive_data;

use crate::json_extract::find_json_object;
use crate::prompt::MENU_EXTRACTION_PROMPT;
use crate::retry::{with_retries, RetryPolicy};
use crate::validator::validate;

/// Turns a batch of menu photographs into a validated menu, retrying whole
/// attempts when the model output is unusable.
pub struct MenuExtractor {
    client: Arc<dyn VisionClient>,
    instructions: String,
    policy: RetryPolicy,
}

impl MenuExtractor {
    pub fn new(client: Arc<dyn VisionClient>) -> Self {
        Self {
            client,
            instructions: MENU_EXTRACTION_PROMPT.to_string(),
            policy: RetryPolicy::default(),
        }
    }

    /// Run up to three independent extraction attempts.
    ///
    /// Dropping the returned future abandons the in-flight request.
    #[instrument(skip_all, fields(provider = %self.client.name(), images = images.len()))]
    pub async fn extract_menu(
        &self,
        images: Vec<MenuImage>,
    ) -> Result<ExtractedMenu, ExtractionExhausted> {
        let request = VisionRequest {
            instructions: self.instructions.clone(),
            images,
        };
        let start = Instant::now();

        let result = with_retries(self.policy, |attempt| self.attempt(&request, attempt)).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(menu) => {
                info!(
                    restaurant = %menu.restaurant_name,
                    categories = menu.menu.len(),
                    items = menu.item_count(),
                    elapsed_ms,
                    "Menu extracted"
                );
                Ok(menu)
            }
            Err(exhausted) => Err(ExtractionExhausted {
                attempts: exhausted.attempts,
                last: exhausted.last,
            }),
        }
    }

    async fn attempt(
        &self,
        request: &VisionRequest,
        attempt: u32,
    ) -> Result<ExtractedMenu, ExtractionError> {
        let response = self
            .client
            .complete(request)
            .await
            .map_err(ExtractionError::Transport)?;
        info!(
            attempt,
            model = %response.model,
            latency_ms = response.latency_ms,
            chars = response.text.len(),
            "Vision response received"
        );

        let parsed = parse_model_output(&response.text);
        match &parsed {
            Ok(menu) => {
                for (index, category) in menu.menu.iter().enumerate() {
                    debug!(
                        index,
                        category = %category.category,
                        items = category.items.len(),
                        "Extracted category"
                    );
                }
            }
            Err(error) => {
                debug!(
                    attempt,
                    error = %error,
                    output = %redact_sensitive_data(&response.text),
                    "Rejected model output"
                );
            }
        }
        parsed
    }
}

/// Pull the JSON object out of raw model text, parse it and validate it.
pub fn parse_model_output(text: &str) -> Result<ExtractedMenu, ExtractionError> {
    let json = find_json_object(text).ok_or(ExtractionError::NoJsonFound)?;
    let value: Value = serde_json::from_str(json)?;
    Ok(validate(&value)?)
}
