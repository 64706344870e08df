//! Caps how many menu extractions run at once.
//!
//! Callers wait for a permit instead of being turned away. The wait is
//! abandoned with the request future when the client disconnects.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use crate::response::ApiError;

#[derive(Clone)]
pub struct ExtractionLimiter {
    permits: Arc<Semaphore>,
    pub max_concurrent: usize,
}

impl Default for ExtractionLimiter {
    fn default() -> Self {
        Self::new(4)
    }
}

impl ExtractionLimiter {
    pub fn new(max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        }
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Wait for a free extraction slot. Hold the permit for the duration of
    /// the extraction.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, ApiError> {
        let start = Instant::now();
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| ApiError::internal("Extraction limiter closed", e))?;
        debug!(
            waited_ms = start.elapsed().as_millis() as u64,
            available = self.available(),
            "Extraction slot acquired"
        );
        Ok(permit)
    }
}
