use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use menuscan_core::{VisionClient, VisionRequest, VisionResponse};

/// A vision client that replays canned outputs, one per call.
///
/// `Ok` entries are returned as the model text, `Err` entries as transport
/// failures. Once the script runs out the last entry repeats.
pub struct ScriptedVisionClient {
    script: Mutex<VecDeque<Result<String, String>>>,
    last: Mutex<Option<Result<String, String>>>,
    calls: AtomicU32,
}

impl ScriptedVisionClient {
    pub fn new(script: Vec<Result<String, String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            calls: AtomicU32::new(0),
        }
    }

    /// Always answer with the same text.
    pub fn always(text: impl Into<String>) -> Self {
        Self::new(vec![Ok(text.into())])
    }

    /// Always fail with the same transport error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(vec![Err(message.into())])
    }

    /// Number of `complete` calls made so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_entry(&self) -> Result<String, String> {
        let mut script = self.script.lock().unwrap_or_else(|e| e.into_inner());
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        match script.pop_front() {
            Some(entry) => {
                *last = Some(entry.clone());
                entry
            }
            None => last
                .clone()
                .unwrap_or_else(|| Err("vision script is empty".to_string())),
        }
    }
}

#[async_trait]
impl VisionClient for ScriptedVisionClient {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _request: &VisionRequest) -> Result<VisionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.next_entry() {
            Ok(text) => Ok(VisionResponse {
                text,
                provider: "scripted".to_string(),
                model: "mock".to_string(),
                latency_ms: 0,
            }),
            Err(message) => Err(anyhow!(message)),
        }
    }
}
