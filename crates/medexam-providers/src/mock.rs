//! Mock generator for testing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use medexam_core::error::ProviderError;
use medexam_core::generation::{GenerationConfig, QuestionGenerator};

/// A mock generation backend for exercising the pipeline without real API
/// calls. Returns a canned response (or failure) and records prompts.
pub struct MockGenerator {
    response: Result<String, String>,
    call_count: AtomicU32,
    last_prompt: Mutex<Option<String>>,
}

impl MockGenerator {
    /// A mock that always returns the same text.
    pub fn with_response(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
            call_count: AtomicU32::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    /// A mock whose every call fails with a network error.
    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            call_count: AtomicU32::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuestionGenerator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(
        &self,
        prompt: &str,
        _config: &GenerationConfig,
    ) -> Result<String, ProviderError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());

        match &self.response {
            Ok(text) => Ok(text.clone()),
            Err(message) => Err(ProviderError::Network(message.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn canned_response_and_prompt_recording() {
        let generator = MockGenerator::with_response("[]");
        let text = generator
            .generate("Generate exactly 2 questions.", &GenerationConfig::default())
            .await
            .unwrap();
        assert_eq!(text, "[]");
        assert_eq!(generator.call_count(), 1);
        assert!(generator
            .last_prompt()
            .unwrap()
            .contains("exactly 2 questions"));
    }

    #[tokio::test]
    async fn failing_mock_surfaces_network_error() {
        let generator = MockGenerator::failing("connection refused");
        let err = generator
            .generate("prompt", &GenerationConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)));
    }
}
