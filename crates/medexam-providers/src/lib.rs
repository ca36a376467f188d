//! medexam-providers — AI generation backend integrations.
//!
//! Implements the `QuestionGenerator` trait for the Gemini API, plus a mock
//! backend for exercising the generation pipeline without network calls.

pub mod config;
pub mod gemini;
pub mod mock;

pub use config::{create_provider, load_config, load_config_from, ProviderConfig, ProvidersConfig};
pub use gemini::GeminiProvider;
pub use mock::MockGenerator;
