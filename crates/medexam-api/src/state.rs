//! Shared application state.

use std::sync::Arc;

use medexam_core::generation::QuestionGenerator;
use medexam_store::Store;

/// State handed to every handler. Cheap to clone: the store shares a pool
/// and the generator is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub generator: Arc<dyn QuestionGenerator>,
}

impl AppState {
    pub fn new(store: Store, generator: Arc<dyn QuestionGenerator>) -> Self {
        Self { store, generator }
    }
}
