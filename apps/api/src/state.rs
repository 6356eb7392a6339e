use std::sync::Arc;

use crate::classify::classifier::BatchClassifier;
use crate::classify::store::InstructionStore;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub classifier: BatchClassifier,
    /// Single live copy of the editable criteria for this process.
    pub store: Arc<InstructionStore>,
    pub config: Config,
}
