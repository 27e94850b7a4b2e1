use std::sync::Arc;

use crate::{chunk::DEFAULT_CHUNK_SIZE, engine::SpeechEngine};

/// Largest accepted request body unless configured otherwise.
pub const DEFAULT_BODY_LIMIT: usize = 64 * 1024 * 1024;

/// Shared, read-only handler state.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<dyn SpeechEngine>,
    pub chunk_size: usize,
    pub body_limit: usize,
}

impl AppState {
    pub fn new(engine: Arc<dyn SpeechEngine>) -> Self {
        Self { engine, chunk_size: DEFAULT_CHUNK_SIZE, body_limit: DEFAULT_BODY_LIMIT }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_body_limit(mut self, body_limit: usize) -> Self {
        self.body_limit = body_limit;
        self
    }
}
