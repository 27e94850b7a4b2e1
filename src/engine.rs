//! Synthesis engine boundary.
//!
//! The pipeline talks to the voice model only through [`SpeechEngine`].  The
//! one engine failure the pipeline recovers from, input longer than the
//! model's style table, is a typed variant of [`EngineError`]; engines that
//! can only report a message string go through [`EngineError::from_message`].

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::voice::ResolvedVoice;

/// Number of rows in a Kokoro voice style table, i.e. the longest token
/// sequence the model can be conditioned on.
pub const MAX_PHONEME_LENGTH: usize = 510;

/// Output of a single engine call.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesized {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

#[derive(Debug, Error)]
pub enum EngineError {
    /// The input does not fit the model; shorter input may succeed.
    #[error("input of {tokens} tokens exceeds the model limit of {limit}")]
    InputTooLong { tokens: usize, limit: usize },

    #[error("{0}")]
    Failed(String),
}

/// numpy's wording when the style lookup runs past the table.  Only an index
/// equal to [`MAX_PHONEME_LENGTH`] means the input was too long; other
/// out-of-bounds indices are genuine failures.
static RE_INDEX_OUT_OF_BOUNDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"index (\d+) is out of bounds").unwrap());

impl EngineError {
    /// Classify a raw engine error message.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let index = RE_INDEX_OUT_OF_BOUNDS
            .captures(&message)
            .and_then(|caps| caps[1].parse::<usize>().ok());
        match index {
            Some(index) if index == MAX_PHONEME_LENGTH => Self::InputTooLong {
                tokens: index,
                limit: MAX_PHONEME_LENGTH,
            },
            _ => Self::Failed(message),
        }
    }

    pub fn is_length_exceeded(&self) -> bool {
        matches!(self, Self::InputTooLong { .. })
    }
}

impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        Self::from_message(format!("{err:#}"))
    }
}

/// A loaded voice model.
///
/// Implementations are shared read-only across concurrent requests.
pub trait SpeechEngine: Send + Sync {
    /// Synthesize `text` in one call.
    fn create(
        &self,
        text: &str,
        voice: &ResolvedVoice,
        speed: f32,
        lang: &str,
    ) -> Result<Synthesized, EngineError>;

    /// Voice identifiers, sorted.
    fn voices(&self) -> Vec<String>;

    /// Language codes, sorted.
    fn languages(&self) -> Vec<String>;

    /// Flat style embedding for `voice`, `None` if unknown.
    fn voice_style(&self, voice: &str) -> Option<Vec<f32>>;
}
