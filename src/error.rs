//! Request-level error taxonomy.
//!
//! Validation failures map to 4xx responses, everything else to 5xx.  The
//! engine's "input too long" signal never shows up here: it is recovered
//! inside [`crate::synth::synthesize_chunk`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TtsError {
    #[error("Format must be 'wav' or 'mp3'")]
    UnsupportedFormat(String),

    #[error("Unsupported language: {lang}. Supported: {}", supported.join(", "))]
    UnsupportedLanguage { lang: String, supported: Vec<String> },

    #[error("Unsupported voice: {voice}. Supported: {}", supported.join(", "))]
    UnsupportedVoice { voice: String, supported: Vec<String> },

    #[error("Voice blending requires exactly two voices (got {0})")]
    InvalidBlendArity(usize),

    #[error("Invalid voice blend weight: {0}")]
    InvalidBlendWeight(String),

    #[error("Speed must be between {min} and {max} (got {speed})")]
    InvalidSpeed { speed: f32, min: f32, max: f32 },

    #[error("File must be {0}")]
    InvalidUpload(&'static str),

    #[error("Missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Error processing chunk: {0}")]
    Synthesis(String),

    #[error("No audio generated")]
    NoAudioGenerated,

    #[error("Failed to extract text: {0}")]
    Extraction(String),

    #[error("Failed to encode audio: {0}")]
    Encoding(String),
}

impl TtsError {
    /// `true` for errors caused by the request itself.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFormat(_)
                | Self::UnsupportedLanguage { .. }
                | Self::UnsupportedVoice { .. }
                | Self::InvalidBlendArity(_)
                | Self::InvalidBlendWeight(_)
                | Self::InvalidSpeed { .. }
                | Self::InvalidUpload(_)
                | Self::MissingField(_)
        )
    }
}

pub type Result<T, E = TtsError> = std::result::Result<T, E>;
