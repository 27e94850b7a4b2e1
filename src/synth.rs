//! Chunk synthesis with adaptive retry, sample aggregation, and the
//! text → audio pipeline that ties them to the chunker.
//!
//! Chunks are synthesized strictly one after another in text order.  When the
//! engine rejects a chunk as too long, the chunk is cut into word groups of
//! 60% of its length and each group is synthesized recursively.

use tracing::{debug, info, warn};

use crate::{
    audio::AudioFormat,
    chunk::{chunk_text, pack_words},
    engine::{EngineError, SpeechEngine},
    error::{Result, TtsError},
    language::validate_language,
    voice::{resolve_voice, ResolvedVoice},
};

/// Fraction of a rejected chunk's length used as the retry budget.
pub const SHRINK_FACTOR: f64 = 0.6;

/// Accepted playback speed range.
pub const MIN_SPEED: f32 = 0.5;
pub const MAX_SPEED: f32 = 2.0;

pub const DEFAULT_VOICE: &str = "af_sarah";
pub const DEFAULT_LANG: &str = "en-us";
pub const DEFAULT_SPEED: f32 = 1.0;
pub const DEFAULT_FORMAT: &str = "wav";

// ─────────────────────────────────────────────────────────────────────────────
// Request settings
// ─────────────────────────────────────────────────────────────────────────────

/// Raw, unvalidated synthesis options as they arrive with a request.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechOptions {
    pub voice: String,
    pub speed: f32,
    pub lang: String,
    pub format: String,
}

impl Default for SpeechOptions {
    fn default() -> Self {
        Self {
            voice: DEFAULT_VOICE.to_string(),
            speed: DEFAULT_SPEED,
            lang: DEFAULT_LANG.to_string(),
            format: DEFAULT_FORMAT.to_string(),
        }
    }
}

/// Options checked against the engine and ready to use.
#[derive(Debug, Clone)]
pub struct SpeechSettings {
    pub voice: ResolvedVoice,
    pub speed: f32,
    pub lang: String,
    pub format: AudioFormat,
}

impl SpeechOptions {
    /// Validate format, language, voice and speed, in that order.
    pub fn validate(&self, engine: &dyn SpeechEngine) -> Result<SpeechSettings> {
        let format = AudioFormat::parse(&self.format)?;
        let lang = validate_language(engine, &self.lang)?;
        let voice = resolve_voice(engine, &self.voice)?;
        if !(MIN_SPEED..=MAX_SPEED).contains(&self.speed) {
            return Err(TtsError::InvalidSpeed { speed: self.speed, min: MIN_SPEED, max: MAX_SPEED });
        }
        Ok(SpeechSettings { voice, speed: self.speed, lang, format })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Chunk synthesizer
// ─────────────────────────────────────────────────────────────────────────────

/// Audio for one chunk.  `sample_rate` is `None` only when a retry produced
/// no pieces at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkAudio {
    pub samples: Vec<f32>,
    pub sample_rate: Option<u32>,
}

/// Synthesize one chunk, re-splitting it whenever the engine reports that
/// the input is too long.
///
/// On a retry the pieces' samples are concatenated in order and the sample
/// rate of the *last* piece that reported one is kept.
pub fn synthesize_chunk(
    engine: &dyn SpeechEngine,
    chunk: &str,
    voice: &ResolvedVoice,
    speed: f32,
    lang: &str,
) -> Result<ChunkAudio> {
    let err = match engine.create(chunk, voice, speed, lang) {
        Ok(out) => {
            return Ok(ChunkAudio { samples: out.samples, sample_rate: Some(out.sample_rate) });
        }
        Err(EngineError::Failed(message)) => return Err(TtsError::Synthesis(message)),
        Err(err) => err,
    };

    let len = chunk.chars().count();
    let budget = (len as f64 * SHRINK_FACTOR) as usize;
    let pieces = pack_words(chunk, budget);
    if pieces.len() == 1 && pieces[0] == chunk {
        return Err(TtsError::Synthesis(format!("{err} and cannot be split further")));
    }
    warn!(chars = len, budget, pieces = pieces.len(), "{err}; re-splitting chunk");

    let mut audio = ChunkAudio::default();
    for piece in &pieces {
        let part = synthesize_chunk(engine, piece, voice, speed, lang)?;
        audio.samples.extend(part.samples);
        if part.sample_rate.is_some() {
            audio.sample_rate = part.sample_rate;
        }
    }
    Ok(audio)
}

// ─────────────────────────────────────────────────────────────────────────────
// Sample aggregator
// ─────────────────────────────────────────────────────────────────────────────

/// Final waveform of a request.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl RenderedAudio {
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Concatenates chunk audio in order.  The sample rate latches to the first
/// chunk that reports one; later differing rates are ignored.
#[derive(Debug, Default)]
pub struct SampleBuffer {
    samples: Vec<f32>,
    sample_rate: Option<u32>,
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, audio: ChunkAudio) {
        if self.sample_rate.is_none() {
            self.sample_rate = audio.sample_rate;
        }
        self.samples.extend(audio.samples);
    }

    pub fn sample_rate(&self) -> Option<u32> {
        self.sample_rate
    }

    pub fn finish(self) -> Result<RenderedAudio> {
        match self.sample_rate {
            Some(sample_rate) if !self.samples.is_empty() => {
                Ok(RenderedAudio { samples: self.samples, sample_rate })
            }
            _ => Err(TtsError::NoAudioGenerated),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pipeline
// ─────────────────────────────────────────────────────────────────────────────

/// Chunk `text`, synthesize every chunk in order, and join the results.
pub fn render(
    engine: &dyn SpeechEngine,
    text: &str,
    settings: &SpeechSettings,
    chunk_size: usize,
) -> Result<RenderedAudio> {
    let chunks = chunk_text(text, chunk_size);
    info!(chars = text.chars().count(), chunks = chunks.len(), "synthesizing");

    let mut buffer = SampleBuffer::new();
    for (i, chunk) in chunks.iter().enumerate() {
        debug!(index = i, chars = chunk.chars().count(), "chunk");
        buffer.push(synthesize_chunk(engine, chunk, &settings.voice, settings.speed, &settings.lang)?);
    }
    buffer.finish()
}
