//! Kokoro ONNX engine.
//!
//! Uses [`ort`] (ONNX Runtime Rust bindings) for inference.
//! The three model inputs are:
//!
//! | Name        | Shape           | dtype   |
//! |-------------|-----------------|---------|
//! | `input_ids` | `[1, tokens+2]` | int64   |
//! | `style`     | `[1, style_d]`  | float32 |
//! | `speed`     | `[1]`           | float32 |
//!
//! The style vector is the row of the voice's style table indexed by the
//! unpadded token count, so utterances longer than the table cannot be
//! conditioned and are reported as [`EngineError::InputTooLong`].

use std::{collections::HashMap, path::Path, sync::Mutex};

use anyhow::{anyhow, ensure, Context, Result};
use ort::{session::Session, value::Tensor};
use tracing::{debug, info};

use crate::{
    engine::{EngineError, SpeechEngine, Synthesized},
    npz::{load_voice_pack, StyleTable},
    phonemize::phonemize,
    tokenize::{pad, Vocab},
    voice::ResolvedVoice,
};

/// Audio sample rate produced by the model.
pub const SAMPLE_RATE: u32 = 24_000;

/// espeak-ng voices the model was trained with.
pub const SUPPORTED_LANGUAGES: &[&str] =
    &["cmn", "en-gb", "en-us", "es", "fr-fr", "hi", "it", "ja", "pt-br"];

pub struct KokoroEngine {
    session: Mutex<Session>,
    voices: HashMap<String, StyleTable>,
    style_dim: usize,
    vocab: Vocab,
}

impl KokoroEngine {
    /// Load the ONNX model and the NPZ voice pack.
    pub fn load(model_path: &Path, voices_path: &Path, vocab: Vocab) -> Result<Self> {
        let session = Session::builder()
            .context("Failed to create ORT session builder")?
            .commit_from_file(model_path)
            .with_context(|| format!("Cannot load ONNX model: {}", model_path.display()))?;

        let voices = load_voice_pack(voices_path)
            .with_context(|| format!("Cannot load voices: {}", voices_path.display()))?;
        ensure!(!voices.is_empty(), "voice pack {} is empty", voices_path.display());

        let style_dim = voices.values().next().map(|t| t.dim).unwrap_or_default();
        if let Some((name, table)) = voices.iter().find(|(_, t)| t.dim != style_dim) {
            anyhow::bail!("voice '{name}' has style dim {}, expected {style_dim}", table.dim);
        }

        info!(voices = voices.len(), style_dim, vocab = vocab.len(), "loaded Kokoro model");
        Ok(Self { session: Mutex::new(session), voices, style_dim, vocab })
    }

    fn style_for<'a>(&'a self, voice: &'a ResolvedVoice, tokens: usize) -> Result<&'a [f32], EngineError> {
        let (row, rows) = match voice {
            ResolvedVoice::Named(id) => {
                let table = self
                    .voices
                    .get(id)
                    .ok_or_else(|| EngineError::Failed(format!("unknown voice '{id}'")))?;
                (table.row(tokens), table.rows)
            }
            ResolvedVoice::Blend(data) => {
                let dim = self.style_dim;
                let rows = data.len() / dim;
                let row = (tokens < rows).then(|| &data[tokens * dim..(tokens + 1) * dim]);
                (row, rows)
            }
        };
        row.ok_or(EngineError::InputTooLong { tokens, limit: rows })
    }

    fn infer(&self, tokens: &[i64], style: &[f32], speed: f32) -> Result<Vec<f32>> {
        let ids = pad(tokens);
        let t_input_ids = Tensor::<i64>::from_array(([1usize, ids.len()], ids))
            .context("Failed to build input_ids tensor")?;
        let t_style = Tensor::<f32>::from_array(([1usize, style.len()], style.to_vec()))
            .context("Failed to build style tensor")?;
        let t_speed = Tensor::<f32>::from_array(([1usize], vec![speed]))
            .context("Failed to build speed tensor")?;

        let mut session = self.session.lock().map_err(|_| anyhow!("ORT session mutex poisoned"))?;
        let outputs = session
            .run(ort::inputs![t_input_ids, t_style, t_speed])
            .context("ONNX inference failed")?;
        let (_shape, audio) = outputs[0]
            .try_extract_tensor::<f32>()
            .context("Failed to extract audio tensor")?;
        Ok(audio.to_vec())
    }
}

impl SpeechEngine for KokoroEngine {
    fn create(
        &self,
        text: &str,
        voice: &ResolvedVoice,
        speed: f32,
        lang: &str,
    ) -> Result<Synthesized, EngineError> {
        let phonemes = phonemize(text, lang)?;
        let tokens = self.vocab.encode(&phonemes);
        let style = self.style_for(voice, tokens.len())?;

        debug!(chars = text.len(), tokens = tokens.len(), "running inference");
        let samples = self.infer(&tokens, style, speed)?;
        Ok(Synthesized { samples, sample_rate: SAMPLE_RATE })
    }

    fn voices(&self) -> Vec<String> {
        let mut voices: Vec<String> = self.voices.keys().cloned().collect();
        voices.sort();
        voices
    }

    fn languages(&self) -> Vec<String> {
        SUPPORTED_LANGUAGES.iter().map(|l| l.to_string()).collect()
    }

    fn voice_style(&self, voice: &str) -> Option<Vec<f32>> {
        self.voices.get(voice).map(|t| t.data.clone())
    }
}
