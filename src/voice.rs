//! Voice resolution: a single voice id, or a two-voice weighted blend.
//!
//! Blend syntax is `id1:weight1,id2:weight2`; a missing weight is 50.  Weights
//! are rescaled to sum to 100 and the two style vectors are combined as
//! `v1 * w1/100 + v2 * w2/100`.

use crate::{
    engine::SpeechEngine,
    error::{Result, TtsError},
};

/// Default weight of a blend component without an explicit `:weight`.
pub const DEFAULT_BLEND_WEIGHT: f32 = 50.0;

/// The voice handed to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedVoice {
    /// A voice from the engine's catalog.
    Named(String),
    /// A precomputed style vector.
    Blend(Vec<f32>),
}

/// Parse a comma-separated blend expression into `(id, weight)` pairs.
///
/// Blank segments are ignored, so `"af_sarah,"` names a single voice and is
/// rejected like any other expression without exactly two voices.
pub fn parse_blend(expr: &str) -> Result<Vec<(String, f32)>> {
    let mut parts = Vec::new();
    for segment in expr.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let part = match segment.split_once(':') {
            Some((id, weight)) => {
                let weight = weight.trim();
                let parsed = weight
                    .parse::<f32>()
                    .map_err(|_| TtsError::InvalidBlendWeight(weight.to_string()))?;
                if !parsed.is_finite() || parsed < 0.0 {
                    return Err(TtsError::InvalidBlendWeight(weight.to_string()));
                }
                (id.trim().to_string(), parsed)
            }
            None => (segment.to_string(), DEFAULT_BLEND_WEIGHT),
        };
        parts.push(part);
    }
    if parts.len() != 2 {
        return Err(TtsError::InvalidBlendArity(parts.len()));
    }
    Ok(parts)
}

/// Rescale `weights` in place so they sum to 100.
pub fn normalize_weights(weights: &mut [f32]) -> Result<()> {
    let total: f32 = weights.iter().sum();
    if total <= 0.0 {
        return Err(TtsError::InvalidBlendWeight(format!("weights sum to {total}")));
    }
    if total != 100.0 {
        for w in weights.iter_mut() {
            *w *= 100.0 / total;
        }
    }
    Ok(())
}

fn ensure_supported(voice: &str, supported: &[String]) -> Result<()> {
    if supported.iter().any(|v| v == voice) {
        return Ok(());
    }
    let mut supported = supported.to_vec();
    supported.sort();
    Err(TtsError::UnsupportedVoice { voice: voice.to_string(), supported })
}

/// Resolve a voice expression against the engine's catalog.
pub fn resolve_voice(engine: &dyn SpeechEngine, expr: &str) -> Result<ResolvedVoice> {
    let supported = engine.voices();

    if !expr.contains(',') {
        ensure_supported(expr, &supported)?;
        return Ok(ResolvedVoice::Named(expr.to_string()));
    }

    let parts = parse_blend(expr)?;
    for (id, _) in &parts {
        ensure_supported(id, &supported)?;
    }
    let mut weights: Vec<f32> = parts.iter().map(|(_, w)| *w).collect();
    normalize_weights(&mut weights)?;

    let style = |id: &str| {
        engine
            .voice_style(id)
            .ok_or_else(|| TtsError::Synthesis(format!("no style data for voice '{id}'")))
    };
    let first = style(&parts[0].0)?;
    let second = style(&parts[1].0)?;
    if first.len() != second.len() {
        return Err(TtsError::Synthesis(format!(
            "cannot blend '{}' ({} values) with '{}' ({} values)",
            parts[0].0,
            first.len(),
            parts[1].0,
            second.len()
        )));
    }

    let (a, b) = (weights[0] / 100.0, weights[1] / 100.0);
    let blend = first.iter().zip(&second).map(|(x, y)| x * a + y * b).collect();
    tracing::debug!(voices = expr, weights = ?weights, "resolved voice blend");
    Ok(ResolvedVoice::Blend(blend))
}
