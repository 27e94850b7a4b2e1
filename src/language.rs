use crate::{
    engine::SpeechEngine,
    error::{Result, TtsError},
};

/// Check `lang` against the engine's language list.
pub fn validate_language(engine: &dyn SpeechEngine, lang: &str) -> Result<String> {
    let mut supported = engine.languages();
    if supported.iter().any(|l| l == lang) {
        return Ok(lang.to_string());
    }
    supported.sort();
    Err(TtsError::UnsupportedLanguage { lang: lang.to_string(), supported })
}
