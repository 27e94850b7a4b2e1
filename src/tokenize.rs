//! Phoneme → token id mapping.
//!
//! Kokoro consumes one token per IPA symbol.  The built-in table is the
//! StyleTTS2 symbol set (`$` pad, punctuation, ASCII letters, IPA letters, in
//! that order).  Model releases that renumber symbols ship a `config.json`
//! whose `vocab` object can be loaded with [`Vocab::from_config`].

use std::{collections::HashMap, path::Path};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;

/// Padding token, placed at both ends of every sequence.
pub const PAD_ID: i64 = 0;

const PAD: char = '$';
const PUNCTUATION: &str = ";:,.!?¡¿—…\u{201C}«»\u{201D}\" ";
const LETTERS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const IPA_LETTERS: &str =
    "ɑɐɒæɓʙβɔɕçɗɖðʤəɘɚɛɜɝɞɟʄɡɠɢʛɦɧħɥʜɨɪʝɭɬɫɮʟɱɯɰŋɳɲɴøɵɸθœɶʘɹɺɾɻʀʁɽʂʃʈʧʉʊʋⱱʌɣɤʍχʎʏʑʐʒʔʡʕʢǀǁǂǃˈˌːˑʼʴʰʱʲʷˠˤ˞↓↑→↗↘\u{2019}\u{0329}\u{2018}ᵻ";

static BUILTIN: Lazy<HashMap<char, i64>> = Lazy::new(|| {
    std::iter::once(PAD)
        .chain(PUNCTUATION.chars())
        .chain(LETTERS.chars())
        .chain(IPA_LETTERS.chars())
        .enumerate()
        .map(|(i, c)| (c, i as i64))
        .collect()
});

#[derive(Debug, Deserialize)]
struct VocabConfig {
    vocab: HashMap<String, i64>,
}

#[derive(Debug, Clone)]
pub struct Vocab {
    ids: HashMap<char, i64>,
}

impl Default for Vocab {
    fn default() -> Self {
        Self { ids: BUILTIN.clone() }
    }
}

impl Vocab {
    /// Parse the `vocab` object of a model config.  Keys must be single
    /// characters.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: VocabConfig = serde_json::from_str(json).context("Failed to parse vocab config")?;
        let mut ids = HashMap::with_capacity(config.vocab.len());
        for (symbol, id) in config.vocab {
            let mut chars = symbol.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => {
                    ids.insert(c, id);
                }
                _ => anyhow::bail!("vocab key {symbol:?} is not a single character"),
            }
        }
        Ok(Self { ids })
    }

    pub fn from_config(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read vocab config: {}", path.display()))?;
        Self::from_json(&json)
    }

    pub fn id(&self, c: char) -> Option<i64> {
        self.ids.get(&c).copied()
    }

    /// Token ids for `phonemes`, unknown symbols dropped, no padding.
    pub fn encode(&self, phonemes: &str) -> Vec<i64> {
        phonemes.chars().filter_map(|c| self.id(c)).collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Wrap `tokens` with [`PAD_ID`] on both sides.
pub fn pad(tokens: &[i64]) -> Vec<i64> {
    let mut ids = Vec::with_capacity(tokens.len() + 2);
    ids.push(PAD_ID);
    ids.extend_from_slice(tokens);
    ids.push(PAD_ID);
    ids
}
