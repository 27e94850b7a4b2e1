//! # kokorotts
//!
//! Text-to-speech over HTTP with the [Kokoro](https://huggingface.co/hexgrad/Kokoro-82M)
//! ONNX model.  Raw text, EPUB and PDF input are turned into WAV or MP3.
//!
//! ## Pipeline
//! 1. **Chunking** — text is cut at sentence boundaries into chunks of at most
//!    1 000 characters ([`chunk`]).
//! 2. **Synthesis** — chunks go to the [`SpeechEngine`] one at a time, in
//!    order.  A chunk the engine rejects as too long is re-split into word
//!    groups of 60% of its length, recursively ([`synth`]).
//! 3. **Aggregation** — samples are concatenated; the first chunk's sample
//!    rate is kept.
//! 4. **Encoding** — WAV via `hound`, MP3 via LAME ([`audio`]).
//!
//! ## Library use
//!
//! ```no_run
//! # #[cfg(feature = "kokoro")]
//! # fn main() -> anyhow::Result<()> {
//! use kokorotts::{model::KokoroEngine, synth::{render, SpeechOptions}, tokenize::Vocab};
//!
//! let engine = KokoroEngine::load(
//!     "kokoro-v1.0.onnx".as_ref(),
//!     "voices-v1.0.bin".as_ref(),
//!     Vocab::default(),
//! )?;
//! let settings = SpeechOptions::default().validate(&engine)?;
//! let audio = render(&engine, "Hello from Rust.", &settings, 1000)?;
//! let wav = kokorotts::audio::encode_wav(&audio.samples, audio.sample_rate)?;
//! # let _ = wav;
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "kokoro"))]
//! # fn main() {}
//! ```
//!
//! ## Features
//! | Feature  | Enables                                                   |
//! |----------|-----------------------------------------------------------|
//! | `server` | axum HTTP server, `config`, MP3 output (default)          |
//! | `mp3`    | MP3 encoding through `mp3lame-encoder`                    |
//! | `espeak` | links `libespeak-ng` (see `build.rs`), [`phonemize`]      |
//! | `kokoro` | the ONNX engine in [`model`]; implies `espeak`            |

pub mod audio;
pub mod chunk;
pub mod engine;
pub mod error;
pub mod extract;
pub mod language;
pub mod npz;
pub mod synth;
pub mod tokenize;
pub mod voice;

#[cfg(feature = "server")]
pub mod config;
#[cfg(feature = "server")]
pub mod server;

#[cfg(feature = "kokoro")]
pub mod model;
#[cfg(feature = "espeak")]
pub mod phonemize;

// ─── Re-exports for convenience ─────────────────────────────────────────────

pub use engine::{EngineError, SpeechEngine, Synthesized};
pub use error::TtsError;
pub use voice::ResolvedVoice;
