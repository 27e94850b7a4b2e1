//! `kokorotts-server`: loads the Kokoro model once and serves the HTTP API.
//!
//! ```text
//! kokorotts-server --model kokoro-v1.0.onnx --voices voices-v1.0.bin --listen 0.0.0.0:8000
//! RUST_LOG=kokorotts=debug kokorotts-server
//! ```

use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tokio::runtime::Builder;
use tracing_subscriber::{fmt, EnvFilter};

use kokorotts::{
    config::ServerConfig, model::KokoroEngine, phonemize, server::serve, tokenize::Vocab, SpeechEngine,
};

fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(env_filter).init();

    config.validate()?;

    if let Some(dir) = &config.espeak_data {
        phonemize::set_data_path(dir);
    }
    if !phonemize::is_espeak_available() {
        bail!("espeak-ng failed to initialise; check --espeak-data or ESPEAK_DATA_PATH");
    }

    let vocab = match &config.vocab {
        Some(path) => Vocab::from_config(path)?,
        None => Vocab::default(),
    };
    let engine = KokoroEngine::load(&config.model, &config.voices, vocab)
        .context("failed to initialise Kokoro model")?;
    let engine: Arc<dyn SpeechEngine> = Arc::new(engine);

    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(serve(&config, engine))
}
