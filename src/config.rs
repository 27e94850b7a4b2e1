//! Server configuration: command-line flags with environment fallbacks.

use std::{net::SocketAddr, path::PathBuf};

use anyhow::{bail, Result};
use clap::Parser;

use crate::chunk::DEFAULT_CHUNK_SIZE;

#[derive(Debug, Clone, Parser)]
#[command(name = "kokorotts-server")]
#[command(about = "HTTP text-to-speech service backed by the Kokoro ONNX model")]
pub struct ServerConfig {
    /// Kokoro ONNX model file
    #[arg(long, env = "KOKORO_MODEL", default_value = "kokoro-v1.0.onnx")]
    pub model: PathBuf,

    /// Voice pack (NPZ archive of style tables)
    #[arg(long, env = "KOKORO_VOICES", default_value = "voices-v1.0.bin")]
    pub voices: PathBuf,

    /// Model config.json providing the phoneme vocabulary; the built-in table
    /// is used when omitted
    #[arg(long, env = "KOKORO_VOCAB")]
    pub vocab: Option<PathBuf>,

    /// `espeak-ng-data` directory; the library's compiled-in default is used
    /// when omitted
    #[arg(long, env = "KOKORO_ESPEAK_DATA")]
    pub espeak_data: Option<PathBuf>,

    /// Address to bind the HTTP server to
    #[arg(long, env = "KOKORO_LISTEN", default_value = "0.0.0.0:8000")]
    pub listen: SocketAddr,

    /// Initial chunk size budget, in characters
    #[arg(long, env = "KOKORO_CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Origins allowed by CORS (comma-separated)
    #[arg(
        long = "cors-origin",
        env = "KOKORO_CORS_ORIGINS",
        value_delimiter = ',',
        default_value = "https://tropley.com"
    )]
    pub cors_origins: Vec<String>,

    /// Largest accepted request body, in MiB
    #[arg(long, env = "KOKORO_MAX_UPLOAD_MB", default_value_t = 64)]
    pub max_upload_mb: usize,
}

impl ServerConfig {
    /// Fail early on missing asset files and nonsensical limits.
    pub fn validate(&self) -> Result<()> {
        for (what, path) in [("model", &self.model), ("voices", &self.voices)] {
            if !path.is_file() {
                bail!("Missing {what} file: {}", path.display());
            }
        }
        if let Some(vocab) = &self.vocab {
            if !vocab.is_file() {
                bail!("Missing vocab config: {}", vocab.display());
            }
        }
        if let Some(dir) = &self.espeak_data {
            if !dir.is_dir() {
                bail!("Missing espeak-ng data directory: {}", dir.display());
            }
        }
        if self.chunk_size == 0 {
            bail!("--chunk-size must be positive");
        }
        Ok(())
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}
