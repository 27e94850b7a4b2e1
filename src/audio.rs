//! In-memory audio encoding (WAV always, MP3 with the `mp3` feature).

use std::io::Cursor;

use crate::error::{Result, TtsError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Mp3,
}

impl AudioFormat {
    pub fn parse(format: &str) -> Result<Self> {
        match format {
            "wav" => Ok(Self::Wav),
            "mp3" => Ok(Self::Mp3),
            other => Err(TtsError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Wav => "audio/wav",
            Self::Mp3 => "audio/mp3",
        }
    }
}

/// f32 [-1.0, 1.0] → i16, clamped.
fn to_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s * i16::MAX as f32).clamp(i16::MIN as f32, i16::MAX as f32) as i16)
        .collect()
}

/// Encode mono `samples` at `sample_rate` Hz.
pub fn encode(samples: &[f32], sample_rate: u32, format: AudioFormat) -> Result<Vec<u8>> {
    match format {
        AudioFormat::Wav => encode_wav(samples, sample_rate),
        AudioFormat::Mp3 => encode_mp3(samples, sample_rate),
    }
}

/// 16-bit PCM WAV.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let enc = |e: hound::Error| TtsError::Encoding(format!("WAV: {e}"));

    let mut cursor = Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec).map_err(enc)?;
    for s in to_i16(samples) {
        writer.write_sample(s).map_err(enc)?;
    }
    writer.finalize().map_err(enc)?;
    Ok(cursor.into_inner())
}

#[cfg(feature = "mp3")]
pub fn encode_mp3(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    use mp3lame_encoder::{Bitrate, Builder, FlushNoGap, MonoPcm, Quality};

    let enc = |what: &str, e: &dyn std::fmt::Debug| TtsError::Encoding(format!("MP3 {what}: {e:?}"));

    let mut builder = Builder::new().ok_or_else(|| TtsError::Encoding("cannot create LAME encoder".into()))?;
    builder.set_num_channels(1).map_err(|e| enc("channels", &e))?;
    builder.set_sample_rate(sample_rate).map_err(|e| enc("sample rate", &e))?;
    builder.set_brate(Bitrate::Kbps128).map_err(|e| enc("bitrate", &e))?;
    builder.set_quality(Quality::Best).map_err(|e| enc("quality", &e))?;
    let mut encoder = builder.build().map_err(|e| enc("init", &e))?;

    let pcm = to_i16(samples);
    let mut out: Vec<u8> = Vec::new();
    out.reserve(mp3lame_encoder::max_required_buffer_size(pcm.len()));

    let written = encoder
        .encode(MonoPcm(&pcm), out.spare_capacity_mut())
        .map_err(|e| enc("encode", &e))?;
    // SAFETY: the encoder initialised exactly `written` bytes of spare capacity.
    unsafe { out.set_len(out.len() + written) };

    let written = encoder
        .flush::<FlushNoGap>(out.spare_capacity_mut())
        .map_err(|e| enc("flush", &e))?;
    // SAFETY: as above.
    unsafe { out.set_len(out.len() + written) };

    Ok(out)
}

#[cfg(not(feature = "mp3"))]
pub fn encode_mp3(_samples: &[f32], _sample_rate: u32) -> Result<Vec<u8>> {
    Err(TtsError::Encoding("built without the `mp3` feature".into()))
}
