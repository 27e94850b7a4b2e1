//! Voice pack loader.
//!
//! A Kokoro voice pack (`voices-v1.0.bin`) is an NPZ archive: a ZIP whose
//! members are `.npy` arrays named after the voices.  Each array is a float32
//! style table of shape `(rows, 1, dim)`; row `n` conditions an utterance of
//! `n` tokens.
//!
//! Only what the packs use is supported: NPY v1/v2/v3 headers, `f4` dtype,
//! C order.

use std::{collections::HashMap, io::Read, path::Path};

use anyhow::{bail, ensure, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use zip::ZipArchive;

const NPY_MAGIC: &[u8] = b"\x93NUMPY";

static RE_DESCR: Lazy<Regex> = Lazy::new(|| Regex::new(r#"['"]descr['"]\s*:\s*['"]([^'"]+)['"]"#).unwrap());
static RE_FORTRAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"['"]fortran_order['"]\s*:\s*(True|False)"#).unwrap());
static RE_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"['"]shape['"]\s*:\s*\(([^)]*)\)"#).unwrap());

/// One voice's style table, flattened row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleTable {
    pub rows: usize,
    pub dim: usize,
    pub data: Vec<f32>,
}

impl StyleTable {
    /// Build from an NPY shape: the last axis is the embedding, everything
    /// before it is rows.
    pub fn from_shape(shape: &[usize], data: Vec<f32>) -> Result<Self> {
        let dim = shape.last().copied().unwrap_or(0);
        ensure!(dim > 0, "style table has no embedding axis (shape {shape:?})");
        ensure!(data.len() % dim == 0, "style table length {} is not a multiple of {dim}", data.len());
        Ok(Self { rows: data.len() / dim, dim, data })
    }

    /// Style for an utterance of `tokens` tokens, `None` past the table.
    pub fn row(&self, tokens: usize) -> Option<&[f32]> {
        (tokens < self.rows).then(|| &self.data[tokens * self.dim..(tokens + 1) * self.dim])
    }
}

/// Parse a raw `.npy` buffer into `(shape, values)`.
pub fn parse_npy(bytes: &[u8]) -> Result<(Vec<usize>, Vec<f32>)> {
    ensure!(bytes.len() >= 10 && bytes.starts_with(NPY_MAGIC), "Not a valid NPY file (bad magic)");

    let (header_len, header_start) = match bytes[6] {
        1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
        2 | 3 => {
            ensure!(bytes.len() >= 12, "NPY header truncated");
            (u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize, 12)
        }
        major => bail!("Unsupported NPY version {major}"),
    };
    let body_start = header_start + header_len;
    ensure!(bytes.len() >= body_start, "NPY header truncated");
    let header = std::str::from_utf8(&bytes[header_start..body_start]).context("NPY header is not UTF-8")?;

    let descr = RE_DESCR.captures(header).map(|c| c[1].to_string()).context("NPY header missing 'descr'")?;
    let big_endian = match descr.as_str() {
        "<f4" | "=f4" | "|f4" => false,
        ">f4" => true,
        other => bail!("Unsupported dtype '{other}', only float32 is supported"),
    };
    if RE_FORTRAN.captures(header).is_some_and(|c| &c[1] == "True") {
        bail!("Fortran-order arrays are not supported");
    }
    let shape = RE_SHAPE
        .captures(header)
        .context("NPY header missing 'shape'")?[1]
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| d.parse::<usize>().with_context(|| format!("Bad shape dim '{d}'")))
        .collect::<Result<Vec<_>>>()?;

    let count: usize = shape.iter().product();
    let body = &bytes[body_start..];
    ensure!(body.len() >= count * 4, "NPY data truncated: expected {} bytes, got {}", count * 4, body.len());

    let values = body[..count * 4]
        .chunks_exact(4)
        .map(|b| {
            let b = [b[0], b[1], b[2], b[3]];
            if big_endian { f32::from_be_bytes(b) } else { f32::from_le_bytes(b) }
        })
        .collect();
    Ok((shape, values))
}

/// Load every style table in a voice pack, keyed by voice id.
pub fn load_voice_pack(path: &Path) -> Result<HashMap<String, StyleTable>> {
    let file = std::fs::File::open(path).with_context(|| format!("Cannot open voice pack: {}", path.display()))?;
    let mut archive = ZipArchive::new(file).with_context(|| format!("Not a ZIP archive: {}", path.display()))?;

    let mut voices = HashMap::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).context("Failed to read voice pack entry")?;
        let name = entry.name().trim_end_matches(".npy").to_string();
        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut buf).with_context(|| format!("Failed to read voice '{name}'"))?;

        let (shape, data) = parse_npy(&buf).with_context(|| format!("Bad style table for voice '{name}'"))?;
        voices.insert(name, StyleTable::from_shape(&shape, data)?);
    }
    Ok(voices)
}
