//! Scripted engine shared by the integration tests.

use std::collections::BTreeMap;

use kokorotts::{EngineError, ResolvedVoice, SpeechEngine, Synthesized};

pub const SAMPLE_RATE: u32 = 24_000;

/// Produces 10 ms of a constant tone per character and rejects input longer
/// than `limit` characters.
pub struct ScriptedEngine {
    limit: usize,
    styles: BTreeMap<&'static str, Vec<f32>>,
}

impl ScriptedEngine {
    pub fn new(limit: usize) -> Self {
        let styles = BTreeMap::from([
            ("af_bella", vec![0.2; 8]),
            ("af_sarah", vec![0.4; 8]),
            ("am_adam", vec![0.6; 8]),
        ]);
        Self { limit, styles }
    }
}

impl SpeechEngine for ScriptedEngine {
    fn create(
        &self,
        text: &str,
        _voice: &ResolvedVoice,
        _speed: f32,
        _lang: &str,
    ) -> Result<Synthesized, EngineError> {
        let chars = text.chars().count();
        if chars > self.limit {
            return Err(EngineError::InputTooLong { tokens: chars, limit: self.limit });
        }
        Ok(Synthesized {
            samples: vec![0.25; chars * (SAMPLE_RATE as usize / 100)],
            sample_rate: SAMPLE_RATE,
        })
    }

    fn voices(&self) -> Vec<String> {
        self.styles.keys().map(|k| k.to_string()).collect()
    }

    fn languages(&self) -> Vec<String> {
        vec!["en-gb".into(), "en-us".into()]
    }

    fn voice_style(&self, voice: &str) -> Option<Vec<f32>> {
        self.styles.get(voice).cloned()
    }
}

/// A minimal EPUB 2 book whose spine holds one XHTML document per entry of
/// `chapters`.
pub fn epub_book(chapters: &[&str]) -> Vec<u8> {
    use std::io::{Cursor, Write};

    use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

    let mut manifest = String::new();
    let mut spine = String::new();
    for i in 0..chapters.len() {
        manifest.push_str(&format!(
            r#"<item id="c{i}" href="c{i}.xhtml" media-type="application/xhtml+xml"/>"#
        ));
        spine.push_str(&format!(r#"<itemref idref="c{i}"/>"#));
    }
    let opf = format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>Test Book</dc:title>
    <dc:identifier id="uid">urn:uuid:1</dc:identifier>
  </metadata>
  <manifest>{manifest}</manifest>
  <spine>{spine}</spine>
</package>"#
    );
    let container = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let mut add = |name: String, body: &str| {
        zip.start_file(name, options).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    };
    add("mimetype".into(), "application/epub+zip");
    add("META-INF/container.xml".into(), container);
    add("OEBPS/content.opf".into(), &opf);
    for (i, text) in chapters.iter().enumerate() {
        let xhtml = format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<html xmlns="http://www.w3.org/1999/xhtml"><head><title>c{i}</title></head><body><p>{text}</p></body></html>"#
        );
        add(format!("OEBPS/c{i}.xhtml"), &xhtml);
    }
    zip.finish().unwrap().into_inner()
}
