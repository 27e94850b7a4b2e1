//! Plain-text extraction from uploaded documents.

use std::io::Cursor;

use epub::doc::EpubDoc;
use html2text::render::text_renderer::TrivialDecorator;
use tracing::debug;

use crate::error::{Result, TtsError};

/// Wrap width for HTML rendering; wide enough that lines are not re-flowed.
const HTML_TEXT_WIDTH: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Epub,
    Pdf,
}

impl DocumentKind {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Epub => ".epub",
            Self::Pdf => ".pdf",
        }
    }

    fn article(self) -> &'static str {
        match self {
            Self::Epub => "an EPUB",
            Self::Pdf => "a PDF",
        }
    }

    /// Reject uploads whose file name lacks the expected extension.
    pub fn check_file_name(self, file_name: &str) -> Result<()> {
        if file_name.ends_with(self.extension()) {
            Ok(())
        } else {
            Err(TtsError::InvalidUpload(self.article()))
        }
    }

    pub fn extract(self, bytes: &[u8]) -> Result<String> {
        match self {
            Self::Epub => epub_text(bytes),
            Self::Pdf => pdf_text(bytes),
        }
    }
}

/// Strip markup from an (X)HTML document.
pub fn html_to_text(html: &str) -> String {
    html2text::from_read_with_decorator(html.as_bytes(), HTML_TEXT_WIDTH, TrivialDecorator::new())
}

/// Text of every spine document, in reading order.
pub fn epub_text(bytes: &[u8]) -> Result<String> {
    let mut doc = EpubDoc::from_reader(Cursor::new(bytes.to_vec()))
        .map_err(|e| TtsError::Extraction(format!("EPUB: {e}")))?;

    let mut parts = Vec::new();
    loop {
        if let Some((html, _mime)) = doc.get_current_str() {
            parts.push(html_to_text(&html));
        }
        if !doc.go_next() {
            break;
        }
    }
    debug!(documents = parts.len(), "extracted EPUB text");
    Ok(parts.join("\n"))
}

/// Text of every page, in page order.
pub fn pdf_text(bytes: &[u8]) -> Result<String> {
    let doc = lopdf::Document::load_mem(bytes)
        .map_err(|e| TtsError::Extraction(format!("PDF: {e}")))?;

    let mut text = String::new();
    let pages = doc.get_pages();
    for &page in pages.keys() {
        let page_text = doc
            .extract_text(&[page])
            .map_err(|e| TtsError::Extraction(format!("PDF page {page}: {e}")))?;
        text.push_str(&page_text);
    }
    debug!(pages = pages.len(), "extracted PDF text");
    Ok(text)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use lopdf::{
        content::{Content, Operation},
        dictionary, Document, Object, Stream,
    };
    use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

    use super::*;

    fn chapter(body: &str) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
             <html xmlns=\"http://www.w3.org/1999/xhtml\"><head><title>t</title></head>\
             <body>{body}</body></html>"
        )
    }

    /// Two chapters; the manifest lists them in reverse so only the spine
    /// gives the reading order.
    fn two_chapter_epub() -> Vec<u8> {
        let opf = r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>Two Chapters</dc:title>
    <dc:identifier id="uid">urn:uuid:0</dc:identifier>
    <dc:language>en</dc:language>
  </metadata>
  <manifest>
    <item id="ch2" href="ch2.xhtml" media-type="application/xhtml+xml"/>
    <item id="ch1" href="ch1.xhtml" media-type="application/xhtml+xml"/>
  </manifest>
  <spine>
    <itemref idref="ch1"/>
    <itemref idref="ch2"/>
  </spine>
</package>"#;
        let container = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

        let ch1 = chapter("<p>Chapter one <em>begins</em> here.</p>");
        let ch2 = chapter("<p>Chapter two follows.</p>");
        let files: [(&str, &str); 5] = [
            ("mimetype", "application/epub+zip"),
            ("META-INF/container.xml", container),
            ("OEBPS/content.opf", opf),
            ("OEBPS/ch1.xhtml", &ch1),
            ("OEBPS/ch2.xhtml", &ch2),
        ];

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, body) in files {
            zip.start_file(name, options).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    /// Two pages; the second page's object is created first so object order
    /// and page order disagree.
    fn two_page_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut page = |text: &str| {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            })
        };
        let second = page("Second page text.");
        let first = page("First page text.");

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![first.into(), second.into()],
                "Count" => 2,
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_file_name_check() {
        assert!(DocumentKind::Epub.check_file_name("book.epub").is_ok());
        assert!(DocumentKind::Pdf.check_file_name("paper.pdf").is_ok());
        let err = DocumentKind::Epub.check_file_name("book.pdf").unwrap_err();
        assert_eq!(err.to_string(), "File must be an EPUB");
        let err = DocumentKind::Pdf.check_file_name("notes.txt").unwrap_err();
        assert_eq!(err.to_string(), "File must be a PDF");
    }

    #[test]
    fn test_html_to_text_strips_tags() {
        let text = html_to_text("<html><body><h1>Title</h1><p>Hello <b>bold</b> world.</p></body></html>");
        assert!(text.contains("Title"), "got: {text}");
        assert!(text.contains("Hello bold world."), "got: {text}");
        assert!(!text.contains('<'), "got: {text}");
    }

    #[test]
    fn test_garbage_is_extraction_error() {
        assert!(matches!(epub_text(b"not a zip"), Err(TtsError::Extraction(_))));
        assert!(matches!(pdf_text(b"not a pdf"), Err(TtsError::Extraction(_))));
    }

    #[test]
    fn test_epub_chapters_in_spine_order() {
        let text = epub_text(&two_chapter_epub()).unwrap();
        let one = text.find("Chapter one begins here.").unwrap_or_else(|| panic!("got: {text}"));
        let two = text.find("Chapter two follows.").unwrap_or_else(|| panic!("got: {text}"));
        assert!(one < two, "got: {text}");
        assert!(!text.contains('<'), "got: {text}");
    }

    #[test]
    fn test_epub_upload_extracts_through_kind() {
        let text = DocumentKind::Epub.extract(&two_chapter_epub()).unwrap();
        assert!(text.contains("Chapter two follows."), "got: {text}");
    }

    #[test]
    fn test_pdf_pages_in_page_order() {
        let text = pdf_text(&two_page_pdf()).unwrap();
        let first = text.find("First page text.").unwrap_or_else(|| panic!("got: {text}"));
        let second = text.find("Second page text.").unwrap_or_else(|| panic!("got: {text}"));
        assert!(first < second, "got: {text}");
    }
}
