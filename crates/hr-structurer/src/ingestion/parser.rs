//! Text extraction for plain text, PDF and Word documents

use crate::error::{Error, Result};
use crate::types::MediaType;

/// UTF-8 byte order mark
const BOM: char = '\u{feff}';

/// Converts raw file content into text
pub trait TextDecoder: Send + Sync {
    /// Decode `data` of the given media type into text
    fn decode(&self, media_type: MediaType, filename: &str, data: &[u8]) -> Result<String>;
}

/// Default decoder backed by `pdf-extract` and `docx-rs`
#[derive(Debug, Default, Clone, Copy)]
pub struct FileParser;

impl FileParser {
    pub fn new() -> Self {
        Self
    }

    /// Decode strict UTF-8 text, dropping a leading byte order mark
    fn parse_text(filename: &str, data: &[u8]) -> Result<String> {
        let text = std::str::from_utf8(data)
            .map_err(|e| Error::decode(filename, format!("invalid UTF-8: {}", e)))?;
        Ok(text.strip_prefix(BOM).unwrap_or(text).to_string())
    }

    /// Extract text from a PDF document
    ///
    /// The extractor can panic on malformed input; the panic is contained and
    /// reported as a decode failure.
    fn parse_pdf(filename: &str, data: &[u8]) -> Result<String> {
        let extracted = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(data))
            .map_err(|_| Error::decode(filename, "PDF extractor panicked on malformed input"))?;

        extracted.map_err(|e| Error::decode(filename, e.to_string()))
    }

    /// Extract paragraph text from a DOCX document
    fn parse_docx(filename: &str, data: &[u8]) -> Result<String> {
        let doc = docx_rs::read_docx(data).map_err(|e| Error::decode(filename, e.to_string()))?;

        let mut content = String::new();

        for child in doc.document.children {
            match child {
                docx_rs::DocumentChild::Paragraph(p) => {
                    for child in p.children {
                        if let docx_rs::ParagraphChild::Run(run) = child {
                            for child in run.children {
                                match child {
                                    docx_rs::RunChild::Text(t) => content.push_str(&t.text),
                                    docx_rs::RunChild::Tab(_) => content.push('\t'),
                                    docx_rs::RunChild::Break(_) => content.push('\n'),
                                    _ => {}
                                }
                            }
                        }
                    }
                    content.push('\n');
                }
                // Table text is not extracted
                docx_rs::DocumentChild::Table(_) => {}
                _ => {}
            }
        }

        Ok(content)
    }
}

impl TextDecoder for FileParser {
    fn decode(&self, media_type: MediaType, filename: &str, data: &[u8]) -> Result<String> {
        match media_type {
            MediaType::PlainText => Self::parse_text(filename, data),
            MediaType::Pdf => Self::parse_pdf(filename, data),
            MediaType::Docx => Self::parse_docx(filename, data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_docx(paragraphs: &[&str]) -> Vec<u8> {
        let mut docx = docx_rs::Docx::new();
        for text in paragraphs {
            docx = docx.add_paragraph(
                docx_rs::Paragraph::new().add_run(docx_rs::Run::new().add_text(*text)),
            );
        }
        let mut buffer = std::io::Cursor::new(Vec::new());
        docx.build().pack(&mut buffer).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_plain_text_strips_bom() {
        let data = "\u{feff}Hei på deg".as_bytes();
        let text = FileParser.decode(MediaType::PlainText, "a.txt", data).unwrap();
        assert_eq!(text, "Hei på deg");
    }

    #[test]
    fn test_invalid_utf8_is_decode_error() {
        let result = FileParser.decode(MediaType::PlainText, "a.txt", &[0xff, 0xfe, 0x41]);
        assert!(matches!(result, Err(Error::Decode { .. })));
    }

    #[test]
    fn test_corrupt_pdf_is_decode_error() {
        let result = FileParser.decode(MediaType::Pdf, "broken.pdf", b"definitely not a pdf");
        assert!(matches!(result, Err(Error::Decode { .. })));
    }

    #[test]
    fn test_corrupt_docx_is_decode_error() {
        let result = FileParser.decode(MediaType::Docx, "broken.docx", b"PK but not really");
        assert!(matches!(result, Err(Error::Decode { .. })));
    }

    #[test]
    fn test_docx_paragraphs() {
        let data = build_docx(&["Retningslinjer for ferie", "Søknad sendes til leder."]);
        let text = FileParser.decode(MediaType::Docx, "ferie.docx", &data).unwrap();
        assert_eq!(text, "Retningslinjer for ferie\nSøknad sendes til leder.\n");
    }

    #[test]
    fn test_docx_table_text_is_skipped() {
        let cell = docx_rs::TableCell::new().add_paragraph(
            docx_rs::Paragraph::new().add_run(docx_rs::Run::new().add_text("Sats")),
        );
        let docx = docx_rs::Docx::new()
            .add_paragraph(
                docx_rs::Paragraph::new().add_run(docx_rs::Run::new().add_text("Lønnstabell")),
            )
            .add_table(docx_rs::Table::new(vec![docx_rs::TableRow::new(vec![cell])]));
        let mut buffer = std::io::Cursor::new(Vec::new());
        docx.build().pack(&mut buffer).unwrap();

        let text = FileParser
            .decode(MediaType::Docx, "lonn.docx", &buffer.into_inner())
            .unwrap();
        assert_eq!(text, "Lønnstabell\n");
    }
}
