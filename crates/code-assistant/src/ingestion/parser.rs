//! Multi-format text extraction (PDF, DOCX, Markdown, plain text)

use pulldown_cmark::{Event, Parser as MarkdownParser, Tag, TagEnd};
use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

use crate::error::{Error, Result};
use crate::types::FileKind;

/// Text extracted from an uploaded file
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// File kind
    pub kind: FileKind,
    /// Extracted text content
    pub content: String,
}

/// Multi-format file parser
pub struct FileParser;

impl FileParser {
    /// Parse a file based on its extension
    pub fn parse(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let kind = FileKind::from_path(filename).ok_or_else(|| Error::UnsupportedFileType {
            extension: filename.rsplit('.').next().unwrap_or_default().to_lowercase(),
            allowed: FileKind::allowed_list(),
        })?;

        let content = match kind {
            FileKind::Pdf => Self::parse_pdf(filename, data)?,
            FileKind::Docx => Self::parse_docx(filename, data)?,
            FileKind::Markdown => Self::parse_markdown(data),
            FileKind::Txt => String::from_utf8_lossy(data).into_owned(),
            FileKind::Image => {
                return Err(Error::file_parse(
                    filename,
                    "images must be converted with OCR before indexing",
                ))
            }
        };

        if content.trim().is_empty() {
            return Err(Error::file_parse(filename, "No text content could be extracted"));
        }

        Ok(ParsedDocument { kind, content })
    }

    /// Parse PDF document
    fn parse_pdf(filename: &str, data: &[u8]) -> Result<String> {
        // pdf-extract panics on some malformed fonts
        let raw = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(data))
            .map_err(|_| Error::file_parse(filename, "PDF extraction panicked"))?
            .map_err(|e| Error::file_parse(filename, e.to_string()))?;

        let content = cleanup_pdf_text(&raw)
            .replace('\0', "")
            .lines()
            .map(|l| collapse_spaces(l.trim()))
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        Ok(content)
    }

    /// Parse DOCX document
    fn parse_docx(filename: &str, data: &[u8]) -> Result<String> {
        let doc = docx_rs::read_docx(data).map_err(|e| Error::file_parse(filename, e.to_string()))?;

        let mut content = String::new();
        for child in doc.document.children {
            if let docx_rs::DocumentChild::Paragraph(p) = child {
                for child in p.children {
                    if let docx_rs::ParagraphChild::Run(run) = child {
                        for child in run.children {
                            if let docx_rs::RunChild::Text(t) = child {
                                content.push_str(&t.text);
                            }
                        }
                    }
                }
                content.push('\n');
            }
        }

        Ok(content)
    }

    /// Parse Markdown into plain text, keeping code blocks verbatim
    fn parse_markdown(data: &[u8]) -> String {
        let source = String::from_utf8_lossy(data);
        let mut content = String::with_capacity(source.len());

        for event in MarkdownParser::new(&source) {
            match event {
                Event::Text(text) | Event::Code(text) => content.push_str(&text),
                Event::SoftBreak | Event::HardBreak => content.push('\n'),
                Event::Start(Tag::CodeBlock(_)) => content.push('\n'),
                Event::End(TagEnd::Paragraph)
                | Event::End(TagEnd::Heading(_))
                | Event::End(TagEnd::CodeBlock)
                | Event::End(TagEnd::Item) => content.push('\n'),
                _ => {}
            }
        }

        content
    }
}

/// pdf-extract pads words with runs of spaces and tabs
fn collapse_spaces(line: &str) -> Cow<'_, str> {
    static SPACES: OnceLock<Regex> = OnceLock::new();
    SPACES
        .get_or_init(|| Regex::new(r"[ \t]{2,}").expect("Invalid regex"))
        .replace_all(line, " ")
}

/// Replace typographic characters pdf-extract emits with ASCII equivalents
fn cleanup_pdf_text(text: &str) -> String {
    text.replace(['\u{2010}', '\u{2011}', '\u{2013}'], "-")
        .replace('\u{2014}', "--")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace('\u{2022}', "* ")
        .replace('\u{2026}', "...")
        .replace('\u{00A0}', " ")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_spaces() {
        assert_eq!(collapse_spaces("fn   main\t\t()"), "fn main ()");
        assert_eq!(collapse_spaces("a b"), "a b");
    }

    #[test]
    fn test_parse_text() {
        let parsed = FileParser::parse("notes.txt", b"hello world").unwrap();
        assert_eq!(parsed.kind, FileKind::Txt);
        assert_eq!(parsed.content, "hello world");
    }

    #[test]
    fn test_parse_markdown_keeps_code() {
        let md = b"# Title\n\nSome *text* here.\n\n```rust\nfn main() {}\n```\n";
        let parsed = FileParser::parse("README.md", md).unwrap();
        assert!(parsed.content.contains("Title"));
        assert!(parsed.content.contains("Some text here."));
        assert!(parsed.content.contains("fn main() {}"));
        assert!(!parsed.content.contains('#'));
    }

    #[test]
    fn test_empty_and_unsupported() {
        assert!(matches!(
            FileParser::parse("blank.txt", b"   \n"),
            Err(Error::FileParse { .. })
        ));
        assert!(matches!(
            FileParser::parse("tool.exe", b"MZ"),
            Err(Error::UnsupportedFileType { .. })
        ));
        assert!(matches!(
            FileParser::parse("scan.png", b"\x89PNG"),
            Err(Error::FileParse { .. })
        ));
    }

    #[test]
    fn test_invalid_pdf_is_parse_error() {
        assert!(matches!(
            FileParser::parse("broken.pdf", b"not a pdf"),
            Err(Error::FileParse { .. })
        ));
    }

    #[test]
    fn test_cleanup_pdf_text() {
        assert_eq!(cleanup_pdf_text("\u{201C}a\u{201D} \u{2013} b\u{2026}"), "\"a\" - b...");
    }
}
