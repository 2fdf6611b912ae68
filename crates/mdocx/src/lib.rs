//! # mdocx
//!
//! Converts Markdown documents into styled Word documents.
//!
//! The pipeline: the source text (with `[FULLWIDTH_SPACES:N]` placeholders
//! expanded) is rendered to HTML, lowered into an element tree, and walked by
//! the structural conversion engine, which resolves each element's style
//! against an optionally bound template document before falling back to the
//! builtin style registry.

pub mod attributes;
pub mod dom;
mod error;
pub mod headings;
pub mod parser;
pub mod writer;

use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::OnceLock;

use ecow::EcoString;
use regex::Regex;

pub use error::Error;
pub use writer::Format;

use crate::dom::Element;
use crate::writer::docx::{self, BoundTemplate, DocxWriter};
use crate::writer::{FormatWriter, TextWriter};

/// The result type for mdocx.
pub type Result<T, Err = Error> = std::result::Result<T, Err>;

/// Conversion features shared by every output format.
#[derive(Debug, Default, Clone)]
pub struct ConvertFeat {
    /// Path of a template document supplying named styles and section
    /// geometry. Loading is best-effort; a missing or unreadable template
    /// degrades to the builtin defaults with a warning.
    pub template: Option<PathBuf>,
}

/// A parsed source document, ready to be written in any supported format.
pub struct MarkdownDocument {
    html: String,
    root: Element,
    feat: ConvertFeat,
}

impl MarkdownDocument {
    /// Parse Markdown text, expanding placeholder syntax first.
    pub fn parse(markdown: &str, feat: ConvertFeat) -> Self {
        let source = expand_fullwidth_spaces(markdown);
        let html = parser::render_html(&source);
        let root = parser::parse_html(&html);
        Self { html, root, feat }
    }

    /// The element tree the writers consume.
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// The rendered HTML form of the source.
    pub fn to_html_string(&self) -> EcoString {
        EcoString::from(self.html.as_str())
    }

    /// Convert the content to a plain text string.
    pub fn to_text_string(&self) -> Result<EcoString> {
        let mut output = EcoString::new();
        TextWriter::new().write_eco(&self.root, &mut output)?;
        Ok(output)
    }

    /// Convert the content to a packed DOCX document.
    pub fn to_docx(&self) -> Result<Vec<u8>> {
        let template = BoundTemplate::bind(self.feat.template.as_deref());
        DocxWriter::new(template).write_vec(&self.root)
    }
}

/// Task builder for converting one Markdown file.
pub struct Mdocx {
    input: PathBuf,
    feat: ConvertFeat,
    format: Format,
}

impl Mdocx {
    /// A conversion task for the Markdown file at `input`.
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            feat: ConvertFeat::default(),
            format: Format::default(),
        }
    }

    /// Sets conversion features.
    pub fn with_feature(mut self, feat: ConvertFeat) -> Self {
        self.feat = feat;
        self
    }

    /// Sets the output format.
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Convert the input and return the raw output bytes.
    pub fn convert(self) -> Result<Vec<u8>> {
        let markdown =
            std::fs::read_to_string(&self.input).map_err(|e| Error::io(&self.input, e))?;
        let document = MarkdownDocument::parse(&markdown, self.feat);
        match self.format {
            Format::Docx => document.to_docx(),
            Format::Html => Ok(document.to_html_string().as_bytes().to_vec()),
            Format::Text => Ok(document.to_text_string()?.as_bytes().to_vec()),
        }
    }

    /// Convert the input and persist it, deriving the output path from the
    /// input when none is given.
    pub fn convert_to_file(self, output: Option<PathBuf>) -> Result<PathBuf> {
        let path = output.unwrap_or_else(|| self.input.with_extension(self.format.extension()));
        let bytes = self.convert()?;
        docx::write_file(&path, &bytes)?;
        Ok(path)
    }
}

/// Expand `[FULLWIDTH SPACES:N]` placeholders into N full-width space
/// characters, before any Markdown parsing sees the text. The marker forces
/// visible indentation that Markdown itself would collapse.
pub fn expand_fullwidth_spaces(text: &str) -> Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(?i)\[FULLWIDTH[ _]?SPACES:(\d+)\]").unwrap());
    re.replace_all(text, |caps: &regex::Captures| {
        let count = caps[1].parse::<usize>().unwrap_or(0);
        "　".repeat(count)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_expand_case_insensitively() {
        assert_eq!(expand_fullwidth_spaces("[FULLWIDTH_SPACES:3]x"), "　　　x");
        assert_eq!(expand_fullwidth_spaces("[fullwidth spaces:2]x"), "　　x");
        assert_eq!(expand_fullwidth_spaces("[FULLWIDTHSPACES:1]x"), "　x");
        assert_eq!(expand_fullwidth_spaces("no markers"), "no markers");
    }

    #[test]
    fn expanded_spaces_survive_the_whole_pipeline() {
        let document =
            MarkdownDocument::parse("[FULLWIDTH_SPACES:3]indented", ConvertFeat::default());
        let text = document.root().plain_text();
        assert!(text.contains("　　　indented"));
    }

    #[test]
    fn html_output_is_the_rendered_source() {
        let document = MarkdownDocument::parse("# Title", ConvertFeat::default());
        assert!(document.to_html_string().contains("<h1>Title</h1>"));
    }

    #[test]
    fn docx_output_is_a_zip_package() {
        let document = MarkdownDocument::parse("# Title\n\nbody", ConvertFeat::default());
        let bytes = document.to_docx().expect("docx bytes");
        // OOXML packages are zip archives.
        assert_eq!(&bytes[..2], b"PK");
    }
}
