//! Writer implementations for the supported output formats.

pub mod docx;
pub mod text;

pub use docx::DocxWriter;
pub use text::TextWriter;

use ecow::EcoString;

use crate::Result;
use crate::dom::Element;

/// Valid formats for the conversion.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// A packed OOXML word-processing document.
    #[default]
    Docx,
    /// The rendered HTML form of the source.
    Html,
    /// Plain text with block separation.
    Text,
}

impl Format {
    /// The file extension used when deriving an output path.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Docx => "docx",
            Format::Html => "html",
            Format::Text => "txt",
        }
    }
}

/// A writer rendering the element tree into one output format.
pub trait FormatWriter {
    /// Write the document into a byte buffer.
    fn write_vec(&mut self, document: &Element) -> Result<Vec<u8>>;
    /// Write the document into a string buffer.
    fn write_eco(&mut self, document: &Element, output: &mut EcoString) -> Result<()>;
}
