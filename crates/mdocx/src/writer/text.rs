//! Text writer implementation - produces plain text output

use ecow::EcoString;

use crate::Result;
use crate::dom::{DomNode, Element, Tag};
use crate::writer::FormatWriter;

/// Renders the element tree as plain text, one block per line.
#[derive(Default)]
pub struct TextWriter {}

impl TextWriter {
    /// A fresh text writer.
    pub fn new() -> Self {
        Self {}
    }

    fn write_node(node: &DomNode, output: &mut EcoString) {
        match node {
            DomNode::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    output.push_str(trimmed);
                    output.push('\n');
                }
            }
            DomNode::Element(element) => Self::write_element(element, output),
        }
    }

    fn write_element(element: &Element, output: &mut EcoString) {
        match element.tag {
            Tag::Heading(_) | Tag::Paragraph | Tag::ListItem => {
                let text = element.plain_text();
                let text = text.trim();
                if !text.is_empty() {
                    output.push_str(text);
                }
                output.push('\n');
            }
            Tag::CodeBlock => {
                let text = element.plain_text();
                output.push_str(text.trim_end_matches('\n'));
                output.push('\n');
            }
            Tag::TableRow => {
                let cells: Vec<String> = element
                    .elements()
                    .filter(|cell| cell.tag == Tag::TableCell)
                    .map(|cell| cell.plain_text().trim().to_string())
                    .collect();
                output.push_str(&cells.join("\t"));
                output.push('\n');
            }
            Tag::LineBreak => output.push('\n'),
            _ => {
                for child in &element.children {
                    Self::write_node(child, output);
                }
            }
        }
    }
}

impl FormatWriter for TextWriter {
    fn write_vec(&mut self, document: &Element) -> Result<Vec<u8>> {
        let mut output = EcoString::new();
        self.write_eco(document, &mut output)?;
        Ok(output.as_str().as_bytes().to_vec())
    }

    fn write_eco(&mut self, document: &Element, output: &mut EcoString) -> Result<()> {
        for child in &document.children {
            Self::write_node(child, output);
        }
        Ok(())
    }
}
