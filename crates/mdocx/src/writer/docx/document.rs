//! Final assembly: trailing cleanup, packing, persistence.

use std::io::{Cursor, Write};
use std::path::Path;

use docx_rs::{Docx, DocumentChild, Paragraph, ParagraphChild, RunChild};
use tempfile::NamedTempFile;

use crate::{Error, Result};

/// Pack the finished document, dropping trailing empty paragraphs first.
pub fn finalize(mut docx: Docx) -> Result<Vec<u8>> {
    trim_trailing_empty(&mut docx);
    let built = docx.build();
    let mut buffer = Vec::new();
    built
        .pack(&mut Cursor::new(&mut buffer))
        .map_err(|e| Error::from(format!("failed to pack document: {e}")))?;
    Ok(buffer)
}

/// Remove empty paragraphs from the end of the document, artifacts of the
/// Markdown front end. A trailing table is left alone.
fn trim_trailing_empty(docx: &mut Docx) {
    loop {
        match docx.document.children.last() {
            Some(DocumentChild::Paragraph(paragraph))
                if paragraph_text(paragraph).trim().is_empty() =>
            {
                docx.document.children.pop();
            }
            _ => break,
        }
    }
}

/// Concatenated run text of a paragraph.
pub fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        if let ParagraphChild::Run(run) = child {
            for piece in &run.children {
                if let RunChild::Text(t) = piece {
                    text.push_str(&t.text);
                }
            }
        }
    }
    text
}

/// Persist packed bytes with a single atomic replace.
///
/// The bytes are staged in a scope-owned temporary file next to the
/// destination; on any failure the temporary file is cleaned up and no
/// partial output is left behind.
pub fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir).map_err(|e| Error::io(path, e))?;
    staged.write_all(bytes).map_err(|e| Error::io(path, e))?;
    staged.persist(path).map_err(|e| Error::io(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use docx_rs::Run;

    use super::*;

    fn text_paragraph(text: &str) -> Paragraph {
        Paragraph::new().add_run(Run::new().add_text(text))
    }

    #[test]
    fn trailing_empty_paragraphs_are_trimmed() {
        let mut docx = Docx::new()
            .add_paragraph(text_paragraph("body"))
            .add_paragraph(text_paragraph(""))
            .add_paragraph(text_paragraph("  "));
        trim_trailing_empty(&mut docx);
        assert_eq!(docx.document.children.len(), 1);
    }

    #[test]
    fn trailing_table_is_untouched() {
        let table = docx_rs::Table::new(vec![docx_rs::TableRow::new(vec![
            docx_rs::TableCell::new().add_paragraph(text_paragraph("cell")),
        ])]);
        let mut docx = Docx::new()
            .add_paragraph(text_paragraph(""))
            .add_table(table);
        trim_trailing_empty(&mut docx);
        assert_eq!(docx.document.children.len(), 2);
    }

    #[test]
    fn write_file_is_atomic_and_complete() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("out.docx");
        write_file(&target, b"payload").expect("persist");
        assert_eq!(std::fs::read(&target).expect("read back"), b"payload");
        // Only the target remains; the staging file is gone.
        assert_eq!(std::fs::read_dir(dir.path()).expect("list").count(), 1);
    }
}
