//! Binding of an external template document.
//!
//! A bound template contributes its named styles and first-section geometry
//! to the generated document; its own content must not leak through. Loading
//! is best-effort: a template that cannot be read or parsed degrades to the
//! registry-seeded blank document with a warning.

use std::fs;
use std::path::Path;

use docx_rs::{Docx, read_docx};
use log::warn;

use crate::{Error, Result};

use super::styles;

/// The seed of the output document: a cleared template or a blank document
/// carrying the registry styles.
pub struct BoundTemplate {
    document: Option<Docx>,
    names: Vec<(String, String)>,
    bound: bool,
}

impl BoundTemplate {
    /// Bind the template at `path`, if one is given.
    pub fn bind(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::blank();
        };
        match Self::load(path) {
            Ok(template) => template,
            Err(err) => {
                warn!(
                    "failed to load template {path}: {err}; continuing without a template",
                    path = path.display()
                );
                Self::blank()
            }
        }
    }

    fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
        Self::from_bytes(&bytes)
    }

    /// Bind a template from its raw bytes, stripping all body content while
    /// keeping named styles and the first section's geometry.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut document =
            read_docx(bytes).map_err(|e| Error::from(format!("not a readable template: {e}")))?;
        // Residual template content would corrupt the generated document.
        // docx-rs models a single section, so dropping the body children also
        // drops any inline section breaks; the first section's geometry lives
        // in `section_property` and survives.
        document.document.children.clear();
        let names = style_index(&document);
        Ok(Self {
            document: Some(document),
            names,
            bound: true,
        })
    }

    fn blank() -> Self {
        let document = styles::seed_document(Docx::new());
        let names = style_index(&document);
        Self {
            document: Some(document),
            names,
            bound: false,
        }
    }

    /// Whether a template document was successfully bound.
    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Resolve a style display name to its underlying style id.
    pub fn style_id(&self, name: &str) -> Option<&str> {
        self.names
            .iter()
            .find(|(style_name, _)| style_name == name)
            .map(|(_, id)| id.as_str())
    }

    /// Whether the bound document defines a style with this display name.
    pub fn has_style(&self, name: &str) -> bool {
        self.style_id(name).is_some()
    }

    /// Take the seeded output document; the binder keeps serving lookups.
    pub fn take_document(&mut self) -> Docx {
        self.document.take().unwrap_or_else(Docx::new)
    }
}

fn style_index(docx: &Docx) -> Vec<(String, String)> {
    docx.styles
        .styles
        .iter()
        .map(|style| (style.name.name.clone(), style.style_id.clone()))
        .collect()
}
