//! DOCX writer built on docx-rs.
//!
//! This module is organized into several main components:
//! - Styles: role-based default attributes and builtin style seeding
//! - Template: binding an external template document
//! - Compose: appending styled runs to paragraphs
//! - Writer: the structural conversion walk over the element tree
//! - Document: final cleanup, packing and persistence

mod compose;
mod document;
mod styles;
mod template;
mod writer;

pub use compose::RunFormat;
pub use document::{paragraph_text, write_file};
pub use styles::{RoleAttrs, StyleRole};
pub use template::BoundTemplate;
pub use writer::DocxWriter;
