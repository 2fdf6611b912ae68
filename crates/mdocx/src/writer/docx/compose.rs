//! Appending styled runs to paragraphs.

use docx_rs::{Paragraph, Run};
use ecow::EcoString;

use super::styles::{self, RoleAttrs, StyleRole};

/// Explicit overrides applied on top of a role's defaults.
///
/// Precedence is fixed: role attributes first, then the bold/italic flags,
/// then the font and size overrides. Later always wins.
#[derive(Debug, Default, Clone)]
pub struct RunFormat {
    /// Force bold.
    pub bold: bool,
    /// Force italic.
    pub italic: bool,
    /// Font family override, usually inherited from the formatting context.
    pub font: Option<EcoString>,
    /// Font size override in points.
    pub size_pt: Option<f32>,
}

/// Append `text` to `paragraph` as a run styled for `role`.
///
/// Whitespace-only text is dropped, unless it starts with the full-width
/// space indentation marker, which must survive trimming.
pub fn append_run(paragraph: Paragraph, text: &str, role: StyleRole, fmt: &RunFormat) -> Paragraph {
    if text.trim().is_empty() && !text.starts_with('　') {
        return paragraph;
    }

    let mut run = apply_role(Run::new().add_text(text), &styles::resolve(role));
    if fmt.bold {
        run = run.bold();
    }
    if fmt.italic {
        run = run.italic();
    }
    if let Some(font) = &fmt.font {
        run = run.fonts(styles::run_fonts(font));
    }
    if let Some(size) = fmt.size_pt {
        run = run.size(styles::half_points(size));
    }
    paragraph.add_run(run)
}

/// Apply the manual attributes of a role to a run.
pub fn apply_role(mut run: Run, attrs: &RoleAttrs) -> Run {
    run = run.fonts(styles::run_fonts(attrs.font)).color(attrs.color);
    if let Some(size) = attrs.size_pt {
        run = run.size(styles::half_points(size));
    }
    if attrs.bold {
        run = run.bold();
    }
    if attrs.italic {
        run = run.italic();
    }
    run
}

#[cfg(test)]
mod tests {
    use super::super::document::paragraph_text;
    use super::*;

    #[test]
    fn whitespace_only_text_is_dropped() {
        let para = append_run(
            Paragraph::new(),
            "   \n",
            StyleRole::Paragraph,
            &RunFormat::default(),
        );
        assert!(para.children.is_empty());
    }

    #[test]
    fn fullwidth_indentation_survives() {
        let para = append_run(
            Paragraph::new(),
            "　　",
            StyleRole::Paragraph,
            &RunFormat::default(),
        );
        assert_eq!(paragraph_text(&para), "　　");
    }

    #[test]
    fn text_lands_in_the_run() {
        let fmt = RunFormat {
            bold: true,
            font: Some("黑体".into()),
            size_pt: Some(14.0),
            ..RunFormat::default()
        };
        let para = append_run(Paragraph::new(), "hello", StyleRole::Strong, &fmt);
        assert_eq!(paragraph_text(&para), "hello");
    }
}
