//! Role-based default styles for generated documents.

use docx_rs::{Docx, PageMargin, RunFonts, Style, StyleType};

/// Default body font. The documents this converter serves are Chinese
/// office documents, so everything falls back to SimSun.
pub const BODY_FONT: &str = "宋体";
/// Monospace font for the code roles.
pub const CODE_FONT: &str = "Courier New";
/// Body font size in points; also the em base for style declarations.
pub const BODY_SIZE_PT: f32 = 11.0;
/// Page margin on all four sides, in twips (one inch).
const PAGE_MARGIN: i32 = 1440;

/// Structural category keying into the style registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleRole {
    /// `heading-1` .. `heading-6`.
    Heading(u8),
    /// Body text and link spans.
    Paragraph,
    /// Inline code and code blocks.
    Code,
    /// Strong spans.
    Strong,
    /// Emphasis spans.
    Emphasis,
    /// Header-row table cells.
    TableHeader,
    /// Body table cells.
    TableCell,
}

/// Manual style attributes for one role.
#[derive(Debug, Clone, Copy)]
pub struct RoleAttrs {
    /// Font family, applied to every script slot.
    pub font: &'static str,
    /// Font size in points, if the role pins one.
    pub size_pt: Option<f32>,
    /// Text color as a hex triplet.
    pub color: &'static str,
    /// Bold flag.
    pub bold: bool,
    /// Italic flag.
    pub italic: bool,
}

/// Look up the default attributes for a role.
///
/// The mapping is closed; there is no error path. Heading levels outside
/// 1..=6 are a caller bug and resolve like level four and below.
pub const fn resolve(role: StyleRole) -> RoleAttrs {
    const BLACK: &str = "000000";
    match role {
        StyleRole::Heading(1) => RoleAttrs {
            font: BODY_FONT,
            size_pt: Some(16.0),
            color: BLACK,
            bold: true,
            italic: false,
        },
        StyleRole::Heading(2) => RoleAttrs {
            font: BODY_FONT,
            size_pt: Some(14.0),
            color: BLACK,
            bold: true,
            italic: false,
        },
        StyleRole::Heading(3) => RoleAttrs {
            font: BODY_FONT,
            size_pt: Some(12.0),
            color: BLACK,
            bold: true,
            italic: false,
        },
        StyleRole::Heading(_) => RoleAttrs {
            font: BODY_FONT,
            size_pt: Some(11.0),
            color: BLACK,
            bold: true,
            italic: false,
        },
        StyleRole::Paragraph => RoleAttrs {
            font: BODY_FONT,
            size_pt: Some(BODY_SIZE_PT),
            color: BLACK,
            bold: false,
            italic: false,
        },
        StyleRole::Code => RoleAttrs {
            font: CODE_FONT,
            size_pt: Some(10.0),
            color: "A9A9A9",
            bold: false,
            italic: false,
        },
        StyleRole::Strong => RoleAttrs {
            font: BODY_FONT,
            size_pt: None,
            color: BLACK,
            bold: true,
            italic: false,
        },
        StyleRole::Emphasis => RoleAttrs {
            font: BODY_FONT,
            size_pt: None,
            color: BLACK,
            bold: false,
            italic: true,
        },
        StyleRole::TableHeader => RoleAttrs {
            font: BODY_FONT,
            size_pt: None,
            color: BLACK,
            bold: true,
            italic: false,
        },
        StyleRole::TableCell => RoleAttrs {
            font: BODY_FONT,
            size_pt: None,
            color: BLACK,
            bold: false,
            italic: false,
        },
    }
}

/// docx-rs measures font sizes in half-points.
pub fn half_points(points: f32) -> usize {
    (points * 2.0).round() as usize
}

/// Build run fonts with the ASCII, high-ANSI and East-Asian slots set to the
/// same family, so mixed-script text renders consistently.
pub fn run_fonts(name: &str) -> RunFonts {
    RunFonts::new().ascii(name).hi_ansi(name).east_asia(name)
}

fn heading_style(level: u8) -> Style {
    let attrs = resolve(StyleRole::Heading(level));
    let mut style = Style::new(format!("Heading{level}"), StyleType::Paragraph)
        .name(format!("Heading {level}"))
        .fonts(run_fonts(attrs.font))
        .bold();
    if let Some(size) = attrs.size_pt {
        style = style.size(half_points(size));
    }
    style
}

/// Seed a blank document with the builtin styles the engine consults when no
/// template is bound, plus the default section geometry.
pub fn seed_document(docx: Docx) -> Docx {
    let list_paragraph = Style::new("ListParagraph", StyleType::Paragraph)
        .name("List Paragraph")
        .fonts(run_fonts(BODY_FONT))
        .size(half_points(BODY_SIZE_PT));

    docx.page_margin(
        PageMargin::new()
            .top(PAGE_MARGIN)
            .bottom(PAGE_MARGIN)
            .left(PAGE_MARGIN)
            .right(PAGE_MARGIN),
    )
    .add_style(heading_style(1))
    .add_style(heading_style(2))
    .add_style(heading_style(3))
    .add_style(heading_style(4))
    .add_style(list_paragraph)
}
