//! Formatting state parsed from element attributes.
//!
//! Container elements may carry inline style declarations or an `align`
//! attribute. Both are folded into a [`FormatContext`] that flows from a
//! container to its descendants; every recursive descent computes a fresh
//! merged context, so sibling branches never observe each other's overrides.

use std::sync::OnceLock;

use ecow::EcoString;
use regex::Regex;

use crate::dom::Element;

/// Horizontal alignment recognized from `text-align` declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    /// Flush left.
    Left,
    /// Centered.
    Center,
    /// Flush right.
    Right,
}

impl TextAlign {
    fn parse(value: &str) -> Option<TextAlign> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" => Some(TextAlign::Left),
            "center" => Some(TextAlign::Center),
            "right" => Some(TextAlign::Right),
            _ => None,
        }
    }
}

/// Inheritable formatting flowing from container elements to descendants.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FormatContext {
    /// Font family override.
    pub font_name: Option<EcoString>,
    /// Font size override, in points.
    pub font_size: Option<f32>,
    /// Paragraph alignment override.
    pub text_align: Option<TextAlign>,
    /// First-line indent override, in points.
    pub text_indent: Option<f32>,
}

impl FormatContext {
    /// A child context: this context with the element's own declarations
    /// merged on top. Unparseable declarations yield no override.
    pub fn merged(&self, element: &Element) -> FormatContext {
        let mut ctx = self.clone();
        if let Some(style) = element.attr("style") {
            for declaration in style.split(';') {
                let Some((property, value)) = declaration.split_once(':') else {
                    continue;
                };
                let value = value.trim();
                match property.trim().to_ascii_lowercase().as_str() {
                    "font-family" => ctx.font_name = Some(first_font(value).into()),
                    "font-size" => {
                        if let Some(points) = parse_css_length(value) {
                            ctx.font_size = Some(points);
                        }
                    }
                    "text-align" => {
                        if let Some(align) = TextAlign::parse(value) {
                            ctx.text_align = Some(align);
                        }
                    }
                    "text-indent" => {
                        if let Some(points) = parse_css_length(value) {
                            ctx.text_indent = Some(points);
                        }
                    }
                    _ => {}
                }
            }
        }
        // The align attribute only fills in when nothing has set an
        // alignment yet, neither inherited nor declared.
        if ctx.text_align.is_none()
            && let Some(value) = element.attr("align")
        {
            ctx.text_align = TextAlign::parse(value);
        }
        ctx
    }
}

/// The first family of a `font-family` list, quotes stripped.
fn first_font(value: &str) -> &str {
    let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
    value.split(',').next().unwrap_or(value).trim()
}

/// Convert a CSS length to points.
///
/// Pixels convert at 0.75 pt/px, em/rem at the 11pt body size, unitless
/// values are points. Anything unparseable yields `None`.
pub fn parse_css_length(value: &str) -> Option<f32> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^(\d+(?:\.\d+)?)\s*(pt|px|em|rem)?").unwrap());
    let caps = re.captures(value.trim())?;
    let number: f32 = caps[1].parse().ok()?;
    Some(match caps.get(2).map(|unit| unit.as_str()) {
        Some("px") => number * 0.75,
        Some("em") | Some("rem") => number * 11.0,
        _ => number,
    })
}
