//! Markdown front end: comrak rendering plus HTML tree lowering.
//!
//! The converter does not interpret Markdown itself. The source is rendered
//! to HTML by comrak and the HTML is parsed back into the crate's element
//! tree, so embedded containers (styled `div` wrappers, alignment
//! attributes) go through the same path as generated markup.

use comrak::{ComrakOptions, markdown_to_html};
use ecow::EcoString;
use html5ever::tendril::TendrilSink;
use html5ever::{ParseOpts, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::dom::{DomNode, Element};

/// Render Markdown to HTML with the extensions the converter relies on.
pub fn render_html(markdown: &str) -> String {
    markdown_to_html(markdown, &comrak_options())
}

fn comrak_options() -> ComrakOptions<'static> {
    let mut options = ComrakOptions::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    // Every newline inside a paragraph becomes an explicit <br>.
    options.render.hardbreaks = true;
    // Raw HTML in the source must survive into the element tree.
    options.render.unsafe_ = true;
    options
}

/// Parse an HTML fragment into the element tree, rooted at a synthetic
/// container holding the `<body>` children.
pub fn parse_html(html: &str) -> Element {
    let dom = parse_document(RcDom::default(), ParseOpts::default()).one(html);
    let mut root = Element::new("body");
    if let Some(body) = find_body(&dom.document) {
        lower_children(&body, &mut root.children);
    }
    root
}

/// Parse Markdown straight to the element tree.
pub fn parse_markdown(markdown: &str) -> Element {
    parse_html(&render_html(markdown))
}

fn find_body(handle: &Handle) -> Option<Handle> {
    if let NodeData::Element { name, .. } = &handle.data
        && name.local.as_ref() == "body"
    {
        return Some(handle.clone());
    }
    for child in handle.children.borrow().iter() {
        if let Some(found) = find_body(child) {
            return Some(found);
        }
    }
    None
}

fn lower_children(handle: &Handle, out: &mut Vec<DomNode>) {
    for child in handle.children.borrow().iter() {
        match &child.data {
            NodeData::Text { contents } => {
                let text = contents.borrow();
                out.push(DomNode::Text(EcoString::from(&**text)));
            }
            NodeData::Element { name, attrs, .. } => {
                let mut element = Element::new(name.local.as_ref());
                element.attrs = attrs
                    .borrow()
                    .iter()
                    .map(|attr| {
                        (
                            EcoString::from(attr.name.local.as_ref()),
                            EcoString::from(&*attr.value),
                        )
                    })
                    .collect();
                lower_children(child, &mut element.children);
                out.push(DomNode::Element(element));
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Tag;

    fn blocks(markdown: &str) -> Vec<Element> {
        parse_markdown(markdown)
            .elements()
            .cloned()
            .collect::<Vec<_>>()
    }

    #[test]
    fn heading_levels_survive() {
        let blocks = blocks("# One\n\n#### Four");
        assert_eq!(blocks[0].tag, Tag::Heading(1));
        assert_eq!(blocks[0].plain_text(), "One");
        assert_eq!(blocks[1].tag, Tag::Heading(4));
    }

    #[test]
    fn hard_breaks_become_line_break_elements() {
        let blocks = blocks("first\nsecond");
        let para = &blocks[0];
        assert_eq!(para.tag, Tag::Paragraph);
        assert!(para.find_child(Tag::LineBreak).is_some());
    }

    #[test]
    fn tables_lower_to_rows_and_cells() {
        let blocks = blocks("| A | B |\n| --- | --- |\n| 1 | 2 |\n");
        let table = blocks
            .iter()
            .find(|block| block.tag == Tag::Table)
            .expect("table block");
        let mut rows = Vec::new();
        collect_rows(table, &mut rows);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].elements().count(), 2);
        assert_eq!(rows[1].plain_text().trim(), "12");
    }

    fn collect_rows<'a>(element: &'a Element, rows: &mut Vec<&'a Element>) {
        for child in element.elements() {
            if child.tag == Tag::TableRow {
                rows.push(child);
            } else {
                collect_rows(child, rows);
            }
        }
    }

    #[test]
    fn raw_containers_keep_style_attributes() {
        let blocks = blocks("<div style=\"text-align: center\">middle</div>");
        let div = blocks
            .iter()
            .find(|block| block.tag == Tag::Container && block.name == "div")
            .expect("div container");
        assert_eq!(div.attr("style"), Some("text-align: center"));
        assert_eq!(div.plain_text().trim(), "middle");
    }

    #[test]
    fn fenced_code_lowers_to_code_block() {
        let blocks = blocks("```\nlet x = 1;\n```\n");
        let pre = &blocks[0];
        assert_eq!(pre.tag, Tag::CodeBlock);
        let code = pre.find_child(Tag::Code).expect("code child");
        assert_eq!(code.plain_text(), "let x = 1;\n");
    }
}
