//! The structural conversion walk from the element tree into a document.

use std::sync::OnceLock;

use docx_rs::{
    AlignmentType, BreakType, Docx, LineSpacing, Paragraph, Run, SpecialIndentType, Table,
    TableCell, TableRow,
};
use ecow::EcoString;
use regex::Regex;

use crate::Result;
use crate::attributes::{FormatContext, TextAlign};
use crate::dom::{DomNode, Element, Tag};
use crate::writer::FormatWriter;

use super::compose::{self, RunFormat};
use super::document;
use super::styles::{self, StyleRole};
use super::template::BoundTemplate;

/// Default first-line indent for body text, in twips: 21pt, roughly two
/// characters at the body size.
const DEFAULT_FIRST_LINE_INDENT: i32 = 420;
/// Extra left indent per list nesting level, in twips.
const LIST_LEVEL_INDENT: i32 = 420;

/// Lines shaped like `(1) ` are pseudo-list lines: prose grouped to look
/// like a list without being one.
fn pseudo_list_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\(\d+\)\s+").unwrap())
}

/// Converts the element tree into a DOCX document, resolving styles against
/// the bound template and falling back to the style registry.
pub struct DocxWriter {
    template: BoundTemplate,
    list_level: usize,
}

impl DocxWriter {
    /// A writer emitting into the document seeded by `template`.
    pub fn new(template: BoundTemplate) -> Self {
        Self {
            template,
            list_level: 0,
        }
    }

    /// Walk the tree and return the populated document model.
    fn build_document(&mut self, root: &Element) -> Result<Docx> {
        let mut docx = self.template.take_document();
        let ctx = FormatContext::default();
        for child in &root.children {
            docx = self.convert_node(docx, child, &ctx)?;
        }
        Ok(docx)
    }

    fn convert_node(&mut self, docx: Docx, node: &DomNode, ctx: &FormatContext) -> Result<Docx> {
        match node {
            DomNode::Text(text) => Ok(self.convert_text_block(docx, text, ctx)),
            DomNode::Element(element) => self.convert_element(docx, element, ctx),
        }
    }

    /// A bare text leaf between blocks becomes its own body paragraph.
    fn convert_text_block(&self, docx: Docx, text: &str, ctx: &FormatContext) -> Docx {
        if text.trim().is_empty() {
            return docx;
        }
        let paragraph = compose::append_run(
            self.block_paragraph(ctx),
            text,
            StyleRole::Paragraph,
            &run_overrides(ctx),
        );
        docx.add_paragraph(paragraph)
    }

    fn convert_element(
        &mut self,
        docx: Docx,
        element: &Element,
        ctx: &FormatContext,
    ) -> Result<Docx> {
        let ctx = ctx.merged(element);
        match element.tag {
            Tag::HorizontalRule => Ok(self.page_break(docx)),
            Tag::Heading(level) => Ok(self.convert_heading(docx, element, level)),
            Tag::Paragraph => Ok(self.convert_paragraph(docx, element, &ctx)),
            Tag::Table => Ok(self.convert_table(docx, element)),
            Tag::OrderedList => self.convert_list(docx, element, true, &ctx),
            Tag::UnorderedList => self.convert_list(docx, element, false, &ctx),
            Tag::CodeBlock => Ok(self.convert_code_block(docx, element)),
            Tag::LineBreak => Ok(docx),
            // Containers, stray inline spans and any unexpected shape: merge
            // attributes into the context and recurse.
            _ => {
                let mut docx = docx;
                for child in &element.children {
                    docx = self.convert_node(docx, child, &ctx)?;
                }
                Ok(docx)
            }
        }
    }

    /// Headings 1-4 resolve template style, then builtin style, then body
    /// default. Levels 5 and 6 render as body paragraphs with zero indent so
    /// they stand apart from body text without entering the outline.
    fn convert_heading(&self, docx: Docx, element: &Element, level: u8) -> Docx {
        let text = element.plain_text();
        let text = text.trim();

        if level >= 5 {
            let base =
                Paragraph::new().indent(None, Some(SpecialIndentType::FirstLine(0)), None, None);
            let paragraph =
                compose::append_run(base, text, StyleRole::Paragraph, &RunFormat::default());
            return docx.add_paragraph(paragraph);
        }

        let mut paragraph = Paragraph::new();
        let template_name = format!("标题 {level}");
        let builtin_name = format!("Heading {level}");
        if let Some(id) = self
            .template
            .style_id(&template_name)
            .or_else(|| self.template.style_id(&builtin_name))
        {
            paragraph = paragraph.style(id);
        }

        // Once a template style applies it is authoritative; manual heading
        // attributes are only for the blank-document case.
        let run = if self.template.is_bound() {
            Run::new().add_text(text)
        } else {
            compose::apply_role(
                Run::new().add_text(text),
                &styles::resolve(StyleRole::Heading(level)),
            )
        };
        docx.add_paragraph(paragraph.add_run(run))
    }

    /// Paragraphs split on top-level hard breaks into one output paragraph
    /// per segment, all sharing the alignment and indent computed once for
    /// the source paragraph.
    fn convert_paragraph(&mut self, mut docx: Docx, element: &Element, ctx: &FormatContext) -> Docx {
        let segments = split_on_breaks(&element.children);
        if segments.len() > 1 {
            for segment in &segments {
                let text = segment_text(segment);
                if text.trim().is_empty() && !text.starts_with('　') {
                    continue;
                }
                let mut paragraph = self.block_paragraph(ctx);
                if pseudo_list_prefix().is_match(text.trim_start()) {
                    paragraph = paragraph.line_spacing(LineSpacing::new().after(0));
                }
                for node in segment {
                    paragraph = self.compose_inline(paragraph, node, ctx);
                }
                docx = docx.add_paragraph(paragraph);
            }
            return docx;
        }

        let mut paragraph = self.block_paragraph(ctx);
        if pseudo_list_prefix().is_match(element.plain_text().trim()) {
            paragraph = paragraph.line_spacing(LineSpacing::new().after(0));
        }
        for node in &element.children {
            paragraph = self.compose_inline(paragraph, node, ctx);
        }
        docx.add_paragraph(paragraph)
    }

    /// Inline recursion within one output paragraph.
    fn compose_inline(
        &self,
        mut paragraph: Paragraph,
        node: &DomNode,
        ctx: &FormatContext,
    ) -> Paragraph {
        match node {
            DomNode::Text(text) => {
                // Newlines inside inline text are soft; protected
                // indentation markers pass through untouched.
                let text = text.replace('\n', "");
                compose::append_run(paragraph, &text, StyleRole::Paragraph, &run_overrides(ctx))
            }
            DomNode::Element(element) => match element.tag {
                Tag::LineBreak => paragraph.add_run(Run::new().add_break(BreakType::TextWrapping)),
                Tag::Strong => self.append_span(paragraph, element, StyleRole::Strong, true, false, ctx),
                Tag::Emphasis => {
                    self.append_span(paragraph, element, StyleRole::Emphasis, false, true, ctx)
                }
                Tag::Code => self.append_span(paragraph, element, StyleRole::Code, false, false, ctx),
                Tag::Link => {
                    self.append_span(paragraph, element, StyleRole::Paragraph, false, false, ctx)
                }
                _ => {
                    for child in &element.children {
                        paragraph = self.compose_inline(paragraph, child, ctx);
                    }
                    paragraph
                }
            },
        }
    }

    fn append_span(
        &self,
        paragraph: Paragraph,
        element: &Element,
        role: StyleRole,
        bold: bool,
        italic: bool,
        ctx: &FormatContext,
    ) -> Paragraph {
        let text = element.plain_text().replace('\n', "");
        let text = text.trim();
        if text.is_empty() {
            return paragraph;
        }
        let mut fmt = run_overrides(ctx);
        fmt.bold = bold;
        fmt.italic = italic;
        compose::append_run(paragraph, text, role, &fmt)
    }

    /// The first row is the header; columns span the widest row and shorter
    /// rows stay ragged.
    fn convert_table(&self, docx: Docx, element: &Element) -> Docx {
        let rows = collect_rows(element);
        if rows.is_empty() {
            return docx;
        }

        let mut table = Table::new(vec![]);
        if let Some(id) = self.template.style_id("Table Grid") {
            table = table.style(id);
        }

        for (index, row) in rows.iter().enumerate() {
            let cells: Vec<TableCell> = row
                .elements()
                .filter(|cell| cell.tag == Tag::TableCell)
                .map(|cell| self.table_cell(cell, index == 0))
                .collect();
            table = table.add_row(TableRow::new(cells));
        }
        docx.add_table(table)
    }

    fn table_cell(&self, cell: &Element, header: bool) -> TableCell {
        let text = cell.plain_text();
        let text = text.trim();

        let (named, role) = if header {
            ("表头", StyleRole::TableHeader)
        } else {
            ("表内", StyleRole::TableCell)
        };
        let mut paragraph = Paragraph::new();
        if let Some(id) = self.template.style_id(named) {
            paragraph = paragraph.style(id);
        }

        let mut run = Run::new().add_text(text);
        if !self.template.is_bound() {
            run = compose::apply_role(run, &styles::resolve(role));
        }
        if header {
            run = run.bold();
        }
        TableCell::new().add_paragraph(paragraph.add_run(run))
    }

    /// List items become literal-prefixed paragraphs; nested lists recurse
    /// one level deeper instead of being flattened.
    fn convert_list(
        &mut self,
        docx: Docx,
        element: &Element,
        ordered: bool,
        ctx: &FormatContext,
    ) -> Result<Docx> {
        self.list_level += 1;
        let result = self.convert_list_items(docx, element, ordered, ctx);
        self.list_level -= 1;
        result
    }

    fn convert_list_items(
        &mut self,
        mut docx: Docx,
        element: &Element,
        ordered: bool,
        ctx: &FormatContext,
    ) -> Result<Docx> {
        let mut index = 0usize;
        for item in element.elements() {
            if item.tag != Tag::ListItem {
                continue;
            }
            index += 1;

            let mut paragraph = Paragraph::new();
            if let Some(id) = self.template.style_id("List Paragraph") {
                paragraph = paragraph.style(id);
            }
            if self.list_level > 1 {
                let left = LIST_LEVEL_INDENT * (self.list_level as i32 - 1);
                paragraph = paragraph.indent(Some(left), None, None, None);
            }

            // Literal prefixes keep the numbering start value and format
            // under the engine's control rather than the template's.
            let prefix = if ordered {
                format!("{index}. ")
            } else {
                "• ".to_string()
            };
            paragraph = paragraph.add_run(Run::new().add_text(prefix));

            // A paragraph child carries the item body; otherwise the item's
            // own children do.
            let content = item.find_child(Tag::Paragraph).unwrap_or(item);
            for child in &content.children {
                if let DomNode::Element(el) = child
                    && matches!(el.tag, Tag::OrderedList | Tag::UnorderedList)
                {
                    continue;
                }
                paragraph = self.compose_inline(paragraph, child, &FormatContext::default());
            }
            docx = docx.add_paragraph(paragraph);

            // Nested lists follow the item as their own blocks.
            for child in item.elements() {
                if matches!(child.tag, Tag::OrderedList | Tag::UnorderedList) {
                    docx = self.convert_element(docx, child, ctx)?;
                }
            }
        }
        Ok(docx)
    }

    /// Code blocks take the nested code span verbatim.
    fn convert_code_block(&self, docx: Docx, element: &Element) -> Docx {
        let Some(code) = element.find_child(Tag::Code) else {
            return docx;
        };
        let text = code.plain_text();

        let style = self.template.style_id("代码块");
        let mut paragraph = Paragraph::new();
        if let Some(id) = style {
            paragraph = paragraph.style(id);
        }
        let mut run = Run::new().add_text(text);
        if style.is_none() && !self.template.is_bound() {
            run = compose::apply_role(run, &styles::resolve(StyleRole::Code));
        }
        docx.add_paragraph(paragraph.add_run(run))
    }

    /// Horizontal rules denote page boundaries in the source documents, so
    /// they emit a forced page break rather than a visual rule.
    fn page_break(&self, docx: Docx) -> Docx {
        docx.add_paragraph(Paragraph::new().add_run(Run::new().add_break(BreakType::Page)))
    }

    /// Base paragraph carrying the context's alignment and first-line
    /// indent.
    fn block_paragraph(&self, ctx: &FormatContext) -> Paragraph {
        let mut paragraph = Paragraph::new();
        if let Some(align) = ctx.text_align {
            paragraph = paragraph.align(map_alignment(align));
        }
        paragraph.indent(
            None,
            Some(SpecialIndentType::FirstLine(first_line_indent(ctx))),
            None,
            None,
        )
    }
}

/// The context's first-line indent in twips; the fixed body default applies
/// when the context specifies none. An explicit zero stays zero.
fn first_line_indent(ctx: &FormatContext) -> i32 {
    match ctx.text_indent {
        Some(points) => twips(points),
        None => DEFAULT_FIRST_LINE_INDENT,
    }
}

fn twips(points: f32) -> i32 {
    (points * 20.0).round() as i32
}

fn map_alignment(align: TextAlign) -> AlignmentType {
    match align {
        TextAlign::Left => AlignmentType::Left,
        TextAlign::Center => AlignmentType::Center,
        TextAlign::Right => AlignmentType::Right,
    }
}

/// Partition direct children on hard line breaks. A single segment means the
/// paragraph had none.
fn split_on_breaks(children: &[DomNode]) -> Vec<Vec<&DomNode>> {
    let mut segments = Vec::new();
    let mut current = Vec::new();
    for node in children {
        let is_break = matches!(node, DomNode::Element(el) if el.tag == Tag::LineBreak);
        if is_break {
            segments.push(std::mem::take(&mut current));
        } else {
            current.push(node);
        }
    }
    segments.push(current);
    segments
}

fn segment_text(nodes: &[&DomNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        node.collect_text(&mut out);
    }
    out
}

/// All rows of a table in document order, descending through grouping
/// containers such as `thead`/`tbody`.
fn collect_rows(element: &Element) -> Vec<&Element> {
    fn walk<'a>(element: &'a Element, rows: &mut Vec<&'a Element>) {
        for child in element.elements() {
            if child.tag == Tag::TableRow {
                rows.push(child);
            } else {
                walk(child, rows);
            }
        }
    }
    let mut rows = Vec::new();
    walk(element, &mut rows);
    rows
}

fn run_overrides(ctx: &FormatContext) -> RunFormat {
    RunFormat {
        font: ctx.font_name.clone(),
        size_pt: ctx.font_size,
        ..RunFormat::default()
    }
}

impl FormatWriter for DocxWriter {
    fn write_vec(&mut self, document: &Element) -> Result<Vec<u8>> {
        self.list_level = 0;
        let docx = self.build_document(document)?;
        document::finalize(docx)
    }

    fn write_eco(&mut self, _document: &Element, _output: &mut EcoString) -> Result<()> {
        Err("DOCX format does not support string output".into())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use docx_rs::{
        DocumentChild, ParagraphChild, Style, StyleType, TableCellContent, TableChild,
        TableRowChild,
    };

    use super::super::document::paragraph_text;
    use super::*;
    use crate::parser;

    fn convert(markdown: &str) -> Docx {
        convert_with(markdown, BoundTemplate::bind(None))
    }

    fn convert_with(markdown: &str, template: BoundTemplate) -> Docx {
        let root = parser::parse_markdown(markdown);
        DocxWriter::new(template)
            .build_document(&root)
            .expect("conversion")
    }

    fn paragraphs(docx: &Docx) -> Vec<String> {
        docx.document
            .children
            .iter()
            .filter_map(|child| match child {
                DocumentChild::Paragraph(p) => Some(paragraph_text(p)),
                _ => None,
            })
            .collect()
    }

    fn template_with_heading_styles() -> BoundTemplate {
        let docx = Docx::new()
            .add_style(Style::new("1", StyleType::Paragraph).name("标题 1"))
            .add_style(Style::new("2", StyleType::Paragraph).name("标题 2"));
        let mut buffer = Vec::new();
        docx.build()
            .pack(&mut Cursor::new(&mut buffer))
            .expect("pack template");
        BoundTemplate::from_bytes(&buffer).expect("bind template")
    }

    #[test]
    fn headings_use_template_styles_when_bound() {
        let docx = convert_with("# Title", template_with_heading_styles());
        let Some(DocumentChild::Paragraph(heading)) = docx.document.children.first() else {
            panic!("expected a heading paragraph");
        };
        let style = heading.property.style.as_ref().expect("named style");
        assert_eq!(style.val, "1");
    }

    #[test]
    fn headings_fall_back_to_builtin_styles() {
        // The template defines 标题 1/2 only; level three falls back.
        let docx = convert_with("### Third", template_with_heading_styles());
        let Some(DocumentChild::Paragraph(heading)) = docx.document.children.first() else {
            panic!("expected a heading paragraph");
        };
        assert!(heading.property.style.is_none());

        // A blank document seeds the builtin styles itself.
        let docx = convert("### Third");
        let Some(DocumentChild::Paragraph(heading)) = docx.document.children.first() else {
            panic!("expected a heading paragraph");
        };
        let style = heading.property.style.as_ref().expect("builtin style");
        assert_eq!(style.val, "Heading3");
    }

    #[test]
    fn deep_headings_render_as_body_paragraphs() {
        for source in ["##### Five", "###### Six"] {
            let docx = convert(source);
            let Some(DocumentChild::Paragraph(paragraph)) = docx.document.children.first() else {
                panic!("expected a paragraph");
            };
            assert!(paragraph.property.style.is_none());
        }
    }

    #[test]
    fn hard_breaks_split_paragraphs() {
        let docx = convert("first\nsecond\nthird");
        assert_eq!(paragraphs(&docx), vec!["first", "second", "third"]);
    }

    #[test]
    fn centered_container_aligns_every_segment() {
        let docx = convert("<div style=\"text-align: center\">\n\nfirst\nsecond\n\n</div>");
        let aligned = docx
            .document
            .children
            .iter()
            .filter(|child| match child {
                DocumentChild::Paragraph(p) => p.property.alignment.is_some(),
                _ => false,
            })
            .count();
        assert_eq!(aligned, 2);
    }

    #[test]
    fn pseudo_list_lines_get_zero_spacing() {
        let docx = convert("(1) first\n(2) second");
        let spaced = docx
            .document
            .children
            .iter()
            .filter(|child| match child {
                DocumentChild::Paragraph(p) => p.property.line_spacing.is_some(),
                _ => false,
            })
            .count();
        assert_eq!(spaced, 2);
    }

    #[test]
    fn ordered_lists_render_literal_prefixes() {
        let docx = convert("1. alpha\n2. beta\n3. gamma\n");
        assert_eq!(
            paragraphs(&docx),
            vec!["1. alpha", "2. beta", "3. gamma"]
        );
    }

    #[test]
    fn unordered_lists_render_bullets() {
        let docx = convert("- one\n- two\n");
        assert_eq!(paragraphs(&docx), vec!["• one", "• two"]);
    }

    #[test]
    fn nested_lists_recurse_with_fresh_numbering() {
        let docx = convert("1. outer\n   1. inner\n2. last\n");
        assert_eq!(paragraphs(&docx), vec!["1. outer", "1. inner", "2. last"]);
    }

    #[test]
    fn tables_keep_header_and_shape() {
        let docx = convert("| A | B |\n| --- | --- |\n| 1 | 2 |\n");
        let table = docx
            .document
            .children
            .iter()
            .find_map(|child| match child {
                DocumentChild::Table(table) => Some(table),
                _ => None,
            })
            .expect("a table");
        assert_eq!(table.rows.len(), 2);
        let TableChild::TableRow(header) = &table.rows[0];
        assert_eq!(header.cells.len(), 2);
        let TableChild::TableRow(data) = &table.rows[1];
        assert_eq!(data.cells.len(), 2);

        // Header cells carry bold runs.
        let TableRowChild::TableCell(first) = &header.cells[0];
        let Some(TableCellContent::Paragraph(cell_paragraph)) = first.children.first() else {
            panic!("expected a cell paragraph");
        };
        let has_bold_run = cell_paragraph.children.iter().any(|child| {
            matches!(child, ParagraphChild::Run(run) if run.run_property.bold.is_some())
        });
        assert!(has_bold_run);
    }

    #[test]
    fn horizontal_rule_emits_page_break_paragraph() {
        let docx = convert("before\n\n---\n\nafter");
        // Three paragraphs: text, break carrier, text.
        assert_eq!(docx.document.children.len(), 3);
    }

    #[test]
    fn code_blocks_take_code_text_verbatim() {
        let docx = convert("```\nlet x = 1;\n```\n");
        assert_eq!(paragraphs(&docx), vec!["let x = 1;\n"]);
    }

    #[test]
    fn malformed_shapes_fall_through_to_recursion() {
        use crate::dom::{DomNode, Element};
        let mut orphan = Element::new("li");
        orphan.children.push(DomNode::Text("stray item".into()));
        let mut root = Element::new("body");
        root.children.push(DomNode::Element(orphan));

        let docx = DocxWriter::new(BoundTemplate::bind(None))
            .build_document(&root)
            .expect("conversion");
        assert_eq!(paragraphs(&docx), vec!["stray item"]);
    }

    #[test]
    fn default_indent_applies_only_without_override() {
        assert_eq!(first_line_indent(&FormatContext::default()), 420);
        let zero = FormatContext {
            text_indent: Some(0.0),
            ..FormatContext::default()
        };
        assert_eq!(first_line_indent(&zero), 0);
        let custom = FormatContext {
            text_indent: Some(10.5),
            ..FormatContext::default()
        };
        assert_eq!(first_line_indent(&custom), 210);
    }
}
