//! HTML output: a small tag writer, the per-render context, and the
//! node-to-markup mapping.
use itertools::Itertools;
use once_cell::sync::Lazy;
use std::panic::{self, AssertUnwindSafe};
use tracing::warn;

use crate::mdparser::inline::render_inline;
use crate::mdparser::node::{RenderNode, Table, TaskItem};
use crate::platform::{EntityEscaper, HtmlEscaper, OriginUrlParser, UrlParser};
use crate::plugins::chat_plugins::highlight::{render_code_block, render_diagram, CodeHighlighter};
use crate::plugins::chat_plugins::inkjet::InkjetHighlighter;
use crate::plugins::chat_plugins::math::{
    render_math, MathEngine, MathPlacement, PulldownLatexEngine,
};
use crate::render_config::{RenderOptions, SyntaxHighlighter};
use crate::panic_message;

/// Each coordinate is an attribute name and its (unescaped) value.
pub trait Renderer {
    fn open(&mut self, tag: &str, attrs: &[(&str, String)]);
    fn close(&mut self, tag: &str);
    fn self_close(&mut self, tag: &str, attrs: &[(&str, String)]);
    /// Escaped text.
    fn text(&mut self, text: &str);
    /// Markup that is already HTML.
    fn text_raw(&mut self, text: &str);
    /// Newline, unless output is empty or already ends with one.
    fn cr(&mut self);
}

pub struct HtmlRenderer<'a> {
    escaper: &'a dyn HtmlEscaper,
    result: String,
}

impl<'a> HtmlRenderer<'a> {
    pub fn new(escaper: &'a dyn HtmlEscaper) -> Self {
        HtmlRenderer {
            escaper,
            result: String::new(),
        }
    }

    pub fn into_string(self) -> String {
        self.result
    }

    fn make_attrs(&mut self, attrs: &[(&str, String)]) {
        for (name, value) in attrs {
            self.result.push(' ');
            self.result.push_str(name);
            self.result.push_str("=\"");
            self.result.push_str(&self.escaper.escape(value));
            self.result.push('"');
        }
    }
}

impl Renderer for HtmlRenderer<'_> {
    fn open(&mut self, tag: &str, attrs: &[(&str, String)]) {
        self.result.push('<');
        self.result.push_str(tag);
        self.make_attrs(attrs);
        self.result.push('>');
    }

    fn close(&mut self, tag: &str) {
        self.result.push_str("</");
        self.result.push_str(tag);
        self.result.push('>');
    }

    fn self_close(&mut self, tag: &str, attrs: &[(&str, String)]) {
        // html5 void element, no trailing slash
        self.open(tag, attrs);
    }

    fn text(&mut self, text: &str) {
        let escaped = self.escaper.escape(text);
        self.result.push_str(&escaped);
    }

    fn text_raw(&mut self, text: &str) {
        self.result.push_str(text);
    }

    fn cr(&mut self) {
        if !self.result.is_empty() && !self.result.ends_with('\n') {
            self.result.push('\n');
        }
    }
}

static DEFAULT_MATH_ENGINE: PulldownLatexEngine = PulldownLatexEngine::new(true);
static DEFAULT_HIGHLIGHTER: InkjetHighlighter = InkjetHighlighter;
static DEFAULT_ESCAPER: EntityEscaper = EntityEscaper;
static DEFAULT_URL_PARSER: Lazy<OriginUrlParser> = Lazy::new(OriginUrlParser::default);

/// Everything node rendering needs: resolved options plus the collaborators.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub options: &'a RenderOptions,
    pub math: &'a dyn MathEngine,
    /// `None` when highlighting is switched off.
    pub highlighter: Option<&'a dyn CodeHighlighter>,
    pub escaper: &'a dyn HtmlEscaper,
    pub urls: &'a dyn UrlParser,
}

impl<'a> RenderContext<'a> {
    /// Context using the built-in engines.
    pub fn new(options: &'a RenderOptions) -> Self {
        RenderContext {
            options,
            math: &DEFAULT_MATH_ENGINE,
            highlighter: match options.syntax_highlighter {
                SyntaxHighlighter::Inkjet => Some(&DEFAULT_HIGHLIGHTER),
                SyntaxHighlighter::Disabled => None,
            },
            escaper: &DEFAULT_ESCAPER,
            urls: &*DEFAULT_URL_PARSER,
        }
    }

    pub fn class(&self, name: &str) -> String {
        self.options.class(name)
    }

    pub fn escape(&self, text: &str) -> String {
        self.escaper.escape(text).into_owned()
    }
}

/// Render nodes in order, newline separated. A node whose rendering panics
/// is replaced by the unknown-node fallback; its siblings are unaffected.
pub fn render_nodes(nodes: &[RenderNode], ctx: &RenderContext<'_>) -> String {
    nodes
        .iter()
        .map(|node| render_node_contained(node, ctx))
        .filter(|html| !html.is_empty())
        .join("\n")
}

fn render_node_contained(node: &RenderNode, ctx: &RenderContext<'_>) -> String {
    match panic::catch_unwind(AssertUnwindSafe(|| render_node(node, ctx))) {
        Ok(html) => html,
        Err(payload) => {
            warn!(
                target: "chatmark::render",
                kind = node.kind(),
                panic = %panic_message(payload.as_ref()),
                "node rendering failed, using fallback"
            );
            render_unknown(node.kind(), &node_text(node), ctx)
        }
    }
}

/// Plain source text of a node, for fallbacks.
fn node_text(node: &RenderNode) -> String {
    match node {
        RenderNode::Heading { content, .. }
        | RenderNode::Paragraph { content }
        | RenderNode::Unknown { content, .. } => content.clone(),
        RenderNode::CodeBlock { code, .. } | RenderNode::Diagram { code } => code.clone(),
        RenderNode::Math { expression, .. } => expression.clone(),
        RenderNode::Table(table) => table.headers.join(" | "),
        RenderNode::Blockquote { children } => children.iter().map(node_text).join("\n"),
        RenderNode::List { items, .. } => items.join("\n"),
        RenderNode::TaskList { items } => items.iter().map(|item| &item.content).join("\n"),
        RenderNode::HorizontalRule => String::new(),
    }
}

fn render_unknown(kind: &str, content: &str, ctx: &RenderContext<'_>) -> String {
    let mut fmt = HtmlRenderer::new(ctx.escaper);
    fmt.open(
        "div",
        &[("class", ctx.class("unknown")), ("data-kind", kind.to_string())],
    );
    fmt.text(content);
    fmt.close("div");
    fmt.into_string()
}

pub fn render_node(node: &RenderNode, ctx: &RenderContext<'_>) -> String {
    let mut fmt = HtmlRenderer::new(ctx.escaper);
    match node {
        RenderNode::Heading { level, id, content } => {
            let tag = format!("h{}", (*level).clamp(1, 6));
            let mut attrs = Vec::with_capacity(2);
            if ctx.options.heading_ids {
                if let Some(id) = id {
                    attrs.push(("id", id.clone()));
                }
            }
            attrs.push(("class", format!("{} {}", ctx.class("heading"), ctx.class(&tag))));
            fmt.open(&tag, &attrs);
            fmt.text_raw(&render_inline(content, ctx));
            fmt.close(&tag);
        }
        RenderNode::Paragraph { content } => {
            fmt.open("p", &[("class", ctx.class("paragraph"))]);
            fmt.text_raw(&render_inline(content, ctx));
            fmt.close("p");
        }
        RenderNode::CodeBlock { language, code } => {
            fmt.text_raw(&render_code_block(code, language.as_deref(), ctx));
        }
        RenderNode::Diagram { code } => {
            fmt.text_raw(&render_diagram(code, ctx));
        }
        RenderNode::Math { expression, inline } => {
            let placement = if *inline {
                MathPlacement::Inline
            } else {
                MathPlacement::Block
            };
            fmt.text_raw(&render_math(expression, placement, ctx));
        }
        RenderNode::Table(table) => render_table(table, ctx, &mut fmt),
        RenderNode::Blockquote { children } => {
            fmt.open("blockquote", &[("class", ctx.class("blockquote"))]);
            fmt.text_raw(&render_nodes(children, ctx));
            fmt.close("blockquote");
        }
        RenderNode::List {
            ordered,
            start,
            items,
        } => {
            let (tag, kind) = if *ordered {
                ("ol", "ordered-list")
            } else {
                ("ul", "unordered-list")
            };
            let mut attrs = vec![("class", format!("{} {}", ctx.class("list"), ctx.class(kind)))];
            if let Some(start) = start.filter(|s| *ordered && *s != 1) {
                attrs.push(("start", start.to_string()));
            }
            fmt.open(tag, &attrs);
            for item in items {
                fmt.open("li", &[("class", ctx.class("list-item"))]);
                fmt.text_raw(&render_inline(item, ctx));
                fmt.close("li");
            }
            fmt.close(tag);
        }
        RenderNode::TaskList { items } => render_task_list(items, ctx, &mut fmt),
        RenderNode::HorizontalRule => {
            fmt.self_close("hr", &[("class", ctx.class("horizontal-rule"))]);
        }
        RenderNode::Unknown { kind, content } => {
            fmt.text_raw(&render_unknown(kind, content, ctx));
        }
    }
    fmt.into_string()
}

fn render_task_list(items: &[TaskItem], ctx: &RenderContext<'_>, fmt: &mut dyn Renderer) {
    fmt.open("ul", &[("class", ctx.class("task-list"))]);
    for item in items {
        fmt.open("li", &[("class", ctx.class("task-item"))]);
        let mut checkbox = vec![
            ("type", "checkbox".to_string()),
            ("class", ctx.class("task-checkbox")),
        ];
        if item.checked {
            checkbox.push(("checked", String::new()));
        }
        checkbox.push(("disabled", String::new()));
        fmt.self_close("input", &checkbox);
        fmt.open("span", &[("class", ctx.class("task-content"))]);
        fmt.text_raw(&render_inline(&item.content, ctx));
        fmt.close("span");
        fmt.close("li");
    }
    fmt.close("ul");
}

fn render_table(table: &Table, ctx: &RenderContext<'_>, fmt: &mut dyn Renderer) {
    let align = |index: usize| {
        let alignment = table.alignment.get(index).copied().unwrap_or_default();
        format!("text-align: {}", alignment.as_css())
    };

    let mut table_class = ctx.class("table");
    if !ctx.options.table_classes.trim().is_empty() {
        table_class.push(' ');
        table_class.push_str(ctx.options.table_classes.trim());
    }

    fmt.open("table", &[("class", table_class)]);
    fmt.open("thead", &[("class", ctx.class("table-head"))]);
    fmt.open("tr", &[("class", ctx.class("table-row"))]);
    for (index, header) in table.headers.iter().enumerate() {
        fmt.open(
            "th",
            &[("class", ctx.class("table-header")), ("style", align(index))],
        );
        fmt.text_raw(&render_inline(header, ctx));
        fmt.close("th");
    }
    fmt.close("tr");
    fmt.close("thead");

    fmt.open("tbody", &[("class", ctx.class("table-body"))]);
    for row in &table.rows {
        fmt.open("tr", &[("class", ctx.class("table-row"))]);
        for (index, cell) in row.iter().enumerate() {
            fmt.open(
                "td",
                &[("class", ctx.class("table-cell")), ("style", align(index))],
            );
            fmt.text_raw(&render_inline(cell, ctx));
            fmt.close("td");
        }
        fmt.close("tr");
    }
    fmt.close("tbody");
    fmt.close("table");
}
