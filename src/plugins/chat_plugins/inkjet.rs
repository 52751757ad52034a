//! Syntax highlighting for code blocks
use inkjet::{
    constants::HIGHLIGHT_CLASS_NAMES, formatter::Formatter, tree_sitter_highlight::HighlightEvent,
    Highlighter, Language,
};
use std::cell::RefCell;
use std::fmt::Write;
use tracing::trace;

use crate::error::HighlightError;
use crate::mdparser::constants::INKJET_TO_HLJS_CLASS_MAP;
use crate::plugins::chat_plugins::highlight::CodeHighlighter;

// the highlighter is mutable while highlighting, so each thread keeps its own
thread_local! {
    static HIGHLIGHTER: RefCell<Highlighter> =
        RefCell::new(Highlighter::new());
}

/// Writes hljs class names so the front-end themes apply.
pub struct HljsCompatibleFormatter<'a> {
    pub class_prefix: &'a str,
}

impl HljsCompatibleFormatter<'_> {
    fn classes(&self, inkjet_class: &str) -> String {
        match INKJET_TO_HLJS_CLASS_MAP.get(inkjet_class) {
            Some(mapped) => mapped
                .split(' ')
                .map(|class| format!("{}{class}", self.class_prefix))
                .collect::<Vec<_>>()
                .join(" "),
            None => format!("{}hljs-{}", self.class_prefix, inkjet_class.replace(' ', "-")),
        }
    }
}

// based on the default html formatter: https://docs.rs/crate/inkjet/latest/source/src/formatter/html.rs
impl Formatter for HljsCompatibleFormatter<'_> {
    fn write<W>(&self, source: &str, writer: &mut W, event: HighlightEvent) -> inkjet::Result<()>
    where
        W: Write,
    {
        match event {
            HighlightEvent::Source { start, end } => {
                let span = source.get(start..end).unwrap_or_default();
                write!(writer, "{}", v_htmlescape::escape(span))?;
            }
            HighlightEvent::HighlightStart(idx) => {
                let inkjet_class = HIGHLIGHT_CLASS_NAMES.get(idx.0).copied().unwrap_or("text");
                write!(writer, "<span class=\"{}\">", self.classes(inkjet_class))?;
            }
            HighlightEvent::HighlightEnd => {
                writer.write_str("</span>")?;
            }
        }
        Ok(())
    }
}

/// Tree-sitter highlighting through inkjet.
#[derive(Debug, Default, Clone, Copy)]
pub struct InkjetHighlighter;

impl CodeHighlighter for InkjetHighlighter {
    fn highlight(&self, code: &str, language: &str, class_prefix: &str) -> Result<String, HighlightError> {
        let lang = Language::from_token(language).ok_or_else(|| HighlightError::UnsupportedLanguage {
            language: language.to_string(),
        })?;
        trace!(target: "chatmark::highlight", ?lang, bytes = code.len(), "highlighting");

        let formatter = HljsCompatibleFormatter { class_prefix };
        HIGHLIGHTER
            .with_borrow_mut(|h| h.highlight_to_string(lang, &formatter, code.to_owned()))
            .map_err(|err| HighlightError::Highlight {
                language: language.to_string(),
                message: err.to_string(),
            })
    }
}

/// call all configs to ensure they're all built
pub fn warmup() {
    for lang in Language::ALL_LANGS.iter() {
        let _ = lang.config();
    }
}
