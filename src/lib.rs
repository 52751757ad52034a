// useful asserts that's off by default
#![warn(clippy::manual_assert)]
#![warn(clippy::semicolon_if_nothing_returned)]
//
// these are often intentionally not collapsed for readability
#![allow(clippy::collapsible_else_if)]
#![allow(clippy::collapsible_if)]
#![allow(clippy::collapsible_match)]
//
// just a style choice that clippy has no business complaining about
#![allow(clippy::uninlined_format_args)]

//! Markdown to HTML for chat messages.
//!
//! ```rust
//! let html = chatmark::render_markdown("# Hi\n\nSee $x^2$", &Default::default());
//! assert!(html.starts_with(r#"<h1 id="hi" class="md-heading md-h1">Hi</h1>"#));
//! ```
//!
//! The pipeline is: LaTeX/chemistry preprocessing, line-based block
//! tokenizing, AST building, HTML rendering (with the inline pass, math and
//! code highlighting), then allow-list sanitizing. [`MarkdownRenderer`] adds
//! an optional FIFO cache in front of it and lets hosts swap the engines.

pub mod error;
pub mod mdparser;
pub mod platform;
pub mod plugins;
pub mod render_config;

pub use crate::error::{ConfigError, HighlightError, MathError};
pub use crate::mdparser::cache::{CacheConfig, CacheStats, RenderCache};
pub use crate::mdparser::preprocess::preprocess;
pub use crate::mdparser::renderer::{RenderContext, Renderer};
pub use crate::mdparser::sanitize::sanitize;
pub use crate::platform::{HtmlEscaper, UrlParser};
pub use crate::plugins::chat_plugins::highlight::CodeHighlighter;
pub use crate::plugins::chat_plugins::inkjet::warmup;
pub use crate::plugins::chat_plugins::math::{MathEngine, MathOptions, OutputFormat};
pub use crate::render_config::{RenderOptions, RenderOptionsOverride, SyntaxHighlighter};

use crate::mdparser::cache::cache_key;
use crate::mdparser::node::build_ast;
use crate::mdparser::renderer::render_nodes;
use crate::mdparser::tokenizer::tokenize;
use crate::platform::{EntityEscaper, OriginUrlParser};
use crate::plugins::chat_plugins::inkjet::InkjetHighlighter;
use crate::plugins::chat_plugins::math::PulldownLatexEngine;

use once_cell::sync::Lazy;
use std::any::Any;
use std::sync::{Arc, Mutex};
use std::{panic, panic::AssertUnwindSafe, panic::PanicHookInfo};
use tracing::{debug, error};

// storage for the most recent panic message, filled by the quiet hook
static LAST_PANIC: Lazy<Mutex<Option<String>>> = Lazy::new(|| Mutex::new(None));

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    // payload often &str or String, but can be other stuff
    match payload.downcast_ref::<&str>() {
        Some(s) => (*s).to_string(),
        None => match payload.downcast_ref::<String>() {
            Some(s) => s.clone(),
            None => "Payload not str or string".to_string(),
        },
    }
}

fn take_last_panic() -> Option<String> {
    LAST_PANIC
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .take()
}

/// Replace the default panic hook (which prints to stderr) with one that
/// logs through `tracing` and remembers the message. Render panics are
/// always contained; this only changes where their message goes.
pub fn install_quiet_panic_hook() {
    panic::set_hook(Box::new(|info: &PanicHookInfo| {
        let mut msg = panic_message(info.payload());

        // location part of panic - points out line number of file and whatnot
        if let Some(location) = info.location() {
            msg.push_str(&format!(" at {}:{}", location.file(), location.line()));
        }
        debug!(target: "chatmark::render", panic = %msg, "panic captured");

        *LAST_PANIC.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(msg);
    }));
}

/// Renders markdown with a fixed set of engines, default options and an
/// optional cache. Cheap to share between threads.
pub struct MarkdownRenderer {
    options: RenderOptions,
    math: Arc<dyn MathEngine>,
    highlighter: Arc<dyn CodeHighlighter>,
    escaper: Arc<dyn HtmlEscaper>,
    urls: Arc<dyn UrlParser>,
    cache: Option<RenderCache>,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        MarkdownRenderer::builder().build()
    }
}

impl MarkdownRenderer {
    /// Default engines, default options, default cache.
    pub fn new() -> Self {
        MarkdownRenderer::default()
    }

    pub fn builder() -> MarkdownRendererBuilder {
        MarkdownRendererBuilder::default()
    }

    /// Options used when a call brings no overrides.
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn render(&self, markdown: &str) -> String {
        self.get_or_render(markdown, &self.options)
    }

    /// Render with `overrides` merged over this renderer's options.
    pub fn render_with(&self, markdown: &str, overrides: &RenderOptionsOverride) -> String {
        if overrides.is_empty() {
            return self.render(markdown);
        }
        let options = self.options.merged(overrides);
        self.get_or_render(markdown, &options)
    }

    /// Cached output for `(markdown, options)` if fresh, otherwise a full
    /// render. Failed renders are returned but never stored.
    pub fn get_or_render(&self, markdown: &str, options: &RenderOptions) -> String {
        if markdown.is_empty() {
            return String::new();
        }
        let Some(cache) = &self.cache else {
            return self.render_uncached(markdown, options);
        };

        let key = cache_key(markdown, options);
        if let Some(hit) = cache.get(&key) {
            debug!(target: "chatmark::cache", "hit");
            return hit;
        }
        match self.render_contained(markdown, options) {
            Some(html) => {
                cache.insert(key, html.clone());
                html
            }
            None => self.error_fragment(options),
        }
    }

    /// Full pipeline, bypassing the cache.
    pub fn render_uncached(&self, markdown: &str, options: &RenderOptions) -> String {
        if markdown.is_empty() {
            return String::new();
        }
        self.render_contained(markdown, options)
            .unwrap_or_else(|| self.error_fragment(options))
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    /// `None` when the renderer was built without a cache.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(RenderCache::stats)
    }

    fn context<'a>(&'a self, options: &'a RenderOptions) -> RenderContext<'a> {
        RenderContext {
            options,
            math: &*self.math,
            highlighter: match options.syntax_highlighter {
                SyntaxHighlighter::Inkjet => Some(&*self.highlighter),
                SyntaxHighlighter::Disabled => None,
            },
            escaper: &*self.escaper,
            urls: &*self.urls,
        }
    }

    fn render_contained(&self, markdown: &str, options: &RenderOptions) -> Option<String> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.run_pipeline(markdown, options))) {
            Ok(html) => Some(html),
            Err(payload) => {
                let message = take_last_panic().unwrap_or_else(|| panic_message(payload.as_ref()));
                error!(target: "chatmark::render", panic = %message, "markdown rendering failed");
                None
            }
        }
    }

    fn run_pipeline(&self, markdown: &str, options: &RenderOptions) -> String {
        let preprocessed = preprocess(markdown);
        let tokens = tokenize(&preprocessed);
        let nodes = build_ast(&tokens);
        debug!(
            target: "chatmark::render",
            bytes = markdown.len(),
            tokens = tokens.len(),
            nodes = nodes.len(),
            "parsed"
        );

        let html = render_nodes(&nodes, &self.context(options));
        sanitize(&html, options)
    }

    // the configured escaper may be what failed, don't route through it
    fn error_fragment(&self, options: &RenderOptions) -> String {
        format!(
            "<div class=\"{}\">Error rendering markdown</div>",
            v_htmlescape::escape(&options.class("error"))
        )
    }
}

/// Configures a [`MarkdownRenderer`]. Unset collaborators fall back to
/// pulldown-latex math, inkjet highlighting, entity escaping and a
/// `http://localhost/` origin; the cache defaults to 100 entries / 5 minutes.
pub struct MarkdownRendererBuilder {
    options: RenderOptions,
    math: Option<Arc<dyn MathEngine>>,
    highlighter: Option<Arc<dyn CodeHighlighter>>,
    escaper: Option<Arc<dyn HtmlEscaper>>,
    urls: Option<Arc<dyn UrlParser>>,
    cache: Option<CacheConfig>,
}

impl Default for MarkdownRendererBuilder {
    fn default() -> Self {
        MarkdownRendererBuilder {
            options: RenderOptions::default(),
            math: None,
            highlighter: None,
            escaper: None,
            urls: None,
            cache: Some(CacheConfig::default()),
        }
    }
}

impl MarkdownRendererBuilder {
    pub fn options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn math_engine(mut self, engine: Arc<dyn MathEngine>) -> Self {
        self.math = Some(engine);
        self
    }

    pub fn code_highlighter(mut self, highlighter: Arc<dyn CodeHighlighter>) -> Self {
        self.highlighter = Some(highlighter);
        self
    }

    pub fn escaper(mut self, escaper: Arc<dyn HtmlEscaper>) -> Self {
        self.escaper = Some(escaper);
        self
    }

    pub fn url_parser(mut self, urls: Arc<dyn UrlParser>) -> Self {
        self.urls = Some(urls);
        self
    }

    /// Resolve relative link targets against `origin`.
    pub fn origin(self, origin: &str) -> Result<Self, ConfigError> {
        let parser = OriginUrlParser::new(origin)?;
        Ok(self.url_parser(Arc::new(parser)))
    }

    pub fn cache(mut self, config: CacheConfig) -> Self {
        self.cache = Some(config);
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    pub fn build(self) -> MarkdownRenderer {
        MarkdownRenderer {
            options: self.options,
            math: self
                .math
                .unwrap_or_else(|| Arc::new(PulldownLatexEngine::default())),
            highlighter: self
                .highlighter
                .unwrap_or_else(|| Arc::new(InkjetHighlighter)),
            escaper: self.escaper.unwrap_or_else(|| Arc::new(EntityEscaper)),
            urls: self
                .urls
                .unwrap_or_else(|| Arc::new(OriginUrlParser::default())),
            cache: self.cache.map(RenderCache::new),
        }
    }
}

static DEFAULT_RENDERER: Lazy<MarkdownRenderer> =
    Lazy::new(|| MarkdownRenderer::builder().without_cache().build());

/// Render `markdown` with the default engines and no cache.
pub fn render_markdown(markdown: &str, options: &RenderOptions) -> String {
    DEFAULT_RENDERER.render_uncached(markdown, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Exploding;

    impl HtmlEscaper for Exploding {
        fn escape<'a>(&self, _: &'a str) -> std::borrow::Cow<'a, str> {
            panic!("escaper bug");
        }
    }

    #[test]
    fn empty_input() {
        assert_eq!(render_markdown("", &RenderOptions::default()), "");
        assert_eq!(MarkdownRenderer::new().render(""), "");
    }

    #[test]
    fn panic_message_downcasts() {
        let payload: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(payload.as_ref()), "static");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "Payload not str or string");
    }

    #[test]
    fn pipeline_failure_is_contained_and_not_cached() {
        let renderer = MarkdownRenderer::builder()
            .escaper(Arc::new(Exploding))
            .build();
        let html = renderer.render("# hi");
        assert!(html.contains("Error rendering markdown"), "{html}");
        assert_eq!(renderer.cache_stats().map(|s| s.size), Some(0));
    }

    #[test]
    fn bad_origin() {
        assert!(matches!(
            MarkdownRenderer::builder().origin("not a url"),
            Err(ConfigError::Origin(_))
        ));
    }
}
