//! Code blocks and diagrams.
use once_cell::sync::Lazy;
use regex::Regex;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

use crate::error::HighlightError;
use crate::mdparser::renderer::{HtmlRenderer, RenderContext, Renderer};
use crate::panic_message;

// info strings like `c++`, `objective-c`, `c#`, `shell.session`
static LANGUAGE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w+#.-]{1,32}$").unwrap());

/// Syntax highlighter for fenced code.
pub trait CodeHighlighter: Send + Sync {
    /// Highlighted HTML for `code`. Token spans carry classes prefixed with
    /// `class_prefix`; all source text in the result must be escaped.
    fn highlight(&self, code: &str, language: &str, class_prefix: &str) -> Result<String, HighlightError>;
}

fn highlight_contained(code: &str, language: &str, ctx: &RenderContext<'_>) -> Option<String> {
    let highlighter = ctx.highlighter?;
    let prefix = &ctx.options.scoped_css_prefix;
    match panic::catch_unwind(AssertUnwindSafe(|| highlighter.highlight(code, language, prefix))) {
        Ok(Ok(html)) => Some(html),
        Ok(Err(err)) => {
            debug!(target: "chatmark::highlight", error = %err, "highlighting skipped");
            None
        }
        Err(payload) => {
            warn!(
                target: "chatmark::highlight",
                language,
                panic = %panic_message(payload.as_ref()),
                "highlighter panicked"
            );
            None
        }
    }
}

/// Fenced code as a container div around `pre > code`. Falls back to the
/// escaped code when there is no usable language or highlighting fails.
pub fn render_code_block(code: &str, language: Option<&str>, ctx: &RenderContext<'_>) -> String {
    let language = language
        .map(str::trim)
        .filter(|lang| LANGUAGE_REGEX.is_match(lang));

    let highlighted = language.and_then(|lang| highlight_contained(code, lang, ctx));

    let mut container_class = ctx.class("code-block");
    let extra = ctx.options.code_block_classes.trim();
    if !extra.is_empty() {
        container_class.push(' ');
        container_class.push_str(extra);
    }
    if highlighted.is_some() {
        container_class.push(' ');
        container_class.push_str(&ctx.class("highlighted"));
    }

    let mut container_attrs = vec![("class", container_class)];
    let mut code_class = ctx.class("code");
    if let Some(lang) = language {
        container_attrs.push(("data-language", lang.to_string()));
        code_class.push_str(" language-");
        code_class.push_str(lang);
    }

    let mut fmt = HtmlRenderer::new(ctx.escaper);
    fmt.open("div", &container_attrs);
    fmt.open("pre", &[("class", ctx.class("pre"))]);
    fmt.open("code", &[("class", code_class)]);
    match highlighted {
        Some(html) => fmt.text_raw(&html),
        None => fmt.text(code),
    }
    fmt.close("code");
    fmt.close("pre");
    fmt.close("div");
    fmt.into_string()
}

/// Mermaid source left for the client-side diagram renderer. With diagrams
/// disabled it is shown as an ordinary code block.
pub fn render_diagram(code: &str, ctx: &RenderContext<'_>) -> String {
    if !ctx.options.enable_diagrams {
        return render_code_block(code, Some("mermaid"), ctx);
    }
    let mut fmt = HtmlRenderer::new(ctx.escaper);
    fmt.open(
        "div",
        &[("class", ctx.class("diagram")), ("data-diagram", "mermaid".to_string())],
    );
    fmt.open("pre", &[("class", ctx.class("mermaid"))]);
    fmt.text(code);
    fmt.close("pre");
    fmt.close("div");
    fmt.into_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_config::{RenderOptions, SyntaxHighlighter};

    struct Upper;

    impl CodeHighlighter for Upper {
        fn highlight(&self, code: &str, language: &str, prefix: &str) -> Result<String, HighlightError> {
            match language {
                "shout" => Ok(format!("<span class=\"{prefix}hljs-keyword\">{}</span>", code.to_uppercase())),
                "panic" => panic!("highlighter bug"),
                other => Err(HighlightError::UnsupportedLanguage {
                    language: other.to_string(),
                }),
            }
        }
    }

    fn block(code: &str, language: Option<&str>, options: &RenderOptions) -> String {
        let ctx = RenderContext {
            highlighter: Some(&Upper),
            ..RenderContext::new(options)
        };
        render_code_block(code, language, &ctx)
    }

    #[test]
    fn highlighted_block() {
        assert_eq!(
            block("hi", Some("shout"), &RenderOptions::default()),
            concat!(
                r#"<div class="md-code-block code-block md-highlighted" data-language="shout">"#,
                r#"<pre class="md-pre"><code class="md-code language-shout">"#,
                r#"<span class="md-hljs-keyword">HI</span></code></pre></div>"#
            )
        );
    }

    #[test]
    fn unsupported_language_is_escaped_text() {
        assert_eq!(
            block("a < b", Some("brainfart"), &RenderOptions::default()),
            concat!(
                r#"<div class="md-code-block code-block" data-language="brainfart">"#,
                r#"<pre class="md-pre"><code class="md-code language-brainfart">a &lt; b</code></pre></div>"#
            )
        );
    }

    #[test]
    fn highlighter_panic_is_contained() {
        let html = block("x", Some("panic"), &RenderOptions::default());
        assert!(html.contains(r#"<code class="md-code language-panic">x</code>"#));
    }

    #[test]
    fn no_language_and_hostile_language() {
        let plain = block("x", None, &RenderOptions::default());
        assert!(plain.contains(r#"<code class="md-code">x</code>"#));
        assert!(!plain.contains("data-language"));

        let hostile = block("x", Some(r#""><script>"#), &RenderOptions::default());
        assert!(!hostile.contains("<script>"));
        assert!(hostile.contains(r#"<code class="md-code">x</code>"#));
    }

    #[test]
    fn highlighting_disabled() {
        let options = RenderOptions {
            syntax_highlighter: SyntaxHighlighter::Disabled,
            ..Default::default()
        };
        let html = render_code_block("fn x() {}", Some("rust"), &RenderContext::new(&options));
        assert!(html.contains(r#"<code class="md-code language-rust">fn x() {}</code>"#));
        assert!(!html.contains("md-highlighted"));
    }

    #[test]
    fn diagrams() {
        let options = RenderOptions::default();
        assert_eq!(
            render_diagram("A --> B", &RenderContext::new(&options)),
            r#"<div class="md-diagram" data-diagram="mermaid"><pre class="md-mermaid">A --&gt; B</pre></div>"#
        );
        let options = RenderOptions {
            enable_diagrams: false,
            syntax_highlighter: SyntaxHighlighter::Disabled,
            ..Default::default()
        };
        assert!(render_diagram("A --> B", &RenderContext::new(&options))
            .contains(r#"<code class="md-code language-mermaid">A --&gt; B</code>"#));
    }
}
