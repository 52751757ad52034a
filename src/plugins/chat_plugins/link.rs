//! Links
//!
//! Internal targets (`/path`, `#anchor`) become `router-link` elements when
//! client-side routing is on; everything else is a plain anchor.
use crate::mdparser::constants::ROUTER_LINK_TAG;
use crate::mdparser::renderer::{HtmlRenderer, RenderContext, Renderer};
use crate::platform::sanitize_url;

/// Same-site target: an absolute path or a fragment. `//host` is external.
///
/// ```
/// use chatmark::plugins::chat_plugins::link::is_internal;
/// assert!(is_internal("/settings"));
/// assert!(is_internal("#section-2"));
/// assert!(!is_internal("//cdn.example.com/x"));
/// assert!(!is_internal("https://example.com"));
/// ```
pub fn is_internal(url: &str) -> bool {
    (url.starts_with('/') && !url.starts_with("//")) || url.starts_with('#')
}

/// `text_html` is already rendered markup; `url` is raw and gets sanitized.
pub fn render_link(text_html: &str, url: &str, ctx: &RenderContext<'_>) -> String {
    let url = url.trim();
    let href = sanitize_url(url, ctx.urls).into_owned();
    let internal = is_internal(&href);
    let mut fmt = HtmlRenderer::new(ctx.escaper);

    if internal && ctx.options.router_link_rewriting {
        fmt.open(ROUTER_LINK_TAG, &[("to", href), ("class", ctx.class("link"))]);
        fmt.text_raw(text_html);
        fmt.close(ROUTER_LINK_TAG);
        return fmt.into_string();
    }

    let mut attrs = vec![("href", href), ("class", ctx.class("link"))];
    if !internal {
        attrs.push(("target", "_blank".to_string()));
        attrs.push(("rel", "noopener noreferrer".to_string()));
    }
    fmt.open("a", &attrs);
    fmt.text_raw(text_html);
    fmt.close("a");
    fmt.into_string()
}
