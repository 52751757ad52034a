//! Images
use crate::mdparser::renderer::{HtmlRenderer, RenderContext, Renderer};
use crate::platform::sanitize_url;

/// With lazy images the real source goes to `data-src` and `src` stays
/// empty until the page swaps it in.
pub fn render_image(alt: &str, src: &str, ctx: &RenderContext<'_>) -> String {
    let src = sanitize_url(src.trim(), ctx.urls).into_owned();
    let mut fmt = HtmlRenderer::new(ctx.escaper);
    let attrs = if ctx.options.lazy_images {
        vec![
            ("class", ctx.class("image")),
            ("src", String::new()),
            ("data-src", src),
            ("alt", alt.to_string()),
            ("loading", "lazy".to_string()),
        ]
    } else {
        vec![
            ("class", ctx.class("image")),
            ("src", src),
            ("alt", alt.to_string()),
        ]
    };
    fmt.self_close("img", &attrs);
    fmt.into_string()
}
