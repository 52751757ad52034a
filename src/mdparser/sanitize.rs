//! Allow-list HTML sanitizer applied to every rendered document.
use ammonia::Builder as AmmoniaBuilder;
use once_cell::sync::Lazy;
use std::{borrow::Cow, collections::HashSet};
use tracing::trace;

use crate::mdparser::constants::ROUTER_LINK_TAG;
use crate::platform::{sanitize_url, SchemeSniffer};
use crate::render_config::RenderOptions;

const HTML_TAGS: [&str; 37] = [
    "a", "b", "blockquote", "br", "code", "del", "div", "em", "h1", "h2", "h3", "h4", "h5", "h6",
    "hr", "i", "img", "input", "kbd", "li", "mark", "ol", "p", "pre", "s", "span", "strong",
    "sub", "sup", "table", "tbody", "td", "th", "thead", "tr", "u", "ul",
];

// what pulldown-latex emits
const MATHML_TAGS: [&str; 27] = [
    "math", "annotation", "menclose", "merror", "mfrac", "mi", "mmultiscripts", "mn", "mo",
    "mover", "mpadded", "mphantom", "mroot", "mrow", "ms", "mspace", "msqrt", "mstyle", "msub",
    "msubsup", "msup", "mtable", "mtd", "mtext", "mtr", "munder", "munderover",
];

const MATHML_ATTRIBUTES: [&str; 24] = [
    "accent", "accentunder", "columnalign", "columnspacing", "depth", "display", "displaystyle",
    "encoding", "fence", "form", "height", "largeop", "linethickness", "lspace", "mathvariant",
    "maxsize", "minsize", "movablelimits", "notation", "rowspacing", "rspace", "scriptlevel",
    "stretchy", "width",
];

const GENERIC_ATTRIBUTES: [&str; 8] = [
    "class",
    "id",
    "style",
    "data-diagram",
    "data-kind",
    "data-language",
    "data-math",
    "data-src",
];

static SANITIZER: Lazy<AmmoniaBuilder<'static>> = Lazy::new(|| base_builder(false));
static ROUTER_SANITIZER: Lazy<AmmoniaBuilder<'static>> = Lazy::new(|| base_builder(true));

fn base_builder(router_links: bool) -> AmmoniaBuilder<'static> {
    let mut builder = AmmoniaBuilder::default();

    let mut tags: HashSet<&'static str> = HTML_TAGS.into_iter().chain(MATHML_TAGS).collect();
    if router_links {
        tags.insert(ROUTER_LINK_TAG);
    }
    builder.tags(tags);
    builder.generic_attributes(GENERIC_ATTRIBUTES.into_iter().collect());

    // rel is written by the link renderer, ammonia must not own it
    builder.link_rel(None);
    builder.add_tag_attributes("a", &["href", "target", "rel"]);
    builder.add_tag_attributes("img", &["src", "alt", "loading"]);
    builder.add_tag_attributes("input", &["type", "checked", "disabled"]);
    builder.add_tag_attributes("ol", &["start"]);
    if router_links {
        builder.add_tag_attributes(ROUTER_LINK_TAG, &["to"]);
    }
    for tag in MATHML_TAGS {
        builder.add_tag_attributes(tag, &MATHML_ATTRIBUTES);
    }

    builder.url_schemes(HashSet::from(["http", "https", "mailto", "tel"]));
    builder.attribute_filter(filter_attribute);

    builder
}

fn filter_attribute<'u>(element: &str, attribute: &str, value: &'u str) -> Option<Cow<'u, str>> {
    match attribute {
        "style" => sanitize_style_attribute(value).map(Cow::Owned),
        "type" if element == "input" => value
            .eq_ignore_ascii_case("checkbox")
            .then_some(Cow::Borrowed(value)),
        "href" | "src" | "data-src" | "to" => Some(sanitize_url(value, &SchemeSniffer)),
        _ => Some(Cow::Borrowed(value)),
    }
}

/// Clean `html` against the allow-list. Disallowed tags are unwrapped (their
/// text kept), `script`/`style` content is dropped, and disallowed attributes
/// are removed. A no-op when `options.sanitize` is off.
pub fn sanitize(html: &str, options: &RenderOptions) -> String {
    if !options.sanitize {
        return html.to_string();
    }
    let sanitizer = if options.router_link_rewriting {
        &*ROUTER_SANITIZER
    } else {
        &*SANITIZER
    };
    let cleaned = sanitizer.clean(html).to_string();
    trace!(target: "chatmark::sanitize", before = html.len(), after = cleaned.len(), "sanitized");
    cleaned
}

const TEXT_ALIGNMENTS: [&str; 4] = ["left", "right", "center", "justify"];

// table cells are the only styled output, so only `text-align` survives
fn sanitize_style_attribute(value: &str) -> Option<String> {
    let kept: Vec<String> = value
        .split(';')
        .filter_map(|declaration| {
            let (property, value) = declaration.split_once(':')?;
            let property = property.trim();
            let value = value.trim();
            (property.eq_ignore_ascii_case("text-align")
                && TEXT_ALIGNMENTS.iter().any(|align| value.eq_ignore_ascii_case(align)))
            .then(|| format!("text-align: {}", value.to_ascii_lowercase()))
        })
        .collect();
    (!kept.is_empty()).then(|| kept.join("; "))
}
