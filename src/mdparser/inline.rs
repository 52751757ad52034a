//! Inline formatting inside block text.
//!
//! Two passes. The first scans for constructs whose content must not be
//! touched by escaping or emphasis (code, math, links, images, escapes, raw
//! tags, bare URLs), renders each one and leaves a numbered placeholder in
//! its place. The second escapes what is left, applies emphasis and line
//! breaks, then swaps the placeholders back in.
use fancy_regex::Regex as FancyRegex;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

use crate::mdparser::constants::{MAX_EMPHASIS_DEPTH, PLACEHOLDER_CLOSE, PLACEHOLDER_OPEN};
use crate::mdparser::preprocess::{DISPLAY_MATH_REGEX, INLINE_MATH_REGEX};
use crate::mdparser::renderer::RenderContext;
use crate::plugins::chat_plugins::image::render_image;
use crate::plugins::chat_plugins::link::render_link;
use crate::plugins::chat_plugins::math::{render_math, MathPlacement};
use crate::plugins::extra::typographer::typographer;

static ESCAPE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\([!-/:-@\[-`{-~])").unwrap());

static CODE_SPAN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"``(?P<double>[^`]|[^`].*?[^`])``|`(?P<single>[^`]+)`").unwrap());

static IMAGE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"!\[(?P<alt>[^\]]*)\]\((?P<src>(?:[^()\s]|\([^()\s]*\))*)(?:\s+"[^"]*")?\)"#)
        .unwrap()
});

static LINK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\[(?P<text>(?:!\[[^\]]*\]\([^)\s]*\)|[^\]])+)\]\((?P<url>(?:[^()\s]|\([^()\s]*\))+)(?:\s+"[^"]*")?\)"#)
        .unwrap()
});

static RAW_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"</?[A-Za-z][A-Za-z0-9-]*(?:\s+[A-Za-z_:][\w:.-]*(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'=<>`]+))?)*\s*/?>"#)
        .unwrap()
});

static PLACEHOLDER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("{PLACEHOLDER_OPEN}([0-9]+){PLACEHOLDER_CLOSE}")).unwrap()
});

// one pass, leftmost match wins; the underscore forms must sit on word boundaries
static EMPHASIS_REGEX: Lazy<FancyRegex> = Lazy::new(|| {
    FancyRegex::new(concat!(
        r"\*\*(?P<strong_star>[^\s](?:.*?[^\s])?)\*\*(?!\*)",
        r"|(?<!\w)__(?P<strong_under>[^\s_](?:.*?[^\s])?)__(?!\w)",
        r"|~~(?P<strike>[^\s~](?:.*?[^\s])?)~~",
        r"|\*(?P<em_star>[^\s*](?:[^*]*?[^\s*])?)\*",
        r"|(?<!\w)_(?P<em_under>[^\s_](?:[^_]*?[^\s_])?)_(?!\w)",
    ))
    .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InlineRule {
    Escape,
    DisplayMath,
    InlineMath,
    Code,
    Image,
    Link,
    RawHtml,
    #[cfg(feature = "linkify")]
    Autolink,
}

#[derive(Debug, Clone)]
enum Piece {
    Literal(String),
    Code(String),
    Math { expression: String, display: bool },
    Image { alt: String, src: String },
    Link { text: String, url: String },
    RawHtml(String),
    #[cfg(feature = "linkify")]
    Autolink(String),
}

#[derive(Debug, Clone)]
struct Span {
    start: usize,
    end: usize,
    piece: Piece,
}

enum Candidate {
    Unsearched,
    Found(Span),
    Exhausted,
}

impl InlineRule {
    fn active(ctx: &RenderContext<'_>, allow_links: bool) -> Vec<InlineRule> {
        let mut rules = vec![
            InlineRule::Escape,
            InlineRule::DisplayMath,
            InlineRule::InlineMath,
            InlineRule::Code,
            InlineRule::Image,
        ];
        if allow_links {
            rules.push(InlineRule::Link);
        }
        if ctx.options.allow_raw_html {
            rules.push(InlineRule::RawHtml);
        }
        #[cfg(feature = "linkify")]
        if allow_links && ctx.options.linkify {
            rules.push(InlineRule::Autolink);
        }
        rules
    }

    /// First match of this rule starting at or after `from`.
    fn find(self, text: &str, from: usize) -> Option<Span> {
        match self {
            InlineRule::Escape => {
                let caps = ESCAPE_REGEX.captures_at(text, from)?;
                let whole = caps.get(0)?;
                Some(Span {
                    start: whole.start(),
                    end: whole.end(),
                    piece: Piece::Literal(caps[1].to_string()),
                })
            }
            InlineRule::DisplayMath | InlineRule::InlineMath => {
                let display = self == InlineRule::DisplayMath;
                let regex = if display {
                    &*DISPLAY_MATH_REGEX
                } else {
                    &*INLINE_MATH_REGEX
                };
                let caps = regex.captures_from_pos(text, from).ok()??;
                let whole = caps.get(0)?;
                Some(Span {
                    start: whole.start(),
                    end: whole.end(),
                    piece: Piece::Math {
                        expression: caps.name("math")?.as_str().to_string(),
                        display,
                    },
                })
            }
            InlineRule::Code => {
                let caps = CODE_SPAN_REGEX.captures_at(text, from)?;
                let whole = caps.get(0)?;
                let code = caps.name("double").or_else(|| caps.name("single"))?;
                Some(Span {
                    start: whole.start(),
                    end: whole.end(),
                    piece: Piece::Code(code.as_str().to_string()),
                })
            }
            InlineRule::Image => {
                let caps = IMAGE_REGEX.captures_at(text, from)?;
                let whole = caps.get(0)?;
                Some(Span {
                    start: whole.start(),
                    end: whole.end(),
                    piece: Piece::Image {
                        alt: caps["alt"].to_string(),
                        src: caps["src"].to_string(),
                    },
                })
            }
            InlineRule::Link => {
                let caps = LINK_REGEX.captures_at(text, from)?;
                let whole = caps.get(0)?;
                Some(Span {
                    start: whole.start(),
                    end: whole.end(),
                    piece: Piece::Link {
                        text: caps["text"].to_string(),
                        url: caps["url"].to_string(),
                    },
                })
            }
            InlineRule::RawHtml => {
                let whole = RAW_TAG_REGEX.find_at(text, from)?;
                Some(Span {
                    start: whole.start(),
                    end: whole.end(),
                    piece: Piece::RawHtml(whole.as_str().to_string()),
                })
            }
            #[cfg(feature = "linkify")]
            InlineRule::Autolink => {
                let mut finder = linkify::LinkFinder::new();
                finder.kinds(&[linkify::LinkKind::Url]);
                let link = finder.links(&text[from..]).next()?;
                Some(Span {
                    start: from + link.start(),
                    end: from + link.end(),
                    piece: Piece::Autolink(link.as_str().to_string()),
                })
            }
        }
    }
}

/// Render inline markdown to HTML. Total: unmatched markers stay literal.
pub fn render_inline(text: &str, ctx: &RenderContext<'_>) -> String {
    render_inline_with(text, ctx, true)
}

fn render_inline_with(text: &str, ctx: &RenderContext<'_>, allow_links: bool) -> String {
    if text.is_empty() {
        return String::new();
    }

    let source: Cow<str> = if text.contains([PLACEHOLDER_OPEN, PLACEHOLDER_CLOSE]) {
        Cow::Owned(text.replace([PLACEHOLDER_OPEN, PLACEHOLDER_CLOSE], ""))
    } else {
        Cow::Borrowed(text)
    };

    let rules = InlineRule::active(ctx, allow_links);
    let mut candidates: Vec<Candidate> = rules.iter().map(|_| Candidate::Unsearched).collect();
    let mut fragments: Vec<String> = Vec::new();
    let mut skeleton = String::with_capacity(source.len());
    let mut pos = 0;

    loop {
        for (candidate, rule) in candidates.iter_mut().zip(&rules) {
            let stale = match candidate {
                Candidate::Unsearched => true,
                Candidate::Found(span) => span.start < pos,
                Candidate::Exhausted => false,
            };
            if stale {
                *candidate = match rule.find(&source, pos) {
                    Some(span) if span.end > span.start => Candidate::Found(span),
                    _ => Candidate::Exhausted,
                };
            }
        }

        // leftmost wins; ties go to the earlier rule
        let best = candidates
            .iter()
            .enumerate()
            .filter_map(|(index, candidate)| match candidate {
                Candidate::Found(span) => Some((span.start, index)),
                _ => None,
            })
            .min();
        let Some((_, index)) = best else { break };
        let Candidate::Found(span) = std::mem::replace(&mut candidates[index], Candidate::Unsearched)
        else {
            break;
        };

        skeleton.push_str(&source[pos..span.start]);
        skeleton.push(PLACEHOLDER_OPEN);
        skeleton.push_str(&fragments.len().to_string());
        skeleton.push(PLACEHOLDER_CLOSE);
        fragments.push(render_piece(&span.piece, ctx));
        pos = span.end;
    }
    skeleton.push_str(&source[pos..]);

    let typeset = if ctx.options.typographer {
        typographer(&skeleton)
    } else {
        Cow::Borrowed(skeleton.as_str())
    };
    let escaped = ctx.escape(&typeset);
    let emphasized = emphasize(&escaped, 0);
    let broken = line_breaks(&emphasized, ctx.options.breaks);
    restore(&broken, &fragments)
}

fn render_piece(piece: &Piece, ctx: &RenderContext<'_>) -> String {
    match piece {
        Piece::Literal(literal) => ctx.escape(literal),
        Piece::Code(code) => format!(
            "<code class=\"{}\">{}</code>",
            ctx.escape(&ctx.class("inline-code")),
            ctx.escape(code)
        ),
        Piece::Math {
            expression,
            display,
        } => {
            let placement = if *display {
                MathPlacement::InlineDisplay
            } else {
                MathPlacement::Inline
            };
            render_math(expression, placement, ctx)
        }
        Piece::Image { alt, src } => render_image(alt, src, ctx),
        Piece::Link { text, url } => {
            // link text gets full inline formatting, minus nested links
            let inner = stacker::maybe_grow(64 * 1024, 1024 * 1024, || {
                render_inline_with(text, ctx, false)
            });
            render_link(&inner, url, ctx)
        }
        Piece::RawHtml(tag) => tag.clone(),
        #[cfg(feature = "linkify")]
        Piece::Autolink(url) => render_link(&ctx.escape(url), url, ctx),
    }
}

fn emphasize(text: &str, depth: usize) -> String {
    if depth > MAX_EMPHASIS_DEPTH || !text.contains(['*', '_', '~']) {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len() + 16);
    let mut last = 0;
    for caps in EMPHASIS_REGEX.captures_iter(text) {
        // backtrack limit: leave the remainder unformatted
        let Ok(caps) = caps else { break };
        let Some(whole) = caps.get(0) else { continue };

        let (tag, inner) = if let Some(m) = caps.name("strong_star").or_else(|| caps.name("strong_under")) {
            ("strong", m)
        } else if let Some(m) = caps.name("strike") {
            ("del", m)
        } else if let Some(m) = caps.name("em_star").or_else(|| caps.name("em_under")) {
            ("em", m)
        } else {
            continue;
        };

        out.push_str(&text[last..whole.start()]);
        out.push('<');
        out.push_str(tag);
        out.push('>');
        out.push_str(&emphasize(inner.as_str(), depth + 1));
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
        last = whole.end();
    }
    out.push_str(&text[last..]);
    out
}

fn line_breaks(text: &str, breaks: bool) -> Cow<'_, str> {
    if !text.contains('\n') {
        Cow::Borrowed(text)
    } else if breaks {
        Cow::Owned(text.replace('\n', "<br>\n"))
    } else {
        Cow::Owned(text.replace('\n', " "))
    }
}

fn restore(text: &str, fragments: &[String]) -> String {
    if fragments.is_empty() {
        return text.to_string();
    }
    PLACEHOLDER_REGEX
        .replace_all(text, |caps: &regex::Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|index| fragments.get(index))
                .cloned()
                .unwrap_or_default()
        })
        .into_owned()
}
