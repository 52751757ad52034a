//! Host services the renderer leans on: HTML escaping and URL parsing.
//!
//! Both sit behind traits so the facade can be handed different
//! implementations (a host may already own an escaper, or want URLs resolved
//! against its own origin).
use std::borrow::Cow;

use once_cell::sync::Lazy;
use url::Url;

use crate::error::ConfigError;

/// Replacement for any URL that is dangerous or cannot be parsed.
pub const PLACEHOLDER_URL: &str = "#";

static DEFAULT_ORIGIN: Lazy<Url> = Lazy::new(|| Url::parse("http://localhost/").unwrap());

const BLOCKED_SCHEMES: [&str; 3] = ["javascript", "data", "vbscript"];

pub trait HtmlEscaper: Send + Sync {
    /// Escape `text` so it is safe both as element text and inside a
    /// double-quoted attribute value. `&`, `<`, `>` and `"` must be escaped.
    fn escape<'a>(&self, text: &'a str) -> Cow<'a, str>;
}

/// Escaper backed by `html-escape`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EntityEscaper;

impl HtmlEscaper for EntityEscaper {
    fn escape<'a>(&self, text: &'a str) -> Cow<'a, str> {
        html_escape::encode_double_quoted_attribute(text)
    }
}

/// SIMD escaper from `v_htmlescape`; also escapes `/`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimdEscaper;

impl HtmlEscaper for SimdEscaper {
    fn escape<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if !text.contains(['&', '<', '>', '"', '\'', '/']) {
            return Cow::Borrowed(text);
        }
        Cow::Owned(v_htmlescape::escape(text).to_string())
    }
}

pub trait UrlParser: Send + Sync {
    /// Scheme a browser would load `raw` with, lower-cased. Relative
    /// references may report an empty scheme. `None` when `raw` cannot be
    /// parsed at all.
    fn resolve_scheme(&self, raw: &str) -> Option<String>;
}

/// Full WHATWG parsing with the `url` crate, relative to a fixed origin.
#[derive(Debug, Clone)]
pub struct OriginUrlParser {
    origin: Url,
}

impl OriginUrlParser {
    pub fn new(origin: &str) -> Result<Self, ConfigError> {
        Ok(OriginUrlParser {
            origin: Url::parse(origin)?,
        })
    }
}

impl Default for OriginUrlParser {
    fn default() -> Self {
        OriginUrlParser {
            origin: DEFAULT_ORIGIN.clone(),
        }
    }
}

impl UrlParser for OriginUrlParser {
    fn resolve_scheme(&self, raw: &str) -> Option<String> {
        Url::options()
            .base_url(Some(&self.origin))
            .parse(raw.trim())
            .ok()
            .map(|url| url.scheme().to_string())
    }
}

/// String-level scheme detection, the same way a browser reads a scheme:
/// ASCII tab, newline and control characters are ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemeSniffer;

impl UrlParser for SchemeSniffer {
    fn resolve_scheme(&self, raw: &str) -> Option<String> {
        let cleaned: String = raw
            .chars()
            .filter(|c| !c.is_ascii_control() && *c != ' ')
            .collect();
        let end = cleaned.find([':', '/', '?', '#']);
        let Some(end) = end else {
            return Some(String::new());
        };
        if !cleaned[end..].starts_with(':') {
            return Some(String::new());
        }
        let scheme = &cleaned[..end];
        let mut chars = scheme.chars();
        let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        // "foo bar:baz" style strings are paths, not schemes
        if !valid {
            return Some(String::new());
        }
        Some(scheme.to_ascii_lowercase())
    }
}

/// Returns `raw` unless it uses a blocked scheme or fails to parse, in which
/// case the inert placeholder is returned.
pub fn sanitize_url<'a>(raw: &'a str, parser: &dyn UrlParser) -> Cow<'a, str> {
    match parser.resolve_scheme(raw) {
        Some(scheme) if !BLOCKED_SCHEMES.contains(&scheme.as_str()) => Cow::Borrowed(raw),
        _ => Cow::Borrowed(PLACEHOLDER_URL),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://example.com/a?b=c", "https://example.com/a?b=c")]
    #[case("/chat/42", "/chat/42")]
    #[case("#section", "#section")]
    #[case("mailto:someone@example.com", "mailto:someone@example.com")]
    #[case("javascript:alert(1)", "#")]
    #[case("JaVaScRiPt:alert(1)", "#")]
    #[case("java\tscript:alert(1)", "#")]
    #[case("data:text/html;base64,PHNjcmlwdD4=", "#")]
    #[case("vbscript:msgbox", "#")]
    fn sniffer_blocks_dangerous_schemes(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(sanitize_url(raw, &SchemeSniffer), expected);
    }

    #[rstest]
    #[case("https://example.com", "https://example.com")]
    #[case("relative/path", "relative/path")]
    #[case(" javascript:alert(1)", "#")]
    #[case("http://[::1", "#")]
    fn origin_parser_blocks_unparseable(#[case] raw: &str, #[case] expected: &str) {
        let parser = OriginUrlParser::default();
        assert_eq!(sanitize_url(raw, &parser), expected);
    }

    #[test]
    fn origin_must_be_absolute() {
        assert!(matches!(
            OriginUrlParser::new("not a url"),
            Err(ConfigError::Origin(_))
        ));
    }

    #[rstest]
    #[case(&EntityEscaper as &dyn HtmlEscaper)]
    #[case(&SimdEscaper as &dyn HtmlEscaper)]
    fn escapers_neutralise_markup(#[case] escaper: &dyn HtmlEscaper) {
        let escaped = escaper.escape(r#"<a href="x">&'"#);
        assert!(!escaped.contains('<'));
        assert!(!escaped.contains('"'));
        assert!(escaped.contains("&lt;a"));
        assert!(escaped.contains("&amp;"));
        assert_eq!(escaper.escape("plain text"), "plain text");
    }
}
