// Heading anchors the way the chat front-end generates them: lower-case,
// drop everything that is not a word character, whitespace or hyphen, then
// turn whitespace runs into single hyphens.
//
// Unlike github-slugger this does not deduplicate: two headings with the
// same text get the same id.

use once_cell::sync::Lazy;
use regex::Regex;

static REMOVE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Slug for a heading's text.
///
/// ```
/// use chatmark::plugins::extra::slugger::slug;
/// assert_eq!(slug("Hello, World!"), "hello-world");
/// assert_eq!(slug("  Café   au lait "), "café-au-lait");
/// assert_eq!(slug("!!!"), "");
/// ```
pub fn slug(s: &str) -> String {
    let lower = s.to_lowercase();
    let stripped = REMOVE_RE.replace_all(&lower, "");
    WHITESPACE_RE.replace_all(stripped.trim(), "-").into_owned()
}
