//! Typographic replacements and smart quotes.
//!
//!  - `(c)` `(r)` `(tm)` → © ® ™
//!  - `+-` → ±
//!  - `...` → …, `?....` → `?..`, `!!!!!` → `!!!`, `,,` → `,`
//!  - `---` → —, `--` → –
//!  - straight quotes → “” and ‘’, apostrophes inside words → ’
//!
//! Runs over inline text before escaping. Code, math, links and raw tags
//! have already been replaced by placeholders at that point, so they are
//! never touched.
use fancy_regex::Regex as FancyRegex;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

static RARE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\+-|\.\.|\?\?\?\?|!!!!|,,|--|(?i)\((?:c|r|tm)\)").unwrap());

static SCOPED_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\((c|r|tm)\)").unwrap());
static ELLIPSIS_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{2,}").unwrap());
static QUESTION_ELLIPSIS_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"([?!])…").unwrap());
static REPEATED_MARKS_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\?{4,})|(!{4,})").unwrap());
static COMMAS_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r",{2,}").unwrap());

// dashes must not eat the character that follows them
static EM_DASH_REGEX: Lazy<FancyRegex> =
    Lazy::new(|| FancyRegex::new(r"(?m)(^|[^-])---(?=[^-]|$)").unwrap());
static SPACED_EN_DASH_REGEX: Lazy<FancyRegex> =
    Lazy::new(|| FancyRegex::new(r"(?m)(^|\s)--(?=\s|$)").unwrap());
static EN_DASH_REGEX: Lazy<FancyRegex> =
    Lazy::new(|| FancyRegex::new(r"(?m)(^|[^-\s])--(?=[^-\s]|$)").unwrap());

fn replace_fancy<'a>(src: Cow<'a, str>, regex: &FancyRegex, with: &str) -> Cow<'a, str> {
    let mut out = String::with_capacity(src.len());
    let mut last = 0;
    let mut changed = false;
    for caps in regex.captures_iter(&src) {
        // backtrack limit: leave the rest as it is
        let Ok(caps) = caps else { break };
        let (Some(whole), Some(prefix)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&src[last..whole.start()]);
        out.push_str(prefix.as_str());
        out.push_str(with);
        last = whole.end();
        changed = true;
    }
    if !changed {
        return src;
    }
    out.push_str(&src[last..]);
    Cow::Owned(out)
}

fn replace<'a>(src: Cow<'a, str>, regex: &Regex, with: &str) -> Cow<'a, str> {
    match src {
        Cow::Borrowed(s) => regex.replace_all(s, with),
        Cow::Owned(s) => Cow::Owned(regex.replace_all(&s, with).into_owned()),
    }
}

fn symbol(caps: &regex::Captures) -> &'static str {
    match caps[1].to_ascii_lowercase().as_str() {
        "c" => "©",
        "r" => "®",
        _ => "™",
    }
}

/// `(c)`, dashes, ellipses and friends.
pub fn replacements(text: &str) -> Cow<'_, str> {
    if !RARE_REGEX.is_match(text) {
        return Cow::Borrowed(text);
    }
    let mut out = SCOPED_REGEX.replace_all(text, symbol);
    if out.contains("+-") {
        out = Cow::Owned(out.replace("+-", "±"));
    }
    out = replace(out, &ELLIPSIS_REGEX, "…");
    out = replace(out, &QUESTION_ELLIPSIS_REGEX, "${1}..");
    if REPEATED_MARKS_REGEX.is_match(&out) {
        let collapsed = REPEATED_MARKS_REGEX.replace_all(&out, |caps: &regex::Captures| {
            if caps.get(1).is_some() {
                "???"
            } else {
                "!!!"
            }
        });
        out = Cow::Owned(collapsed.into_owned());
    }
    out = replace(out, &COMMAS_REGEX, ",");
    out = replace_fancy(out, &EM_DASH_REGEX, "\u{2014}");
    out = replace_fancy(out, &SPACED_EN_DASH_REGEX, "\u{2013}");
    replace_fancy(out, &EN_DASH_REGEX, "\u{2013}")
}

fn opens_quote(prev: Option<char>) -> bool {
    match prev {
        None => true,
        Some(c) => c.is_whitespace() || matches!(c, '(' | '[' | '{' | '\u{2013}' | '\u{2014}'),
    }
}

/// Curly quotes chosen from the characters around each straight quote.
/// A quote with whitespace on both sides is left alone.
pub fn smart_quotes(text: &str) -> Cow<'_, str> {
    if !text.contains(['"', '\'']) {
        return Cow::Borrowed(text);
    }
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 8);
    for (index, &c) in chars.iter().enumerate() {
        if c != '"' && c != '\'' {
            out.push(c);
            continue;
        }
        let prev = index.checked_sub(1).map(|i| chars[i]);
        let next = chars.get(index + 1).copied();
        let can_open = next.is_some_and(|n| !n.is_whitespace());
        let can_close = prev.is_some_and(|p| !p.is_whitespace());

        let (open, close) = if c == '"' {
            ('\u{201C}', '\u{201D}')
        } else {
            ('\u{2018}', '\u{2019}')
        };
        let replacement = if c == '\'' && prev.is_some_and(char::is_alphanumeric) {
            // apostrophe: don't, 90's, rock'n'roll
            close
        } else if opens_quote(prev) && can_open {
            open
        } else if can_close {
            close
        } else {
            c
        };
        out.push(replacement);
    }
    Cow::Owned(out)
}

/// Both passes, replacements first.
pub fn typographer(text: &str) -> Cow<'_, str> {
    match replacements(text) {
        Cow::Borrowed(text) => smart_quotes(text),
        Cow::Owned(replaced) => Cow::Owned(smart_quotes(&replaced).into_owned()),
    }
}
