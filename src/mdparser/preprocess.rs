//! LaTeX and chemistry normalisation applied to raw markdown before
//! tokenizing.
//!
//! Code (fenced blocks and inline spans) and link spans are copied through
//! untouched; every other segment runs through the processors in order.
use fancy_regex::Regex as FancyRegex;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use tracing::trace;

// display math first, so `$$x$$` is never seen as two inline spans.
// Escaped dollars (`\$`) never open or close a span; an inline span whose
// closing dollar is followed by a digit is a price ("$5 and $10"), not math.
pub static DISPLAY_MATH_REGEX: Lazy<FancyRegex> = Lazy::new(|| {
    FancyRegex::new(r"(?<!\\)\$\$(?P<math>(?:[^$\\]|\\.)+?)\$\$").unwrap()
});

pub static INLINE_MATH_REGEX: Lazy<FancyRegex> = Lazy::new(|| {
    FancyRegex::new(r"(?<![\\$])\$(?!\$)(?P<math>(?:[^$\\\n]|\\.)+?)\$(?![$\d])").unwrap()
});

static MATH_SPAN_REGEX: Lazy<FancyRegex> = Lazy::new(|| {
    FancyRegex::new(
        r"(?<!\\)\$\$(?P<display>(?:[^$\\]|\\.)+?)\$\$|(?<![\\$])\$(?!\$)(?P<inline>(?:[^$\\\n]|\\.)+?)\$(?![$\d])",
    )
    .unwrap()
});

// protected spans, in order: fenced code (to its closing fence or end of
// input), double and single backtick code spans, `[text](url)` links
static PROTECTED_SPAN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^[ \t]{0,3}(?:```|~~~)[^\n]*\n(?s:.*?)(?:\n[ \t]{0,3}(?:```|~~~)[ \t]*$|\z)|``[^`]+?``|`[^`\n]+`|\[[^\]\n]+\]\([^)\n]+\)",
    )
    .unwrap()
});

// `\rightarrow` as a whole command; `\rightarrowtail` is left alone
static RIGHTARROW_REGEX: Lazy<FancyRegex> =
    Lazy::new(|| FancyRegex::new(r"\\rightarrow(?![a-zA-Z])").unwrap());

// `\text{H}`-style wrappers around something that looks like a formula
static TEXT_FORMULA_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\text\{([A-Z][a-zA-Z0-9]*)\}").unwrap());

/// Whole-input rewrites for formulas that models commonly split across
/// `\ce` and `\text` wrappers. Applied in order.
const SPLIT_FORMULA_FIXES: [(&str, &str); 4] = [
    (r"\ce{H_2}\text{O}", r"\ce{H2O}"),
    (r"\ce{H_2}", r"\ce{H2}"),
    (r"\ce{C_6}\text{H}_{12}\ce{O_6}", r"\ce{C6H12O6}"),
    (r"\ce{C_6}", r"\ce{C6}"),
];

/// Subscript spellings normalised inside math spans.
const SUBSCRIPT_FIXES: [(&str, &str); 2] = [("H_2", "H2"), ("C_6", "C6")];

fn apply_regex<'a>(src: Cow<'a, str>, regex: &Regex, replacement: &str) -> Cow<'a, str> {
    // replace_all returns Borrowed when nothing matched, keep it that way
    match src {
        Cow::Borrowed(s) => regex.replace_all(s, replacement),
        Cow::Owned(s) => {
            let result = regex.replace_all(&s, replacement);
            Cow::Owned(result.into_owned())
        }
    }
}

fn normalize_arrows(src: Cow<'_, str>) -> Cow<'_, str> {
    if !src.contains(r"\rightarrow") {
        return src;
    }
    let mut out = String::with_capacity(src.len());
    let mut last = 0;
    for found in RIGHTARROW_REGEX.find_iter(&src) {
        let Ok(found) = found else { break };
        out.push_str(&src[last..found.start()]);
        out.push_str(r"\to");
        last = found.end();
    }
    if last == 0 {
        return src;
    }
    out.push_str(&src[last..]);
    Cow::Owned(out)
}

fn join_split_formulas(src: Cow<'_, str>) -> Cow<'_, str> {
    SPLIT_FORMULA_FIXES
        .iter()
        .fold(src, |acc, (from, to)| match acc.contains(from) {
            true => Cow::Owned(acc.replace(from, to)),
            false => acc,
        })
}

/// Rewrites the body of a single math span.
pub fn rewrite_formula(formula: &str) -> Cow<'_, str> {
    let rewritten = apply_regex(Cow::Borrowed(formula), &TEXT_FORMULA_REGEX, r"\ce{${1}}");
    SUBSCRIPT_FIXES
        .iter()
        .fold(rewritten, |acc, (from, to)| match acc.contains(from) {
            true => Cow::Owned(acc.replace(from, to)),
            false => acc,
        })
}

fn rewrite_math_spans(src: Cow<'_, str>) -> Cow<'_, str> {
    if !src.contains('$') {
        return src;
    }
    let mut out = String::with_capacity(src.len());
    let mut last = 0;
    let mut changed = false;
    for caps in MATH_SPAN_REGEX.captures_iter(&src) {
        // backtrack limit hit: leave the rest of the segment as it is
        let Ok(caps) = caps else { break };
        let Some(body) = caps.name("display").or_else(|| caps.name("inline")) else {
            continue;
        };
        let rewritten = rewrite_formula(body.as_str());
        if let Cow::Owned(rewritten) = rewritten {
            out.push_str(&src[last..body.start()]);
            out.push_str(&rewritten);
            last = body.end();
            changed = true;
        }
    }
    if !changed {
        return src;
    }
    out.push_str(&src[last..]);
    Cow::Owned(out)
}

fn preprocess_segment(segment: &str) -> Cow<'_, str> {
    let mut processed = Cow::Borrowed(segment);

    let processors: [(&str, fn(Cow<str>) -> Cow<str>); 3] = [
        ("arrows", normalize_arrows),
        ("split_formulas", join_split_formulas),
        ("math_spans", rewrite_math_spans),
    ];

    for (name, processor) in processors {
        processed = processor(processed);
        if let Cow::Owned(_) = processed {
            trace!(target: "chatmark::render", processor = name, "preprocessor rewrote segment");
        }
    }

    processed
}

/// Normalise LaTeX and chemistry notation. Total: never fails, and returns
/// the input borrowed when nothing needed rewriting.
pub fn preprocess(src: &str) -> Cow<'_, str> {
    if src.is_empty() {
        return Cow::Borrowed(src);
    }

    let mut out = String::with_capacity(src.len());
    let mut last = 0;
    for span in PROTECTED_SPAN_REGEX.find_iter(src) {
        out.push_str(&preprocess_segment(&src[last..span.start()]));
        out.push_str(span.as_str());
        last = span.end();
    }
    out.push_str(&preprocess_segment(&src[last..]));

    if out == src {
        Cow::Borrowed(src)
    } else {
        Cow::Owned(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "")]
    #[case("plain text, no math", "plain text, no math")]
    #[case(r"$a \rightarrow b$", r"$a \to b$")]
    #[case(r"$$a \rightarrow b$$", r"$$a \to b$$")]
    #[case(r"$\rightarrowtail$", r"$\rightarrowtail$")]
    #[case(r"$a \rightarrow\rightarrow b$", r"$a \to\to b$")]
    #[case(r"$a\rightarrow$", r"$a\to$")]
    #[case(r"$\ce{H_2}\text{O}$", r"$\ce{H2O}$")]
    #[case(r"$\ce{C_6}\text{H}_{12}\ce{O_6}$", r"$\ce{C6H12O6}$")]
    #[case(r"$\ce{H_2}$", r"$\ce{H2}$")]
    #[case(r"$\text{NaCl}$ dissolves", r"$\ce{NaCl}$ dissolves")]
    #[case(r"$\text{area}$", r"$\text{area}$")]
    #[case(r"outside math \text{NaCl}", r"outside math \text{NaCl}")]
    #[case("$H_2 + C_6$", "$H2 + C6$")]
    fn normalises_math(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(preprocess(input), expected);
    }

    #[test]
    fn prices_are_not_math() {
        let src = r"It costs $5 and \text{NaCl} costs $10";
        assert_eq!(preprocess(src), src);
    }

    #[test]
    fn code_is_protected() {
        let src = "```latex\n$\\text{NaCl} \\rightarrow x$\n```\nand `$H_2$` but $H_2$";
        let expected = "```latex\n$\\text{NaCl} \\rightarrow x$\n```\nand `$H_2$` but $H2$";
        assert_eq!(preprocess(src), expected);
    }

    #[test]
    fn unterminated_fence_protects_rest() {
        let src = "```\n$\\text{NaCl}$";
        assert_eq!(preprocess(src), src);
    }

    #[test]
    fn links_are_protected() {
        let src = r"[see \rightarrow here](https://example.com/$H_2$)";
        assert_eq!(preprocess(src), src);
    }

    #[test]
    fn untouched_input_stays_borrowed() {
        assert!(matches!(preprocess("hello **world**"), Cow::Borrowed(_)));
    }

    #[test]
    fn rewriting_is_idempotent() {
        let src = r"$\ce{H_2}\text{O} \rightarrow \text{CO2}$";
        let once = preprocess(src).into_owned();
        assert_eq!(preprocess(&once), once);
    }
}
