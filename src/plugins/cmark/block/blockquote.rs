//! Block quotes
//!
//! `> quoted text`
//!
//! <https://spec.commonmark.org/0.30/#block-quotes>
use once_cell::sync::Lazy;
use regex::Regex;

use crate::mdparser::block::{is_blank, raw_lines, BlockRule};
use crate::mdparser::token::{Token, TokenKind};

static QUOTE_MARKER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ {0,3}> ?").unwrap());

pub struct BlockquoteScanner;

impl BlockquoteScanner {
    fn is_quote_line(line: &str) -> bool {
        QUOTE_MARKER_REGEX.is_match(line)
    }
}

impl BlockRule for BlockquoteScanner {
    fn check(lines: &[&str], line: usize) -> bool {
        Self::is_quote_line(lines[line])
    }

    fn run(lines: &[&str], line: usize) -> Option<(Token, usize)> {
        if !Self::is_quote_line(lines[line]) {
            return None;
        }

        let mut inner: Vec<&str> = Vec::new();
        let mut next_line = line;

        while next_line < lines.len() {
            let current = lines[next_line];
            if Self::is_quote_line(current) {
                inner.push(QUOTE_MARKER_REGEX.find(current).map_or(current, |m| &current[m.end()..]));
                next_line += 1;
                continue;
            }

            if !is_blank(current) {
                break;
            }

            // blank lines continue the quote only when it resumes right after them
            let resumes = lines[next_line..]
                .iter()
                .position(|l| !is_blank(l))
                .map(|offset| next_line + offset)
                .filter(|&resume| Self::is_quote_line(lines[resume]));
            let Some(resume) = resumes else { break };
            inner.extend(std::iter::repeat("").take(resume - next_line));
            next_line = resume;
        }

        let token = Token::new(
            TokenKind::Blockquote,
            raw_lines(lines, line, next_line),
            inner.join("\n"),
        );
        Some((token, next_line))
    }
}
