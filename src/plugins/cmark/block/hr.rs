//! Horizontal rule
//!
//! `---`, `***` or `___` alone on a line.
use once_cell::sync::Lazy;
use regex::Regex;

use crate::mdparser::block::BlockRule;
use crate::mdparser::token::{Token, TokenKind};

static HR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:-{3,}|\*{3,}|_{3,})$").unwrap());

pub struct HrScanner;

impl BlockRule for HrScanner {
    fn check(lines: &[&str], line: usize) -> bool {
        HR_REGEX.is_match(lines[line].trim())
    }

    fn run(lines: &[&str], line: usize) -> Option<(Token, usize)> {
        if !Self::check(lines, line) {
            return None;
        }
        Some((Token::new(TokenKind::HorizontalRule, lines[line], ""), line + 1))
    }
}
