//! ATX headings, `#` through `######`.
use once_cell::sync::Lazy;
use regex::Regex;

use crate::mdparser::block::BlockRule;
use crate::mdparser::token::{Token, TokenKind, TokenMeta};

static HEADING_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ {0,3}(#{1,6})[ \t]+(.+?)(?:[ \t]+#+)?[ \t]*$").unwrap());

pub struct HeadingScanner;

impl BlockRule for HeadingScanner {
    fn check(lines: &[&str], line: usize) -> bool {
        HEADING_REGEX.is_match(lines[line])
    }

    fn run(lines: &[&str], line: usize) -> Option<(Token, usize)> {
        let caps = HEADING_REGEX.captures(lines[line])?;
        let level = caps.get(1)?.as_str().len() as u8;
        let content = caps.get(2)?.as_str().trim();

        let token = Token::new(TokenKind::Heading, lines[line], content).with_meta(TokenMeta {
            level: Some(level),
            ..Default::default()
        });
        Some((token, line + 1))
    }
}
