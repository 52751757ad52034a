//! Ordered, unordered and task lists.
//!
//! Items are kept flat: an indented marker starts a new item of the same
//! list rather than a nested list, and other indented lines are joined onto
//! the previous item.
use once_cell::sync::Lazy;
use regex::Regex;

use crate::mdparser::block::{is_blank, raw_lines, BlockRule};
use crate::mdparser::token::{ListKind, Token, TokenKind, TokenMeta};

static LIST_ITEM_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([ \t]*)(\d{1,9}[.)]|[-*+])[ \t]+(.*)$").unwrap());

/// `[ ]`, `[x]` or `[X]` at the start of an item.
pub static TASK_MARKER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[([ xX])\](?:[ \t]+|$)").unwrap());

pub struct ListScanner;

struct ListItem<'a> {
    ordered: bool,
    number: Option<u32>,
    content: &'a str,
}

impl ListScanner {
    fn parse_item(line: &str) -> Option<ListItem<'_>> {
        let caps = LIST_ITEM_REGEX.captures(line)?;
        let marker = caps.get(2)?.as_str();
        let ordered = marker.starts_with(|c: char| c.is_ascii_digit());
        let number = ordered
            .then(|| marker.trim_end_matches(['.', ')']).parse::<u32>().ok())
            .flatten();
        Some(ListItem {
            ordered,
            number,
            content: caps.get(3)?.as_str(),
        })
    }
}

impl BlockRule for ListScanner {
    fn check(lines: &[&str], line: usize) -> bool {
        Self::parse_item(lines[line]).is_some()
    }

    fn run(lines: &[&str], line: usize) -> Option<(Token, usize)> {
        let first = Self::parse_item(lines[line])?;
        let ordered = first.ordered;
        let task = !ordered && TASK_MARKER_REGEX.is_match(first.content);

        let mut items = vec![first.content.to_string()];
        let mut next_line = line + 1;

        while next_line < lines.len() {
            let current = lines[next_line];

            if let Some(item) = Self::parse_item(current) {
                if item.ordered != ordered {
                    break;
                }
                items.push(item.content.to_string());
                next_line += 1;
                continue;
            }

            if is_blank(current) {
                // a blank line only separates items of the same list
                let resume = lines[next_line..]
                    .iter()
                    .position(|l| !is_blank(l))
                    .map(|offset| next_line + offset);
                match resume.and_then(|r| Self::parse_item(lines[r]).map(|item| (r, item))) {
                    Some((r, item)) if item.ordered == ordered => {
                        next_line = r;
                        continue;
                    }
                    _ => break,
                }
            }

            // continuation line
            if current.starts_with([' ', '\t']) {
                if let Some(last) = items.last_mut() {
                    last.push('\n');
                    last.push_str(current.trim());
                }
                next_line += 1;
                continue;
            }

            break;
        }

        let kind = match (ordered, task) {
            (true, _) => ListKind::Ordered,
            (false, true) => ListKind::Task,
            (false, false) => ListKind::Unordered,
        };

        let token = Token::new(TokenKind::List(kind), raw_lines(lines, line, next_line), "")
            .with_meta(TokenMeta {
                items,
                start: first.number,
                ..Default::default()
            });
        Some((token, next_line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(src: &str) -> (Token, usize) {
        let lines: Vec<&str> = src.split('\n').collect();
        ListScanner::run(&lines, 0).unwrap()
    }

    #[test]
    fn unordered_items() {
        let (token, next) = scan("- one\n* two\n+ three\n\nafter");
        assert_eq!(token.kind, TokenKind::List(ListKind::Unordered));
        assert_eq!(token.meta.items, vec!["one", "two", "three"]);
        assert_eq!(next, 3);
    }

    #[test]
    fn ordered_list_keeps_start() {
        let (token, _) = scan("3. three\n4. four");
        assert_eq!(token.kind, TokenKind::List(ListKind::Ordered));
        assert_eq!(token.meta.start, Some(3));
        assert_eq!(token.meta.items, vec!["three", "four"]);
    }

    #[test]
    fn task_list_detected_from_first_item() {
        let (token, _) = scan("- [x] done\n- [ ] todo");
        assert_eq!(token.kind, TokenKind::List(ListKind::Task));
        assert_eq!(token.meta.items, vec!["[x] done", "[ ] todo"]);
    }

    #[test]
    fn blank_line_between_items_is_one_list() {
        let (token, next) = scan("1. a\n\n2. b\n\nnot a list");
        assert_eq!(token.meta.items, vec!["a", "b"]);
        assert_eq!(next, 3);
    }

    #[test]
    fn indented_lines_continue_items() {
        let (token, _) = scan("- first\n  more text\n  - nested");
        assert_eq!(token.meta.items, vec!["first\nmore text", "nested"]);
    }

    #[test]
    fn switching_kind_ends_list() {
        let (token, next) = scan("- bullet\n1. number");
        assert_eq!(token.meta.items, vec!["bullet"]);
        assert_eq!(next, 1);
    }
}
