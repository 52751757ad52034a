//! Block rule plumbing shared by every block scanner.
use crate::mdparser::token::Token;

/// A block-level construct recognised from the line starting at `line`.
///
/// `run` returns the token and the index of the first line after the block.
/// `check` answers "would this rule start a block here"; paragraphs use it
/// to decide where they end.
pub trait BlockRule {
    fn check(lines: &[&str], line: usize) -> bool {
        Self::run(lines, line).is_some()
    }

    fn run(lines: &[&str], line: usize) -> Option<(Token, usize)>;
}

pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Source text of `lines[start..end]`.
pub fn raw_lines(lines: &[&str], start: usize, end: usize) -> String {
    lines[start..end.min(lines.len())].join("\n")
}

/// Strip up to `count` leading spaces.
pub fn strip_indent(line: &str, count: usize) -> &str {
    let spaces = line.bytes().take(count).take_while(|b| *b == b' ').count();
    &line[spaces..]
}
