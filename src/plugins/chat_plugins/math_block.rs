//! Display math blocks
//!
//! `$$` on its own line, the expression, then a closing `$$` line. A block
//! written on one line (`$$x^2$$`) is accepted too. An opening `$$` that is
//! never closed is not a math block; the line falls through to paragraph text.
use crate::mdparser::block::{raw_lines, BlockRule};
use crate::mdparser::token::{Token, TokenKind};

const DISPLAY_MATH_FENCE: &str = "$$";

pub struct MathBlockScanner;

fn math_token(lines: &[&str], line: usize, end: usize, expression: &str) -> (Token, usize) {
    (
        Token::new(TokenKind::Math, raw_lines(lines, line, end), expression.trim()),
        end,
    )
}

impl BlockRule for MathBlockScanner {
    fn check(lines: &[&str], line: usize) -> bool {
        lines[line].trim_start().starts_with(DISPLAY_MATH_FENCE) && Self::run(lines, line).is_some()
    }

    fn run(lines: &[&str], line: usize) -> Option<(Token, usize)> {
        let first = lines[line].trim();
        if !first.starts_with(DISPLAY_MATH_FENCE) {
            return None;
        }

        if first == DISPLAY_MATH_FENCE {
            let mut body: Vec<&str> = Vec::new();
            for (next_line, current) in lines.iter().enumerate().skip(line + 1) {
                // closing fence, possibly with the tail of the expression before it
                if let Some(before) = current.trim().strip_suffix(DISPLAY_MATH_FENCE) {
                    if !before.trim().is_empty() {
                        body.push(before);
                    }
                    return Some(math_token(lines, line, next_line + 1, &body.join("\n")));
                }
                body.push(current);
            }
            return None;
        }

        let inner = first
            .strip_prefix(DISPLAY_MATH_FENCE)?
            .strip_suffix(DISPLAY_MATH_FENCE)?;
        if inner.trim().is_empty() || inner.contains(DISPLAY_MATH_FENCE) {
            return None;
        }
        Some(math_token(lines, line, line + 1, inner))
    }
}
