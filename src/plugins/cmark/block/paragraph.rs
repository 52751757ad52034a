//! Paragraph
//!
//! Catch-all: takes the current line plus every following line until a
//! blank line or the start of another block.
use crate::mdparser::block::{raw_lines, BlockRule};
use crate::mdparser::token::{Token, TokenKind};
use crate::mdparser::tokenizer::interrupts_paragraph;

pub struct ParagraphScanner;

impl BlockRule for ParagraphScanner {
    fn check(_lines: &[&str], _line: usize) -> bool {
        true
    }

    fn run(lines: &[&str], line: usize) -> Option<(Token, usize)> {
        let mut next_line = line + 1;
        while next_line < lines.len() && !interrupts_paragraph(lines, next_line) {
            next_line += 1;
        }

        let content = lines[line..next_line]
            .iter()
            .map(|l| l.trim())
            .collect::<Vec<_>>()
            .join("\n");

        Some((
            Token::new(TokenKind::Paragraph, raw_lines(lines, line, next_line), content),
            next_line,
        ))
    }
}
