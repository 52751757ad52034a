//! Line-oriented block tokenizer.
//!
//! Rules are tried in a fixed order at each line; the first one that
//! recognises a block wins. Blank lines between blocks are skipped, and
//! anything no rule claims becomes a paragraph.
use tracing::trace;

use crate::mdparser::block::{is_blank, BlockRule};
use crate::mdparser::token::Token;
use crate::plugins::chat_plugins::math_block::MathBlockScanner;
use crate::plugins::cmark::block::blockquote::BlockquoteScanner;
use crate::plugins::cmark::block::fence::FenceScanner;
use crate::plugins::cmark::block::heading::HeadingScanner;
use crate::plugins::cmark::block::hr::HrScanner;
use crate::plugins::cmark::block::list::ListScanner;
use crate::plugins::cmark::block::paragraph::ParagraphScanner;
use crate::plugins::extra::tables::TableScanner;

type RuleFn = fn(&[&str], usize) -> Option<(Token, usize)>;
type CheckFn = fn(&[&str], usize) -> bool;

struct RuleEntry {
    name: &'static str,
    check: CheckFn,
    run: RuleFn,
}

macro_rules! rule {
    ($name:literal, $scanner:ty) => {
        RuleEntry {
            name: $name,
            check: <$scanner as BlockRule>::check,
            run: <$scanner as BlockRule>::run,
        }
    };
}

// order is precedence, paragraph is the fallback and not listed
static BLOCK_RULES: [RuleEntry; 7] = [
    rule!("fence", FenceScanner),
    rule!("math_block", MathBlockScanner),
    rule!("table", TableScanner),
    rule!("heading", HeadingScanner),
    rule!("blockquote", BlockquoteScanner),
    rule!("list", ListScanner),
    rule!("hr", HrScanner),
];

/// Whether the line at `line` ends a running paragraph.
pub fn interrupts_paragraph(lines: &[&str], line: usize) -> bool {
    is_blank(lines[line]) || BLOCK_RULES.iter().any(|rule| (rule.check)(lines, line))
}

/// Tokenize markdown into a flat list of block tokens. Total: any input
/// yields a (possibly empty) token list.
pub fn tokenize(markdown: &str) -> Vec<Token> {
    if markdown.is_empty() {
        return Vec::new();
    }
    let normalized = markdown.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = normalized.split('\n').collect();
    tokenize_lines(&lines)
}

pub fn tokenize_lines(lines: &[&str]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut line = 0;

    'lines: while line < lines.len() {
        for rule in BLOCK_RULES.iter() {
            if let Some((token, next_line)) = (rule.run)(lines, line) {
                trace!(target: "chatmark::render", rule = rule.name, line, "block matched");
                tokens.push(token);
                line = next_line.max(line + 1);
                continue 'lines;
            }
        }

        if is_blank(lines[line]) {
            line += 1;
            continue;
        }

        match ParagraphScanner::run(lines, line) {
            Some((token, next_line)) => {
                tokens.push(token);
                line = next_line.max(line + 1);
            }
            None => line += 1,
        }
    }

    tokens
}
