//! Code fence
//!
//! ` ```lang ` or `~~~lang`
//!
//! <https://spec.commonmark.org/0.30/#code-fence>
use crate::mdparser::block::{raw_lines, strip_indent, BlockRule};
use crate::mdparser::token::{Token, TokenKind, TokenMeta};

#[doc(hidden)]
pub struct FenceScanner;

impl FenceScanner {
    /// `(indent, marker, marker_len, info)` of an opening fence line.
    fn get_header(line: &str) -> Option<(usize, char, usize, &str)> {
        let indent = line.len() - line.trim_start_matches(' ').len();
        if indent > 3 {
            return None;
        }

        let line = &line[indent..];
        let mut chars = line.chars();

        let marker = chars.next()?;
        if marker != '~' && marker != '`' {
            return None;
        }

        // scan marker length
        let mut len = 1;
        while Some(marker) == chars.next() {
            len += 1;
        }

        if len < 3 {
            return None;
        }

        // skip if fences open and close on the same line
        if marker == '`' && line.matches("```").count() != 1 {
            return None;
        }

        let params = &line[len..];

        if marker == '`' && params.contains(marker) {
            return None;
        }

        Some((indent, marker, len, params.trim()))
    }

    fn is_closing(line: &str, marker: char, len: usize) -> bool {
        let line = line.trim();
        let len_end = line.chars().take_while(|c| *c == marker).count();
        // closing code fence must be at least as long as the opening one, and have nothing after it
        len_end >= len && len_end == line.chars().count()
    }
}

impl BlockRule for FenceScanner {
    fn check(lines: &[&str], line: usize) -> bool {
        Self::get_header(lines[line]).is_some()
    }

    fn run(lines: &[&str], line: usize) -> Option<(Token, usize)> {
        let (indent, marker, len, params) = Self::get_header(lines[line])?;

        let mut next_line = line + 1;
        let mut have_end_marker = false;

        // unclosed block is autoclosed by end of document
        while next_line < lines.len() {
            if Self::is_closing(lines[next_line], marker, len) {
                have_end_marker = true;
                break;
            }
            next_line += 1;
        }

        // If a fence has heading spaces, they should be removed from its inner block
        let content = lines[line + 1..next_line]
            .iter()
            .map(|l| strip_indent(l, indent))
            .collect::<Vec<_>>()
            .join("\n");

        let end = next_line + usize::from(have_end_marker);
        let language = params.split_whitespace().next().unwrap_or("");

        let token = Token::new(TokenKind::CodeBlock, raw_lines(lines, line, end), content).with_meta(
            TokenMeta {
                language: (!language.is_empty()).then(|| language.to_string()),
                ..Default::default()
            },
        );

        Some((token, end))
    }
}
