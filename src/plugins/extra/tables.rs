//! GFM tables
//!
//! <https://github.github.com/gfm/#tables-extension->
//!
//! A header row with pipes, a separator row made of `:`/`-` cells, then any
//! number of body rows. Body rows are padded or truncated to the header width.
use once_cell::sync::Lazy;
use regex::Regex;

use crate::mdparser::block::{is_blank, raw_lines, BlockRule};
use crate::mdparser::token::{Alignment, Token, TokenKind, TokenMeta};

static SEPARATOR_CELL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[:\-\s]*$").unwrap());

pub struct TableScanner;

/// Split a row on unescaped pipes, dropping one leading and one trailing pipe.
pub fn split_row(line: &str) -> Vec<String> {
    let line = line.trim();
    let line = line.strip_prefix('|').unwrap_or(line);
    let line = match line.strip_suffix('|') {
        Some(stripped) if !stripped.ends_with('\\') => stripped,
        _ => line,
    };

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('|') => current.push('|'),
                Some(other) => {
                    current.push('\\');
                    current.push(other);
                }
                None => current.push('\\'),
            },
            '|' => cells.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(c),
        }
    }
    cells.push(current.trim().to_string());
    cells
}

fn is_row(line: &str) -> bool {
    !is_blank(line) && line.contains('|')
}

fn parse_separator(line: &str) -> Option<Vec<Alignment>> {
    if !line.contains('|') || !line.contains('-') {
        return None;
    }
    let cells = split_row(line);
    if cells.is_empty() || !cells.iter().all(|cell| SEPARATOR_CELL_REGEX.is_match(cell)) {
        return None;
    }
    Some(cells.iter().map(|cell| Alignment::from_separator(cell)).collect())
}

fn fit_to_width<T: Clone + Default>(mut cells: Vec<T>, width: usize) -> Vec<T> {
    cells.resize(width, T::default());
    cells
}

impl BlockRule for TableScanner {
    fn check(lines: &[&str], line: usize) -> bool {
        line + 1 < lines.len() && is_row(lines[line]) && parse_separator(lines[line + 1]).is_some()
    }

    fn run(lines: &[&str], line: usize) -> Option<(Token, usize)> {
        if line + 1 >= lines.len() || !is_row(lines[line]) {
            return None;
        }
        let alignment = parse_separator(lines[line + 1])?;
        let headers = split_row(lines[line]);
        let width = headers.len();

        let mut rows = Vec::new();
        let mut next_line = line + 2;
        while next_line < lines.len() && is_row(lines[next_line]) {
            rows.push(fit_to_width(split_row(lines[next_line]), width));
            next_line += 1;
        }

        let token = Token::new(TokenKind::Table, raw_lines(lines, line, next_line), "").with_meta(
            TokenMeta {
                headers,
                rows,
                alignment: fit_to_width(alignment, width),
                ..Default::default()
            },
        );
        Some((token, next_line))
    }
}
