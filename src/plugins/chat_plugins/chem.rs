//! Lowering of mhchem `\ce{...}` into plain LaTeX the math engine understands.
//!
//! Covers what chat answers actually use: formulas with subscripts,
//! stoichiometric coefficients, charges, state suffixes, reaction arrows and
//! hydrate dots. Anything else inside `\ce{}` passes through upright.
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::iter::Peekable;
use std::str::Chars;

// `\ce{...}` allowing one level of nested braces, e.g. `\ce{SO4^{2-}}`
static CE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\ce\{((?:[^{}]|\{[^{}]*\})*)\}").unwrap());

fn lower_operator(term: &str) -> Option<&'static str> {
    let lowered = match term {
        "->" | "→" => r"\rightarrow",
        "<-" => r"\leftarrow",
        "<->" => r"\leftrightarrow",
        "<=>" | "⇌" => r"\rightleftharpoons",
        "+" => "+",
        "=" => "=",
        "^" => r"\uparrow",
        _ => return None,
    };
    Some(lowered)
}

fn take_charge(chars: &mut Peekable<Chars<'_>>) -> String {
    if chars.next_if_eq(&'{').is_some() {
        return chars.by_ref().take_while(|c| *c != '}').collect();
    }
    let mut charge = String::new();
    while let Some(c) = chars.next_if(|c| c.is_ascii_digit() || *c == '+' || *c == '-') {
        charge.push(c);
    }
    charge
}

fn lower_species(term: &str) -> String {
    let coefficient_len = term.bytes().take_while(u8::is_ascii_digit).count();
    let (coefficient, species) = term.split_at(coefficient_len);
    if species.is_empty() {
        return coefficient.to_string();
    }

    let mut body = String::with_capacity(species.len() + 8);
    let mut chars = species.chars().peekable();
    let mut previous: Option<char> = None;

    while let Some(c) = chars.next() {
        match c {
            '0'..='9' if previous.is_some_and(|p| p.is_ascii_alphabetic() || p == ')') => {
                let mut digits = String::from(c);
                while let Some(d) = chars.next_if(char::is_ascii_digit) {
                    digits.push(d);
                }
                body.push_str(&format!("_{{{digits}}}"));
            }
            '^' => {
                let charge = take_charge(&mut chars);
                body.push_str(&format!("^{{{charge}}}"));
            }
            // trailing charge: Na+, Cl-, O2^2- is handled by '^' above
            '+' | '-' if previous.is_some() && chars.clone().all(|r| r == '+' || r == '-') => {
                let mut charge = String::from(c);
                charge.extend(chars.by_ref());
                body.push_str(&format!("^{{{charge}}}"));
            }
            '.' | '*' => body.push_str(r"\cdot "),
            _ => body.push(c),
        }
        previous = Some(c);
    }

    format!(r"{coefficient}\mathrm{{{body}}}")
}

fn lower_formula(body: &str) -> String {
    let terms: Vec<String> = body
        .split_whitespace()
        .map(|term| match lower_operator(term) {
            Some(op) => op.to_string(),
            None => lower_species(term),
        })
        .collect();
    format!("{{{}}}", terms.join(" "))
}

/// Replace every `\ce{...}` in `expression`.
///
/// ```
/// use chatmark::plugins::chat_plugins::chem::lower_mhchem;
/// assert_eq!(lower_mhchem(r"\ce{H2O}"), r"{\mathrm{H_{2}O}}");
/// assert_eq!(lower_mhchem(r"x^2"), r"x^2");
/// ```
pub fn lower_mhchem(expression: &str) -> Cow<'_, str> {
    if !expression.contains(r"\ce{") {
        return Cow::Borrowed(expression);
    }
    CE_REGEX.replace_all(expression, |caps: &Captures| lower_formula(&caps[1]))
}
