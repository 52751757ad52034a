//! Typed render tree built from block tokens.
use tracing::debug;

use crate::mdparser::constants::MAX_NESTING;
use crate::mdparser::token::{Alignment, ListKind, Token, TokenKind};
use crate::mdparser::tokenizer::tokenize;
use crate::plugins::cmark::block::list::TASK_MARKER_REGEX;
use crate::plugins::extra::slugger::slug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub checked: bool,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub alignment: Vec<Alignment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderNode {
    Heading {
        level: u8,
        id: Option<String>,
        content: String,
    },
    Paragraph {
        content: String,
    },
    CodeBlock {
        language: Option<String>,
        code: String,
    },
    /// Fenced block tagged `mermaid`.
    Diagram {
        code: String,
    },
    Math {
        expression: String,
        inline: bool,
    },
    Table(Table),
    Blockquote {
        children: Vec<RenderNode>,
    },
    List {
        ordered: bool,
        start: Option<u32>,
        items: Vec<String>,
    },
    TaskList {
        items: Vec<TaskItem>,
    },
    HorizontalRule,
    /// Anything the renderer has no dedicated markup for.
    Unknown {
        kind: String,
        content: String,
    },
}

impl RenderNode {
    pub fn kind(&self) -> &str {
        match self {
            RenderNode::Heading { .. } => "heading",
            RenderNode::Paragraph { .. } => "paragraph",
            RenderNode::CodeBlock { .. } => "code_block",
            RenderNode::Diagram { .. } => "diagram",
            RenderNode::Math { .. } => "math",
            RenderNode::Table(_) => "table",
            RenderNode::Blockquote { .. } => "blockquote",
            RenderNode::List { .. } => "list",
            RenderNode::TaskList { .. } => "task_list",
            RenderNode::HorizontalRule => "horizontal_rule",
            RenderNode::Unknown { kind, .. } => kind,
        }
    }
}

/// Convert tokens to nodes, one node per token, order preserved. Total.
pub fn build_ast(tokens: &[Token]) -> Vec<RenderNode> {
    build_nodes(tokens, 0)
}

fn build_nodes(tokens: &[Token], depth: usize) -> Vec<RenderNode> {
    tokens.iter().map(|token| token_to_node(token, depth)).collect()
}

fn token_to_node(token: &Token, depth: usize) -> RenderNode {
    match &token.kind {
        TokenKind::Heading => {
            let level = token.meta.level.filter(|l| (1..=6).contains(l)).unwrap_or(1);
            let id = slug(&token.content);
            RenderNode::Heading {
                level,
                id: (!id.is_empty()).then_some(id),
                content: token.content.clone(),
            }
        }
        TokenKind::CodeBlock => {
            let language = token.meta.language.clone().filter(|l| !l.is_empty());
            match language.as_deref() {
                Some("mermaid") => RenderNode::Diagram {
                    code: token.content.clone(),
                },
                _ => RenderNode::CodeBlock {
                    language,
                    code: token.content.clone(),
                },
            }
        }
        TokenKind::Math => RenderNode::Math {
            expression: token.content.clone(),
            inline: token.meta.inline,
        },
        TokenKind::Table if token.meta.headers.is_empty() => RenderNode::Unknown {
            kind: "table".to_string(),
            content: token.raw.clone(),
        },
        TokenKind::Table => RenderNode::Table(Table {
            headers: token.meta.headers.clone(),
            rows: token.meta.rows.clone(),
            alignment: token.meta.alignment.clone(),
        }),
        TokenKind::Blockquote => {
            if depth >= MAX_NESTING {
                debug!(target: "chatmark::render", depth, "blockquote nesting limit reached");
                return RenderNode::Blockquote {
                    children: vec![RenderNode::Paragraph {
                        content: token.content.clone(),
                    }],
                };
            }
            let children = stacker::maybe_grow(64 * 1024, 1024 * 1024, || {
                build_nodes(&tokenize(&token.content), depth + 1)
            });
            RenderNode::Blockquote { children }
        }
        TokenKind::List(ListKind::Task) => RenderNode::TaskList {
            items: token.meta.items.iter().map(|item| task_item(item)).collect(),
        },
        TokenKind::List(kind) => {
            let ordered = *kind == ListKind::Ordered;
            RenderNode::List {
                ordered,
                start: token.meta.start.filter(|_| ordered),
                items: token.meta.items.clone(),
            }
        }
        TokenKind::HorizontalRule => RenderNode::HorizontalRule,
        TokenKind::Paragraph => RenderNode::Paragraph {
            content: token.content.clone(),
        },
        TokenKind::Custom(kind) => RenderNode::Unknown {
            kind: kind.clone(),
            content: if token.content.is_empty() {
                token.raw.clone()
            } else {
                token.content.clone()
            },
        },
    }
}

fn task_item(item: &str) -> TaskItem {
    match TASK_MARKER_REGEX.captures(item) {
        Some(caps) => TaskItem {
            checked: caps.get(1).is_some_and(|m| m.as_str().eq_ignore_ascii_case("x")),
            content: item[caps.get(0).map_or(0, |m| m.end())..].to_string(),
        },
        None => TaskItem {
            checked: false,
            content: item.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdparser::token::TokenMeta;

    fn ast(markdown: &str) -> Vec<RenderNode> {
        build_ast(&tokenize(markdown))
    }

    #[test]
    fn heading_gets_slug_id() {
        assert_eq!(
            ast("## Hello World!"),
            vec![RenderNode::Heading {
                level: 2,
                id: Some("hello-world".into()),
                content: "Hello World!".into(),
            }]
        );
    }

    #[test]
    fn heading_without_level_degrades() {
        let token = Token::new(TokenKind::Heading, "", "");
        assert_eq!(
            build_ast(&[token]),
            vec![RenderNode::Heading {
                level: 1,
                id: None,
                content: String::new(),
            }]
        );
    }

    #[test]
    fn mermaid_fence_is_a_diagram() {
        assert_eq!(
            ast("```mermaid\ngraph TD; A-->B\n```"),
            vec![RenderNode::Diagram {
                code: "graph TD; A-->B".into()
            }]
        );
    }

    #[test]
    fn task_items_parse_checked_state() {
        assert_eq!(
            ast("- [x] done\n- [ ] todo\n- plain"),
            vec![RenderNode::TaskList {
                items: vec![
                    TaskItem { checked: true, content: "done".into() },
                    TaskItem { checked: false, content: "todo".into() },
                    TaskItem { checked: false, content: "plain".into() },
                ]
            }]
        );
    }

    #[test]
    fn blockquote_children_are_parsed() {
        let nodes = ast("> # Quoted\n> text");
        let RenderNode::Blockquote { children } = &nodes[0] else {
            panic!("expected blockquote, got {nodes:?}");
        };
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].kind(), "heading");
        assert_eq!(children[1].kind(), "paragraph");
    }

    #[test]
    fn deep_nesting_is_capped() {
        let markdown = format!("{} deep", ">".repeat(200));
        let mut nodes = ast(&markdown);
        let mut depth = 0;
        while let Some(RenderNode::Blockquote { children }) = nodes.first().cloned() {
            depth += 1;
            nodes = children;
        }
        assert!(depth <= MAX_NESTING + 1);
        assert!(matches!(nodes.first(), Some(RenderNode::Paragraph { .. })));
    }

    #[test]
    fn custom_tokens_become_unknown_nodes() {
        let token = Token::new(TokenKind::Custom("callout".into()), "!!! note", "");
        assert_eq!(
            build_ast(&[token]),
            vec![RenderNode::Unknown {
                kind: "callout".into(),
                content: "!!! note".into(),
            }]
        );
    }

    #[test]
    fn empty_table_is_unknown() {
        let token = Token::new(TokenKind::Table, "| a |", "").with_meta(TokenMeta::default());
        assert_eq!(
            build_ast(&[token]),
            vec![RenderNode::Unknown {
                kind: "table".into(),
                content: "| a |".into(),
            }]
        );
    }
}
