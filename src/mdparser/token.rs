//! Flat block tokens produced by the tokenizer.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Ordered,
    Unordered,
    Task,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Heading,
    CodeBlock,
    Math,
    Table,
    Blockquote,
    List(ListKind),
    HorizontalRule,
    Paragraph,
    /// Produced by host-side tokenizers; rendered through the unknown-node fallback.
    Custom(String),
}

impl TokenKind {
    pub fn name(&self) -> &str {
        match self {
            TokenKind::Heading => "heading",
            TokenKind::CodeBlock => "code_block",
            TokenKind::Math => "math",
            TokenKind::Table => "table",
            TokenKind::Blockquote => "blockquote",
            TokenKind::List(_) => "list",
            TokenKind::HorizontalRule => "horizontal_rule",
            TokenKind::Paragraph => "paragraph",
            TokenKind::Custom(name) => name,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl Alignment {
    /// Alignment encoded by a separator cell such as `:---:`.
    pub fn from_separator(cell: &str) -> Self {
        let cell = cell.trim();
        match (cell.starts_with(':'), cell.ends_with(':') && cell.len() > 1) {
            (true, true) => Alignment::Center,
            (false, true) => Alignment::Right,
            _ => Alignment::Left,
        }
    }

    pub fn as_css(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }
}

/// Kind-specific data. Fields that do not apply to a token stay `None` or empty.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TokenMeta {
    pub level: Option<u8>,
    pub language: Option<String>,
    pub inline: bool,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub alignment: Vec<Alignment>,
    pub items: Vec<String>,
    pub start: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source lines the token was built from, joined with `\n`.
    pub raw: String,
    pub content: String,
    pub meta: TokenMeta,
}

impl Token {
    pub fn new(kind: TokenKind, raw: impl Into<String>, content: impl Into<String>) -> Self {
        Token {
            kind,
            raw: raw.into(),
            content: content.into(),
            meta: TokenMeta::default(),
        }
    }

    pub fn with_meta(mut self, meta: TokenMeta) -> Self {
        self.meta = meta;
        self
    }
}
