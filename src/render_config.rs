use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Which highlighter colours fenced code blocks.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyntaxHighlighter {
    #[default]
    Inkjet,
    #[serde(rename = "none")]
    Disabled,
}

/// Fully resolved options for one render.
///
/// Serialised form uses camelCase keys so hosts can pass the same JSON
/// they use for their front-end configuration. The serialised form is also
/// part of the cache key, so every field that changes output lives here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderOptions {
    pub sanitize: bool,
    pub allow_raw_html: bool,
    pub scoped_css_prefix: String,
    pub syntax_highlighter: SyntaxHighlighter,
    pub router_link_rewriting: bool,
    pub lazy_images: bool,
    pub enable_math: bool,
    pub enable_diagrams: bool,
    pub heading_ids: bool,
    pub table_classes: String,
    pub code_block_classes: String,
    /// Single newlines inside paragraphs become `<br>`.
    pub breaks: bool,
    /// Bare URLs in text become links (needs the `linkify` feature).
    pub linkify: bool,
    /// Typographic replacements (`(c)`, `--`, `...`) and curly quotes.
    pub typographer: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            sanitize: true,
            allow_raw_html: false,
            scoped_css_prefix: "md-".to_string(),
            syntax_highlighter: SyntaxHighlighter::Inkjet,
            router_link_rewriting: true,
            lazy_images: true,
            enable_math: true,
            enable_diagrams: true,
            heading_ids: true,
            table_classes: "table table-striped".to_string(),
            code_block_classes: "code-block".to_string(),
            breaks: true,
            linkify: true,
            typographer: true,
        }
    }
}

/// Per-call overrides. Absent fields keep the renderer's defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct RenderOptionsOverride {
    pub sanitize: Option<bool>,
    pub allow_raw_html: Option<bool>,
    pub scoped_css_prefix: Option<String>,
    pub syntax_highlighter: Option<SyntaxHighlighter>,
    pub router_link_rewriting: Option<bool>,
    pub lazy_images: Option<bool>,
    pub enable_math: Option<bool>,
    pub enable_diagrams: Option<bool>,
    pub heading_ids: Option<bool>,
    pub table_classes: Option<String>,
    pub code_block_classes: Option<String>,
    pub breaks: Option<bool>,
    pub linkify: Option<bool>,
    pub typographer: Option<bool>,
}

impl RenderOptionsOverride {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn is_empty(&self) -> bool {
        *self == RenderOptionsOverride::default()
    }
}

macro_rules! merge_fields {
    ($target:ident, $overrides:ident, $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = &$overrides.$field {
                $target.$field = value.clone();
            }
        )+
    };
}

impl RenderOptions {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Field-by-field merge; an override wins whenever it is present.
    pub fn merged(&self, overrides: &RenderOptionsOverride) -> RenderOptions {
        let mut merged = self.clone();
        merge_fields!(
            merged,
            overrides,
            sanitize,
            allow_raw_html,
            scoped_css_prefix,
            syntax_highlighter,
            router_link_rewriting,
            lazy_images,
            enable_math,
            enable_diagrams,
            heading_ids,
            table_classes,
            code_block_classes,
            breaks,
            linkify,
            typographer,
        );
        merged
    }

    /// `name` with the scoped prefix applied.
    pub fn class(&self, name: &str) -> String {
        format!("{}{}", self.scoped_css_prefix, name)
    }
}
