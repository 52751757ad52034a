use phf::phf_map;

/// Blocks nested deeper than this (blockquotes inside blockquotes) are
/// rendered as plain paragraphs instead of being parsed further.
pub const MAX_NESTING: usize = 32;

/// Emphasis markers nested deeper than this are left as literal text.
pub const MAX_EMPHASIS_DEPTH: usize = 16;

/// Private-use code points that bracket placeholder indices during inline
/// rendering. Any occurrence in user text is stripped before inline parsing.
pub const PLACEHOLDER_OPEN: char = '\u{E000}';
pub const PLACEHOLDER_CLOSE: char = '\u{E001}';

pub const ROUTER_LINK_TAG: &str = "router-link";

// list of inkjet classes: https://docs.rs/inkjet/latest/src/inkjet/constants.rs.html#100-189
// highlight.js class reference: https://highlightjs.readthedocs.io/en/latest/css-classes-reference.html
// the front-end themes are hljs themes, so code spans carry `hljs-*` classes (scoped with the css prefix)
pub static INKJET_TO_HLJS_CLASS_MAP: phf::Map<&'static str, &'static str> = phf_map! {
    "attribute" => "hljs-attr",
    "type" => "hljs-type",
    "type builtin" => "hljs-built_in",
    "type enum" => "hljs-type",
    "type enum variant" => "hljs-variable constant_",
    "constructor" => "hljs-title class_",

    "constant" => "hljs-variable constant_",
    "constant builtin" => "hljs-literal",
    "constant builtin boolean" => "hljs-literal",
    "constant character" => "hljs-string",
    "constant character escape" => "hljs-char escape_",
    "constant numeric" => "hljs-number",
    "constant numeric integer" => "hljs-number",
    "constant numeric float" => "hljs-number",

    "string" => "hljs-string",
    "string regexp" => "hljs-regexp",
    "string special" => "hljs-symbol",
    "string special path" => "hljs-link",
    "string special url" => "hljs-link",
    "string special symbol" => "hljs-symbol",
    "escape" => "hljs-char escape_",

    "comment" => "hljs-comment",
    "comment line" => "hljs-comment",
    "comment block" => "hljs-comment",
    "comment block documentation" => "hljs-doctag",

    "variable" => "hljs-variable",
    "variable builtin" => "hljs-variable language_",
    "variable parameter" => "hljs-params",
    "variable other" => "hljs-variable",
    "variable other member" => "hljs-property",
    "label" => "hljs-symbol",

    "punctuation" => "hljs-punctuation",
    "punctuation delimiter" => "hljs-punctuation",
    "punctuation bracket" => "hljs-punctuation",
    "punctuation special" => "hljs-punctuation",

    "operator" => "hljs-operator",
    "keyword operator" => "hljs-keyword",

    "keyword" => "hljs-keyword",
    "keyword control" => "hljs-keyword",
    "keyword control conditional" => "hljs-keyword",
    "keyword control repeat" => "hljs-keyword",
    "keyword control import" => "hljs-keyword",
    "keyword control return" => "hljs-keyword",
    "keyword control exception" => "hljs-keyword",
    "keyword directive" => "hljs-meta",
    "keyword function" => "hljs-keyword",
    "keyword storage" => "hljs-keyword",
    "keyword storage type" => "hljs-type",
    "keyword storage modifier" => "hljs-keyword",

    "function" => "hljs-title function_",
    "function builtin" => "hljs-built_in",
    "function method" => "hljs-title function_",
    "function macro" => "hljs-meta",
    "function special" => "hljs-title function_",

    "tag" => "hljs-tag",
    "tag builtin" => "hljs-name",
    "namespace" => "hljs-title class_",

    "special" => "hljs-meta",

    "markup" => "hljs-section",
    "markup heading" => "hljs-section",
    "markup heading marker" => "hljs-section",
    "markup heading 1" => "hljs-section",
    "markup heading 2" => "hljs-section",
    "markup heading 3" => "hljs-section",
    "markup heading 4" => "hljs-section",
    "markup heading 5" => "hljs-section",
    "markup heading 6" => "hljs-section",

    "markup list" => "hljs-bullet",
    "markup list unnumbered" => "hljs-bullet",
    "markup list numbered" => "hljs-bullet",
    "markup list checked" => "hljs-bullet",
    "markup list unchecked" => "hljs-bullet",

    "markup bold" => "hljs-strong",
    "markup italic" => "hljs-emphasis",
    "markup strikethrough" => "hljs-deletion",

    "markup link" => "hljs-link",
    "markup link url" => "hljs-link",
    "markup link label" => "hljs-string",
    "markup link text" => "hljs-string",

    "markup quote" => "hljs-quote",
    "markup raw" => "hljs-code",
    "markup raw inline" => "hljs-code",
    "markup raw block" => "hljs-code",

    "diff" => "hljs-meta",
    "diff plus" => "hljs-addition",
    "diff minus" => "hljs-deletion",
    "diff delta" => "hljs-meta",
    "diff delta moved" => "hljs-meta",
};
