//! Errors raised inside the pipeline. None of them escape the public
//! `render` entry points: they are turned into fallback markup at the node
//! that produced them.
use thiserror::Error;

/// Failure reported by a [`MathEngine`](crate::plugins::chat_plugins::math::MathEngine).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MathError {
    #[error("math parsing failed: {message}")]
    Parse { message: String },
    #[error("math rendering failed: {message}")]
    Render { message: String },
}

/// Failure reported by a [`CodeHighlighter`](crate::plugins::chat_plugins::highlight::CodeHighlighter).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HighlightError {
    #[error("unsupported language: {language}")]
    UnsupportedLanguage { language: String },
    #[error("syntax highlighting failed: {language}: {message}")]
    Highlight { language: String, message: String },
}

/// Invalid renderer configuration supplied by the host.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid render options: {0}")]
    Options(#[from] serde_json::Error),
    #[error("invalid origin url: {0}")]
    Origin(#[from] url::ParseError),
}
