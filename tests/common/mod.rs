#![allow(dead_code)]

use chatmark::{CodeHighlighter, HighlightError, MathEngine, MathError, MathOptions};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Route `chatmark` logs to the test writer; `RUST_LOG` overrides the level.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chatmark=debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Records every call and wraps the expression in `<mtext>`.
#[derive(Default)]
pub struct RecordingMath {
    pub calls: Mutex<Vec<(String, bool)>>,
}

impl RecordingMath {
    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<(String, bool)> {
        self.calls.lock().unwrap().last().cloned()
    }
}

impl MathEngine for RecordingMath {
    fn render(&self, expression: &str, options: &MathOptions) -> Result<String, MathError> {
        self.calls
            .lock()
            .unwrap()
            .push((expression.to_string(), options.display_mode));
        if expression.contains("\\bad") {
            return Err(MathError::Parse {
                message: "unknown command".to_string(),
            });
        }
        Ok(format!("<math><mtext>{expression}</mtext></math>"))
    }
}

/// Upper-cases `shout` code, rejects every other language.
#[derive(Default)]
pub struct CountingHighlighter {
    pub calls: AtomicUsize,
}

impl CountingHighlighter {
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CodeHighlighter for CountingHighlighter {
    fn highlight(&self, code: &str, language: &str, prefix: &str) -> Result<String, HighlightError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if language != "shout" {
            return Err(HighlightError::UnsupportedLanguage {
                language: language.to_string(),
            });
        }
        Ok(format!(
            "<span class=\"{prefix}hljs-keyword\">{}</span>",
            v_htmlescape::escape(&code.to_uppercase())
        ))
    }
}

// whole tags, quoted attribute values included, so a `<` inside a value is not a tag
static TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<(/?)([a-zA-Z][\w-]*)(?:\s+[^\s"'>/=]+(?:="[^"]*")?)*\s*/?>"#).unwrap()
});
const VOID: [&str; 4] = ["br", "hr", "img", "input"];

/// Every non-void opening tag has a matching closing tag, properly nested.
pub fn tags_balanced(html: &str) -> bool {
    let mut stack: Vec<&str> = Vec::new();
    for caps in TAG.captures_iter(html) {
        let name = caps.get(2).map_or("", |m| m.as_str());
        if VOID.contains(&name) {
            continue;
        }
        if caps[1].is_empty() {
            stack.push(name);
        } else if stack.pop() != Some(name) {
            return false;
        }
    }
    stack.is_empty()
}
