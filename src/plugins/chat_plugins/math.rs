//! Math rendering: the engine seam, the default pulldown-latex engine (with
//! a small memo cache), and the adapter that wraps engine output in markup.
use cached::proc_macro::cached;
use pulldown_latex::config::DisplayMode;
use pulldown_latex::RenderConfig;
use pulldown_latex::{mathml::push_mathml, Parser, Storage};
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

use crate::error::MathError;
use crate::mdparser::renderer::{HtmlRenderer, RenderContext, Renderer};
use crate::panic_message;
use crate::plugins::chat_plugins::chem::lower_mhchem;

/// Markup an engine is asked to produce.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Html,
    #[default]
    MathMl,
    HtmlAndMathMl,
}

/// Options handed to a [`MathEngine`] for each expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MathOptions {
    pub display_mode: bool,
    /// Always `false` from the adapter: failures come back as `Err`, never panics.
    pub throw_on_error: bool,
    /// Allow `\ce` and similar extension commands.
    pub trust: bool,
    pub output_format: OutputFormat,
}

impl Default for MathOptions {
    fn default() -> Self {
        MathOptions {
            display_mode: false,
            throw_on_error: false,
            trust: true,
            output_format: OutputFormat::MathMl,
        }
    }
}

/// Turns a LaTeX expression into markup.
pub trait MathEngine: Send + Sync {
    fn render(&self, expression: &str, options: &MathOptions) -> Result<String, MathError>;
}

/// MathML via pulldown-latex, with mhchem `\ce{}` lowered to plain LaTeX first.
#[derive(Debug, Clone, Copy)]
pub struct PulldownLatexEngine {
    cache: bool,
}

impl PulldownLatexEngine {
    pub const fn new(cache: bool) -> Self {
        PulldownLatexEngine { cache }
    }
}

impl Default for PulldownLatexEngine {
    fn default() -> Self {
        PulldownLatexEngine::new(true)
    }
}

impl MathEngine for PulldownLatexEngine {
    fn render(&self, expression: &str, options: &MathOptions) -> Result<String, MathError> {
        if options.output_format != OutputFormat::MathMl {
            return Err(MathError::Render {
                message: format!("pulldown-latex cannot produce {:?} output", options.output_format),
            });
        }
        let expression = if options.trust {
            lower_mhchem(expression)
        } else {
            expression.into()
        };
        if self.cache {
            math_render_cached(expression.into_owned(), options.display_mode)
        } else {
            math_render(&expression, options.display_mode)
        }
    }
}

#[cached(size = 128, result = true)]
fn math_render_cached(math: String, block_display_mode: bool) -> Result<String, MathError> {
    math_render(&math, block_display_mode)
}

fn math_render(math: &str, block_display_mode: bool) -> Result<String, MathError> {
    let storage = Storage::new();
    let parser = Parser::new(math, &storage);
    let config = RenderConfig {
        display_mode: if block_display_mode {
            DisplayMode::Block
        } else {
            DisplayMode::Inline
        },
        ..Default::default()
    };

    let events: Vec<_> = parser.collect();
    let errors: Vec<String> = events
        .iter()
        .filter_map(|event| event.as_ref().err().map(ToString::to_string))
        .collect();
    if !errors.is_empty() {
        return Err(MathError::Parse {
            message: errors.join("; "),
        });
    }

    let mut mathml = String::new();
    push_mathml(&mut mathml, events.into_iter(), config).map_err(|err| MathError::Render {
        message: err.to_string(),
    })?;

    // some parsing errors show up in the converted text instead of being raised
    if mathml.contains("parsing error") && mathml.contains("╭─►") {
        return Err(MathError::Parse {
            message: "parser reported an inline error".to_string(),
        });
    }
    Ok(mathml)
}

/// Where a math expression sits, which decides its container and display mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathPlacement {
    /// `$...$` inside text.
    Inline,
    /// `$$...$$` inside a line of text.
    InlineDisplay,
    /// A `$$` block of its own.
    Block,
}

/// Render one expression through the context's engine. Never fails: engine
/// errors (and engine panics) produce the escaped source with an error class.
pub fn render_math(expression: &str, placement: MathPlacement, ctx: &RenderContext<'_>) -> String {
    let mut fmt = HtmlRenderer::new(ctx.escaper);

    if !ctx.options.enable_math {
        let delimiter = match placement {
            MathPlacement::Inline => "$",
            MathPlacement::InlineDisplay | MathPlacement::Block => "$$",
        };
        fmt.text(&format!("{delimiter}{expression}{delimiter}"));
        return fmt.into_string();
    }

    let (tag, class) = match placement {
        MathPlacement::Inline => ("span", "math-inline"),
        MathPlacement::InlineDisplay => ("span", "math-block"),
        MathPlacement::Block => ("div", "math-block"),
    };
    let options = MathOptions {
        display_mode: placement != MathPlacement::Inline,
        ..MathOptions::default()
    };

    let rendered = panic::catch_unwind(AssertUnwindSafe(|| ctx.math.render(expression, &options)))
        .unwrap_or_else(|payload| {
            warn!(target: "chatmark::math", panic = %panic_message(payload.as_ref()), "math engine panicked");
            Err(MathError::Render {
                message: "engine panicked".to_string(),
            })
        });

    match rendered {
        Ok(markup) => {
            fmt.open(tag, &[("class", ctx.class(class)), ("data-math", expression.to_string())]);
            fmt.text_raw(&markup);
        }
        Err(err) => {
            debug!(target: "chatmark::math", error = %err, expression, "math fell back to source");
            fmt.open(
                tag,
                &[
                    ("class", format!("{} {}", ctx.class(class), ctx.class("math-error"))),
                    ("data-math", expression.to_string()),
                ],
            );
            fmt.text(expression);
        }
    }
    fmt.close(tag);
    fmt.into_string()
}
