mod common;

use chatmark::{
    render_markdown, MarkdownRenderer, RenderOptions, RenderOptionsOverride, SyntaxHighlighter,
};
use common::{init_logging, tags_balanced, CountingHighlighter, RecordingMath};
use rstest::rstest;
use std::sync::Arc;

fn renderer_with(math: Arc<RecordingMath>) -> MarkdownRenderer {
    init_logging();
    MarkdownRenderer::builder()
        .math_engine(math)
        .without_cache()
        .build()
}

#[test]
fn empty_input_is_empty_output() {
    assert_eq!(render_markdown("", &RenderOptions::default()), "");
    assert_eq!(MarkdownRenderer::new().render(""), "");
}

#[test]
fn inline_math_is_extracted() {
    let math = Arc::new(RecordingMath::default());
    let html = renderer_with(math.clone()).render("$E = mc^2$");
    assert_eq!(
        html,
        concat!(
            r#"<p class="md-paragraph"><span class="md-math-inline" data-math="E = mc^2">"#,
            "<math><mtext>E = mc^2</mtext></math></span></p>"
        )
    );
    assert_eq!(math.last(), Some(("E = mc^2".to_string(), false)));
}

#[test]
fn display_math_is_a_block() {
    let math = Arc::new(RecordingMath::default());
    let renderer = renderer_with(math.clone());

    let html = renderer.render("$$E = mc^2$$");
    assert!(html.starts_with(r#"<div class="md-math-block" data-math="E = mc^2">"#), "{html}");
    assert_eq!(math.last(), Some(("E = mc^2".to_string(), true)));

    let html = renderer.render("$$\n\\int_0^1 x\\,dx\n$$");
    assert!(html.starts_with(r#"<div class="md-math-block""#), "{html}");
    assert_eq!(math.last().map(|(_, display)| display), Some(true));
}

#[test]
fn chemistry_is_normalised_before_the_engine() {
    let math = Arc::new(RecordingMath::default());
    renderer_with(math.clone()).render(r"Water is $\text{H2O}$ and $\ce{H_2}\text{O}$.");
    let seen: Vec<String> = math.calls.lock().unwrap().iter().map(|(e, _)| e.clone()).collect();
    assert_eq!(seen, vec![r"\ce{H2O}".to_string(), r"\ce{H2O}".to_string()]);
}

#[test]
fn adjacent_arrows_are_all_normalised() {
    let math = Arc::new(RecordingMath::default());
    renderer_with(math.clone()).render(r"$A \rightarrow\rightarrow B$");
    assert_eq!(math.last(), Some((r"A \to\to B".to_string(), false)));
}

#[test]
fn typography_in_paragraphs() {
    let html = render_markdown("(c) 2024 -- \"quoted\"", &RenderOptions::default());
    assert_eq!(html, r#"<p class="md-paragraph">© 2024 – “quoted”</p>"#);

    let overrides = RenderOptionsOverride::from_json(r#"{"typographer": false}"#).unwrap();
    let html = MarkdownRenderer::new().render_with("(c) 2024 -- x", &overrides);
    assert_eq!(html, r#"<p class="md-paragraph">(c) 2024 -- x</p>"#);
}

#[test]
fn math_errors_degrade_to_source() {
    let math = Arc::new(RecordingMath::default());
    let html = renderer_with(math).render(r"$\bad x$");
    assert!(html.contains(r#"class="md-math-inline md-math-error""#), "{html}");
    assert!(html.contains(r"\bad x</span>"), "{html}");
}

#[test]
fn links_are_preserved() {
    let html = render_markdown("[Google](https://www.google.com)", &RenderOptions::default());
    assert_eq!(
        html,
        r#"<p class="md-paragraph"><a href="https://www.google.com" class="md-link" target="_blank" rel="noopener noreferrer">Google</a></p>"#
    );
}

#[test]
fn internal_links_use_the_router() {
    let html = render_markdown("Open [settings](/settings).", &RenderOptions::default());
    assert!(html.contains(r#"<router-link to="/settings" class="md-link">settings</router-link>"#));

    let options = RenderOptions {
        router_link_rewriting: false,
        ..Default::default()
    };
    let html = render_markdown("Open [settings](/settings).", &options);
    assert!(html.contains(r#"<a href="/settings" class="md-link">settings</a>"#), "{html}");
}

#[rstest]
#[case("[x](javascript:alert(1))")]
#[case("![x](data:text/html;base64,PHNjcmlwdD4=)")]
#[case("<a href=\"javascript:alert(1)\">x</a>")]
fn dangerous_urls_never_survive(#[case] markdown: &str) {
    let options = RenderOptions {
        allow_raw_html: true,
        ..Default::default()
    };
    let html = render_markdown(markdown, &options).to_ascii_lowercase();
    assert!(!html.contains("javascript:"), "{html}");
    assert!(!html.contains("data:text"), "{html}");
}

#[test]
fn raw_html_is_sanitized() {
    let options = RenderOptions {
        allow_raw_html: true,
        ..Default::default()
    };
    let html = render_markdown(
        "press <kbd>Ctrl</kbd> <script>alert(1)</script> <img src=x onerror=alert(2)>",
        &options,
    );
    assert!(html.contains("<kbd>Ctrl</kbd>"), "{html}");
    assert!(!html.contains("alert"), "{html}");

    let html = render_markdown("press <kbd>Ctrl</kbd>", &RenderOptions::default());
    assert!(html.contains("&lt;kbd&gt;Ctrl&lt;/kbd&gt;"), "{html}");
}

#[test]
fn headings_get_slug_ids() {
    let html = render_markdown("## Hello, World!", &RenderOptions::default());
    assert_eq!(html, r#"<h2 id="hello-world" class="md-heading md-h2">Hello, World!</h2>"#);

    let options = RenderOptions {
        heading_ids: false,
        ..Default::default()
    };
    assert_eq!(
        render_markdown("## Hello", &options),
        r#"<h2 class="md-heading md-h2">Hello</h2>"#
    );
}

#[test]
fn tables_keep_alignment() {
    let markdown = "| a | b | c |\n|:-:|--:|---|\n| 1 | 2 | 3 |\n| 4 | 5 | 6 |";
    let html = render_markdown(markdown, &RenderOptions::default());
    assert!(html.starts_with(r#"<table class="md-table table table-striped">"#), "{html}");
    assert_eq!(html.matches(r#"<tr class="md-table-row">"#).count(), 3);
    assert_eq!(html.matches(r#"style="text-align: center""#).count(), 3);
    assert_eq!(html.matches(r#"style="text-align: right""#).count(), 3);
    assert_eq!(html.matches(r#"style="text-align: left""#).count(), 3);
}

#[test]
fn table_without_separator_is_not_a_table() {
    let html = render_markdown("| a | b |\n| 1 | 2 |", &RenderOptions::default());
    assert!(!html.contains("<table"), "{html}");
    assert!(html.contains("| a | b |"), "{html}");
}

#[test]
fn javascript_fence_is_highlighted() {
    let html = render_markdown(
        "```javascript\nconst x = 1 < 2;\n```",
        &RenderOptions::default(),
    );
    assert!(html.contains("language-javascript"), "{html}");
    assert!(html.contains("md-highlighted"), "{html}");
    assert!(html.contains("&lt;"), "{html}");
    assert!(!html.contains("1 < 2"), "{html}");
}

#[test]
fn unknown_language_falls_back_to_escaped_text() {
    let html = render_markdown("```notalanguage\na < b && <script>\n```", &RenderOptions::default());
    assert!(html.contains("a &lt; b &amp;&amp; &lt;script&gt;"), "{html}");
    assert!(!html.contains("md-highlighted"), "{html}");
}

#[test]
fn injected_highlighter_and_disabled_highlighting() {
    let highlighter = Arc::new(CountingHighlighter::default());
    let renderer = MarkdownRenderer::builder()
        .code_highlighter(highlighter.clone())
        .without_cache()
        .build();

    let html = renderer.render("```shout\nhey\n```");
    assert!(html.contains(r#"<span class="md-hljs-keyword">HEY</span>"#), "{html}");
    assert_eq!(highlighter.count(), 1);

    let overrides = RenderOptionsOverride {
        syntax_highlighter: Some(SyntaxHighlighter::Disabled),
        ..Default::default()
    };
    let html = renderer.render_with("```shout\nhey\n```", &overrides);
    assert!(html.contains(">hey</code>"), "{html}");
    assert_eq!(highlighter.count(), 1);
}

#[test]
fn mermaid_blocks_become_diagrams() {
    let html = render_markdown("```mermaid\ngraph TD; A-->B\n```", &RenderOptions::default());
    assert!(html.contains(r#"<div class="md-diagram" data-diagram="mermaid">"#), "{html}");
    assert!(html.contains("A--&gt;B"), "{html}");
}

#[test]
fn lists_and_task_lists() {
    let html = render_markdown("3. three\n4. four\n\n- [x] done\n- [ ] todo", &RenderOptions::default());
    assert!(html.contains(r#"<ol class="md-list md-ordered-list" start="3">"#), "{html}");
    assert!(html.contains(r#"<ul class="md-task-list">"#), "{html}");
    assert_eq!(html.matches(r#"checked="""#).count(), 1);
    assert!(html.contains(r#"<span class="md-task-content">todo</span>"#), "{html}");
}

#[test]
fn blockquotes_nest() {
    let html = render_markdown("> outer\n> > inner", &RenderOptions::default());
    assert_eq!(html.matches(r#"<blockquote class="md-blockquote">"#).count(), 2);
}

#[test]
fn images_are_lazy_unless_overridden() {
    let renderer = MarkdownRenderer::new();
    let html = renderer.render("![cat](https://example.com/cat.png)");
    assert!(html.contains(r#"src="" data-src="https://example.com/cat.png""#), "{html}");

    let overrides = RenderOptionsOverride::from_json(r#"{"lazyImages": false}"#).unwrap();
    let html = renderer.render_with("![cat](https://example.com/cat.png)", &overrides);
    assert!(html.contains(r#"src="https://example.com/cat.png" alt="cat""#), "{html}");
}

#[test]
fn every_class_carries_the_prefix() {
    let options = RenderOptions {
        scoped_css_prefix: "chat-".to_string(),
        table_classes: String::new(),
        code_block_classes: String::new(),
        ..Default::default()
    };
    let html = render_markdown(
        "# T\n\npara `code`\n\n- a\n\n> q\n\n---\n\n```\nx\n```",
        &options,
    );
    for class_attr in html.split("class=\"").skip(1) {
        let classes = class_attr.split('"').next().unwrap_or_default();
        for class in classes.split_whitespace() {
            assert!(class.starts_with("chat-"), "{class} in {html}");
        }
    }
}

#[test]
fn sanitizing_can_be_disabled() {
    let options = RenderOptions {
        sanitize: false,
        ..Default::default()
    };
    let html = render_markdown("$x<1$", &options);
    assert!(html.contains(r#"data-math="x&lt;1""#), "{html}");
}

#[rstest]
#[case("```\nunterminated fence".to_string())]
#[case("$$\nunterminated display math".to_string())]
#[case("$unterminated inline".to_string())]
#[case("> ".repeat(200))]
#[case("*".repeat(500))]
#[case("[".repeat(300))]
#[case("**a ".repeat(100))]
#[case("|||\n|-|\n|".to_string())]
#[case("\u{E000}0\u{E001}".to_string())]
#[case("\r\n\r\n# heading\r\n".to_string())]
#[case("- [x]\n- \n1.".to_string())]
fn garbage_never_breaks_rendering(#[case] markdown: String) {
    init_logging();
    let html = MarkdownRenderer::new().render(&markdown);
    assert!(tags_balanced(&html), "{html}");
}

#[test]
fn random_bytes_never_break_rendering() {
    let mut state: u32 = 0x2545_f491;
    for _ in 0..50 {
        let bytes: Vec<u8> = (0..256)
            .map(|_| {
                // xorshift
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state & 0xff) as u8
            })
            .collect();
        let markdown = String::from_utf8_lossy(&bytes);
        let html = render_markdown(&markdown, &RenderOptions::default());
        assert!(tags_balanced(&html), "{html}");
    }
}
