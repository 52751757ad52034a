use chatmark::{sanitize, RenderOptions};
use rstest::rstest;

fn clean(html: &str) -> String {
    sanitize(html, &RenderOptions::default())
}

#[rstest]
#[case("")]
#[case("plain text & <more>")]
#[case("<p onclick=\"x()\">a<iframe src=\"https://evil.example\"></iframe></p>")]
#[case("<div><table><tr><td>cell</td></tr></table></div>")]
#[case("<a href=\"https://example.com\" target=\"_blank\" rel=\"noopener noreferrer\">x</a>")]
#[case("<ul><li>one<li>two</ul>")]
#[case("<math><mfrac><mn>1</mn><mn>2</mn></mfrac></math>")]
#[case("<svg><script>alert(1)</script></svg>")]
#[case("<style>p { color: red }</style><p style=\"color: red; position: fixed\">x</p>")]
#[case("<img src=\"x.png\" alt=\"a &quot;b&quot;\" loading=\"lazy\">")]
#[case("<!-- comment --><p>after</p>")]
#[case("<p>nested <em><strong>tags</em></strong></p>")]
fn sanitizing_is_idempotent(#[case] html: &str) {
    let once = clean(html);
    assert_eq!(clean(&once), once);
}

#[rstest]
#[case("<script>alert(1)</script>", "")]
#[case("<p onmouseover=\"alert(1)\">x</p>", "<p>x</p>")]
#[case("<iframe src=\"https://evil.example\"></iframe>text", "text")]
#[case("<!-- hidden --><p>seen</p>", "<p>seen</p>")]
#[case("<form><input type=\"text\" name=\"q\"></form>", "<input>")]
fn disallowed_markup_is_stripped(#[case] html: &str, #[case] expected: &str) {
    assert_eq!(clean(html), expected);
}

#[rstest]
#[case("<a href=\"javascript:alert(1)\">x</a>")]
#[case("<a href=\"jav&#x09;ascript:alert(1)\">x</a>")]
#[case("<img src=\"data:text/html,<script>alert(1)</script>\">")]
#[case("<a href=\"vbscript:msgbox(1)\">x</a>")]
#[case("<p style=\"background: url(javascript:alert(1))\">x</p>")]
fn script_urls_are_neutralised(#[case] html: &str) {
    let cleaned = clean(html).to_ascii_lowercase();
    assert!(!cleaned.contains("javascript"), "{cleaned}");
    assert!(!cleaned.contains("vbscript"), "{cleaned}");
    assert!(!cleaned.contains("data:text"), "{cleaned}");
}

#[test]
fn only_listed_data_attributes_survive() {
    let html = r#"<div data-kind="table" data-evil="1" data-math="x">y</div>"#;
    assert_eq!(clean(html), r#"<div data-kind="table" data-math="x">y</div>"#);
}
