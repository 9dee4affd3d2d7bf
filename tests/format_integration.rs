//! End-to-end checks of the public formatting API.
//!
//! Exercises the engine the way the bot does: authored text in, transport
//! HTML out, plus the edit path (spans to markup to HTML) and the service
//! wrapper with its configuration snapshot.

use regex::Regex;

use post_formatter::config::{ConfigHandle, FormatterConfig};
use post_formatter::error::FormatError;
use post_formatter::format::{
    ALLOWED_TAGS, Dialect, FooterLink, FooterSlot, Span, SpanKind, compose_footer, convert,
    is_passthrough, reconstruct_markup,
};
use post_formatter::post::PostRenderer;

const SAMPLES: &[&str] = &[
    "# Weekly digest :newspaper:\n\n**Top story**: prices < costs & margins > 0\n\n- one\n- two",
    "1. first\n2. second\n   - nested\n\n> quoted *text*\n\n---\n\n| k | v |\n|---|---|\n| a | b |",
    "```python\nif a < b and c > d:\n    print('&')\n```\nafter `x<y>` code",
    "***x*** **bold _mixed_** ~~old~~ __under__ [link](https://t.me/chan_name)",
    "snake_case_name 2 * 3 * 4 a<bc>d & e;",
    "unbalanced **bold and *italic\n\n\n\n\nlots of space",
    "<div>not allowed</div> & <script>alert(1)</script>",
    "[docs](https://t.me/my_chan_bot) and [code](`x<y`) | [u](https://x.io/*a*_b_)",
    "| `a<b` | **x** |\n|---|---|\n| [l](https://x.io/~s~) | _y_ |",
];

/// Remove every whitelisted tag, leaving only the text between them.
fn strip_allowed_tags(html: &str) -> String {
    let names = ALLOWED_TAGS.join("|");
    let tag = Regex::new(&format!(r#"</?(?:{names})(?: href="[^"<>]*"| class="[^"<>]*")?>"#))
        .unwrap();
    tag.replace_all(html, "").into_owned()
}

fn assert_escaped(html: &str) {
    let text = strip_allowed_tags(html);
    assert!(!text.contains('<'), "raw < in {html:?}");
    assert!(!text.contains('>'), "raw > in {html:?}");
    let entity = Regex::new(r"^&(?:amp|lt|gt|quot);").unwrap();
    for (i, _) in text.match_indices('&') {
        assert!(entity.is_match(&text[i..]), "raw & in {html:?}");
    }
}

#[test]
fn plain_conversion_is_idempotent() {
    for sample in SAMPLES {
        let once = convert(sample, Dialect::Plain);
        assert_eq!(convert(&once, Dialect::Plain), once, "sample {sample:?}");
        assert!(!once.contains("<b>") && !once.contains("<i>"));
    }
}

#[test]
fn html_output_escapes_everything_outside_allowed_tags() {
    for sample in SAMPLES {
        assert!(!is_passthrough(sample));
        assert_escaped(&convert(sample, Dialect::Html));
        assert_escaped(&convert(sample, Dialect::Markdown));
        assert_escaped(&convert(sample, Dialect::Modern));
    }
}

#[test]
fn code_is_rendered_literally() {
    assert_eq!(
        convert("`**not bold**`", Dialect::Markdown),
        "<code>**not bold**</code>"
    );
}

#[test]
fn lists_degrade_to_bullets() {
    assert_eq!(convert("- a\n- b", Dialect::Markdown), "• a\n• b");
}

#[test]
fn table_degrades_to_header_rule_and_rows() {
    let out = convert("| A | B |\n|---|---|\n| 1 | 2 |", Dialect::Markdown);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "A | B");
    assert!(lines[1].chars().all(|c| c == '-'));
    assert_eq!(lines[2], "1 | 2");
}

#[test]
fn triple_star_is_one_bold_italic_span() {
    assert_eq!(convert("***x***", Dialect::Markdown), "<b><i>x</i></b>");
}

#[test]
fn spans_survive_reconstruction_and_conversion() {
    let cases: Vec<(&str, Vec<Span>, &str)> = vec![
        (
            "hello world code",
            vec![
                Span::new(SpanKind::Bold, 0, 5),
                Span::new(SpanKind::Italic, 6, 5),
                Span::new(SpanKind::Code, 12, 4),
            ],
            "<b>hello</b> <i>world</i> <code>code</code>",
        ),
        (
            "price: 5 < 7 & done",
            vec![Span::new(SpanKind::Bold, 0, 5), Span::new(SpanKind::Code, 7, 5)],
            "<b>price</b>: <code>5 &lt; 7</code> &amp; done",
        ),
        (
            "Тест эмодзи 🚀 готов",
            vec![Span::new(SpanKind::Italic, 5, 6), Span::new(SpanKind::Bold, 14, 5)],
            "Тест <i>эмодзи</i> 🚀 <b>готов</b>",
        ),
        (
            "abcd",
            vec![Span::new(SpanKind::Bold, 0, 2), Span::new(SpanKind::Italic, 2, 2)],
            "<b>ab</b><i>cd</i>",
        ),
        (
            "abcdef",
            vec![Span::new(SpanKind::Italic, 0, 3), Span::new(SpanKind::Bold, 3, 3)],
            "<i>abc</i><b>def</b>",
        ),
        (
            "abcd",
            vec![Span::new(SpanKind::Underline, 0, 2), Span::new(SpanKind::Bold, 2, 2)],
            "<u>ab</u><b>cd</b>",
        ),
        (
            "abcd",
            vec![Span::new(SpanKind::Bold, 0, 2), Span::new(SpanKind::Code, 2, 2)],
            "<b>ab</b><code>cd</code>",
        ),
        (
            "abcd",
            vec![Span::new(SpanKind::Bold, 0, 2), Span::new(SpanKind::Bold, 2, 2)],
            "<b>abcd</b>",
        ),
        (
            "a_b c",
            vec![Span::new(SpanKind::Code, 0, 3), Span::new(SpanKind::Underline, 4, 1)],
            "<code>a_b</code> <u>c</u>",
        ),
    ];

    for (text, spans, expected) in cases {
        let markup = reconstruct_markup(text, &spans, Dialect::Markdown);
        assert_eq!(convert(&markup, Dialect::Markdown), expected, "markup {markup:?}");

        let html = reconstruct_markup(text, &spans, Dialect::Html);
        assert_eq!(convert(&html, Dialect::Html), expected, "html {html:?}");
    }
}

#[test]
fn link_targets_are_never_rewritten() {
    assert_eq!(
        convert("[a](https://x.io/_c_)", Dialect::Markdown),
        "<a href=\"https://x.io/_c_\">a</a>"
    );
    assert_eq!(
        convert("[a](https://x.io/*p*/q)", Dialect::Markdown),
        "<a href=\"https://x.io/*p*/q\">a</a>"
    );
    assert_eq!(
        convert("[a](https://x.io/~u~)", Dialect::Modern),
        "<a href=\"https://x.io/~u~\">a</a>\n\n"
    );
    assert_eq!(
        convert("[x](`u`)", Dialect::Markdown),
        "[x](<code>u</code>)"
    );
}

#[test]
fn table_with_code_cells_stays_aligned() {
    let out = convert("| `abcdef` | x |\n|---|---|\n| a | y |", Dialect::Markdown);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "<code>abcdef</code> | x");
    assert_eq!(lines[1], "----------");
    assert_eq!(lines[2], "a      | y");
}

#[test]
fn spans_deserialize_from_transport_entities() {
    let raw = r#"[
        {"type": "bold", "offset": 0, "length": 4},
        {"type": "text_link", "offset": 5, "length": 4, "url": "https://x.io"},
        {"type": "mention", "offset": 10, "length": 3}
    ]"#;
    let spans: Vec<Span> = serde_json::from_str(raw).unwrap();
    assert_eq!(spans[1].kind, SpanKind::Link);
    assert_eq!(spans[2].kind, SpanKind::Unsupported);

    assert_eq!(
        reconstruct_markup("Bold link @me", &spans, Dialect::Markdown),
        "**Bold** [link](https://x.io) @me"
    );
}

#[test]
fn footer_is_stable() {
    let links = [
        FooterLink::new(FooterSlot::SupportBot, "Help", "https://t.me/help_bot"),
        FooterLink::new(FooterSlot::Channel, "News", "https://t.me/news"),
        FooterLink::new(FooterSlot::MainBot, "Bot", "https://t.me/main_bot"),
    ];
    for dialect in Dialect::ALL {
        let first = compose_footer(&links, dialect);
        let _ = convert("**unrelated** work", dialect);
        assert_eq!(compose_footer(&links, dialect), first);
        assert_eq!(first.matches(" | ").count(), 2);
    }
    assert!(compose_footer(&links, Dialect::Plain).starts_with("Bot: "));
}

#[test]
fn renderer_applies_config_snapshot() {
    let handle = ConfigHandle::new(FormatterConfig {
        footer_links: vec![FooterLink::new(FooterSlot::MainBot, "Bot", "https://t.me/main_bot")],
        max_message_len: 64,
        ..FormatterConfig::default()
    });
    let renderer = PostRenderer::new(handle.clone());

    let post = renderer.render("**Launch** today", None).unwrap();
    assert_eq!(
        post.text,
        "<b>Launch</b> today\n\n<a href=\"https://t.me/main_bot\">Bot</a>"
    );

    handle.set_default_dialect(Dialect::Plain);
    let post = renderer.render("**Launch** today", None).unwrap();
    assert_eq!(post.text, "Launch today\n\nBot: https://t.me/main_bot");

    let err = renderer.render(&"x".repeat(100), None).unwrap_err();
    assert!(matches!(err, FormatError::SizeLimitExceeded { max: 64, .. }));
}

#[test]
fn transport_rejection_asks_for_a_fix() {
    let err = FormatError::from_transport("Bad Request: can't parse entities: unclosed start tag");
    assert!(err.is_retryable());
    assert!(err.to_string().contains("Fix the markup"));
}

#[tokio::test]
async fn offloaded_rendering_runs_concurrently() {
    let renderer = PostRenderer::new(ConfigHandle::default());
    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let renderer = renderer.clone();
            tokio::spawn(async move {
                renderer
                    .render_offloaded(format!("**post {i}**"), None)
                    .await
            })
        })
        .collect();

    for (i, task) in tasks.into_iter().enumerate() {
        let post = task.await.unwrap().unwrap();
        assert_eq!(post.text, format!("<b>post {i}</b>"));
    }
}
