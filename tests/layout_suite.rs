use std::path::Path;

use proptest::prelude::*;
use seqsketch::layout::{Primitive, StyleClass, count_rows};
use seqsketch::{
    AspectRatio, LayoutConfig, RenderOptions, Theme, compute_layout, parse_sequence, render_svg,
    render_with_options,
};

fn assert_valid_svg(svg: &str, fixture: &str) {
    assert!(svg.contains("<svg"), "{fixture}: missing <svg tag");
    assert!(svg.contains("</svg>"), "{fixture}: missing </svg tag");
}

fn read_fixture(rel: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(rel);
    assert!(path.exists(), "fixture missing: {}", rel);
    std::fs::read_to_string(path).expect("fixture read failed")
}

fn render_fixture(rel: &str) -> String {
    let input = read_fixture(rel);
    let diagram = parse_sequence(&input).expect("parse failed");
    let theme = Theme::default();
    let layout = compute_layout(&diagram, &LayoutConfig::default());
    render_svg(&layout, &theme, (layout.width, layout.height))
}

#[test]
fn render_all_fixtures() {
    // Keep this list explicit so new fixtures must be added intentionally.
    let candidates = [
        "alt.seq",
        "basic.seq",
        "nested.seq",
        "self_async.seq",
        "unbalanced.seq",
    ];

    for rel in candidates {
        let svg = render_fixture(rel);
        assert_valid_svg(&svg, rel);
    }
}

#[test]
fn nested_fixture_matches_row_budget() {
    let diagram = parse_sequence(&read_fixture("nested.seq")).expect("parse failed");
    assert_eq!(
        diagram.participants,
        vec!["Client", "Gateway", "Auth", "Audit", "Service", "Store"]
    );
    let config = LayoutConfig::default();
    let layout = compute_layout(&diagram, &config);
    assert_eq!(layout.rows, count_rows(&diagram.elements));
    let expected_height = config.top_margin
        + config.participant_height
        + layout.rows as f32 * config.row_height
        + config.lifeline_extension;
    assert_eq!(layout.height, expected_height.round() as u32);
    // loop, alt, par, critical, break, opt
    assert_eq!(layout.primitives_of(StyleClass::FragmentBox).count(), 6);
    assert_eq!(layout.primitives_of(StyleClass::FragmentDivider).count(), 2);
}

#[test]
fn alt_fixture_draws_both_branches() {
    let svg = render_fixture("alt.seq");
    assert!(svg.contains(">alt</text>"));
    assert!(svg.contains(">[success]</text>"));
    assert!(svg.contains(">[failure]</text>"));
    assert_eq!(svg.matches("class=\"fragment-divider\"").count(), 1);
}

#[test]
fn self_and_async_fixture() {
    let diagram = parse_sequence(&read_fixture("self_async.seq")).expect("parse failed");
    assert!(diagram.participants.contains(&"my-app".to_string()));
    let layout = compute_layout(&diagram, &LayoutConfig::default());
    let loops = layout
        .primitives_of(StyleClass::MessageLine)
        .filter(|p| matches!(p, Primitive::Polyline { .. }))
        .count();
    assert_eq!(loops, 1);
}

#[test]
fn unbalanced_fixture_reports_open_activations() {
    let diagram = parse_sequence(&read_fixture("unbalanced.seq")).expect("parse failed");
    let layout = compute_layout(&diagram, &LayoutConfig::default());
    let open: Vec<_> = layout
        .activations
        .iter()
        .filter(|interval| !interval.closed)
        .map(|interval| interval.participant.as_str())
        .collect();
    assert_eq!(open, vec!["A", "B"]);
    assert!(layout.activations.iter().all(|i| i.end_row >= i.start_row));
}

#[test]
fn themed_render_with_aspect_ratio() {
    let input = read_fixture("basic.seq");
    let options = RenderOptions::default()
        .with_theme(Theme::dark())
        .with_aspect_ratio(AspectRatio::Widescreen);
    let rendered = render_with_options(&input, &options).expect("render failed");
    assert_valid_svg(&rendered.svg, "basic.seq");
    assert!(rendered.svg.contains("#37474F"));
    let ratio = rendered.width as f64 / rendered.height as f64;
    assert!((ratio - 16.0 / 9.0).abs() < 0.02, "ratio {ratio}");
}

#[test]
fn structural_errors_surface() {
    for (input, line) in [
        ("sequence:\nloop\nA -> B: x\nelse\nend", Some(4)),
        ("sequence:\nA -> B: x\nend", Some(3)),
        ("sequence:\nalt [a]\nA -> B: x", Some(2)),
        ("A -> B: x", None),
    ] {
        let err = parse_sequence(input).expect_err(input);
        assert_eq!(err.line(), line, "{input}");
    }
}

fn arb_name() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["A", "B", "Cart", "db-1"])
}

fn arb_line() -> impl Strategy<Value = String> {
    (arb_name(), prop::sample::select(vec!["->", "->>", "-->"]), arb_name(), "[a-z ]{0,8}")
        .prop_map(|(from, arrow, to, text)| format!("{from} {arrow} {to}: {text}"))
}

/// Random well-nested sources built from messages and fragments.
fn arb_source() -> impl Strategy<Value = String> {
    let leaf = prop::collection::vec(arb_line(), 1..3);
    leaf.prop_recursive(3, 40, 4, |inner| {
        (
            prop::sample::select(vec!["loop", "alt", "opt", "par", "critical"]),
            prop::collection::vec(inner.clone(), 0..3),
            prop::collection::vec(inner, 0..2),
        )
            .prop_map(|(keyword, body, branches)| {
                let mut lines = vec![format!("{keyword} [c]")];
                lines.extend(body.into_iter().flatten());
                if keyword == "alt" {
                    for branch in branches {
                        lines.push("else [d]".to_string());
                        lines.extend(branch);
                    }
                }
                lines.push("end".to_string());
                lines
            })
    })
    .prop_map(|lines| format!("sequence:\n{}", lines.join("\n")))
}

proptest! {
    #[test]
    fn canonical_source_round_trips(source in arb_source()) {
        let parsed = parse_sequence(&source).unwrap();
        let again = parse_sequence(&parsed.to_source()).unwrap();
        prop_assert_eq!(&parsed, &again);
    }

    #[test]
    fn rendering_is_deterministic(source in arb_source()) {
        let options = RenderOptions::default();
        let first = render_with_options(&source, &options).unwrap();
        let second = render_with_options(&source, &options).unwrap();
        prop_assert_eq!(first, second);
    }
}
