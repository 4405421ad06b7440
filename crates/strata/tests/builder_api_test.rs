//! Integration tests for the TimelineBuilder API

use strata::{
    InputError, StrataError, TimelineBuilder,
    config::{AppConfig, LayoutConfig, StyleConfig},
    input::RawEntry,
    model::Warning,
};

const LANGUAGES: &str = r#"
[[entry]]
id = "latin"
name = "Latin"
start = -75
end = 600

[[entry]]
id = "old-french"
name = "Old French"
start = 600
end = 1400
split = "latin"
become = "french"

[[entry]]
id = "french"
start = 1400
end = 2000

[[entry]]
id = "old-spanish"
start = 650
end = 1500
split = "latin"
links = ["old-french"]

[[entry]]
id = "gothic"
start = 300
end = 800
merge = "vandal"
"#;

#[test]
fn test_parse_layout_render() {
    let builder = TimelineBuilder::default();

    let mut timeline = builder.parse(LANGUAGES).expect("Failed to parse timeline");
    let summary = builder.layout(&mut timeline).expect("Failed to lay out timeline");
    let svg = builder.render_svg(&timeline).expect("Failed to render timeline");

    assert!(summary.rows >= 3);
    assert!(svg.contains("<svg"), "Output should contain SVG tag");
    assert!(svg.contains("</svg>"), "Output should be complete SVG");
    assert!(svg.contains("Old French"));
}

#[test]
fn test_continuation_ids_share_a_row() {
    let builder = TimelineBuilder::default();
    let mut timeline = builder.parse(LANGUAGES).unwrap();
    builder.layout(&mut timeline).unwrap();

    assert_eq!(timeline.row_of("old-french"), timeline.row_of("french"));
    let assignments = timeline.row_assignments().unwrap();
    assert_eq!(assignments.len(), 5);
    assert_eq!(assignments[0].0, "latin");
}

#[test]
fn test_unresolved_merge_is_warning() {
    let builder = TimelineBuilder::default();
    let mut timeline = builder.parse(LANGUAGES).unwrap();
    builder.layout(&mut timeline).unwrap();

    assert!(timeline.row_of("gothic").is_some());
    assert!(timeline.warnings().iter().any(|warning| matches!(
        warning,
        Warning::UnresolvedReference { target, .. } if target == "vandal"
    )));
}

#[test]
fn test_syntax_error_keeps_source() {
    let source = "[[entry]]\nid = \"broken\"\nstart = \"soon\"\nend = 10\n";

    let err = TimelineBuilder::default().parse(source).unwrap_err();

    match err {
        StrataError::Input { err, src } => {
            assert!(matches!(err, InputError::Syntax { span: Some(_), .. }));
            assert_eq!(src, source);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_build_from_entries() {
    let builder = TimelineBuilder::new(AppConfig::new(LayoutConfig::new(false), StyleConfig::default()));

    let mut timeline = builder
        .build(vec![
            RawEntry::new("a", 1900, 1950),
            RawEntry::new("b", 1950, 2000).with_split("a"),
        ])
        .unwrap();
    let summary = builder.layout(&mut timeline).unwrap();

    assert_eq!(summary.adjusted, 0);
    assert_eq!(summary.clusters, 1);
    assert_eq!(timeline.total_deviation(), 0);
}

#[test]
fn test_render_before_layout_fails() {
    let builder = TimelineBuilder::default();
    let timeline = builder.build(vec![RawEntry::new("early", 1900, 1950)]).unwrap();

    let err = builder.render_svg(&timeline).unwrap_err();

    assert!(matches!(err, StrataError::Layout(_)));
}

#[test]
fn test_invalid_style_color_fails_render() {
    let config: AppConfig = toml::from_str("[style]\nbackground_color = \"nope\"").unwrap();
    let builder = TimelineBuilder::new(config);
    let mut timeline = builder.build(vec![RawEntry::new("x", 1900, 1950)]).unwrap();
    builder.layout(&mut timeline).unwrap();

    let err = builder.render_svg(&timeline).unwrap_err();

    assert!(matches!(err, StrataError::Export(_)));
}
