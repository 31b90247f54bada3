//! Tests for pattern compilation and the instruction listing.

use rstest::rstest;

use crate::{
    Anchor, Axis, CaptureKind, CompileError, EngineConfig, MAX_PROGRAM_LEN, Pattern, PatternNode,
    Template, TemplateAtom, ValueTest,
};

fn listing(text: &str) -> String {
    Pattern::compile(text).expect("pattern").program().to_string()
}

#[test]
fn star_compiles_to_split_loop() {
    insta::assert_snapshot!(listing("a*b"), @r#"
    0: SPLIT 1, 3
    1: FIND child "a"
    2: JUMP 0
    3: FIND child "b"
    4: MATCH
    "#);
}

#[test]
fn alternation_tries_branches_in_order() {
    insta::assert_snapshot!(listing("x|y"), @r#"
    0: SPLIT 1, 3
    1: FIND child "x"
    2: JUMP 4
    3: FIND child "y"
    4: MATCH
    "#);
}

#[test]
fn captures_annotate_their_find() {
    insta::assert_snapshot!(listing("list/x:item"), @r#"
    0: FIND child "list"
    1: FIND child "item" @0
    2: MATCH
    "#);
}

#[test]
fn anchors_and_lazy_bounded_repetition() {
    insta::assert_snapshot!(listing("/a//b{1,2}?$"), @r#"
    0: ASSERT root
    1: FIND child "a"
    2: FIND descendant "b"
    3: SPLIT 5, 4
    4: FIND descendant "b"
    5: ASSERT leaf
    6: MATCH
    "#);
}

#[test]
fn parent_steps_climb_without_consuming() {
    insta::assert_snapshot!(listing("a/b>/c"), @r#"
    0: FIND child "a"
    1: FIND child "b"
    2: PARENT
    3: FIND child "c"
    4: MATCH
    "#);
}

#[test]
fn back_references_test_against_a_capture() {
    insta::assert_snapshot!(listing("x:a/$x"), @r#"
    0: FIND child "a" @0
    1: FIND child $x
    2: MATCH
    "#);
}

#[test]
fn juxtaposition_means_child() {
    let spaced = Pattern::compile("list item").expect("pattern");
    let slashed = Pattern::compile("list/item").expect("pattern");
    assert_eq!(spaced.program(), slashed.program());
}

#[test]
fn leading_descendant_axis_is_ignored() {
    let plain = Pattern::compile("a/b").expect("pattern");
    let prefixed = Pattern::compile("//a/b").expect("pattern");
    assert_eq!(plain.program(), prefixed.program());
    assert!(!prefixed.program().is_rooted());
}

#[test]
fn leading_slash_roots_the_program() {
    let pattern = Pattern::compile("/root").expect("pattern");
    assert!(pattern.program().is_rooted());
    let PatternNode::Sequence(steps) = pattern.ast() else {
        panic!("expected a sequence, got {:?}", pattern.ast());
    };
    assert_eq!(steps.len(), 2);
    assert_eq!(
        steps.first().map(|step| &step.node),
        Some(&PatternNode::Anchor(Anchor::Root))
    );
}

#[test]
fn sibling_axes_parse() {
    let pattern = Pattern::compile("a,b&c").expect("pattern");
    let PatternNode::Sequence(steps) = pattern.ast() else {
        panic!("expected a sequence, got {:?}", pattern.ast());
    };
    let axes: Vec<_> = steps.iter().map(|step| step.axis).collect();
    assert_eq!(axes, vec![None, Some(Axis::NextSibling), Some(Axis::AnySibling)]);
}

#[test]
fn value_tests_render_as_notation() {
    let pattern = Pattern::compile(r#""two words"/./[numeric]"#).expect("pattern");
    insta::assert_snapshot!(pattern.program().to_string(), @r#"
    0: FIND child "two words"
    1: FIND child .
    2: FIND child [numeric]
    3: MATCH
    "#);
    let names: Vec<_> = pattern.predicate_references().collect();
    assert_eq!(names, vec![("numeric", 14)]);
}

#[test]
fn single_and_multiple_capture_kinds() {
    let pattern = Pattern::compile("x:a/y:(b|c)/x:d/z:e*/w:(f,g)").expect("pattern");
    let kinds: Vec<_> = pattern
        .program()
        .captures()
        .iter()
        .map(|slot| (slot.name().to_owned(), slot.kind()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("x".to_owned(), CaptureKind::Multiple),
            ("y".to_owned(), CaptureKind::Single),
            ("z".to_owned(), CaptureKind::Multiple),
            ("w".to_owned(), CaptureKind::Multiple),
        ]
    );
    assert_eq!(pattern.capture_names(), vec!["x", "y", "z", "w"]);
}

#[test]
fn capture_inside_repetition_is_multiple() {
    let pattern = Pattern::compile("(x:a)+").expect("pattern");
    let kinds: Vec<_> = pattern.program().captures().iter().map(|slot| slot.kind()).collect();
    assert_eq!(kinds, vec![CaptureKind::Multiple]);
}

#[test]
fn inline_template_is_parsed() {
    let pattern = Pattern::compile("x:item -> li/($x, $0)").expect("pattern");
    let template = pattern.template().expect("template");
    assert_eq!(template.to_string(), "li/($x, $0)");
    let root = template.roots().first().expect("root");
    assert_eq!(root.atom(), &TemplateAtom::Literal("li".to_owned()));
    assert_eq!(root.children().len(), 2);
    assert_eq!(template.references(), vec![("x", 14)]);
}

#[test]
fn empty_template_deletes() {
    let pattern = Pattern::compile("a -> ").expect("pattern");
    assert_eq!(pattern.template().map(|template| template.roots().len()), Some(0));
}

#[test]
fn standalone_template_round_trips_quoted_text() {
    let template = Template::parse(r#"pair/("two words", $x)"#).expect("template");
    assert_eq!(template.to_string(), r#"pair/("two words", $x)"#);
}

#[test]
fn display_shows_source() {
    let pattern: Pattern = "list/item".parse().expect("pattern");
    assert_eq!(pattern.to_string(), "list/item");
    assert_eq!(pattern.source(), "list/item");
}

#[test]
fn quantifier_bounds_follow_config() {
    let config = EngineConfig::default().with_max_quantifier_bound(4);
    assert!(Pattern::compile_with("a{4}", &config).is_ok());
    let error = Pattern::compile_with("a{5}", &config).expect_err("bound too large");
    assert!(matches!(error, CompileError::InvalidQuantifier { position: 1, .. }));
}

#[rstest]
#[case("a*b")]
#[case("x|y|z")]
#[case("/a//b{1,2}?$")]
#[case("(a,b){2,3}|c+")]
#[case("x:(a|b)/c?")]
fn program_len_counts_the_emitted_instructions(#[case] text: &str) {
    let pattern = Pattern::compile(text).expect("pattern");
    assert_eq!(pattern.ast().program_len() + 1, pattern.program().instructions().len());
}

#[test]
fn nested_bounds_within_the_expansion_limit_compile() {
    let pattern = Pattern::compile("(a{100}){100}").expect("pattern");
    assert!(pattern.program().instructions().len() <= MAX_PROGRAM_LEN + 1);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Syntax,
    Undefined,
    Quantifier,
}

fn kind_of(error: &CompileError) -> Kind {
    match error {
        CompileError::Syntax { .. } => Kind::Syntax,
        CompileError::UndefinedCapture { .. } => Kind::Undefined,
        CompileError::InvalidQuantifier { .. } => Kind::Quantifier,
        CompileError::UnknownPredicate { .. } => panic!("unexpected predicate error: {error}"),
    }
}

#[rstest]
#[case::dangling_axis("a/", Kind::Syntax, 2)]
#[case::unclosed_group("(a", Kind::Syntax, 2)]
#[case::stray_close("a)", Kind::Syntax, 1)]
#[case::unknown_character("a @", Kind::Syntax, 2)]
#[case::unterminated_literal("\"open", Kind::Syntax, 0)]
#[case::empty_predicate("[]", Kind::Syntax, 0)]
#[case::double_quantifier("a**", Kind::Syntax, 2)]
#[case::reference_with_children("x:a -> $x/b", Kind::Syntax, 7)]
#[case::inverted_bounds("a{3,1}", Kind::Quantifier, 1)]
#[case::bound_over_limit("a{2000}", Kind::Quantifier, 1)]
#[case::empty_loop_body("(a?)*", Kind::Quantifier, 4)]
#[case::nested_expansion("((a{1000}){1000}){1000}", Kind::Quantifier, 10)]
#[case::undeclared_reference("a -> $y", Kind::Undefined, 5)]
#[case::back_reference_before_capture("$x/x:a", Kind::Undefined, 0)]
#[case::back_reference_inside_capture("x:(a/$x)", Kind::Undefined, 5)]
fn compile_errors_report_position(#[case] text: &str, #[case] kind: Kind, #[case] position: usize) {
    let error = Pattern::compile(text).expect_err("pattern should be rejected");
    assert_eq!(kind_of(&error), kind, "{error}");
    assert_eq!(error.position(), position, "{error}");
}

#[test]
fn undefined_capture_names_the_reference() {
    let error = Pattern::compile("x:a -> $x, $y").expect_err("undeclared");
    assert_eq!(
        error,
        CompileError::UndefinedCapture {
            name: "y".to_owned(),
            position: 11,
        }
    );
}

#[test]
fn wildcard_and_predicate_tests_are_distinct() {
    assert_ne!(ValueTest::Wildcard, ValueTest::Predicate("any".to_owned()));
    assert_eq!(ValueTest::Literal("a b".to_owned()).to_string(), r#""a b""#);
}
