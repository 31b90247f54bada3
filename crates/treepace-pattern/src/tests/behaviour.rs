//! Behaviour-driven development (BDD) step definitions for treepace scenarios.

use std::cell::RefCell;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use treepace_core::{ChangeLog, Node, TextFormat, Tree, TreeNode};

use crate::{
    ApplyError, EngineConfig, Match, Matcher, Mode, Pattern, RunOutcome, Runner, TransformError,
    Transformation,
};

// =============================================================================
// Test World
// =============================================================================

/// State shared across BDD steps.
#[derive(Default)]
struct TestWorld {
    /// Tree under test.
    tree: Option<Tree<Node>>,
    /// Observer log attached to the tree's root.
    log: Option<ChangeLog<Node>>,
    /// Pattern for search scenarios.
    pattern: Option<Pattern>,
    /// Rule for transformation scenarios.
    rule: Option<Transformation<Node>>,
    /// Engine configuration for the runner.
    config: EngineConfig,
    /// Matches found by the last search.
    matches: Vec<Match<Node>>,
    /// Result of the last run.
    outcome: Option<Result<RunOutcome, TransformError>>,
}

#[fixture]
fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::default())
}

/// Strips surrounding double quotes from a string if present.
fn strip_quotes(s: &str) -> &str {
    s.trim_matches('"')
}

fn rule(text: &str, mode: Mode) -> Transformation<Node> {
    Transformation::rule(strip_quotes(text), mode).expect("rule should compile")
}

// =============================================================================
// Given Steps
// =============================================================================

#[given("the tree {text}")]
fn given_tree(world: &RefCell<TestWorld>, text: String) {
    let mut w = world.borrow_mut();
    let root: Node = TextFormat::Paren.load(strip_quotes(&text)).expect("tree text");
    let log = ChangeLog::new();
    root.add_observer(log.observer());
    w.tree = Some(Tree::new(root));
    w.log = Some(log);
}

#[given("the pattern {text}")]
fn given_pattern(world: &RefCell<TestWorld>, text: String) {
    let mut w = world.borrow_mut();
    w.pattern = Some(Pattern::compile(strip_quotes(&text)).expect("pattern should compile"));
}

#[given("the rule {text}")]
fn given_rule(world: &RefCell<TestWorld>, text: String) {
    world.borrow_mut().rule = Some(rule(&text, Mode::Once));
}

#[given("the repeating rule {text}")]
fn given_repeating_rule(world: &RefCell<TestWorld>, text: String) {
    world.borrow_mut().rule = Some(rule(&text, Mode::Repeat));
}

#[given("a pass cap of {passes}")]
fn given_pass_cap(world: &RefCell<TestWorld>, passes: usize) {
    let mut w = world.borrow_mut();
    w.config = w.config.with_max_passes(passes);
}

// =============================================================================
// When Steps
// =============================================================================

#[when("the pattern is matched against the tree")]
fn when_match(world: &RefCell<TestWorld>) {
    let mut w = world.borrow_mut();
    let pattern = w.pattern.as_ref().expect("pattern should be set");
    let tree = w.tree.as_ref().expect("tree should be set");
    let matches = Matcher::new(pattern).find_all(tree.root());
    w.matches = matches;
}

#[when("the rule runs")]
fn when_run(world: &RefCell<TestWorld>) {
    let mut w = world.borrow_mut();
    let runner = Runner::new().with_config(w.config);
    let rule = w.rule.take().expect("rule should be set");
    let mut tree = w.tree.take().expect("tree should be set");
    let outcome = runner.run(&rule, &mut tree);
    w.tree = Some(tree);
    w.rule = Some(rule);
    w.outcome = Some(outcome);
}

// =============================================================================
// Then Steps
// =============================================================================

#[then("the result is {text}")]
fn then_result_is(world: &RefCell<TestWorld>, text: String) {
    let w = world.borrow();
    let tree = w.tree.as_ref().expect("tree should be set");
    assert_eq!(TextFormat::Paren.save(tree.root()), strip_quotes(&text));
}

#[then("{count} replacements were applied")]
fn then_applications(world: &RefCell<TestWorld>, count: usize) {
    let w = world.borrow();
    let outcome = w.outcome.as_ref().expect("run should have happened");
    let applied = outcome.as_ref().expect("run should succeed").applications();
    assert_eq!(applied, count);
}

#[then("the root was told about {count} child changes")]
fn then_root_notifications(world: &RefCell<TestWorld>, count: usize) {
    let w = world.borrow();
    let log = w.log.as_ref().expect("log should be set");
    assert_eq!(log.len(), count, "events: {:?}", log.kinds());
}

#[then("{count} matches are found")]
fn then_match_count(world: &RefCell<TestWorld>, count: usize) {
    let w = world.borrow();
    assert_eq!(w.matches.len(), count);
}

#[then("capture {name} of the first match holds {values}")]
fn then_capture_holds(world: &RefCell<TestWorld>, name: String, values: String) {
    let w = world.borrow();
    let found = w.matches.first().expect("at least one match");
    let bound: Vec<String> = found
        .nodes(strip_quotes(&name))
        .iter()
        .map(TreeNode::value)
        .collect();
    let expected: Vec<&str> = strip_quotes(&values).split_whitespace().collect();
    assert_eq!(bound, expected);
}

#[then("the run fails to converge after {passes} passes")]
fn then_did_not_converge(world: &RefCell<TestWorld>, passes: usize) {
    let w = world.borrow();
    let outcome = w.outcome.as_ref().expect("run should have happened");
    assert!(
        matches!(outcome, Err(TransformError::DidNotConverge { passes: reached, .. }) if *reached == passes),
        "unexpected outcome: {outcome:?}"
    );
}

#[then("the run fails because the root needs exactly one replacement")]
fn then_invalid_root(world: &RefCell<TestWorld>) {
    let w = world.borrow();
    let outcome = w.outcome.as_ref().expect("run should have happened");
    assert!(
        matches!(
            outcome,
            Err(TransformError::Apply(ApplyError::InvalidRootReplacement { .. }))
        ),
        "unexpected outcome: {outcome:?}"
    );
}

// =============================================================================
// Scenario Bindings
// =============================================================================

#[scenario(
    path = "tests/features/treepace.feature",
    name = "Renaming list items"
)]
fn renaming_list_items(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/treepace.feature",
    name = "Greedy repetition captures a whole chain"
)]
fn greedy_capture(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/treepace.feature",
    name = "Wrapping a captured node"
)]
fn wrapping_capture(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/treepace.feature",
    name = "Repeat mode stops at the pass cap"
)]
fn pass_cap(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/treepace.feature",
    name = "The root cannot be replaced by two nodes"
)]
fn invalid_root(world: RefCell<TestWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/treepace.feature",
    name = "Back-references collapse adjacent duplicates"
)]
fn adjacent_duplicates(world: RefCell<TestWorld>) {
    let _ = world;
}
