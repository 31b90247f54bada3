//! Tests for [`Runner`] modes, pass caps, and rule sets.

use std::cell::Cell;
use std::rc::Rc;

use rstest::rstest;
use treepace_core::{ChangeLog, Node, TreeNode, observe_subtree};

use super::{render, tree};
use crate::{
    ApplyError, CompileError, EngineConfig, Match, Mode, Pattern, Predicates, Replacement, RuleSet,
    Runner, TransformError, Transformation, run,
};

#[test]
fn once_mode_rewrites_matches_present_before_the_run() {
    let mut tree = tree("list (item (a) item (b))");
    let log = ChangeLog::new();
    tree.root().add_observer(log.observer());
    let rule = Transformation::rule("list/item -> li", Mode::Once).expect("rule");

    let outcome = run(&rule, &mut tree).expect("run");

    assert_eq!(render(&tree), "list (li li)");
    assert_eq!(outcome.applications(), 2);
    assert_eq!(outcome.passes(), 1);
    assert_eq!(log.len(), 2);
}

#[test]
fn once_mode_ignores_nodes_it_creates() {
    let mut tree = tree("r (a)");
    let rule = Transformation::rule("x:a -> a/$x", Mode::Once).expect("rule");

    let outcome = run(&rule, &mut tree).expect("run");

    assert_eq!(render(&tree), "r (a (a))");
    assert_eq!(outcome.applications(), 1);
}

#[test]
fn identity_rewrites_leave_the_tree_alone() {
    let mut tree = tree("r (a (b) a)");
    let log = ChangeLog::new();
    observe_subtree(tree.root(), &log.observer());
    let pattern = Pattern::compile("a").expect("pattern");
    let identity = Replacement::callback(|found: &Match<Node>| vec![found.target().clone()]);
    let rule = Transformation::new(pattern, identity, Mode::Once).expect("rule");

    let outcome = run(&rule, &mut tree).expect("run");

    assert_eq!(render(&tree), "r (a (b) a)");
    assert_eq!(outcome.applications(), 2);
    assert!(log.is_empty());

    let target_rule = Transformation::rule("a -> $0", Mode::Once).expect("rule");
    run(&target_rule, &mut tree).expect("run");
    assert_eq!(render(&tree), "r (a (b) a)");
}

#[test]
fn repeat_mode_runs_until_nothing_matches() {
    let mut tree = tree("list (item item)");
    let rule = Transformation::rule("item -> li", Mode::Repeat).expect("rule");

    let outcome = run(&rule, &mut tree).expect("run");

    assert_eq!(render(&tree), "list (li li)");
    assert_eq!(outcome.applications(), 2);
    assert_eq!(outcome.passes(), 2);
}

#[test]
fn repeat_mode_sees_matches_exposed_by_earlier_passes() {
    let mut tree = tree("r (c (c (c)))");
    let prune = Transformation::rule("c$ -> ", Mode::Repeat).expect("rule");

    let outcome = run(&prune, &mut tree).expect("run");

    assert_eq!(render(&tree), "r");
    assert_eq!(outcome.applications(), 3);
    assert_eq!(outcome.passes(), 4);
}

#[test]
fn repeat_mode_reports_non_convergence() {
    let mut tree = tree("r (x)");
    let rule = Transformation::rule("x -> x", Mode::Repeat).expect("rule");
    let runner = Runner::new().with_config(EngineConfig::default().with_max_passes(3));

    let error = runner.run(&rule, &mut tree).expect_err("no fixed point");

    assert_eq!(
        error,
        TransformError::DidNotConverge {
            passes: 3,
            applications: 3,
        }
    );
}

#[test]
fn back_references_drive_duplicate_removal() {
    let mut tree = tree("list (a a b b b)");
    let once = Transformation::rule("x:.,$x -> ", Mode::Once).expect("rule");

    let outcome = run(&once, &mut tree).expect("run");

    assert_eq!(render(&tree), "list (a b b)");
    assert_eq!(outcome.applications(), 2);

    let repeat = Transformation::rule("x:.,$x -> ", Mode::Repeat).expect("rule");
    run(&repeat, &mut tree).expect("run");
    assert_eq!(render(&tree), "list (a b)");
}

#[test]
fn pass_cap_is_not_an_error_when_the_tree_settles() {
    let mut tree = tree("r (item)");
    let rule = Transformation::rule("item -> li", Mode::Repeat).expect("rule");
    let runner = Runner::new().with_config(EngineConfig::default().with_max_passes(1));

    let outcome = runner.run(&rule, &mut tree).expect("run");

    assert_eq!(outcome.applications(), 1);
    assert_eq!(outcome.passes(), 2);
}

#[test]
fn matches_whose_nodes_were_removed_are_skipped() {
    let mut tree = tree("r (a b)");
    let replacement = Replacement::callback(|found: &Match<Node>| {
        let neighbour = found.target().parent().and_then(|parent| parent.child_at(1));
        if let Some(node) = neighbour {
            node.detach();
        }
        vec![Node::new("z")]
    });
    let pattern = Pattern::compile("a|b").expect("pattern");
    let rule = Transformation::new(pattern, replacement, Mode::Once).expect("rule");

    let outcome = run(&rule, &mut tree).expect("run");

    assert_eq!(render(&tree), "r (z)");
    assert_eq!(outcome.applications(), 1);
    assert_eq!(outcome.skipped(), 1);
}

#[test]
fn sibling_matches_in_one_pass_do_not_share_nodes() {
    let mut tree = tree("p (a b c)");
    let rule = Transformation::rule("x:.,y:. -> $y, $x", Mode::Once).expect("rule");

    let outcome = run(&rule, &mut tree).expect("run");

    assert_eq!(render(&tree), "p (a b a c)");
    assert_eq!(outcome.applications(), 1);
    assert_eq!(outcome.skipped(), 0);
}

#[test]
fn apply_errors_keep_earlier_changes() {
    let mut tree = tree("r (a a k)");
    let sibling = tree.root().child_at(2).expect("k");
    let calls = Rc::new(Cell::new(0_usize));
    let counter = Rc::clone(&calls);
    let replacement = Replacement::callback(move |_: &Match<Node>| {
        counter.set(counter.get() + 1);
        if counter.get() == 1 {
            vec![Node::new("z")]
        } else {
            vec![sibling.clone()]
        }
    });
    let pattern = Pattern::compile("a").expect("pattern");
    let rule = Transformation::new(pattern, replacement, Mode::Once).expect("rule");

    let error = run(&rule, &mut tree).expect_err("second replacement is attached");

    assert!(matches!(
        error,
        TransformError::Apply(ApplyError::DetachedReplacement { .. })
    ));
    assert_eq!(render(&tree), "r (z a k)");
    assert_eq!(calls.get(), 2);
}

#[test]
fn predicates_must_be_registered_before_running() {
    let mut tree = tree("add (1 x)");
    let rule = Transformation::rule("[numeric] -> n", Mode::Once).expect("rule");

    let error = run(&rule, &mut tree).expect_err("unknown predicate");
    assert_eq!(
        error,
        TransformError::Compile(CompileError::UnknownPredicate {
            name: "numeric".to_owned(),
            position: 0,
        })
    );
    assert_eq!(render(&tree), "add (1 x)");

    let predicates =
        Predicates::new().with("numeric", |value: &String| value.parse::<i64>().is_ok());
    let outcome = Runner::new()
        .with_predicates(&predicates)
        .run(&rule, &mut tree)
        .expect("run");
    assert_eq!(outcome.applications(), 1);
    assert_eq!(render(&tree), "add (n x)");
}

#[test]
fn standalone_templates_are_checked_against_captures() {
    let pattern = Pattern::compile("x:a").expect("pattern");
    let template = Replacement::<Node>::template("$y").expect("template");

    let error = Transformation::new(pattern, template, Mode::Once).expect_err("undeclared");

    assert!(matches!(error, CompileError::UndefinedCapture { ref name, position: 0 } if name == "y"));
}

#[test]
fn rule_text_requires_an_arrow() {
    let error = Transformation::<Node>::rule("list/item", Mode::Once).expect_err("no arrow");
    assert_eq!(error.position(), 9);
}

#[test]
fn rule_sets_cycle_until_nothing_applies() {
    let mut tree = tree("root (a b)");
    let rules: RuleSet = RuleSet::parse("# rename twice\nx -> y\n\na -> x\n").expect("rules");

    let outcome = Runner::new().run_program(&rules, &mut tree).expect("run");

    assert_eq!(render(&tree), "root (y b)");
    assert_eq!(outcome.passes(), 3);
    assert_eq!(outcome.applications(), 2);
}

#[test]
fn rule_sets_respect_the_pass_cap() {
    let mut tree = tree("root (a)");
    let rules: RuleSet = RuleSet::parse("a -> b\nb -> a").expect("rules");
    let runner = Runner::new().with_config(EngineConfig::default().with_max_passes(4));

    let error = runner.run_program(&rules, &mut tree).expect_err("cycle");

    assert!(matches!(error, TransformError::DidNotConverge { passes: 4, .. }));
}

#[rstest]
#[case::second_line("a -> b\n  c -> $q", 14)]
#[case::after_comment("# header\nbad -> (", 16)]
fn rule_set_errors_point_into_the_whole_text(#[case] text: &str, #[case] position: usize) {
    let error = RuleSet::<Node>::parse(text).expect_err("invalid rule");
    assert_eq!(error.position(), position);
}

#[test]
fn mode_parses_from_text() {
    assert_eq!("repeat".parse::<Mode>().ok(), Some(Mode::Repeat));
    assert_eq!(Mode::default(), Mode::Once);
    assert_eq!(Mode::Repeat.to_string(), "repeat");
}
