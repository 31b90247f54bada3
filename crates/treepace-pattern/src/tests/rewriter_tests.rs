//! Tests for [`apply`] and its change notifications.

use treepace_core::{ChangeKind, ChangeLog, Node, Tree, TreeNode, observe_subtree};

use super::{render, tree};
use crate::{ApplyError, Match, Matcher, Pattern, Replacement, apply};

fn first_match(pattern: &Pattern, tree: &Tree<Node>) -> Match<Node> {
    Matcher::new(pattern).find_first(tree.root()).expect("match")
}

fn template_rule(text: &str) -> (Pattern, Replacement<Node>) {
    let pattern = Pattern::compile(text).expect("pattern");
    let template = pattern.template().cloned().expect("template");
    (pattern, Replacement::Template(template))
}

#[test]
fn template_replaces_every_match_in_place() {
    let mut tree = tree("list (item (a) item (b))");
    let log = ChangeLog::new();
    tree.root().add_observer(log.observer());
    let (pattern, replacement) = template_rule("list/item -> li");

    let matches = Matcher::new(&pattern).find_all(tree.root());
    for found in &matches {
        apply(&mut tree, found, &replacement).expect("apply");
    }

    assert_eq!(render(&tree), "list (li li)");
    assert_eq!(log.kinds(), vec![ChangeKind::ChildrenChanged; 2]);
}

#[test]
fn notifications_reach_the_target_then_its_parent() {
    let mut tree = tree("r (a b)");
    let log = ChangeLog::new();
    observe_subtree(tree.root(), &log.observer());
    let (pattern, replacement) = template_rule("a -> z");
    let found = first_match(&pattern, &tree);

    let applied = apply(&mut tree, &found, &replacement).expect("apply");

    let events: Vec<_> = log
        .events()
        .into_iter()
        .map(|(kind, node)| (kind, node.value()))
        .collect();
    assert_eq!(
        events,
        vec![
            (ChangeKind::Removed, "a".to_owned()),
            (ChangeKind::ChildrenChanged, "r".to_owned()),
        ]
    );
    assert!(applied.changed());
    let inserted = applied.inserted().first().expect("inserted");
    assert_eq!(inserted.value(), "z");
    assert!(inserted.parent().is_some_and(|parent| parent.is_same(tree.root())));
}

#[test]
fn wrapping_moves_the_target() {
    let mut tree = tree("r (a (k) b)");
    let target = tree.root().child_at(0).expect("a");
    let log = ChangeLog::new();
    target.add_observer(log.observer());
    let (pattern, replacement) = template_rule("x:a -> w/$x");
    let found = first_match(&pattern, &tree);

    apply(&mut tree, &found, &replacement).expect("apply");

    assert_eq!(render(&tree), "r (w (a (k)) b)");
    assert_eq!(log.kinds(), vec![ChangeKind::Removed, ChangeKind::Moved]);
    let wrapper = tree.root().child_at(0).expect("w");
    assert!(wrapper.child_at(0).is_some_and(|child| child.is_same(&target)));
}

#[test]
fn reused_captures_are_cloned_after_the_first_use() {
    let mut tree = tree("r (a (k))");
    let (pattern, replacement) = template_rule("x:a -> pair/($x, $x)");
    let found = first_match(&pattern, &tree);
    let original = found.target().clone();

    apply(&mut tree, &found, &replacement).expect("apply");

    assert_eq!(render(&tree), "r (pair (a (k) a (k)))");
    let pair = tree.root().child_at(0).expect("pair");
    let first = pair.child_at(0).expect("first");
    let second = pair.child_at(1).expect("second");
    assert!(first.is_same(&original));
    assert!(!second.is_same(&first));
}

#[test]
fn captures_outside_the_target_are_copied() {
    let mut tree = tree("call (name arg)");
    let (pattern, replacement) = template_rule("call/(n:name, a:arg) -> $n");
    let found = first_match(&pattern, &tree);

    apply(&mut tree, &found, &replacement).expect("apply");

    assert_eq!(render(&tree), "call (name name)");
    let children = tree.root().children();
    let [first, second] = children.as_slice() else {
        panic!("expected two children, got {children:?}");
    };
    assert!(!first.is_same(second));
}

#[test]
fn target_reference_leaves_the_tree_unchanged() {
    let mut tree = tree("r (a b)");
    let original = tree.root().child_at(0).expect("a");
    let (pattern, replacement) = template_rule("a -> $0");
    let found = first_match(&pattern, &tree);

    apply(&mut tree, &found, &replacement).expect("apply");

    assert_eq!(render(&tree), "r (a b)");
    assert!(tree.root().child_at(0).is_some_and(|node| node.is_same(&original)));
}

#[test]
fn empty_template_deletes_the_target() {
    let mut tree = tree("r (a b)");
    let (pattern, replacement) = template_rule("a -> ");
    let found = first_match(&pattern, &tree);

    let applied = apply(&mut tree, &found, &replacement).expect("apply");

    assert_eq!(render(&tree), "r (b)");
    assert!(applied.inserted().is_empty());
}

#[test]
fn several_roots_are_spliced_in_order() {
    let mut tree = tree("r (a b)");
    let (pattern, replacement) = template_rule("a -> x, y");
    let found = first_match(&pattern, &tree);

    apply(&mut tree, &found, &replacement).expect("apply");

    assert_eq!(render(&tree), "r (x y b)");
}

#[test]
fn root_target_may_be_replaced_by_one_node() {
    let mut tree = tree("r (a)");
    let (pattern, replacement) = template_rule("x:r -> top/$x");
    let found = first_match(&pattern, &tree);

    apply(&mut tree, &found, &replacement).expect("apply");

    assert_eq!(render(&tree), "top (r (a))");
}

#[test]
fn root_target_rejects_other_counts() {
    let mut tree = tree("r (a)");
    let (pattern, replacement) = template_rule("r -> x, y");
    let found = first_match(&pattern, &tree);
    let root_id = tree.root().id();

    let error = apply(&mut tree, &found, &replacement).expect_err("two roots");

    assert_eq!(
        error,
        ApplyError::InvalidRootReplacement {
            node: root_id,
            count: 2,
        }
    );
    assert_eq!(render(&tree), "r (a)");
}

#[test]
fn callback_builds_new_nodes() {
    let mut tree = tree("sum (1 2)");
    let pattern = Pattern::compile("sum").expect("pattern");
    let replacement = Replacement::callback(|found: &Match<Node>| {
        let total: i64 = found
            .target()
            .children()
            .iter()
            .filter_map(|child| child.value().parse::<i64>().ok())
            .sum();
        vec![Node::new(total.to_string())]
    });
    let found = first_match(&pattern, &tree);

    apply(&mut tree, &found, &replacement).expect("apply");

    assert_eq!(render(&tree), "3");
}

#[test]
fn callback_returning_the_target_changes_nothing() {
    let mut tree = tree("r (a)");
    let log = ChangeLog::new();
    observe_subtree(tree.root(), &log.observer());
    let pattern = Pattern::compile("a").expect("pattern");
    let replacement = Replacement::callback(|found: &Match<Node>| vec![found.target().clone()]);
    let found = first_match(&pattern, &tree);

    let applied = apply(&mut tree, &found, &replacement).expect("apply");

    assert!(!applied.changed());
    assert!(log.is_empty());
}

#[test]
fn callback_may_adopt_the_target() {
    let mut tree = tree("r (a b)");
    let target = tree.root().child_at(0).expect("a");
    let log = ChangeLog::new();
    target.add_observer(log.observer());
    let pattern = Pattern::compile("a").expect("pattern");
    let replacement = Replacement::callback(|found: &Match<Node>| {
        let wrapper = Node::new("w");
        wrapper.push_child(found.target().clone());
        vec![wrapper]
    });
    let found = first_match(&pattern, &tree);

    apply(&mut tree, &found, &replacement).expect("apply");

    assert_eq!(render(&tree), "r (w (a) b)");
    assert_eq!(log.kinds(), vec![ChangeKind::Removed, ChangeKind::Moved]);
}

#[test]
fn callback_returning_an_attached_node_fails() {
    let mut tree = tree("r (a b)");
    let sibling = tree.root().child_at(1).expect("b");
    let sibling_id = sibling.id();
    let pattern = Pattern::compile("a").expect("pattern");
    let replacement = Replacement::callback(move |_: &Match<Node>| vec![sibling.clone()]);
    let found = first_match(&pattern, &tree);

    let error = apply(&mut tree, &found, &replacement).expect_err("attached");

    assert!(matches!(error, ApplyError::DetachedReplacement { node, .. } if node == sibling_id));
    assert_eq!(render(&tree), "r (a b)");
}

#[test]
fn detached_target_is_reported() {
    let mut tree = tree("r (a)");
    let (pattern, replacement) = template_rule("a -> z");
    let found = first_match(&pattern, &tree);
    found.target().detach();

    let error = apply(&mut tree, &found, &replacement).expect_err("detached");

    assert!(matches!(error, ApplyError::DetachedReplacement { .. }));
}
