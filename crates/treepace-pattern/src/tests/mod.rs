//! Unit and behavioural tests for `treepace_pattern`.

mod behaviour;
mod compile_tests;
mod config_tests;
mod rewriter_tests;
mod runner_tests;

use treepace_core::{Node, TextFormat, Tree};

/// Loads a parenthesised tree.
fn tree(text: &str) -> Tree<Node> {
    Tree::new(TextFormat::Paren.load(text).expect("tree text"))
}

/// Renders a tree in parenthesised form.
fn render(tree: &Tree<Node>) -> String {
    TextFormat::Paren.save(tree.root())
}
