//! Tree model and node capabilities for the Treepace rewriting engine.
//!
//! The pattern engine never owns tree storage. It talks to nodes through the
//! [`TreeNode`] capability trait defined here, which covers value access,
//! ordered children, a weak parent link, structural mutation, and per-node
//! change observers.
//!
//! # Core types
//!
//! - [`TreeNode`] - the node capability set required by the engine
//! - [`Node`] - a reference-counted in-memory implementation
//! - [`Tree`] - owns the current root and survives root replacement
//! - [`ChangeKind`] and [`Observer`] - structural change notifications
//! - [`TextFormat`] - parenthesised and indented text formats
//!
//! # Example
//!
//! ```
//! use treepace_core::{Node, TextFormat, Tree, TreeNode};
//!
//! let root: Node = TextFormat::Paren.load("list (item item)")?;
//! let tree = Tree::new(root);
//! assert_eq!(tree.root().child_count(), 2);
//! assert_eq!(TextFormat::Paren.save(tree.root()), "list (item item)");
//! # Ok::<(), treepace_core::FormatError>(())
//! ```

mod error;
mod format;
mod memory;
mod node;
mod observer;
mod tree;
mod value;

pub use error::FormatError;
pub use format::TextFormat;
pub use memory::Node;
pub use node::{ChangeKind, NodeId, Observer, TreeNode};
pub use observer::{ChangeLog, log_observer, observe_subtree};
pub use tree::{Ancestors, Preorder, Tree, ancestors, is_ancestor_or_self, preorder, same_structure};
pub use value::Literal;

#[cfg(test)]
mod tests;
