//! Composable authentication ceremony trees.
//!
//! A ceremony describes which credential components a caller must complete,
//! and in what structure, to authenticate or register. Trees are built from
//! three constructors:
//!
//! - [`CeremonyNode::component`] — one named credential step,
//! - [`CeremonyNode::sequence`] — all children, in order,
//! - [`CeremonyNode::choice`] — exactly one child.
//!
//! The module is pure: no I/O, no async, no shared state. A resolver feeds
//! the ordered list of completed component ids into
//! [`resolve_step_at_path`] and gets back the next pending step, a choice of
//! steps, completion, or "this progress matches no walk of the tree".

mod node;
mod walk;

pub use node::CeremonyNode;
pub use walk::{enumerate_leaf_orderings, resolve_step_at_path, ResolvedStep};
