//! Self-balancing binary search tree that uses a color bit to ensure that the tree remains
//! approximately balanced during insertions and deletions.
//!
//! Nodes live in a `TypedArena` and refer to their parent and children through arena entries, so
//! the tree can walk upwards during rebalancing without reference counting or unsafe code.

mod node;
mod set;
mod tree;

pub use self::node::Color;
pub use self::set::{NodeRef, RedBlackSet, RedBlackSetIntoIter, RedBlackSetIter};

use std::error;
use std::fmt;
use std::result;

/// A broken red black tree invariant.
///
/// `RedBlackSet::validate` reports these as values. When a mutation itself runs into one of
/// them the tree can no longer be trusted, so the operation panics with the same message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// The root node is red.
    RedRoot,
    /// A red node has a red child.
    ConsecutiveReds,
    /// Two sibling subtrees have different black heights.
    UnbalancedBlacks { left: usize, right: usize },
    /// A node's value is not strictly between the values of its left and right subtrees.
    OutOfOrder,
    /// A child's parent link does not point back at the node owning it.
    BrokenParentLink,
    /// The cached element count disagrees with the number of nodes.
    LengthMismatch { expected: usize, actual: usize },
    /// A red node being removed still has children.
    RedNodeWithChildren,
    /// The red child absorbed by a removed black node has children of its own.
    AbsorbedChildHasChildren,
    /// A black node with one child has a black child.
    BlackChildOfSingleChildNode,
    /// A black non-root node has no sibling.
    MissingSibling,
    /// The sibling configuration of a double black node matches no rebalancing case.
    UnmatchedDeletionCase,
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::RedRoot => write!(f, "the root node is red"),
            Error::ConsecutiveReds => write!(f, "a red node has a red child"),
            Error::UnbalancedBlacks { left, right } => write!(
                f,
                "unbalanced black heights: left subtree has {} and right subtree has {}",
                left, right,
            ),
            Error::OutOfOrder => write!(f, "values are not in binary search tree order"),
            Error::BrokenParentLink => write!(f, "a child does not link back to its parent"),
            Error::LengthMismatch { expected, actual } => write!(
                f,
                "tracked length is {} but the tree holds {} nodes",
                expected, actual,
            ),
            Error::RedNodeWithChildren => write!(f, "a red node selected for removal has children"),
            Error::AbsorbedChildHasChildren => write!(
                f,
                "the red child of a black node with one child cannot have children",
            ),
            Error::BlackChildOfSingleChildNode => write!(
                f,
                "a black node with a single child has a black child",
            ),
            Error::MissingSibling => write!(f, "a double black node has no sibling"),
            Error::UnmatchedDeletionCase => write!(
                f,
                "the sibling of a double black node matches no rebalancing case",
            ),
        }
    }
}

pub type Result<T> = result::Result<T, Error>;
