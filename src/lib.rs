//! An in-memory ordered set backed by a red black tree whose nodes keep parent links.
//!
//! Nodes are stored in a `TypedArena` and linked by arena entries, which lets the rebalancing
//! code walk from a node to its parent, grandparent and siblings without shared ownership.

#[macro_use]
extern crate log;
extern crate serde;
#[macro_use]
extern crate serde_derive;

pub mod arena;
pub mod red_black_tree;
