use crate::arena::{Entry, TypedArena};
use crate::red_black_tree::node::{Color, Direction, Link, Node};
use crate::red_black_tree::{Error, Result};
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::mem;

pub const DEFAULT_CHUNK_SIZE: usize = 1024;

fn fatal(error: Error) -> ! {
    error!("red black tree invariant violated: {}", error);
    panic!("Error: {}.", error);
}

pub struct Tree<T> {
    arena: TypedArena<Node<T>>,
    root: Link,
    len: usize,
}

impl<T> Tree<T> {
    pub fn new(chunk_size: usize) -> Self {
        Tree {
            arena: TypedArena::new(chunk_size),
            root: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn clear(&mut self) {
        self.arena.clear();
        self.root = None;
        self.len = 0;
    }

    fn node(&self, entry: Entry) -> &Node<T> {
        &self.arena[entry]
    }

    fn node_mut(&mut self, entry: Entry) -> &mut Node<T> {
        &mut self.arena[entry]
    }

    fn color_of(&self, link: Link) -> Color {
        match link {
            Some(entry) => self.node(entry).color,
            None => Color::Black,
        }
    }

    fn is_red(&self, link: Link) -> bool {
        self.color_of(link) == Color::Red
    }

    fn set_color(&mut self, entry: Entry, color: Color) {
        self.node_mut(entry).color = color;
    }

    fn side_of(&self, entry: Entry, parent: Entry) -> Direction {
        if self.node(parent).left == Some(entry) {
            Direction::Left
        } else {
            Direction::Right
        }
    }

    // Points whatever referenced `old` from above (a parent or the root) at `new`.
    fn replace_child(&mut self, parent: Link, old: Entry, new: Link) {
        match parent {
            Some(parent) => {
                let side = self.side_of(old, parent);
                self.node_mut(parent).set_child(side, new);
            },
            None => self.root = new,
        }
        if let Some(new) = new {
            self.node_mut(new).parent = parent;
        }
    }

    fn extreme(&self, direction: Direction) -> Link {
        let mut curr = self.root?;
        while let Some(next) = self.node(curr).child(direction) {
            curr = next;
        }
        Some(curr)
    }

    fn leftmost(&self, mut entry: Entry) -> Entry {
        while let Some(left) = self.node(entry).left {
            entry = left;
        }
        entry
    }

    fn find_entry<V>(&self, value: &V) -> Link
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        let mut curr = self.root;
        while let Some(entry) = curr {
            let node = self.node(entry);
            curr = match value.cmp(node.value.borrow()) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return Some(entry),
            };
        }
        None
    }

    pub fn find<V>(&self, value: &V) -> Option<&Node<T>>
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        self.find_entry(value).map(|entry| self.node(entry))
    }

    pub fn contains<V>(&self, value: &V) -> bool
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        self.find_entry(value).is_some()
    }

    /// Smallest stored value that is greater than or equal to `value`. Each left turn of the
    /// descent records a smaller candidate than the last, so the final one recorded wins.
    pub fn ceil<V>(&self, value: &V) -> Option<&T>
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        let mut best = None;
        let mut curr = self.root;
        while let Some(entry) = curr {
            let node = self.node(entry);
            curr = match value.cmp(node.value.borrow()) {
                Ordering::Equal => return Some(&node.value),
                Ordering::Greater => node.right,
                Ordering::Less => {
                    best = Some(&node.value);
                    node.left
                },
            };
        }
        best
    }

    /// Largest stored value that is less than or equal to `value`.
    pub fn floor<V>(&self, value: &V) -> Option<&T>
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        let mut best = None;
        let mut curr = self.root;
        while let Some(entry) = curr {
            let node = self.node(entry);
            curr = match value.cmp(node.value.borrow()) {
                Ordering::Equal => return Some(&node.value),
                Ordering::Less => node.left,
                Ordering::Greater => {
                    best = Some(&node.value);
                    node.right
                },
            };
        }
        best
    }

    pub fn min(&self) -> Option<&T> {
        self.extreme(Direction::Left)
            .map(|entry| &self.node(entry).value)
    }

    pub fn max(&self) -> Option<&T> {
        self.extreme(Direction::Right)
            .map(|entry| &self.node(entry).value)
    }

    /// Rotates `parent` up into the place of `grandfather`, moving `grandfather` down towards
    /// `direction`. `parent` must be the child of `grandfather` opposite to `direction`.
    fn rotate(&mut self, direction: Direction, parent: Entry, grandfather: Entry) {
        trace!("rotating {:?}", direction);
        debug_assert_eq!(
            self.node(grandfather).child(direction.opposite()),
            Some(parent),
        );

        let great_grandfather = self.node(grandfather).parent;
        self.replace_child(great_grandfather, grandfather, Some(parent));

        let inner = self.node(parent).child(direction);
        self.node_mut(parent).set_child(direction, Some(grandfather));
        self.node_mut(grandfather).parent = Some(parent);
        self.node_mut(grandfather)
            .set_child(direction.opposite(), inner);
        if let Some(inner) = inner {
            self.node_mut(inner).parent = Some(grandfather);
        }
    }

    fn rotate_and_recolor(
        &mut self,
        direction: Direction,
        node: Entry,
        parent: Entry,
        grandfather: Entry,
    ) {
        self.rotate(direction, parent, grandfather);
        self.set_color(parent, Color::Black);
        self.set_color(node, Color::Red);
        self.set_color(grandfather, Color::Red);
    }

    /// Inserts `value` and returns `true`, or returns `false` and leaves the tree untouched if an
    /// equal value is already stored.
    pub fn insert(&mut self, value: T) -> bool
    where
        T: Ord,
    {
        let mut curr = match self.root {
            Some(root) => root,
            None => {
                let mut node = Node::new(value, None);
                node.color = Color::Black;
                self.root = Some(self.arena.allocate(node));
                self.len = 1;
                return true;
            },
        };

        let direction = loop {
            let node = self.node(curr);
            let direction = match value.cmp(&node.value) {
                Ordering::Less => Direction::Left,
                Ordering::Greater => Direction::Right,
                Ordering::Equal => return false,
            };
            match node.child(direction) {
                Some(child) => curr = child,
                None => break direction,
            }
        };

        let new_node = self.arena.allocate(Node::new(value, Some(curr)));
        self.node_mut(curr).set_child(direction, Some(new_node));
        self.len += 1;
        self.insert_fixup(new_node);
        true
    }

    fn insert_fixup(&mut self, mut node: Entry) {
        loop {
            let parent = match self.node(node).parent {
                Some(parent) => parent,
                None => return,
            };
            let grandfather = match self.node(parent).parent {
                Some(grandfather) => grandfather,
                None => return,
            };
            if !self.node(node).is_red() || !self.node(parent).is_red() {
                return;
            }

            let node_side = self.side_of(node, parent);
            let parent_side = self.side_of(parent, grandfather);
            let uncle = self.node(grandfather).child(parent_side.opposite());

            if self.is_red(uncle) {
                trace!("insert fixup: red uncle, recoloring");
                let (left, right) = {
                    let grandfather = self.node(grandfather);
                    (grandfather.left, grandfather.right)
                };
                for child in left.into_iter().chain(right) {
                    self.set_color(child, Color::Black);
                }
                if self.root != Some(grandfather) {
                    self.set_color(grandfather, Color::Red);
                }
                node = grandfather;
                continue;
            }

            trace!("insert fixup: black uncle, {:?}{:?}", node_side, parent_side);
            match (node_side, parent_side) {
                (Direction::Left, Direction::Left) => {
                    self.rotate_and_recolor(Direction::Right, node, parent, grandfather);
                },
                (Direction::Right, Direction::Right) => {
                    self.rotate_and_recolor(Direction::Left, node, parent, grandfather);
                },
                (Direction::Left, Direction::Right) => {
                    self.rotate(Direction::Right, node, parent);
                    self.rotate_and_recolor(Direction::Left, parent, node, grandfather);
                },
                (Direction::Right, Direction::Left) => {
                    self.rotate(Direction::Left, node, parent);
                    self.rotate_and_recolor(Direction::Right, parent, node, grandfather);
                },
            }
            return;
        }
    }

    /// Removes the value equal to `value` and returns it, or returns `None` if no such value is
    /// stored.
    pub fn remove<V>(&mut self, value: &V) -> Option<T>
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        let target = self.find_entry(value)?;
        let doomed = match (self.node(target).left, self.node(target).right) {
            (Some(_), Some(right)) => {
                debug!("removal retargeted onto the in-order successor");
                self.leftmost(right)
            },
            _ => target,
        };

        let removed = self.unlink(doomed);
        self.len -= 1;
        if doomed == target {
            Some(removed.value)
        } else {
            Some(mem::replace(&mut self.node_mut(target).value, removed.value))
        }
    }

    // Detaches a node with at most one child and releases it from the arena.
    fn unlink(&mut self, entry: Entry) -> Node<T> {
        let (parent, child, color) = {
            let node = self.node(entry);
            debug_assert!(node.child_count() < 2);
            (node.parent, node.left.or(node.right), node.color)
        };

        match parent {
            None => {
                debug!("removing the root");
                self.root = child;
                if let Some(child) = child {
                    let node = self.node_mut(child);
                    node.parent = None;
                    node.color = Color::Black;
                }
            },
            Some(parent) if color == Color::Red => {
                if child.is_some() {
                    fatal(Error::RedNodeWithChildren);
                }
                self.replace_child(Some(parent), entry, None);
            },
            Some(parent) => match child {
                Some(child) => {
                    if !self.node(child).is_red() {
                        fatal(Error::BlackChildOfSingleChildNode);
                    }
                    if self.node(child).has_children() {
                        fatal(Error::AbsorbedChildHasChildren);
                    }
                    self.replace_child(Some(parent), entry, Some(child));
                    self.set_color(child, Color::Black);
                },
                None => {
                    self.remove_fixup(entry);
                    let parent = self.node(entry).parent;
                    self.replace_child(parent, entry, None);
                },
            },
        }

        self.arena.free(&entry)
    }

    /// Restores black heights around `entry`, a black leaf that is about to be detached.
    fn remove_fixup(&mut self, mut node: Entry) {
        loop {
            let parent = match self.node(node).parent {
                Some(parent) => parent,
                None => {
                    trace!("remove fixup: case 1");
                    self.set_color(node, Color::Black);
                    return;
                },
            };
            let side = self.side_of(node, parent);
            let sibling = match self.node(parent).child(side.opposite()) {
                Some(sibling) => sibling,
                None => fatal(Error::MissingSibling),
            };
            let (near, far) = {
                let sibling = self.node(sibling);
                (sibling.child(side), sibling.child(side.opposite()))
            };
            let parent_red = self.node(parent).is_red();
            let sibling_red = self.node(sibling).is_red();
            let nephews_black = !self.is_red(near) && !self.is_red(far);

            if sibling_red && !parent_red && nephews_black {
                trace!("remove fixup: case 2");
                self.rotate(side, sibling, parent);
                self.set_color(parent, Color::Red);
                self.set_color(sibling, Color::Black);
                continue;
            }

            if !sibling_red && !parent_red && nephews_black {
                trace!("remove fixup: case 3");
                self.set_color(sibling, Color::Red);
                node = parent;
                continue;
            }

            if parent_red && !sibling_red && nephews_black {
                trace!("remove fixup: case 4");
                self.set_color(parent, Color::Black);
                self.set_color(sibling, Color::Red);
                return;
            }

            if !sibling_red && !self.is_red(far) {
                if let Some(near) = near.filter(|&near| self.node(near).is_red()) {
                    trace!("remove fixup: case 5");
                    self.rotate(side.opposite(), near, sibling);
                    self.set_color(near, Color::Black);
                    self.set_color(sibling, Color::Red);
                }
            }

            let sibling = match self.node(parent).child(side.opposite()) {
                Some(sibling) => sibling,
                None => fatal(Error::MissingSibling),
            };
            let far = self.node(sibling).child(side.opposite());
            if !self.node(sibling).is_red() && self.is_red(far) {
                trace!("remove fixup: case 6");
                let parent_color = self.node(parent).color;
                self.rotate(side, sibling, parent);
                self.set_color(sibling, parent_color);
                self.set_color(parent, Color::Black);
                if let Some(far) = far {
                    self.set_color(far, Color::Black);
                }
                return;
            }

            fatal(Error::UnmatchedDeletionCase);
        }
    }

    /// Checks every red black tree invariant, the parent links and the cached length.
    pub fn validate(&self) -> Result<()>
    where
        T: Ord,
    {
        let root = match self.root {
            Some(root) => root,
            None if self.len == 0 => return Ok(()),
            None => {
                return Err(Error::LengthMismatch {
                    expected: self.len,
                    actual: 0,
                });
            },
        };

        let node = self.node(root);
        if node.parent.is_some() {
            return Err(Error::BrokenParentLink);
        }
        if node.is_red() {
            return Err(Error::RedRoot);
        }

        let mut count = 0;
        self.validate_subtree(root, None, None, &mut count)?;
        if count != self.len {
            return Err(Error::LengthMismatch {
                expected: self.len,
                actual: count,
            });
        }
        Ok(())
    }

    // Returns the number of black nodes below `entry` on any path to a sentinel.
    fn validate_subtree(
        &self,
        entry: Entry,
        lower: Option<&T>,
        upper: Option<&T>,
        count: &mut usize,
    ) -> Result<usize>
    where
        T: Ord,
    {
        let node = self.node(entry);
        *count += 1;

        let above_lower = lower.map_or(true, |lower| node.value > *lower);
        let below_upper = upper.map_or(true, |upper| node.value < *upper);
        if !above_lower || !below_upper {
            return Err(Error::OutOfOrder);
        }

        let left = self.validate_child(entry, node.left, lower, Some(&node.value), count)?;
        let right = self.validate_child(entry, node.right, Some(&node.value), upper, count)?;
        if left != right {
            return Err(Error::UnbalancedBlacks { left, right });
        }
        Ok(left)
    }

    fn validate_child(
        &self,
        parent: Entry,
        child: Link,
        lower: Option<&T>,
        upper: Option<&T>,
        count: &mut usize,
    ) -> Result<usize>
    where
        T: Ord,
    {
        let child = match child {
            Some(child) => child,
            None => return Ok(0),
        };

        let node = self.node(child);
        if node.parent != Some(parent) {
            return Err(Error::BrokenParentLink);
        }
        if node.is_red() && self.node(parent).is_red() {
            return Err(Error::ConsecutiveReds);
        }

        let height = self.validate_subtree(child, lower, upper, count)?;
        Ok(height + if node.is_red() { 0 } else { 1 })
    }

    fn clone_subtree(&mut self, source: &Tree<T>, entry: Entry, parent: Link) -> Entry
    where
        T: Clone,
    {
        let original = source.node(entry);
        let copy = self.arena.allocate(Node {
            value: original.value.clone(),
            color: original.color,
            parent,
            left: None,
            right: None,
        });
        let left = original
            .left
            .map(|left| self.clone_subtree(source, left, Some(copy)));
        let right = original
            .right
            .map(|right| self.clone_subtree(source, right, Some(copy)));

        let node = self.node_mut(copy);
        node.left = left;
        node.right = right;
        copy
    }

    pub fn iter(&self) -> Iter<'_, T> {
        let mut iter = Iter {
            tree: self,
            stack: Vec::new(),
            remaining: self.len,
        };
        iter.push_left_spine(self.root);
        iter
    }
}

impl<T> Clone for Tree<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        let mut tree = Tree::new(self.arena.chunk_size());
        let root = self
            .root
            .map(|root| tree.clone_subtree(self, root, None));
        tree.root = root;
        tree.len = self.len;
        tree
    }
}

impl<T> IntoIterator for Tree<T> {
    type IntoIter = IntoIter<T>;
    type Item = T;

    fn into_iter(self) -> Self::IntoIter {
        let root = self.root;
        let mut iter = IntoIter {
            remaining: self.len,
            tree: self,
            stack: Vec::new(),
        };
        iter.push_left_spine(root);
        iter
    }
}

/// In-order iterator over borrowed values.
pub struct Iter<'a, T> {
    tree: &'a Tree<T>,
    stack: Vec<Entry>,
    remaining: usize,
}

impl<'a, T> Iter<'a, T> {
    fn push_left_spine(&mut self, mut link: Link) {
        while let Some(entry) = link {
            self.stack.push(entry);
            link = self.tree.node(entry).left;
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T>
where
    T: 'a,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.stack.pop()?;
        let tree = self.tree;
        let node = tree.node(entry);
        self.push_left_spine(node.right);
        self.remaining -= 1;
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

/// In-order iterator that releases each node as its value is yielded.
pub struct IntoIter<T> {
    tree: Tree<T>,
    stack: Vec<Entry>,
    remaining: usize,
}

impl<T> IntoIter<T> {
    fn push_left_spine(&mut self, mut link: Link) {
        while let Some(entry) = link {
            self.stack.push(entry);
            link = self.tree.node(entry).left;
        }
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.stack.pop()?;
        let node = self.tree.arena.free(&entry);
        self.push_left_spine(node.right);
        self.remaining -= 1;
        Some(node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::Tree;
    use crate::arena::Entry;
    use crate::red_black_tree::node::{Color, Link, Node};
    use crate::red_black_tree::Error;

    // Pre-order (value, color) pairs pin down the exact shape of a binary search tree.
    fn shape(tree: &Tree<u32>) -> Vec<(u32, Color)> {
        fn walk(tree: &Tree<u32>, link: Link, ret: &mut Vec<(u32, Color)>) {
            if let Some(entry) = link {
                let node = tree.node(entry);
                ret.push((node.value, node.color));
                walk(tree, node.left, ret);
                walk(tree, node.right, ret);
            }
        }
        let mut ret = Vec::new();
        walk(tree, tree.root, &mut ret);
        ret
    }

    fn build(values: &[u32]) -> Tree<u32> {
        let mut tree = Tree::new(8);
        for value in values {
            assert!(tree.insert(*value));
        }
        assert_eq!(tree.validate(), Ok(()));
        tree
    }

    fn entry_of(tree: &Tree<u32>, value: u32) -> Entry {
        tree.find_entry(&value).unwrap()
    }

    use crate::red_black_tree::node::Color::{Black as B, Red as R};

    #[test]
    fn test_insert_into_empty_makes_black_root() {
        let tree = build(&[7]);
        assert_eq!(shape(&tree), vec![(7, B)]);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_insert_right_right() {
        let tree = build(&[10, 20, 30]);
        assert_eq!(shape(&tree), vec![(20, B), (10, R), (30, R)]);
    }

    #[test]
    fn test_insert_left_left() {
        let tree = build(&[30, 20, 10]);
        assert_eq!(shape(&tree), vec![(20, B), (10, R), (30, R)]);
    }

    #[test]
    fn test_insert_left_right() {
        let tree = build(&[30, 10, 20]);
        assert_eq!(shape(&tree), vec![(20, B), (10, R), (30, R)]);
    }

    #[test]
    fn test_insert_right_left() {
        let tree = build(&[10, 30, 20]);
        assert_eq!(shape(&tree), vec![(20, B), (10, R), (30, R)]);
    }

    #[test]
    fn test_insert_red_uncle_recolors() {
        let tree = build(&[20, 10, 30, 5]);
        assert_eq!(shape(&tree), vec![(20, B), (10, B), (5, R), (30, B)]);
    }

    #[test]
    fn test_insert_recoloring_propagates() {
        let tree = build(&[10, 20, 30, 40, 50, 60]);
        assert_eq!(
            shape(&tree),
            vec![(20, B), (10, B), (40, R), (30, B), (50, B), (60, R)],
        );
    }

    #[test]
    fn test_insert_duplicate_is_noop() {
        let mut tree = build(&[10, 20, 30, 40]);
        let before = shape(&tree);
        assert!(!tree.insert(30));
        assert_eq!(shape(&tree), before);
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut tree = build(&[10, 20, 30, 40]);
        let before = shape(&tree);
        assert_eq!(tree.remove(&25), None);
        assert_eq!(shape(&tree), before);
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_remove_only_node() {
        let mut tree = build(&[1]);
        assert_eq!(tree.remove(&1), Some(1));
        assert_eq!(tree.root, None);
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.validate(), Ok(()));
    }

    #[test]
    fn test_remove_root_promotes_child() {
        let mut tree = build(&[10, 20]);
        assert_eq!(tree.remove(&10), Some(10));
        assert_eq!(shape(&tree), vec![(20, B)]);
        assert_eq!(tree.validate(), Ok(()));
    }

    #[test]
    fn test_remove_red_leaf() {
        let mut tree = build(&[20, 10, 30, 5]);
        assert_eq!(tree.remove(&5), Some(5));
        assert_eq!(shape(&tree), vec![(20, B), (10, B), (30, B)]);
    }

    #[test]
    fn test_remove_black_node_absorbs_red_child() {
        let mut tree = build(&[20, 10, 30, 5]);
        assert_eq!(tree.remove(&10), Some(10));
        assert_eq!(shape(&tree), vec![(20, B), (5, B), (30, B)]);
        assert_eq!(tree.validate(), Ok(()));
    }

    #[test]
    fn test_remove_two_children_uses_successor() {
        let mut tree = build(&[10, 20, 30, 40, 50]);
        assert_eq!(tree.remove(&20), Some(20));
        assert_eq!(shape(&tree), vec![(30, B), (10, B), (40, B), (50, R)]);
        assert_eq!(tree.iter().cloned().collect::<Vec<_>>(), vec![10, 30, 40, 50]);
        assert_eq!(tree.validate(), Ok(()));
    }

    #[test]
    fn test_remove_fixup_case_2_then_case_4() {
        let mut tree = build(&[10, 20, 30, 40, 50, 60]);
        tree.remove(&60);
        assert_eq!(shape(&tree), vec![(20, B), (10, B), (40, R), (30, B), (50, B)]);

        tree.remove(&10);
        assert_eq!(shape(&tree), vec![(40, B), (20, B), (30, R), (50, B)]);
        assert_eq!(tree.validate(), Ok(()));
    }

    #[test]
    fn test_remove_fixup_case_3_reaches_root() {
        let mut tree = build(&[10, 20, 30, 40]);
        tree.remove(&40);
        assert_eq!(shape(&tree), vec![(20, B), (10, B), (30, B)]);

        tree.remove(&10);
        assert_eq!(shape(&tree), vec![(20, B), (30, R)]);
        assert_eq!(tree.validate(), Ok(()));
    }

    #[test]
    fn test_remove_fixup_case_4() {
        let mut tree = build(&[10, 20, 30, 40, 50, 60]);
        tree.remove(&60);
        tree.remove(&30);
        assert_eq!(shape(&tree), vec![(20, B), (10, B), (40, B), (50, R)]);
        assert_eq!(tree.validate(), Ok(()));
    }

    #[test]
    fn test_remove_fixup_case_5_then_case_6() {
        let mut tree = build(&[10, 20, 30, 25]);
        assert_eq!(shape(&tree), vec![(20, B), (10, B), (30, B), (25, R)]);

        tree.remove(&10);
        assert_eq!(shape(&tree), vec![(25, B), (20, B), (30, B)]);
        assert_eq!(tree.validate(), Ok(()));
    }

    #[test]
    fn test_remove_fixup_case_6() {
        let mut tree = build(&[10, 20, 30, 40]);
        tree.remove(&10);
        assert_eq!(shape(&tree), vec![(30, B), (20, B), (40, B)]);
        assert_eq!(tree.validate(), Ok(()));
    }

    #[test]
    fn test_insert_then_remove_restores_contents() {
        for probe in 0..70 {
            let mut tree = build(&[10, 20, 30, 40, 50, 60]);
            let before: Vec<u32> = tree.iter().cloned().collect();
            if tree.insert(probe) {
                assert_eq!(tree.remove(&probe), Some(probe));
            }
            assert_eq!(tree.validate(), Ok(()));
            assert_eq!(tree.iter().cloned().collect::<Vec<_>>(), before);
        }
    }

    #[test]
    fn test_insert_then_remove_under_black_parent_restores_shape() {
        for probe in &[5, 15, 25, 35] {
            let mut tree = build(&[10, 20, 30, 40, 50, 60]);
            let before = shape(&tree);
            assert!(tree.insert(*probe));
            assert_eq!(tree.remove(probe), Some(*probe));
            assert_eq!(shape(&tree), before);
        }
    }

    #[test]
    fn test_ceil_floor() {
        let tree = build(&[10, 20, 30]);
        assert_eq!(tree.ceil(&25), Some(&30));
        assert_eq!(tree.floor(&25), Some(&20));
        assert_eq!(tree.ceil(&20), Some(&20));
        assert_eq!(tree.floor(&20), Some(&20));
        assert_eq!(tree.ceil(&5), Some(&10));
        assert_eq!(tree.floor(&35), Some(&30));
        assert_eq!(tree.ceil(&35), None);
        assert_eq!(tree.floor(&5), None);
    }

    #[test]
    fn test_ceil_floor_empty() {
        let tree: Tree<u32> = Tree::new(8);
        assert_eq!(tree.ceil(&1), None);
        assert_eq!(tree.floor(&1), None);
        assert_eq!(tree.min(), None);
        assert_eq!(tree.max(), None);
    }

    #[test]
    fn test_clone_keeps_shape() {
        let tree = build(&[10, 20, 30, 40, 50, 60]);
        let copy = tree.clone();
        assert_eq!(shape(&copy), shape(&tree));
        assert_eq!(copy.validate(), Ok(()));
    }

    #[test]
    fn test_into_iter_is_ordered() {
        let tree = build(&[5, 3, 8, 1, 4, 9, 7]);
        assert_eq!(tree.into_iter().collect::<Vec<_>>(), vec![1, 3, 4, 5, 7, 8, 9]);
    }

    #[test]
    fn test_iter_is_restartable() {
        let tree = build(&[3, 1, 2]);
        let mut iter = tree.iter();
        assert_eq!(iter.size_hint(), (3, Some(3)));
        assert_eq!(iter.next(), Some(&1));
        assert_eq!(tree.iter().collect::<Vec<_>>(), vec![&1, &2, &3]);
    }

    #[test]
    fn test_validate_red_root() {
        let mut tree = build(&[10, 20, 30]);
        let root = tree.root.unwrap();
        tree.set_color(root, Color::Red);
        assert_eq!(tree.validate(), Err(Error::RedRoot));
    }

    #[test]
    fn test_validate_consecutive_reds() {
        let mut tree = build(&[20, 10, 30, 5]);
        let entry = entry_of(&tree, 10);
        tree.set_color(entry, Color::Red);
        assert_eq!(tree.validate(), Err(Error::ConsecutiveReds));
    }

    #[test]
    fn test_validate_unbalanced_blacks() {
        let mut tree = build(&[10, 20, 30]);
        let entry = entry_of(&tree, 10);
        tree.set_color(entry, Color::Black);
        assert_eq!(
            tree.validate(),
            Err(Error::UnbalancedBlacks { left: 1, right: 0 }),
        );
    }

    #[test]
    fn test_validate_out_of_order() {
        let mut tree = build(&[10, 20, 30]);
        let entry = entry_of(&tree, 10);
        tree.node_mut(entry).value = 25;
        assert_eq!(tree.validate(), Err(Error::OutOfOrder));
    }

    #[test]
    fn test_validate_length_mismatch() {
        let mut tree = build(&[10, 20, 30]);
        tree.len = 4;
        assert_eq!(
            tree.validate(),
            Err(Error::LengthMismatch {
                expected: 4,
                actual: 3,
            }),
        );
    }

    #[test]
    fn test_validate_broken_parent_link() {
        let mut tree = build(&[10, 20, 30]);
        let entry = entry_of(&tree, 10);
        tree.node_mut(entry).parent = None;
        assert_eq!(tree.validate(), Err(Error::BrokenParentLink));
    }

    #[test]
    #[should_panic(expected = "a red node selected for removal has children")]
    fn test_remove_red_node_with_child_is_fatal() {
        let mut tree = build(&[10, 20, 30, 40]);
        let entry = entry_of(&tree, 30);
        tree.set_color(entry, Color::Red);
        tree.remove(&30);
    }

    #[test]
    #[should_panic(expected = "matches no rebalancing case")]
    fn test_unmatched_deletion_case_is_fatal() {
        let mut tree = build(&[20, 10, 30]);
        let entry = entry_of(&tree, 10);
        tree.set_color(entry, Color::Black);
        let entry = entry_of(&tree, 20);
        tree.set_color(entry, Color::Red);
        tree.remove(&10);
    }

    #[test]
    #[should_panic(expected = "a black node with a single child has a black child")]
    fn test_remove_black_node_with_black_child_is_fatal() {
        let mut tree = build(&[10, 20, 30, 40]);
        let entry = entry_of(&tree, 40);
        tree.set_color(entry, Color::Black);
        tree.remove(&30);
    }

    #[test]
    #[should_panic(expected = "cannot have children")]
    fn test_remove_absorbed_child_with_children_is_fatal() {
        let mut tree = build(&[10, 20, 30, 40]);
        let parent = entry_of(&tree, 40);
        let grandchild = tree.arena.allocate(Node::new(45, Some(parent)));
        tree.node_mut(parent).right = Some(grandchild);
        tree.remove(&30);
    }
}
