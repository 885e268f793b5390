//! AVL tree with owned children and no parent links.
//!
//! Insertion and deletion recurse down to the point of change and rebalance
//! every node on the way back up. Rotation choices are the same as in
//! [`AvlTree`](crate::AvlTree), so both trees take the same shapes for the
//! same sequence of operations.

use core::fmt;
use std::mem;

use compare::{Compare, Less};
use log::{debug, trace};

type Link<T> = Option<Box<Node<T>>>;

struct Node<T> {
    key: T,
    height: usize,
    left: Link<T>,
    right: Link<T>,
}

impl<T> Node<T> {
    fn leaf(key: T) -> Box<Self> {
        Box::new(Node {
            key,
            height: 1,
            left: None,
            right: None,
        })
    }

    fn balance_factor(&self) -> isize {
        height(&self.left) as isize - height(&self.right) as isize
    }

    fn update_height(&mut self) {
        self.height = 1 + height(&self.left).max(height(&self.right));
    }
}

fn height<T>(link: &Link<T>) -> usize {
    link.as_ref().map_or(0, |n| n.height)
}

fn rotate_right<T>(mut node: Box<Node<T>>) -> Box<Node<T>> {
    let Some(mut l) = node.left.take() else {
        return node;
    };
    node.left = l.right.take();
    node.update_height();
    l.right = Some(node);
    l.update_height();
    l
}

fn rotate_left<T>(mut node: Box<Node<T>>) -> Box<Node<T>> {
    let Some(mut r) = node.right.take() else {
        return node;
    };
    node.right = r.left.take();
    node.update_height();
    r.left = Some(node);
    r.update_height();
    r
}

/// Updates the height of `node` and rotates it if it's unbalanced.
///
/// `outer` tells whether an inserted key went to the outer side of the
/// taller child. After a deletion (`None`) the child's balance factor
/// decides instead.
fn rebalance<T>(mut node: Box<Node<T>>, outer: Option<bool>) -> Box<Node<T>> {
    node.update_height();
    let bf = node.balance_factor();

    if bf > 1 {
        if let Some(left) = node.left.take() {
            let outer = outer.unwrap_or_else(|| left.balance_factor() >= 0);
            node.left = Some(if outer {
                trace!("rebalance: left-left");
                left
            } else {
                trace!("rebalance: left-right");
                rotate_left(left)
            });
        }
        rotate_right(node)
    } else if bf < -1 {
        if let Some(right) = node.right.take() {
            let outer = outer.unwrap_or_else(|| right.balance_factor() <= 0);
            node.right = Some(if outer {
                trace!("rebalance: right-right");
                right
            } else {
                trace!("rebalance: right-left");
                rotate_right(right)
            });
        }
        rotate_left(node)
    } else {
        node
    }
}

/// Removes the leftmost node below `node`, returns what is left of the
/// subtree and the removed key.
fn remove_min<T>(mut node: Box<Node<T>>) -> (Link<T>, T) {
    match node.left.take() {
        None => {
            let Node { key, right, .. } = *node;
            (right, key)
        }
        Some(left) => {
            let (left, min) = remove_min(left);
            node.left = left;
            (Some(rebalance(node, None)), min)
        }
    }
}

/// Height balanced binary search tree holding a set of keys ordered by `C`.
///
/// Same contract as [`AvlTree`](crate::AvlTree).
pub struct RecursiveAvlTree<T, C = Less> {
    root: Link<T>,
    len: usize,
    cmp: C,
}

impl<T, C> Drop for RecursiveAvlTree<T, C> {
    fn drop(&mut self) {
        let mut stack: Vec<_> = self.root.take().into_iter().collect();
        while let Some(mut node) = stack.pop() {
            stack.extend(node.left.take());
            stack.extend(node.right.take());
        }
    }
}

impl<T, C> fmt::Debug for RecursiveAvlTree<T, C>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct PreOrder<'a, T, C>(&'a RecursiveAvlTree<T, C>);

        impl<T, C> fmt::Debug for PreOrder<'_, T, C>
        where
            T: fmt::Debug,
        {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_list()
                    .entries(self.0.preorder().map(|n| (&n.key, n.height)))
                    .finish()
            }
        }

        f.debug_struct("RecursiveAvlTree")
            .field("len", &self.len)
            .field("nodes", &PreOrder(self))
            .finish()
    }
}

impl<T> RecursiveAvlTree<T> {
    /// Creates an empty tree ordering keys ascending.
    pub fn new() -> Self {
        Self::with_comparator(Less)
    }
}

impl<T> Default for RecursiveAvlTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C> RecursiveAvlTree<T, C> {
    /// Creates an empty tree ordered by `cmp`.
    pub fn with_comparator(cmp: C) -> Self {
        Self {
            root: None,
            len: 0,
            cmp,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn root(&self) -> Option<&T> {
        self.root.as_ref().map(|n| &n.key)
    }

    /// Same checks as [`AvlTree::verify`](crate::AvlTree::verify).
    pub fn verify(&self, expected: &[T]) -> bool
    where
        T: PartialEq,
    {
        let mut count = 0;
        for (index, node) in self.preorder().enumerate() {
            if expected.get(index) != Some(&node.key) {
                debug!("verify: key mismatch at pre-order position {}", index);
                return false;
            }
            let (left, right) = (height(&node.left), height(&node.right));
            if node.height != 1 + left.max(right) || left.abs_diff(right) > 1 {
                debug!("verify: bad height at pre-order position {}", index);
                return false;
            }
            count += 1;
        }
        count == expected.len()
    }

    fn preorder(&self) -> impl Iterator<Item = &Node<T>> {
        let mut stack: Vec<&Node<T>> = self.root.as_deref().into_iter().collect();
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.right.as_deref());
            stack.extend(node.left.as_deref());
            Some(node)
        })
    }
}

impl<T, C> RecursiveAvlTree<T, C>
where
    C: Compare<T>,
{
    /// Inserts `key` into the tree, does nothing if an equivalent key is
    /// already present.
    pub fn insert(&mut self, key: T) {
        let root = self.root.take();
        self.root = Some(Self::insert_node(&self.cmp, root, key, &mut self.len));
    }

    fn insert_node(cmp: &C, node: Link<T>, key: T, len: &mut usize) -> Box<Node<T>> {
        let Some(mut node) = node else {
            *len += 1;
            return Node::leaf(key);
        };

        if cmp.precedes(&key, &node.key) {
            let outer = node
                .left
                .as_ref()
                .map_or(false, |l| cmp.precedes(&key, &l.key));
            node.left = Some(Self::insert_node(cmp, node.left.take(), key, len));
            rebalance(node, Some(outer))
        } else if cmp.precedes(&node.key, &key) {
            let outer = node
                .right
                .as_ref()
                .map_or(false, |r| cmp.precedes(&r.key, &key));
            node.right = Some(Self::insert_node(cmp, node.right.take(), key, len));
            rebalance(node, Some(outer))
        } else {
            node
        }
    }

    /// Removes the key equivalent to `key` and returns it.
    pub fn delete(&mut self, key: &T) -> Option<T> {
        let mut removed = None;
        let root = self.root.take();
        self.root = Self::delete_node(&self.cmp, root, key, &mut removed);
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    fn delete_node(cmp: &C, node: Link<T>, key: &T, removed: &mut Option<T>) -> Link<T> {
        let mut node = node?;

        if cmp.precedes(key, &node.key) {
            node.left = Self::delete_node(cmp, node.left.take(), key, removed);
        } else if cmp.precedes(&node.key, key) {
            node.right = Self::delete_node(cmp, node.right.take(), key, removed);
        } else {
            match (node.left.take(), node.right.take()) {
                (None, child) | (child, None) => {
                    *removed = Some(node.key);
                    return child;
                }
                (Some(left), Some(right)) => {
                    let (right, successor) = remove_min(right);
                    *removed = Some(mem::replace(&mut node.key, successor));
                    node.left = Some(left);
                    node.right = right;
                }
            }
        }

        Some(rebalance(node, None))
    }

    /// Returns `true` if the tree holds a key equivalent to `key`.
    pub fn search(&self, key: &T) -> bool {
        let mut x = self.root.as_deref();
        while let Some(node) = x {
            x = if self.cmp.precedes(key, &node.key) {
                node.left.as_deref()
            } else if self.cmp.precedes(&node.key, key) {
                node.right.as_deref()
            } else {
                return true;
            };
        }
        false
    }
}
