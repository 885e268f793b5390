//! Plain, unbalanced binary search tree over a set of keys.

use core::fmt;
use std::marker::PhantomData;

use compare::{Compare, Less};
use log::debug;

use crate::raw::{self, Node};

type RawNode<T> = raw::RawNode<T, ()>;

/// Binary search tree holding a set of keys ordered by `C`.
///
/// No balancing is done, sorted input degenerates into a linked list. All
/// operations (including drop) are iterative, so such shapes are slow but
/// never overflow the stack.
pub struct BinarySearchTree<T, C = Less> {
    root: Option<RawNode<T>>,
    len: usize,
    cmp: C,
    marker: PhantomData<Box<Node<T, ()>>>,
}

impl<T, C> Drop for BinarySearchTree<T, C> {
    fn drop(&mut self) {
        // TODO: handle panics in `T::drop`
        self.len = 0;
        unsafe { raw::free_tree(self.root.take()) };
    }
}

impl<T, C> fmt::Debug for BinarySearchTree<T, C>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct PreOrder<T>(Option<RawNode<T>>);

        impl<T> fmt::Debug for PreOrder<T>
        where
            T: fmt::Debug,
        {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let mut f = f.debug_list();
                unsafe {
                    raw::preorder_try_for_each(self.0, |node| {
                        f.entry(node.key());
                        true
                    });
                }
                f.finish()
            }
        }

        f.debug_struct("BinarySearchTree")
            .field("len", &self.len)
            .field("nodes", &PreOrder(self.root))
            .finish()
    }
}

impl<T> BinarySearchTree<T> {
    pub fn new() -> Self {
        Self::with_comparator(Less)
    }
}

impl<T> Default for BinarySearchTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C> BinarySearchTree<T, C> {
    pub fn with_comparator(cmp: C) -> Self {
        Self {
            root: None,
            len: 0,
            cmp,
            marker: PhantomData,
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
        self.root.map(|root| unsafe { root.key() })
    }

    /// Checks that a pre-order walk of the tree yields exactly `expected`.
    pub fn verify(&self, expected: &[T]) -> bool
    where
        T: PartialEq,
    {
        let mut index = 0;
        let matched = unsafe {
            raw::preorder_try_for_each(self.root, |node| {
                if expected.get(index) != Some(node.key()) {
                    debug!("verify: mismatch at pre-order position {}", index);
                    return false;
                }
                index += 1;
                true
            })
        };
        matched && index == expected.len()
    }
}

impl<T, C> BinarySearchTree<T, C>
where
    C: Compare<T>,
{
    /// Inserts `key` as a new leaf, does nothing if an equivalent key is
    /// already present.
    pub fn insert(&mut self, key: T) {
        let mut parent = None;
        let mut goes_left = false;
        let mut x = self.root;

        while let Some(node) = x {
            parent = Some(node);
            let node_key = unsafe { node.key() };
            x = if self.cmp.precedes(&key, node_key) {
                goes_left = true;
                unsafe { node.left() }
            } else if self.cmp.precedes(node_key, &key) {
                goes_left = false;
                unsafe { node.right() }
            } else {
                return;
            };
        }

        let node = RawNode::new(key, (), parent);
        match parent {
            None => self.root = Some(node),
            Some(mut parent) if goes_left => unsafe { parent.set_left(Some(node)) },
            Some(mut parent) => unsafe { parent.set_right(Some(node)) },
        }
        self.len += 1;
    }

    /// Removes the key equivalent to `key` and returns it.
    pub fn delete(&mut self, key: &T) -> Option<T> {
        let node = self.find(key)?;
        Some(unsafe { self.delete_core(node) })
    }

    /// Returns `true` if the tree holds a key equivalent to `key`.
    pub fn search(&self, key: &T) -> bool {
        self.find(key).is_some()
    }

    fn find(&self, key: &T) -> Option<RawNode<T>> {
        let mut x = self.root;
        while let Some(node) = x {
            let node_key = unsafe { node.key() };
            x = if self.cmp.precedes(key, node_key) {
                unsafe { node.left() }
            } else if self.cmp.precedes(node_key, key) {
                unsafe { node.right() }
            } else {
                return Some(node);
            };
        }
        None
    }

    /// # Safety
    ///
    /// * `node` must be a node of this tree
    unsafe fn delete_core(&mut self, node: RawNode<T>) -> T {
        //       ┌────────── 34 ─────────┐
        //       │                       │
        // ┌──── 2 ────┐                 58 ────┐
        // │           │                        │
        // 1      ┌─── 9 ────┐              ┌── 77 ──┐
        //        │          │              │        │
        //     ┌─ 6       ┌─ 20 ─┐      ┌─ 71 ─┐     82
        //     │          │      │      │      │
        //     5         12 ─┐   24    67      75
        //                   │
        //                   13

        unsafe {
            match (node.left(), node.right()) {
                // No children or only one, the child (if any) takes the place
                // of `node`. Eg. 1, 6, 12 or 58 above.
                (None, child) | (child, None) => raw::replace_subtree(&mut self.root, node, child),
                (Some(mut left), Some(right)) => {
                    // The successor is the minimum of the right subtree, it
                    // has no left child. If it isn't `right` itself (eg. 9
                    // above, with successor 12) it is first replaced by its
                    // own right subtree and adopts `node.right`.
                    let mut min = raw::min_of(right);
                    if min != right {
                        raw::replace_subtree(&mut self.root, min, min.right());
                        min.set_right(Some(right));
                        let mut right = right;
                        right.set_parent(Some(min));
                    }

                    raw::replace_subtree(&mut self.root, node, Some(min));
                    min.set_left(Some(left));
                    left.set_parent(Some(min));
                }
            }

            self.len -= 1;
            node.into_key()
        }
    }
}

#[cfg(test)]
mod tests {
    use compare::Greater;

    use super::*;

    fn tree_of<T, C: Compare<T>>(cmp: C, keys: impl IntoIterator<Item = T>) -> BinarySearchTree<T, C> {
        let mut tree = BinarySearchTree::with_comparator(cmp);
        for k in keys {
            tree.insert(k);
        }
        tree
    }

    fn assert_bst<T, C>(tree: &BinarySearchTree<T, C>)
    where
        C: Compare<T>,
    {
        let mut count = 0;
        unsafe {
            if let Some(root) = tree.root {
                assert!(root.parent().is_none());
            }
            raw::preorder_try_for_each(tree.root, |node| {
                count += 1;
                if let Some(left) = node.left() {
                    assert!(left.parent() == Some(node));
                    assert!(tree.cmp.precedes(left.key(), node.key()));
                }
                if let Some(right) = node.right() {
                    assert!(right.parent() == Some(node));
                    assert!(tree.cmp.precedes(node.key(), right.key()));
                }
                true
            });
        }
        assert_eq!(count, tree.len());
    }

    const KEYS: [i32; 16] = [34, 2, 58, 1, 9, 77, 6, 20, 71, 82, 5, 12, 24, 67, 75, 13];

    #[test]
    fn test() {
        let tree = tree_of(Less, KEYS);
        assert_eq!(tree.len(), 16);
        assert_eq!(tree.root(), Some(&34));
        assert!(tree.verify(&[34, 2, 1, 9, 6, 5, 20, 12, 13, 24, 58, 77, 71, 67, 75, 82]));
        assert_bst(&tree);
        for k in KEYS {
            assert!(tree.search(&k));
        }
        assert!(!tree.search(&1337));
    }

    #[test]
    fn duplicates_and_missing() {
        let mut tree = tree_of(Less, KEYS);
        tree.insert(9);
        assert_eq!(tree.len(), 16);
        assert_eq!(tree.delete(&1337), None);
        assert_eq!(tree.len(), 16);
        assert!(tree.verify(&[34, 2, 1, 9, 6, 5, 20, 12, 13, 24, 58, 77, 71, 67, 75, 82]));
    }

    #[test]
    fn delete() {
        let mut tree = tree_of(Less, KEYS);

        // leaf
        assert_eq!(tree.delete(&1), Some(1));
        assert!(tree.verify(&[34, 2, 9, 6, 5, 20, 12, 13, 24, 58, 77, 71, 67, 75, 82]));
        // single child
        assert_eq!(tree.delete(&58), Some(58));
        assert!(tree.verify(&[34, 2, 9, 6, 5, 20, 12, 13, 24, 77, 71, 67, 75, 82]));
        // successor deep in the right subtree
        assert_eq!(tree.delete(&9), Some(9));
        assert!(tree.verify(&[34, 2, 12, 6, 5, 20, 13, 24, 77, 71, 67, 75, 82]));
        // successor is the right child
        assert_eq!(tree.delete(&20), Some(20));
        assert!(tree.verify(&[34, 2, 12, 6, 5, 24, 13, 77, 71, 67, 75, 82]));
        // root
        assert_eq!(tree.delete(&34), Some(34));
        assert_eq!(tree.root(), Some(&67));
        assert!(tree.verify(&[67, 2, 12, 6, 5, 24, 13, 77, 71, 75, 82]));
        assert_bst(&tree);

        for k in [67, 2, 12, 6, 5, 24, 13, 77, 71, 75, 82] {
            assert_eq!(tree.delete(&k), Some(k));
            assert_bst(&tree);
        }
        assert!(tree.is_empty());
        assert!(tree.verify(&[]));
    }

    #[test]
    fn degenerate_shape() {
        #[cfg(not(miri))]
        const SIZE: i32 = 10_000;
        #[cfg(miri)]
        const SIZE: i32 = 100;

        let mut tree = tree_of(Greater, 0..SIZE);
        assert_eq!(tree.root(), Some(&0));
        assert!(tree.search(&(SIZE - 1)));
        assert_eq!(tree.delete(&0), Some(0));
        assert_eq!(tree.root(), Some(&1));
        // dropping must not recurse
        drop(tree);
    }

    #[test]
    fn debug_output() {
        let tree = tree_of(Less, [2, 1, 3]);
        assert_eq!(
            format!("{:?}", tree),
            "BinarySearchTree { len: 3, nodes: [2, 1, 3] }"
        );
    }

    mod proptests {
        use std::collections::BTreeSet;

        use proptest::prelude::*;
        use rand::seq::SliceRandom;
        use rand::thread_rng;

        use super::*;

        #[cfg(not(miri))]
        const TREE_SIZE: usize = 1000;
        #[cfg(miri)]
        const TREE_SIZE: usize = 50;

        #[cfg(not(miri))]
        const PROPTEST_CASES: u32 = 500;
        #[cfg(miri)]
        const PROPTEST_CASES: u32 = 10;

        proptest!(
            #![proptest_config(ProptestConfig::with_cases(PROPTEST_CASES))]

            #[test]
            fn insert_search(
                inserts in proptest::collection::vec(0..10000i32, 0..TREE_SIZE),
                access in proptest::collection::vec(0..10000i32, 0..10)
            ) {
                let reference = BTreeSet::from_iter(inserts.iter().copied());
                let tree = tree_of(Less, inserts.iter().copied());
                assert_bst(&tree);
                for key in inserts.iter().chain(access.iter()) {
                    prop_assert_eq!(tree.search(key), reference.contains(key));
                }
            }

            #[test]
            fn delete(
                inserts in proptest::collection::hash_set(0..10000i32, 0..TREE_SIZE),
                access in proptest::collection::vec(0..10000i32, 0..10)
            ) {
                let mut reference = BTreeSet::from_iter(inserts.iter().copied());
                let mut tree = tree_of(Less, inserts.iter().copied());

                let mut keys: Vec<_> = inserts.into_iter().collect();
                keys.shuffle(&mut thread_rng());
                for key in keys.iter().chain(access.iter()) {
                    prop_assert_eq!(tree.delete(key), reference.take(key));
                    assert_bst(&tree);
                }
            }
        );
    }
}
