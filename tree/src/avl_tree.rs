//! AVL tree with parent pointers.
//!
//! Every node caches the height of its subtree (a leaf has height 1, a missing
//! child counts as 0). After each insertion or deletion the tree is walked
//! upward from the point of change to the root, recomputing heights and
//! rotating wherever the balance factor `height(left) - height(right)` leaves
//! `[-1, 1]`. Nothing recurses, so the call stack stays flat for any tree size.

use core::fmt;
use std::marker::PhantomData;
use std::mem;

use compare::{Compare, Less};
use log::{debug, trace};

use crate::raw::{self, Node};

type RawNode<T> = raw::RawNode<T, usize>;

#[inline]
unsafe fn height<T>(node: Option<RawNode<T>>) -> usize {
    node.map_or(0, |n| unsafe { *n.meta() })
}

#[inline]
unsafe fn balance_factor<T>(node: RawNode<T>) -> isize {
    unsafe { height(node.left()) as isize - height(node.right()) as isize }
}

#[inline]
unsafe fn update_height<T>(mut node: RawNode<T>) {
    unsafe {
        let h = 1 + height(node.left()).max(height(node.right()));
        node.set_meta(h);
    }
}

/// Rotates the subtree rooted at `node` to the left and returns its new root.
///
/// The new root inherits the parent link of `node` but the parent's child
/// slot is left for the caller to update.
unsafe fn rotate_left<T>(mut node: RawNode<T>) -> RawNode<T> {
    unsafe {
        let Some(mut r) = node.right() else {
            return node;
        };

        let b = r.left();
        node.set_right(b);
        if let Some(mut b) = b {
            b.set_parent(Some(node));
        }

        r.set_parent(node.parent());
        r.set_left(Some(node));
        node.set_parent(Some(r));

        update_height(node);
        update_height(r);
        r
    }
}

/// Mirror image of [`rotate_left`].
unsafe fn rotate_right<T>(mut node: RawNode<T>) -> RawNode<T> {
    unsafe {
        let Some(mut l) = node.left() else {
            return node;
        };

        let b = l.right();
        node.set_left(b);
        if let Some(mut b) = b {
            b.set_parent(Some(node));
        }

        l.set_parent(node.parent());
        l.set_right(Some(node));
        node.set_parent(Some(l));

        update_height(node);
        update_height(l);
        l
    }
}

/// What changed below the nodes being rebalanced.
enum Fixup<'a, T> {
    /// A node with this key was added.
    Insert(&'a T),
    /// A node was removed.
    Delete,
}

/// Height balanced binary search tree holding a set of keys ordered by `C`.
///
/// Inserting a key that is equivalent to one already in the tree is a no-op.
pub struct AvlTree<T, C = Less> {
    root: Option<RawNode<T>>,
    len: usize,
    cmp: C,
    marker: PhantomData<Box<Node<T, usize>>>,
}

impl<T, C> Drop for AvlTree<T, C> {
    fn drop(&mut self) {
        // TODO: handle panics in `T::drop`
        self.len = 0;
        unsafe { raw::free_tree(self.root.take()) };
    }
}

impl<T, C> fmt::Debug for AvlTree<T, C>
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
                        f.entry(&(node.key(), node.meta()));
                        true
                    });
                }
                f.finish()
            }
        }

        f.debug_struct("AvlTree")
            .field("len", &self.len)
            .field("nodes", &PreOrder(self.root))
            .finish()
    }
}

impl<T> AvlTree<T> {
    /// Creates an empty tree ordering keys ascending.
    pub fn new() -> Self {
        Self::with_comparator(Less)
    }
}

impl<T> Default for AvlTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C> AvlTree<T, C> {
    /// Creates an empty tree ordered by `cmp`.
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

    /// Returns the key stored at the root.
    pub fn root(&self) -> Option<&T> {
        self.root.map(|root| unsafe { root.key() })
    }

    /// Checks that a pre-order walk of the tree yields exactly the keys in
    /// `expected`, and that every node is balanced with a correct cached height.
    pub fn verify(&self, expected: &[T]) -> bool
    where
        T: PartialEq,
    {
        let mut index = 0;
        let matched = unsafe {
            raw::preorder_try_for_each(self.root, |node| {
                let Some(key) = expected.get(index) else {
                    debug!("verify: tree has more than {} nodes", expected.len());
                    return false;
                };
                if node.key() != key {
                    debug!("verify: key mismatch at pre-order position {}", index);
                    return false;
                }

                let (left, right) = (height(node.left()), height(node.right()));
                if *node.meta() != 1 + left.max(right) {
                    debug!("verify: stale height at pre-order position {}", index);
                    return false;
                }
                if left.abs_diff(right) > 1 {
                    debug!("verify: unbalanced node at pre-order position {}", index);
                    return false;
                }

                index += 1;
                true
            })
        };

        if matched && index != expected.len() {
            debug!(
                "verify: tree has {} nodes, expected {}",
                index,
                expected.len()
            );
        }
        matched && index == expected.len()
    }
}

impl<T, C> AvlTree<T, C>
where
    C: Compare<T>,
{
    /// Inserts `key` into the tree, does nothing if an equivalent key is
    /// already present.
    pub fn insert(&mut self, key: T) {
        let Some(mut parent) = self.root else {
            self.root = Some(RawNode::new(key, 1, None));
            self.len = 1;
            return;
        };

        unsafe {
            let goes_left = loop {
                let p_key = parent.key();
                let (next, goes_left) = if self.cmp.precedes(&key, p_key) {
                    (parent.left(), true)
                } else if self.cmp.precedes(p_key, &key) {
                    (parent.right(), false)
                } else {
                    trace!("insert: equivalent key already present");
                    return;
                };

                match next {
                    Some(next) => parent = next,
                    None => break goes_left,
                }
            };

            let node = RawNode::new(key, 1, Some(parent));
            if goes_left {
                parent.set_left(Some(node));
            } else {
                parent.set_right(Some(node));
            }
            self.len += 1;

            self.rebalance_upwards(parent, Fixup::Insert(node.key()));
        }
    }

    /// Removes the key equivalent to `key` and returns it.
    pub fn delete(&mut self, key: &T) -> Option<T> {
        let mut node = self.find(key)?;

        unsafe {
            // A node with two children takes over its successor's key, the
            // successor (which has no left child) is removed in its place.
            if let (Some(_), Some(right)) = (node.left(), node.right()) {
                let mut successor = raw::min_of(right);
                mem::swap(node.key_mut(), successor.key_mut());
                node = successor;
            }

            let parent = node.parent();
            let child = node.left().or(node.right());
            raw::replace_subtree(&mut self.root, node, child);
            self.len -= 1;

            if let Some(start) = child.or(parent) {
                self.rebalance_upwards(start, Fixup::Delete);
            }
            Some(node.into_key())
        }
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

    /// Walks from `start` up to the root, fixing heights and rotating any
    /// unbalanced node. The walk always reaches the root.
    unsafe fn rebalance_upwards(&mut self, start: RawNode<T>, fixup: Fixup<'_, T>) {
        let mut next = Some(start);
        while let Some(node) = next {
            unsafe {
                let parent = node.parent();
                let was_left = node.is_left_child();

                update_height(node);
                let top = self.rebalance(node, &fixup);
                if top != node {
                    match parent {
                        Some(mut parent) if was_left => parent.set_left(Some(top)),
                        Some(mut parent) => parent.set_right(Some(top)),
                        None => self.root = Some(top),
                    }
                }

                next = parent;
            }
        }
    }

    /// Rotates `node` if it is unbalanced, returns the root of the subtree.
    unsafe fn rebalance(&self, mut node: RawNode<T>, fixup: &Fixup<'_, T>) -> RawNode<T> {
        unsafe {
            let bf = balance_factor(node);
            if bf > 1 {
                if let Some(left) = node.left() {
                    let outer = match fixup {
                        Fixup::Insert(key) => self.cmp.precedes(*key, left.key()),
                        Fixup::Delete => balance_factor(left) >= 0,
                    };
                    if outer {
                        trace!("rebalance: left-left");
                    } else {
                        trace!("rebalance: left-right");
                        node.set_left(Some(rotate_left(left)));
                    }
                }
                rotate_right(node)
            } else if bf < -1 {
                if let Some(right) = node.right() {
                    let outer = match fixup {
                        Fixup::Insert(key) => self.cmp.precedes(right.key(), *key),
                        Fixup::Delete => balance_factor(right) <= 0,
                    };
                    if outer {
                        trace!("rebalance: right-right");
                    } else {
                        trace!("rebalance: right-left");
                        node.set_right(Some(rotate_right(right)));
                    }
                }
                rotate_left(node)
            } else {
                node
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use compare::{Deref, Greater};

    use super::*;

    fn init_logger() {
        let _ = simplelog::TestLogger::init(log::LevelFilter::Trace, simplelog::Config::default());
    }

    fn tree_of<T, C: Compare<T>>(cmp: C, keys: impl IntoIterator<Item = T>) -> AvlTree<T, C> {
        let mut tree = AvlTree::with_comparator(cmp);
        for k in keys {
            tree.insert(k);
        }
        tree
    }

    /// Checks the search tree order, the parent links, the cached heights
    /// and the balance of every node.
    fn assert_avl<T, C>(tree: &AvlTree<T, C>)
    where
        T: fmt::Debug,
        C: Compare<T>,
    {
        fn inner<T, C>(tree: &AvlTree<T, C>, node: Option<RawNode<T>>, count: &mut usize) -> usize
        where
            T: fmt::Debug,
            C: Compare<T>,
        {
            let Some(node) = node else {
                return 0;
            };
            *count += 1;

            unsafe {
                let (left, right) = (node.left(), node.right());
                if let Some(left) = left {
                    assert!(left.parent() == Some(node), "broken parent link");
                    assert!(tree.cmp.precedes(left.key(), node.key()));
                }
                if let Some(right) = right {
                    assert!(right.parent() == Some(node), "broken parent link");
                    assert!(tree.cmp.precedes(node.key(), right.key()));
                }

                let lh = inner(tree, left, count);
                let rh = inner(tree, right, count);
                assert!(lh.abs_diff(rh) <= 1, "{:?} is unbalanced", node.key());
                assert_eq!(*node.meta(), 1 + lh.max(rh), "stale height at {:?}", node.key());
                *node.meta()
            }
        }

        if let Some(root) = tree.root {
            assert!(unsafe { root.parent() }.is_none());
        }
        let mut count = 0;
        inner(tree, tree.root, &mut count);
        assert_eq!(count, tree.len());
    }

    const SCENARIO: [i32; 7] = [30, 35, 40, 20, 10, 24, 39];
    const SCENARIO_SHAPE: [i32; 7] = [30, 20, 10, 24, 39, 35, 40];

    #[test]
    fn insert_scenario() {
        init_logger();
        let tree = tree_of(Less, SCENARIO);
        assert_eq!(tree.len(), 7);
        assert_eq!(tree.root(), Some(&30));
        assert!(tree.verify(&SCENARIO_SHAPE));
        assert_avl(&tree);
    }

    #[test]
    fn verify_rejects() {
        let tree = tree_of(Less, SCENARIO);
        let mut shape = SCENARIO_SHAPE;
        shape.swap(5, 6);
        assert!(!tree.verify(&shape));
        assert!(!tree.verify(&SCENARIO_SHAPE[..6]));
        let mut longer = SCENARIO_SHAPE.to_vec();
        longer.push(41);
        assert!(!tree.verify(&longer));
    }

    #[test]
    fn verify_checks_heights() {
        let tree = tree_of(Less, [2, 1, 3]);
        assert!(tree.verify(&[2, 1, 3]));

        let mut root = tree.root.unwrap();
        unsafe { root.set_meta(3) };
        assert!(!tree.verify(&[2, 1, 3]));
        unsafe { root.set_meta(2) };
        assert!(tree.verify(&[2, 1, 3]));
    }

    #[test]
    fn duplicate_insert_is_noop() {
        let mut tree = tree_of(Less, SCENARIO);
        tree.insert(30);
        assert_eq!(tree.len(), 7);
        assert!(tree.verify(&SCENARIO_SHAPE));
    }

    #[test]
    fn delete_missing_is_noop() {
        let mut tree = tree_of(Less, SCENARIO);
        assert_eq!(tree.delete(&1337), None);
        assert_eq!(tree.len(), 7);
        assert!(tree.verify(&SCENARIO_SHAPE));
    }

    #[test]
    fn search() {
        let tree = tree_of(Less, SCENARIO);
        assert!(tree.search(&24));
        assert!(!tree.search(&1337));
        for k in SCENARIO {
            assert!(tree.search(&k));
        }
    }

    #[test]
    fn empty() {
        let mut tree = AvlTree::<i32>::new();
        assert!(tree.is_empty());
        assert_eq!(tree.root(), None);
        assert!(tree.verify(&[]));
        assert!(!tree.verify(&[1]));
        assert!(!tree.search(&1));
        assert_eq!(tree.delete(&1), None);
        assert_eq!(format!("{:?}", tree), "AvlTree { len: 0, nodes: [] }");

        tree.insert(1);
        assert!(tree.verify(&[1]));
        assert_eq!(tree.delete(&1), Some(1));
        assert!(tree.is_empty());
        assert!(tree.verify(&[]));
    }

    #[test]
    fn rotations_on_insert() {
        // left-left
        assert!(tree_of(Less, [3, 2, 1]).verify(&[2, 1, 3]));
        // left-right
        assert!(tree_of(Less, [3, 1, 2]).verify(&[2, 1, 3]));
        // right-right
        assert!(tree_of(Less, [1, 2, 3]).verify(&[2, 1, 3]));
        // right-left
        assert!(tree_of(Less, [1, 3, 2]).verify(&[2, 1, 3]));
    }

    #[test]
    fn delete_cases() {
        init_logger();
        let mut tree = tree_of(Less, SCENARIO);

        // two children, the successor 35 moves into the root
        assert_eq!(tree.delete(&30), Some(30));
        assert!(tree.verify(&[35, 20, 10, 24, 39, 40]));

        assert_eq!(tree.delete(&10), Some(10));
        assert!(tree.verify(&[35, 20, 24, 39, 40]));

        // single child spliced into its parent's slot
        assert_eq!(tree.delete(&20), Some(20));
        assert!(tree.verify(&[35, 24, 39, 40]));

        // right-right after removing a leaf
        assert_eq!(tree.delete(&24), Some(24));
        assert!(tree.verify(&[39, 35, 40]));
        assert_avl(&tree);
    }

    #[test]
    fn delete_uses_child_balance() {
        // the right child is balanced, a single rotation is enough
        let mut tree = tree_of(Less, [20, 10, 30, 25, 35]);
        assert_eq!(tree.delete(&10), Some(10));
        assert!(tree.verify(&[30, 20, 25, 35]));

        // the right child leans left, double rotation
        let mut tree = tree_of(Less, [20, 10, 30, 25]);
        assert_eq!(tree.delete(&10), Some(10));
        assert!(tree.verify(&[25, 20, 30]));

        // mirrored
        let mut tree = tree_of(Less, [20, 10, 30, 5, 15]);
        assert_eq!(tree.delete(&30), Some(30));
        assert!(tree.verify(&[10, 5, 20, 15]));

        let mut tree = tree_of(Less, [20, 10, 30, 15]);
        assert_eq!(tree.delete(&30), Some(30));
        assert!(tree.verify(&[15, 10, 20]));
    }

    #[test]
    fn ascending_inserts_stay_balanced() {
        let tree = tree_of(Less, 0..1023);
        assert_avl(&tree);
        // a perfect tree
        assert_eq!(unsafe { *tree.root.unwrap().meta() }, 10);
    }

    #[test]
    fn descending_comparator() {
        let tree = tree_of(Greater, SCENARIO);
        assert!(tree.verify(&[30, 39, 40, 35, 20, 24, 10]));
        assert_avl(&tree);
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: u32,
        name: &'static str,
    }

    #[test]
    fn custom_type() {
        let by_id = |a: &Item, b: &Item| a.id < b.id;
        let item = |id: i32| Item {
            id: id as u32,
            name: "item",
        };
        let mut tree = tree_of(by_id, SCENARIO.map(item));
        assert!(tree.verify(&SCENARIO_SHAPE.map(item)));

        let other = Item { id: 24, name: "other" };
        tree.insert(other.clone());
        assert_eq!(tree.len(), 7);
        assert_eq!(tree.delete(&other).map(|i| i.name), Some("item"));
    }

    #[test]
    fn shared_pointers() {
        let keys: Vec<Rc<i32>> = SCENARIO.iter().copied().map(Rc::new).collect();
        let tree = tree_of(Deref(Less), keys.iter().cloned());
        assert!(tree.verify(&SCENARIO_SHAPE.map(Rc::new)));
        assert!(tree.search(&Rc::new(24)));

        drop(tree);
        assert!(keys.iter().all(|k| Rc::strong_count(k) == 1));
    }

    #[test]
    fn debug_output() {
        let tree = tree_of(Less, [1, 2, 3, 4]);
        assert_eq!(
            format!("{:?}", tree),
            "AvlTree { len: 4, nodes: [(2, 3), (1, 1), (3, 2), (4, 1)] }"
        );
    }

    mod proptests {
        use std::collections::BTreeSet;

        use proptest::prelude::*;
        use rand::seq::SliceRandom;
        use rand::SeedableRng;
        use rand_chacha::ChaCha8Rng;

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
                assert_avl(&tree);
                prop_assert_eq!(tree.len(), reference.len());

                for key in inserts.iter().chain(access.iter()) {
                    prop_assert_eq!(tree.search(key), reference.contains(key));
                }
            }

            #[test]
            fn delete(
                inserts in proptest::collection::hash_set(0..10000i32, 0..TREE_SIZE),
                access in proptest::collection::vec(0..10000i32, 0..10),
                seed in any::<u64>()
            ) {
                let mut reference = BTreeSet::from_iter(inserts.iter().copied());
                let mut tree = tree_of(Less, inserts.iter().copied());

                let mut keys: Vec<_> = inserts.into_iter().collect();
                keys.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));
                for key in keys.iter().chain(access.iter()) {
                    let expected = reference.take(key);
                    prop_assert_eq!(tree.delete(key), expected);
                    prop_assert!(!tree.search(key));
                    assert_avl(&tree);
                }
                prop_assert!(tree.is_empty());
            }

            #[test]
            fn interleaved(
                ops in proptest::collection::vec((any::<bool>(), 0..200i32), 0..TREE_SIZE)
            ) {
                let mut reference = BTreeSet::new();
                let mut tree = AvlTree::with_comparator(Greater);
                for (insert, key) in ops {
                    if insert {
                        reference.insert(key);
                        tree.insert(key);
                    } else {
                        prop_assert_eq!(tree.delete(&key), reference.take(&key));
                    }
                    prop_assert_eq!(tree.len(), reference.len());
                }
                assert_avl(&tree);
            }
        );
    }
}
