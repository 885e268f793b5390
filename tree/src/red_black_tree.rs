//! Red-black tree over a set of keys.
//!
//! Every missing child of a node (and the whole tree, when empty) is
//! represented by one shared, always black sentinel node. The
//! sentinel lets the fix-up routines read the color of an "empty" subtree
//! and, during deletion, remember the parent of a removed leaf. Only the
//! parent of the root is a genuinely absent link.

use core::fmt;
use std::marker::PhantomData;
use std::mem::{self, MaybeUninit};
use std::ptr::NonNull;

use compare::{Compare, Less};
use log::{debug, trace};

/// Color of a [`RedBlackTree`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Red,
    Black,
}

impl Color {
    /// Returns `true` if the color is [`Red`].
    ///
    /// [`Red`]: Color::Red
    #[must_use]
    pub fn is_red(&self) -> bool {
        matches!(self, Self::Red)
    }

    /// Returns `true` if the color is [`Black`].
    ///
    /// [`Black`]: Color::Black
    #[must_use]
    pub fn is_black(&self) -> bool {
        matches!(self, Self::Black)
    }
}

struct Node<T> {
    // uninit only for the sentinel node, must be a valid value for all other nodes
    key: MaybeUninit<T>,
    color: Color,
    // `None` only for the root, or for the sentinel outside of `delete`
    parent: Option<RawNode<T>>,
    left: RawNode<T>,
    right: RawNode<T>,
}

/// Wrapper around `NonNull<Node<T>>` to keep the balancing algorithms readable.
#[repr(transparent)]
struct RawNode<T> {
    ptr: NonNull<Node<T>>,
}

impl<T> Clone for RawNode<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RawNode<T> {}

impl<T> PartialEq for RawNode<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}

impl<T> Eq for RawNode<T> {}

impl<T> RawNode<T> {
    fn from_node(node: Node<T>) -> Self {
        Self {
            ptr: NonNull::from(Box::leak(Box::new(node))),
        }
    }

    /// Allocates the sentinel, its children point back to itself.
    fn new_sentinel() -> Self {
        let mut sentinel = Self::from_node(Node {
            key: MaybeUninit::uninit(),
            color: Color::Black,
            parent: None,
            left: Self {
                ptr: NonNull::dangling(),
            },
            right: Self {
                ptr: NonNull::dangling(),
            },
        });
        unsafe {
            sentinel.set_left(sentinel);
            sentinel.set_right(sentinel);
        }
        sentinel
    }

    #[inline]
    fn as_ptr(&self) -> *mut Node<T> {
        self.ptr.as_ptr()
    }

    #[inline]
    unsafe fn key<'a>(&self) -> &'a T {
        unsafe { (*self.as_ptr()).key.assume_init_ref() }
    }

    #[inline]
    unsafe fn key_mut<'a>(&mut self) -> &'a mut T {
        unsafe { (*self.as_ptr()).key.assume_init_mut() }
    }

    /// Deallocates a regular node and returns its key.
    ///
    /// # Safety
    ///
    /// * node must not be the sentinel
    /// * node must be unlinked, no other handle to it may be used afterwards
    unsafe fn into_key(self) -> T {
        let node = unsafe { Box::from_raw(self.as_ptr()) };
        unsafe { node.key.assume_init() }
    }

    #[inline]
    unsafe fn parent(&self) -> Option<RawNode<T>> {
        unsafe { (*self.as_ptr()).parent }
    }

    #[inline]
    unsafe fn set_parent(&mut self, new_parent: Option<RawNode<T>>) {
        unsafe { (*self.as_ptr()).parent = new_parent }
    }

    #[inline]
    unsafe fn left(&self) -> RawNode<T> {
        unsafe { (*self.as_ptr()).left }
    }

    #[inline]
    unsafe fn set_left(&mut self, new_left: RawNode<T>) {
        unsafe { (*self.as_ptr()).left = new_left }
    }

    #[inline]
    unsafe fn right(&self) -> RawNode<T> {
        unsafe { (*self.as_ptr()).right }
    }

    #[inline]
    unsafe fn set_right(&mut self, new_right: RawNode<T>) {
        unsafe { (*self.as_ptr()).right = new_right }
    }

    #[inline]
    unsafe fn color(&self) -> Color {
        unsafe { (*self.as_ptr()).color }
    }

    #[inline]
    unsafe fn set_color(&mut self, new_color: Color) {
        unsafe { (*self.as_ptr()).color = new_color }
    }
}

/// Self balancing binary search tree holding a set of keys ordered by `C`.
///
/// Inserting a key that is equivalent to one already in the tree is a no-op.
pub struct RedBlackTree<T, C = Less> {
    // `sentinel` iff the tree is empty
    root: RawNode<T>,
    len: usize,
    sentinel: RawNode<T>,
    cmp: C,
    marker: PhantomData<Box<Node<T>>>,
}

impl<T, C> Drop for RedBlackTree<T, C> {
    fn drop(&mut self) {
        // TODO: handle panics in `T::drop`
        let mut stack = Vec::new();
        if !self.is_empty() {
            stack.push(self.root);
        }

        while let Some(node) = stack.pop() {
            unsafe {
                for child in [node.left(), node.right()] {
                    if !self.is_sentinel(child) {
                        stack.push(child);
                    }
                }
                drop(node.into_key());
            }
        }

        self.len = 0;
        self.root = self.sentinel;
        let _: Box<Node<T>> = unsafe { Box::from_raw(self.sentinel.as_ptr()) };
    }
}

impl<T, C> fmt::Debug for RedBlackTree<T, C>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct PreOrder<'a, T, C>(&'a RedBlackTree<T, C>);

        impl<T, C> fmt::Debug for PreOrder<'_, T, C>
        where
            T: fmt::Debug,
        {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let mut f = f.debug_list();
                unsafe {
                    self.0.preorder_try_for_each(|node| {
                        f.entry(&(node.key(), node.color()));
                        true
                    });
                }
                f.finish()
            }
        }

        f.debug_struct("RedBlackTree")
            .field("len", &self.len)
            .field("nodes", &PreOrder(self))
            .finish()
    }
}

impl<T> RedBlackTree<T> {
    /// Creates an empty tree ordering keys ascending.
    pub fn new() -> Self {
        Self::with_comparator(Less)
    }
}

impl<T> Default for RedBlackTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C> RedBlackTree<T, C> {
    /// Creates an empty tree ordered by `cmp`.
    pub fn with_comparator(cmp: C) -> Self {
        let sentinel = RawNode::new_sentinel();
        Self {
            root: sentinel,
            len: 0,
            sentinel,
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
        if self.is_empty() {
            None
        } else {
            Some(unsafe { self.root.key() })
        }
    }

    #[inline]
    fn is_sentinel(&self, node: RawNode<T>) -> bool {
        node == self.sentinel
    }

    /// Checks that a pre-order walk of the tree yields exactly `expected`,
    /// both keys and colors.
    pub fn verify(&self, expected: &[(T, Color)]) -> bool
    where
        T: PartialEq,
    {
        let mut index = 0;
        let matched = unsafe {
            self.preorder_try_for_each(|node| {
                let Some((key, color)) = expected.get(index) else {
                    debug!("verify: tree has more than {} nodes", expected.len());
                    return false;
                };
                if node.key() != key || node.color() != *color {
                    debug!("verify: mismatch at pre-order position {}", index);
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

    /// Calls `f` for each node in pre-order until it returns `false`.
    ///
    /// Walks the parent links, no recursion nor allocation. Returns `false`
    /// if the walk was cut short.
    unsafe fn preorder_try_for_each<F>(&self, mut f: F) -> bool
    where
        F: FnMut(RawNode<T>) -> bool,
    {
        if self.is_empty() {
            return true;
        }

        let mut node = self.root;
        loop {
            if !f(node) {
                return false;
            }

            unsafe {
                if !self.is_sentinel(node.left()) {
                    node = node.left();
                    continue;
                }
                if !self.is_sentinel(node.right()) {
                    node = node.right();
                    continue;
                }

                loop {
                    let Some(parent) = node.parent() else {
                        return true;
                    };
                    if parent.left() == node && !self.is_sentinel(parent.right()) {
                        node = parent.right();
                        break;
                    }
                    node = parent;
                }
            }
        }
    }

    unsafe fn min_of(&self, root: RawNode<T>) -> RawNode<T> {
        let mut x = root;
        while !self.is_sentinel(unsafe { x.left() }) {
            x = unsafe { x.left() };
        }
        x
    }

    /// Makes the parent of `old` point to `new` instead.
    ///
    /// `new` may be the sentinel, in which case its parent link is set too.
    unsafe fn replace_subtree(&mut self, old: RawNode<T>, mut new: RawNode<T>) {
        unsafe {
            let parent = old.parent();
            match parent {
                Some(mut parent) => {
                    if parent.left() == old {
                        parent.set_left(new);
                    } else {
                        parent.set_right(new);
                    }
                }
                None => self.root = new,
            }
            new.set_parent(parent);
        }
    }

    /// Rotates the subtree rooted at `node` to the left.
    ///
    /// ```text
    ///       |                      |
    ///      node                    r
    ///     /   \                  /   \
    ///    a     r       =>      node   c
    ///        /   \            /   \
    ///       b     c          a     b
    /// ```
    fn rotate_left(&mut self, mut node: RawNode<T>) {
        unsafe {
            let mut r = node.right();
            debug_assert!(!self.is_sentinel(r));

            let mut b = r.left();
            node.set_right(b);
            if !self.is_sentinel(b) {
                b.set_parent(Some(node));
            }

            self.replace_subtree(node, r);
            r.set_left(node);
            node.set_parent(Some(r));
        }
    }

    /// Mirror image of [`rotate_left`](Self::rotate_left).
    fn rotate_right(&mut self, mut node: RawNode<T>) {
        unsafe {
            let mut l = node.left();
            debug_assert!(!self.is_sentinel(l));

            let mut b = l.right();
            node.set_left(b);
            if !self.is_sentinel(b) {
                b.set_parent(Some(node));
            }

            self.replace_subtree(node, l);
            l.set_right(node);
            node.set_parent(Some(l));
        }
    }

    /// Restores the red-black properties after `node` was inserted as a red
    /// leaf below a red parent.
    fn insert_fixup(&mut self, mut node: RawNode<T>) {
        unsafe {
            while let Some(mut parent) = node.parent() {
                if parent.color().is_black() {
                    break;
                }
                // a red parent is never the root
                let Some(mut grand_parent) = parent.parent() else {
                    unreachable!("red root")
                };

                if parent == grand_parent.left() {
                    let mut uncle = grand_parent.right();
                    if uncle.color().is_red() {
                        trace!("insert fix-up: red uncle, recolor");
                        parent.set_color(Color::Black);
                        uncle.set_color(Color::Black);
                        grand_parent.set_color(Color::Red);
                        node = grand_parent;
                        continue;
                    }

                    if node == parent.right() {
                        trace!("insert fix-up: inner child, rotate parent left");
                        self.rotate_left(parent);
                        mem::swap(&mut node, &mut parent);
                    }
                    trace!("insert fix-up: outer child, rotate grand parent right");
                    parent.set_color(Color::Black);
                    grand_parent.set_color(Color::Red);
                    self.rotate_right(grand_parent);
                } else {
                    let mut uncle = grand_parent.left();
                    if uncle.color().is_red() {
                        trace!("insert fix-up: red uncle, recolor");
                        parent.set_color(Color::Black);
                        uncle.set_color(Color::Black);
                        grand_parent.set_color(Color::Red);
                        node = grand_parent;
                        continue;
                    }

                    if node == parent.left() {
                        trace!("insert fix-up: inner child, rotate parent right");
                        self.rotate_right(parent);
                        mem::swap(&mut node, &mut parent);
                    }
                    trace!("insert fix-up: outer child, rotate grand parent left");
                    parent.set_color(Color::Black);
                    grand_parent.set_color(Color::Red);
                    self.rotate_left(grand_parent);
                }
            }

            self.root.set_color(Color::Black);
        }
    }

    /// Restores the red-black properties after a black node was spliced
    /// out and replaced by `x`, which may be the sentinel (with its parent
    /// link pointing to the removed node's parent).
    fn delete_fixup(&mut self, mut x: RawNode<T>) {
        unsafe {
            while x != self.root && x.color().is_black() {
                let Some(mut parent) = x.parent() else {
                    unreachable!("non-root node without parent")
                };

                // `x` carries an extra black, so its sibling can't be the sentinel
                if x == parent.left() {
                    let mut sibling = parent.right();
                    debug_assert!(!self.is_sentinel(sibling));

                    if sibling.color().is_red() {
                        trace!("delete fix-up: red sibling, rotate parent left");
                        sibling.set_color(Color::Black);
                        parent.set_color(Color::Red);
                        self.rotate_left(parent);
                        sibling = parent.right();
                    }

                    if sibling.left().color().is_black() && sibling.right().color().is_black() {
                        trace!("delete fix-up: black nephews, move extra black up");
                        sibling.set_color(Color::Red);
                        x = parent;
                        continue;
                    }

                    if sibling.right().color().is_black() {
                        trace!("delete fix-up: red inner nephew, rotate sibling right");
                        sibling.left().set_color(Color::Black);
                        sibling.set_color(Color::Red);
                        self.rotate_right(sibling);
                        sibling = parent.right();
                    }

                    trace!("delete fix-up: red outer nephew, rotate parent left");
                    sibling.set_color(parent.color());
                    parent.set_color(Color::Black);
                    sibling.right().set_color(Color::Black);
                    self.rotate_left(parent);
                    x = self.root;
                } else {
                    let mut sibling = parent.left();
                    debug_assert!(!self.is_sentinel(sibling));

                    if sibling.color().is_red() {
                        trace!("delete fix-up: red sibling, rotate parent right");
                        sibling.set_color(Color::Black);
                        parent.set_color(Color::Red);
                        self.rotate_right(parent);
                        sibling = parent.left();
                    }

                    if sibling.left().color().is_black() && sibling.right().color().is_black() {
                        trace!("delete fix-up: black nephews, move extra black up");
                        sibling.set_color(Color::Red);
                        x = parent;
                        continue;
                    }

                    if sibling.left().color().is_black() {
                        trace!("delete fix-up: red inner nephew, rotate sibling left");
                        sibling.right().set_color(Color::Black);
                        sibling.set_color(Color::Red);
                        self.rotate_left(sibling);
                        sibling = parent.left();
                    }

                    trace!("delete fix-up: red outer nephew, rotate parent right");
                    sibling.set_color(parent.color());
                    parent.set_color(Color::Black);
                    sibling.left().set_color(Color::Black);
                    self.rotate_right(parent);
                    x = self.root;
                }
            }

            // the sentinel is black already and must stay untouched
            if !self.is_sentinel(x) {
                x.set_color(Color::Black);
            }
        }
    }
}

impl<T, C> RedBlackTree<T, C>
where
    C: Compare<T>,
{
    /// Inserts `key` into the tree, does nothing if an equivalent key is
    /// already present.
    pub fn insert(&mut self, key: T) {
        if self.is_empty() {
            self.root = self.new_node(key, Color::Black);
            self.len = 1;
            return;
        }

        unsafe {
            let mut parent = self.root;
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

                if self.is_sentinel(next) {
                    break goes_left;
                }
                parent = next;
            };

            let mut node = self.new_node(key, Color::Red);
            node.set_parent(Some(parent));
            if goes_left {
                parent.set_left(node);
            } else {
                parent.set_right(node);
            }
            self.len += 1;

            if parent.color().is_red() {
                self.insert_fixup(node);
            }
        }
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
        while !self.is_sentinel(x) {
            let x_key = unsafe { x.key() };
            x = if self.cmp.precedes(key, x_key) {
                unsafe { x.left() }
            } else if self.cmp.precedes(x_key, key) {
                unsafe { x.right() }
            } else {
                return Some(x);
            };
        }
        None
    }

    fn new_node(&self, key: T, color: Color) -> RawNode<T> {
        RawNode::from_node(Node {
            key: MaybeUninit::new(key),
            color,
            parent: None,
            left: self.sentinel,
            right: self.sentinel,
        })
    }

    /// # Safety
    ///
    /// * `node` must be a regular node of this tree
    unsafe fn delete_core(&mut self, mut node: RawNode<T>) -> T {
        unsafe {
            // A node with two children takes over its successor's key, the
            // successor (which has no left child) is removed in its place.
            if !self.is_sentinel(node.left()) && !self.is_sentinel(node.right()) {
                let mut successor = self.min_of(node.right());
                mem::swap(node.key_mut(), successor.key_mut());
                node = successor;
            }

            let removed_color = node.color();
            let child = if self.is_sentinel(node.left()) {
                node.right()
            } else {
                node.left()
            };
            self.replace_subtree(node, child);
            self.len -= 1;

            if removed_color.is_black() {
                self.delete_fixup(child);
            }
            self.sentinel.set_parent(None);

            node.into_key()
        }
    }
}
