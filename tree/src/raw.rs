//! Heap allocated tree nodes linked by raw pointers.
//!
//! Children are owned by their parent, the `parent` link is a plain back
//! pointer used to walk up the tree. Every function here trusts the caller to
//! keep both directions of the links in sync.

use core::fmt;
use std::ptr::NonNull;

pub(crate) struct Node<T, M> {
    key: T,
    /// Per-tree bookkeeping, eg. the cached height of an AVL subtree.
    meta: M,
    parent: Option<RawNode<T, M>>,
    left: Option<RawNode<T, M>>,
    right: Option<RawNode<T, M>>,
}

/// Copyable handle to a [`Node`].
#[repr(transparent)]
pub(crate) struct RawNode<T, M> {
    ptr: NonNull<Node<T, M>>,
}

impl<T, M> Clone for RawNode<T, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, M> Copy for RawNode<T, M> {}

impl<T, M> PartialEq for RawNode<T, M> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}

impl<T, M> Eq for RawNode<T, M> {}

impl<T, M> fmt::Debug for RawNode<T, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawNode").field(&self.ptr).finish()
    }
}

impl<T, M> RawNode<T, M> {
    /// Allocates a new childless node.
    pub(crate) fn new(key: T, meta: M, parent: Option<Self>) -> Self {
        let node = Box::new(Node {
            key,
            meta,
            parent,
            left: None,
            right: None,
        });
        Self {
            ptr: NonNull::from(Box::leak(node)),
        }
    }

    /// Deallocates the node and returns its key.
    ///
    /// # Safety
    ///
    /// * node must be unlinked from the tree, no other handle to it may be used afterwards
    pub(crate) unsafe fn into_key(self) -> T {
        let node = unsafe { Box::from_raw(self.ptr.as_ptr()) };
        node.key
    }

    #[inline]
    fn as_ptr(&self) -> *mut Node<T, M> {
        self.ptr.as_ptr()
    }

    #[inline]
    pub(crate) unsafe fn key<'a>(&self) -> &'a T {
        unsafe { &(*self.as_ptr()).key }
    }

    #[inline]
    pub(crate) unsafe fn key_mut<'a>(&mut self) -> &'a mut T {
        unsafe { &mut (*self.as_ptr()).key }
    }

    #[inline]
    pub(crate) unsafe fn meta<'a>(&self) -> &'a M {
        unsafe { &(*self.as_ptr()).meta }
    }

    #[inline]
    pub(crate) unsafe fn set_meta(&mut self, meta: M) {
        unsafe { (*self.as_ptr()).meta = meta }
    }

    #[inline]
    pub(crate) unsafe fn parent(&self) -> Option<Self> {
        unsafe { (*self.as_ptr()).parent }
    }

    #[inline]
    pub(crate) unsafe fn set_parent(&mut self, new_parent: Option<Self>) {
        unsafe { (*self.as_ptr()).parent = new_parent }
    }

    #[inline]
    pub(crate) unsafe fn left(&self) -> Option<Self> {
        unsafe { (*self.as_ptr()).left }
    }

    #[inline]
    pub(crate) unsafe fn set_left(&mut self, new_left: Option<Self>) {
        unsafe { (*self.as_ptr()).left = new_left }
    }

    #[inline]
    pub(crate) unsafe fn right(&self) -> Option<Self> {
        unsafe { (*self.as_ptr()).right }
    }

    #[inline]
    pub(crate) unsafe fn set_right(&mut self, new_right: Option<Self>) {
        unsafe { (*self.as_ptr()).right = new_right }
    }

    /// Returns `true` if `self` is the left child of its parent.
    #[inline]
    pub(crate) unsafe fn is_left_child(&self) -> bool {
        match unsafe { self.parent() } {
            Some(parent) => unsafe { parent.left() == Some(*self) },
            None => false,
        }
    }
}

/// Returns the leftmost node of the subtree rooted at `node`.
pub(crate) unsafe fn min_of<T, M>(node: RawNode<T, M>) -> RawNode<T, M> {
    let mut x = node;
    while let Some(left) = unsafe { x.left() } {
        x = left;
    }
    x
}

/// Puts subtree `new` into the place of subtree `old`.
///
/// `old` keeps its own links, it's up to the caller to reuse or free it.
pub(crate) unsafe fn replace_subtree<T, M>(
    root: &mut Option<RawNode<T, M>>,
    old: RawNode<T, M>,
    new: Option<RawNode<T, M>>,
) {
    unsafe {
        let parent = old.parent();
        match parent {
            Some(mut parent) => {
                if parent.left() == Some(old) {
                    parent.set_left(new);
                } else {
                    parent.set_right(new);
                }
            }
            None => *root = new,
        }

        if let Some(mut new) = new {
            new.set_parent(parent);
        }
    }
}

/// Calls `f` for each node in pre-order until it returns `false`.
///
/// Walks the parent links instead of recursing or keeping a stack.
/// Returns `false` if the walk was cut short.
pub(crate) unsafe fn preorder_try_for_each<T, M, F>(root: Option<RawNode<T, M>>, mut f: F) -> bool
where
    F: FnMut(RawNode<T, M>) -> bool,
{
    let Some(mut node) = root else {
        return true;
    };

    loop {
        if !f(node) {
            return false;
        }

        unsafe {
            if let Some(left) = node.left() {
                node = left;
                continue;
            }
            if let Some(right) = node.right() {
                node = right;
                continue;
            }

            // `node` is a leaf, climb up until we leave a left subtree whose
            // parent has a right subtree still to visit
            loop {
                let Some(parent) = node.parent() else {
                    return true;
                };
                match parent.right() {
                    Some(right) if parent.left() == Some(node) => {
                        node = right;
                        break;
                    }
                    _ => node = parent,
                }
            }
        }
    }
}

/// Frees every node of a whole tree.
///
/// Goes down to a leaf, frees it and continues from its parent, so no
/// recursion nor extra memory is needed.
pub(crate) unsafe fn free_tree<T, M>(root: Option<RawNode<T, M>>) {
    let Some(mut node) = root else {
        return;
    };
    debug_assert!(unsafe { node.parent() }.is_none());

    loop {
        unsafe {
            if let Some(left) = node.left() {
                node = left;
                continue;
            }
            if let Some(right) = node.right() {
                node = right;
                continue;
            }

            let parent = node.parent();
            let was_left = node.is_left_child();
            drop(node.into_key());
            match parent {
                Some(mut parent) => {
                    if was_left {
                        parent.set_left(None);
                    } else {
                        parent.set_right(None);
                    }
                    node = parent;
                }
                None => return,
            }
        }
    }
}
