#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]

//! Binary search trees and a binary heap, all generic over a
//! [`Compare`](compare::Compare) ordering policy.
//!
//! The trees hold sets of keys: inserting a key equivalent to a present one
//! does nothing. [`RedBlackTree`] and [`AvlTree`] link their nodes with
//! parent pointers and rebalance iteratively, [`RecursiveAvlTree`] owns its
//! children and rebalances while unwinding the recursion.

pub mod avl_tree;
pub mod avl_tree_recursive;
pub mod binary_search_tree;
pub mod heap;
mod raw;
pub mod red_black_tree;

pub use avl_tree::AvlTree;
pub use avl_tree_recursive::RecursiveAvlTree;
pub use binary_search_tree::BinarySearchTree;
pub use heap::BinaryHeap;
pub use red_black_tree::{Color, RedBlackTree};
