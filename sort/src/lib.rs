#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]

//! In-place comparison sorts.
//!
//! Every algorithm comes in two flavours: `<name>_by(slice, &cmp)` which
//! orders the slice so that no element precedes its left neighbour under
//! `cmp`, and `<name>(slice)` which sorts `Ord` items in ascending order.

pub mod bubble_sort;
pub mod heap_sort;
pub mod insertion_sort;
pub mod merge_sort;
pub mod quicksort;
pub mod selection_sort;
