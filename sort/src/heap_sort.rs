// Indices in a heap
//           0
//     1            2
//  3     4      5     6
// 7 8   9 10  11 12 13 14
//
// parent_index = (child_index - 1) / 2
// left_child = parent_index * 2 + 1
// right_child = left_child + 1 = parent_index * 2 + 2

use compare::{Compare, Less};

pub fn heap_sort<T: Ord>(slice: &mut [T]) {
    heap_sort_by(slice, &Less)
}

/// Unstable heap sort.
pub fn heap_sort_by<T, C>(slice: &mut [T], cmp: &C)
where
    C: Compare<T>,
{
    build_heap(slice, cmp);

    for i in (1..slice.len()).rev() {
        // slice[..=i] is a heap with the item that sorts last on top,
        // slice[i + 1..] is sorted
        slice.swap(i, 0);
        // both subtrees of the new top are still heaps
        sift_down(&mut slice[..i], 0, cmp);
    }
}

/// Builds a heap in-place, the item that no other item follows ends up at
/// index 0.
fn build_heap<T, C>(slice: &mut [T], cmp: &C)
where
    C: Compare<T>,
{
    if slice.len() < 2 {
        return;
    }
    // Leaves are heaps already, sift down every parent starting from the last
    // one: (last_index - 1) / 2.
    let last_parent = (slice.len() - 2) / 2;
    for i in (0..=last_parent).rev() {
        sift_down(slice, i, cmp);
    }
}

/// Moves the item at `parent_index` down until neither child follows it.
///
/// Both subtrees of `parent_index` must be heaps.
fn sift_down<T, C>(slice: &mut [T], mut parent_index: usize, cmp: &C)
where
    C: Compare<T>,
{
    loop {
        let parent = &slice[parent_index];

        let left_index = 2 * parent_index + 1;
        let (last, last_index) = match slice.get(left_index) {
            Some(left) if cmp.precedes(parent, left) => (left, left_index),
            Some(_) => (parent, parent_index),
            None => return,
        };

        let right_index = left_index + 1;
        let last_index = match slice.get(right_index) {
            Some(right) if cmp.precedes(last, right) => right_index,
            _ => last_index,
        };

        if last_index == parent_index {
            break;
        }
        slice.swap(parent_index, last_index);
        parent_index = last_index;
    }
}
