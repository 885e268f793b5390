// Indices in a heap
//           0
//     1            2
//  3     4      5     6
// 7 8   9 10  11 12 13 14
//
// parent_index = (child_index - 1) / 2
// left_child = parent_index * 2 + 1
// right_child = left_child + 1 = parent_index * 2 + 2

use compare::{Compare, Greater};

/// Array backed binary heap.
///
/// The item that precedes every other item under `C` is kept on top, so the
/// default [`Greater`] comparator makes a max-heap and [`Less`] a min-heap.
///
/// [`Less`]: compare::Less
#[derive(Debug, Clone)]
pub struct BinaryHeap<T, C = Greater> {
    data: Vec<T>,
    cmp: C,
}

impl<T> BinaryHeap<T> {
    /// Creates an empty max-heap.
    pub fn new() -> Self {
        Self::with_comparator(Greater)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            cmp: Greater,
        }
    }
}

impl<T> Default for BinaryHeap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C> BinaryHeap<T, C> {
    pub fn with_comparator(cmp: C) -> Self {
        Self {
            data: Vec::new(),
            cmp,
        }
    }

    /// Returns the top item.
    pub fn peek(&self) -> Option<&T> {
        self.data.first()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Reserves capacity for at least `additional` more items.
    pub fn reserve(&mut self, additional: usize) {
        self.data.reserve(additional)
    }

    /// Items in their heap order.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}

impl<T, C> BinaryHeap<T, C>
where
    C: Compare<T>,
{
    /// Turns `data` into a heap in O(n).
    pub fn from_vec(data: Vec<T>, cmp: C) -> Self {
        let mut heap = Self { data, cmp };
        if heap.data.len() > 1 {
            // leaves are heaps already
            let last_parent = (heap.data.len() - 2) / 2;
            for i in (0..=last_parent).rev() {
                heap.sift_down(i);
            }
        }
        heap
    }

    pub fn insert(&mut self, item: T) {
        self.data.push(item);
        self.sift_up(self.data.len() - 1);
    }

    /// Removes and returns the top item.
    pub fn pop(&mut self) -> Option<T> {
        self.remove(0)
    }

    /// Removes the item at `index` of [`as_slice`](Self::as_slice).
    ///
    /// Returns `None` and leaves the heap untouched if `index` is out of
    /// bounds.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        if index >= self.data.len() {
            return None;
        }

        let item = self.data.swap_remove(index);
        if index < self.data.len() {
            // the item moved from the end may belong either above or below
            let index = self.sift_up(index);
            self.sift_down(index);
        }
        Some(item)
    }

    /// Moves the item at `index` up while it precedes its parent, returns
    /// its final index.
    fn sift_up(&mut self, mut index: usize) -> usize {
        while index > 0 {
            let parent = (index - 1) / 2;
            if !self.cmp.precedes(&self.data[index], &self.data[parent]) {
                break;
            }
            self.data.swap(index, parent);
            index = parent;
        }
        index
    }

    /// Moves the item at `index` down until no child precedes it.
    fn sift_down(&mut self, mut index: usize) {
        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut top = index;

            if left < self.data.len() && self.cmp.precedes(&self.data[left], &self.data[top]) {
                top = left;
            }
            if right < self.data.len() && self.cmp.precedes(&self.data[right], &self.data[top]) {
                top = right;
            }
            if top == index {
                return;
            }

            self.data.swap(index, top);
            index = top;
        }
    }
}

impl<T, C> Extend<T> for BinaryHeap<T, C>
where
    C: Compare<T>,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for item in iter {
            self.insert(item);
        }
    }
}
