use compare::{Compare, Less};

pub fn selection_sort<T: Ord>(slice: &mut [T]) {
    selection_sort_by(slice, &Less)
}

/// Unstable selection sort.
pub fn selection_sort_by<T, C>(slice: &mut [T], cmp: &C)
where
    C: Compare<T>,
{
    for i in 0..slice.len() {
        // slice[..i] is sorted and nothing in slice[i..] precedes any of it,
        // pick the leading item of slice[i..] and append it to the sorted part
        let mut first_index = i;
        let mut first = &slice[i];
        for (j, it) in (i + 1..).zip(&slice[i + 1..]) {
            if cmp.precedes(it, first) {
                first_index = j;
                first = it;
            }
        }

        if first_index != i {
            slice.swap(i, first_index);
        }
    }
}
