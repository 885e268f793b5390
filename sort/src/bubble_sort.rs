use compare::{Compare, Less};

pub fn bubble_sort<T: Ord>(slice: &mut [T]) {
    bubble_sort_by(slice, &Less)
}

/// Stable bubble sort.
///
/// Every pass carries the last item of the unsorted prefix to its final
/// position. Anything after the last swap of a pass is already in place, so
/// the next pass only needs to go up to there. A pass without any swaps ends
/// the sort.
pub fn bubble_sort_by<T, C>(mut slice: &mut [T], cmp: &C)
where
    C: Compare<T>,
{
    while slice.len() > 1 {
        let mut unsorted_len = 0;
        for i in 0..slice.len() - 1 {
            let j = i + 1;
            if cmp.precedes(&slice[j], &slice[i]) {
                slice.swap(i, j);
                unsorted_len = j;
            }
        }
        slice = &mut slice[..unsorted_len];
    }
}
