use core::mem;

use compare::{Compare, Less};

pub fn quicksort_lomuto<T: Ord>(slice: &mut [T]) {
    quicksort_lomuto_by(slice, &Less)
}

pub fn quicksort_lomuto_by<T, C>(slice: &mut [T], cmp: &C)
where
    C: Compare<T>,
{
    if slice.len() < 2 {
        return;
    }

    let (l, r) = partition_lomuto(slice, cmp);
    if l.len() > 1 {
        quicksort_lomuto_by(l, cmp);
    }
    if r.len() > 1 {
        quicksort_lomuto_by(r, cmp);
    }
}

/// Partitions the slice in-place around its middle item using Lomuto's scheme.
///
/// Returns two slices: the first holds the items that the pivot doesn't
/// precede, the second the items it does. The pivot itself is left out of
/// both, in its final sorted position between them.
///
/// # Panics
///
/// * if `slice` is empty
fn partition_lomuto<'a, T, C>(slice: &'a mut [T], cmp: &C) -> (&'a mut [T], &'a mut [T])
where
    C: Compare<T>,
{
    // middle pivot keeps already sorted input away from the quadratic case
    let mid = slice.len() / 2;
    slice.swap(slice.len() - 1, mid);

    let (pivot, rest) = slice.split_last_mut().unwrap();

    // rest[..boundary] holds the items that belong before the pivot
    let mut boundary = 0;
    for i in 0..rest.len() {
        if !cmp.precedes(pivot, &rest[i]) {
            if i != boundary {
                rest.swap(boundary, i);
            }
            boundary += 1;
        }
    }

    if boundary != rest.len() {
        mem::swap(pivot, &mut rest[boundary]);
    }

    let (a, b) = slice.split_at_mut(boundary);
    (a, &mut b[1..])
}

pub fn quicksort_hoare<T: Ord>(slice: &mut [T]) {
    quicksort_hoare_by(slice, &Less)
}

pub fn quicksort_hoare_by<T, C>(slice: &mut [T], cmp: &C)
where
    C: Compare<T>,
{
    if slice.len() < 2 {
        return;
    }

    let (l, r) = partition_hoare(slice, cmp);
    if l.len() > 1 {
        quicksort_hoare_by(l, cmp);
    }
    if r.len() > 1 {
        quicksort_hoare_by(r, cmp);
    }
}

/// Partitions the slice in-place around its middle item using Hoare's scheme.
///
/// Same output as [`partition_lomuto`] but does fewer swaps: out of place
/// items are found from both ends at once and swapped with each other.
///
/// # Panics
///
/// * if `slice` is empty
fn partition_hoare<'a, T, C>(slice: &'a mut [T], cmp: &C) -> (&'a mut [T], &'a mut [T])
where
    C: Compare<T>,
{
    let mid = slice.len() / 2;
    slice.swap(0, mid);

    let (pivot, rest) = slice.split_first_mut().unwrap();

    let mut left = 0;
    let mut right = rest.len() - 1;

    while cmp.precedes(pivot, &rest[right]) {
        if right == 0 {
            // pivot precedes everything, it's already in place
            return (&mut [], &mut slice[1..]);
        }
        right -= 1;
    }

    while left < right {
        // Invariants:
        //   nothing in `rest[..left]` comes after the pivot
        //   everything in `rest[right + 1..]` comes after the pivot
        //   `rest[right]` doesn't come after the pivot
        debug_assert!(!cmp.precedes(pivot, &rest[right]));

        if !cmp.precedes(pivot, &rest[left]) {
            left += 1;
        } else {
            rest.swap(left, right);
            // `rest[left]` now stops the scan below at the latest
            while cmp.precedes(pivot, &rest[right]) {
                right -= 1;
            }
        }
    }

    // `rest[..=right]` belongs before the pivot and `rest[right + 1..]` after it
    mem::swap(pivot, &mut rest[right]);
    let (a, b) = slice.split_at_mut(right + 1);
    (a, &mut b[1..])
}
