use compare::{Compare, Less};

pub fn merge_sort<T: Ord>(slice: &mut [T]) {
    merge_sort_by(slice, &Less)
}

/// Stable top-down merge sort.
///
/// Items are never moved while the comparator runs: the sort works on the
/// positions of the items and the resulting permutation is applied to the
/// slice at the very end. A panicking comparator thus leaves the slice as it
/// was, and any `T` can be sorted without `Copy` or `Clone`.
pub fn merge_sort_by<T, C>(slice: &mut [T], cmp: &C)
where
    C: Compare<T>,
{
    if slice.len() < 2 {
        return;
    }

    let mut order: Vec<usize> = (0..slice.len()).collect();
    let mut tmp = order.clone();
    {
        let items: &[T] = slice;
        let by_item = |a: &usize, b: &usize| cmp.precedes(&items[*a], &items[*b]);
        merge_sort_core(&mut order, &mut tmp, &by_item);
    }
    apply_permutation(slice, &mut order);
}

/// Sorts `output`.
///
/// `tmp` must hold the same items as `output` on entry, its content is
/// garbage afterwards. The two buffers swap roles at each level: halves are
/// sorted into `tmp` (using `output` as their scratch space) and then merged
/// back into `output`.
fn merge_sort_core<C>(output: &mut [usize], tmp: &mut [usize], cmp: &C)
where
    C: Compare<usize>,
{
    if output.len() > 1 {
        let mid = output.len() / 2;
        let (l, r) = output.split_at_mut(mid);
        let (tmpl, tmpr) = tmp.split_at_mut(mid);

        merge_sort_core(tmpl, l, cmp);
        merge_sort_core(tmpr, r, cmp);
        merge(output, tmpl, tmpr, cmp);
    }
}

/// Merges sorted `l` and `r` into `output`.
///
/// On ties the item from `l` goes first which keeps the sort stable.
fn merge<C>(output: &mut [usize], l: &[usize], r: &[usize], cmp: &C)
where
    C: Compare<usize>,
{
    debug_assert_eq!(l.len() + r.len(), output.len());
    let mut l_iter = l.iter().peekable();
    let mut r_iter = r.iter().peekable();

    for it in output.iter_mut() {
        let take_left = match (l_iter.peek(), r_iter.peek()) {
            (None, None) => unreachable!(),
            (None, Some(_)) => false,
            (Some(_), None) => true,
            (Some(&&l), Some(&&r)) => !cmp.precedes(&r, &l),
        };

        let next = if take_left {
            l_iter.next()
        } else {
            r_iter.next()
        };
        if let Some(next) = next {
            *it = *next;
        }
    }
}

/// Moves `slice[order[i]]` to `slice[i]` for every `i`.
///
/// `order` is left as the identity permutation.
fn apply_permutation<T>(slice: &mut [T], order: &mut [usize]) {
    for start in 0..order.len() {
        // Walk the cycle starting at `start`. The item that was at `start`
        // travels along with the swaps until it reaches the slot which wants it.
        let mut current = start;
        while order[current] != start {
            let next = order[current];
            slice.swap(current, next);
            order[current] = current;
            current = next;
        }
        order[current] = current;
    }
}
