use compare::{Compare, Less};

pub fn insertion_sort<T: Ord>(slice: &mut [T]) {
    insertion_sort_by(slice, &Less)
}

/// Stable insertion sort.
///
/// Moves each item left past every item it precedes.
pub fn insertion_sort_by<T, C>(slice: &mut [T], cmp: &C)
where
    C: Compare<T>,
{
    for i in 1..slice.len() {
        // slice[..i] is sorted
        let mut j = i;
        while j > 0 && cmp.precedes(&slice[j], &slice[j - 1]) {
            slice.swap(j, j - 1);
            j -= 1;
        }
    }
}

pub fn insertion_sort2<T: Ord>(slice: &mut [T]) {
    binary_insertion_sort_by(slice, &Less)
}

/// Stable insertion sort which finds the insertion point by binary search
/// and then shifts the items after it in one go.
///
/// Does `O(n log n)` comparisons, but still `O(n^2)` moves.
pub fn binary_insertion_sort_by<T, C>(slice: &mut [T], cmp: &C)
where
    C: Compare<T>,
{
    for i in 1..slice.len() {
        let (sorted, rest) = slice.split_at(i);
        let item = &rest[0];
        // first position whose item `item` precedes, equal items stay in front
        let pos = sorted.partition_point(|it| !cmp.precedes(item, it));
        if pos != i {
            slice[pos..=i].rotate_right(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use compare::{Deref, Greater};

    use super::*;
    use crate::test_utils::*;

    #[test]
    #[cfg_attr(miri, ignore = "no unsafe code, nothing for miri to check")]
    fn test() {
        let mut arr = vec![1, 4, 2, 24, 65, 3, 3, 45];
        insertion_sort(&mut arr);
        assert_eq!(arr, [1, 2, 3, 3, 4, 24, 45, 65]);
    }

    #[test]
    #[cfg_attr(miri, ignore = "no unsafe code, nothing for miri to check")]
    fn test2() {
        let mut arr = vec![1, 4, 2, 24, 65, 3, 3, 45];
        insertion_sort2(&mut arr);
        assert_eq!(arr, [1, 2, 3, 3, 4, 24, 45, 65]);
    }

    #[test]
    #[cfg_attr(miri, ignore = "no unsafe code, nothing for miri to check")]
    fn boxed_descending() {
        let mut arr: Vec<_> = [3, 6, 2, 5, 1].into_iter().map(Box::new).collect();
        insertion_sort_by(&mut arr, &Deref(Greater));
        let arr: Vec<_> = arr.into_iter().map(|it| *it).collect();
        assert_eq!(arr, [6, 5, 3, 2, 1]);
    }

    mod proptests {
        use proptest::prelude::*;

        use super::*;

        #[cfg(not(miri))]
        const VEC_SIZE: usize = 1000;
        #[cfg(miri)]
        const VEC_SIZE: usize = 50;

        #[cfg(not(miri))]
        const PROPTEST_CASES: u32 = 500;
        #[cfg(miri)]
        const PROPTEST_CASES: u32 = 10;

        proptest!(
            #![proptest_config(ProptestConfig::with_cases(PROPTEST_CASES))]

            #[test]
            #[cfg_attr(miri, ignore = "no unsafe code, nothing for miri to check")]
            fn test(
                mut vec in proptest::collection::vec(0..10000i32, 0..VEC_SIZE),
            ) {
               let mut expected = vec.clone();
               expected.sort();
               insertion_sort(vec.as_mut_slice());
               assert_eq!(vec, expected);
            }

            #[test]
            #[cfg_attr(miri, ignore = "no unsafe code, nothing for miri to check")]
            fn test2(
                mut vec in proptest::collection::vec(0..10000i32, 0..VEC_SIZE),
            ) {
               let mut expected = vec.clone();
               expected.sort();
               insertion_sort2(vec.as_mut_slice());
               assert_eq!(vec, expected);
            }

            #[test]
            #[cfg_attr(miri, ignore = "no unsafe code, nothing for miri to check")]
            fn stable(
                keys in proptest::collection::vec(0..50i32, 0..VEC_SIZE),
            ) {
               let mut vec = tagged(&keys);
               insertion_sort_by(&mut vec, &Greater);
               assert_sorted_by(&vec, &Greater);
               assert_stable(&vec);

               let mut vec = tagged(&keys);
               binary_insertion_sort_by(&mut vec, &Less);
               assert_sorted_by(&vec, &Less);
               assert_stable(&vec);
            }
        );
    }
}
