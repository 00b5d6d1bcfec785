//! In-memory merge sort.

/// Sorts the prefix `buf[..end]` ascending, in place.
///
/// Recursive top-down merge sort: O(n log(n)) time, O(n) auxiliary space per
/// merge step. Equal values compare indistinguishable, so tie order is not
/// observable.
///
/// # Panics
/// Panics if `end` exceeds the buffer length; an out-of-range prefix is a
/// caller bug, not a recoverable condition.
pub fn sort_prefix(buf: &mut [i32], end: usize) {
    assert!(end <= buf.len(), "sort prefix out of range");
    merge_sort(buf, 0, end);
}

/// Sorts the half-open range `[low, high)`.
fn merge_sort(buf: &mut [i32], low: usize, high: usize) {
    if high - low > 1 {
        let mid = low + (high - low) / 2;

        merge_sort(buf, low, mid);
        merge_sort(buf, mid, high);
        merge(buf, low, mid, high);
    }
}

/// Merges the adjacent sorted ranges `[low, mid)` and `[mid, high)`,
/// preferring the left element on ties.
fn merge(buf: &mut [i32], low: usize, mid: usize, high: usize) {
    let left = buf[low..mid].to_vec();
    let right = buf[mid..high].to_vec();

    let mut l = 0;
    let mut r = 0;
    let mut k = low;

    while l < left.len() && r < right.len() {
        if left[l] <= right[r] {
            buf[k] = left[l];
            l += 1;
        } else {
            buf[k] = right[r];
            r += 1;
        }
        k += 1;
    }

    while l < left.len() {
        buf[k] = left[l];
        l += 1;
        k += 1;
    }

    while r < right.len() {
        buf[k] = right[r];
        r += 1;
        k += 1;
    }
}

#[cfg(test)]
mod test {
    use rand::Rng;
    use rstest::*;

    use super::sort_prefix;

    #[rstest]
    #[case(vec![], vec![])]
    #[case(vec![1], vec![1])]
    #[case(vec![5, 3, 1, 4, 2], vec![1, 2, 3, 4, 5])]
    #[case(vec![7, 7, 7], vec![7, 7, 7])]
    #[case(vec![2, 1], vec![1, 2])]
    #[case(vec![i32::MAX, i32::MIN, 0], vec![i32::MIN, 0, i32::MAX])]
    fn test_sort_prefix(#[case] mut input: Vec<i32>, #[case] expected: Vec<i32>) {
        let end = input.len();
        sort_prefix(&mut input, end);
        assert_eq!(input, expected);
    }

    #[test]
    fn test_partial_prefix_leaves_tail_untouched() {
        let mut buf = vec![3, 1, 2, 0, -1];
        sort_prefix(&mut buf, 3);
        assert_eq!(buf, vec![1, 2, 3, 0, -1]);
    }

    #[test]
    fn test_idempotent() {
        let mut rng = rand::thread_rng();
        let mut buf: Vec<i32> = (0..1000).map(|_| rng.gen_range(-100..100)).collect();

        sort_prefix(&mut buf, 1000);
        let once = buf.clone();
        sort_prefix(&mut buf, 1000);

        assert_eq!(buf, once);
    }

    #[test]
    fn test_matches_std_sort() {
        let mut rng = rand::thread_rng();

        for _ in 0..50 {
            let len = rng.gen_range(0..500);
            let mut buf: Vec<i32> = (0..len).map(|_| rng.gen()).collect();
            let mut expected = buf.clone();
            expected.sort();

            sort_prefix(&mut buf, len);
            assert_eq!(buf, expected);
        }
    }

    #[test]
    #[should_panic]
    fn test_out_of_range_prefix_panics() {
        let mut buf = vec![1, 2];
        sort_prefix(&mut buf, 3);
    }
}
