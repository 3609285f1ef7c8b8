use super::*;

#[test]
fn matches_std_sort_on_total_orders() {
    let mut values: Vec<i64> = (0..500).map(|i| (i * 7919) % 251 - 120).collect();
    let mut expected = values.clone();
    expected.sort();

    adaptive_sort_by(&mut values, |a, b| a.cmp(b));
    assert_eq!(values, expected);
}

#[test]
fn keeps_equal_keys_in_input_order() {
    let mut pairs: Vec<(u8, usize)> = (0..100).map(|i| ((i % 3) as u8, i)).collect();
    adaptive_sort_by(&mut pairs, |a, b| a.0.cmp(&b.0));

    for window in pairs.windows(2) {
        assert!(window[0].0 <= window[1].0);
        if window[0].0 == window[1].0 {
            assert!(window[0].1 < window[1].1, "tie order broken: {window:?}");
        }
    }
}

#[test]
fn reverses_strictly_descending_input() {
    let mut values: Vec<u32> = (0..40).rev().collect();
    adaptive_sort_by(&mut values, |a, b| a.cmp(b));
    assert_eq!(values, (0..40).collect::<Vec<_>>());
}

#[test]
fn handles_trivial_inputs() {
    let mut empty: Vec<u8> = Vec::new();
    adaptive_sort_by(&mut empty, |a, b| a.cmp(b));
    assert!(empty.is_empty());

    let mut single = vec![1];
    adaptive_sort_by(&mut single, |a, b| a.cmp(b));
    assert_eq!(single, vec![1]);
}

#[test]
fn inconsistent_comparator_never_panics_and_keeps_every_item() {
    // Rock-paper-scissors ordering: cyclic, not a total order.
    let mut values: Vec<u32> = (0..2_000).map(|i| (i * 31) % 997).collect();
    let mut expected = values.clone();
    adaptive_sort_by(&mut values, |a, b| match (a % 3, b % 3) {
        (x, y) if x == y => a.cmp(b),
        (0, 1) | (1, 2) | (2, 0) => Ordering::Less,
        _ => Ordering::Greater,
    });

    let mut sorted = values.clone();
    sorted.sort();
    expected.sort();
    assert_eq!(sorted, expected);
}
