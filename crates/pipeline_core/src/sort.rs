//! Stable adaptive merge sort that tolerates inconsistent comparators.
//!
//! The bucket comparator only compares dates when both sides have one, so it is
//! not a total order. `slice::sort_by` may panic on such comparators; this sort
//! never does, and its output is a deterministic function of the input order and
//! the pairwise comparator results.
//!
//! Natural runs are detected first (strictly descending runs are reversed),
//! short runs are extended to [`MIN_RUN`] by binary insertion, and adjacent runs
//! are merged pairwise until one remains.

use std::cmp::Ordering;

const MIN_RUN: usize = 32;

pub fn adaptive_sort_by<T, F>(items: &mut Vec<T>, mut compare: F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    let len = items.len();
    if len < 2 {
        return;
    }

    let mut run_lengths = Vec::new();
    let mut start = 0;
    while start < len {
        let rest = &mut items[start..];
        let mut run = count_run(rest, &mut compare);
        let forced = MIN_RUN.min(rest.len());
        if run < forced {
            binary_insertion(&mut rest[..forced], run, &mut compare);
            run = forced;
        }
        run_lengths.push(run);
        start += run;
    }

    let mut runs = Vec::with_capacity(run_lengths.len());
    for run in run_lengths.iter().rev() {
        let tail = items.split_off(items.len() - run);
        runs.push(tail);
    }
    runs.reverse();

    while runs.len() > 1 {
        let mut merged = Vec::with_capacity(runs.len().div_ceil(2));
        let mut pending = runs.into_iter();
        while let Some(left) = pending.next() {
            match pending.next() {
                Some(right) => merged.push(merge(left, right, &mut compare)),
                None => merged.push(left),
            }
        }
        runs = merged;
    }

    if let Some(sorted) = runs.pop() {
        *items = sorted;
    }
}

/// Length of the run at the head of `slice`, reversing it in place if it is
/// strictly descending.
fn count_run<T, F>(slice: &mut [T], compare: &mut F) -> usize
where
    F: FnMut(&T, &T) -> Ordering,
{
    if slice.len() < 2 {
        return slice.len();
    }

    let mut end = 2;
    if compare(&slice[1], &slice[0]) == Ordering::Less {
        while end < slice.len() && compare(&slice[end], &slice[end - 1]) == Ordering::Less {
            end += 1;
        }
        slice[..end].reverse();
    } else {
        while end < slice.len() && compare(&slice[end], &slice[end - 1]) != Ordering::Less {
            end += 1;
        }
    }
    end
}

/// Inserts `slice[sorted..]` one by one into the sorted prefix. A pivot lands
/// after every element it is not strictly less than, which keeps ties stable.
fn binary_insertion<T, F>(slice: &mut [T], sorted: usize, compare: &mut F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    for i in sorted.max(1)..slice.len() {
        let (mut lo, mut hi) = (0, i);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if compare(&slice[i], &slice[mid]) == Ordering::Less {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }
        slice[lo..=i].rotate_right(1);
    }
}

fn merge<T, F>(left: Vec<T>, right: Vec<T>, compare: &mut F) -> Vec<T>
where
    F: FnMut(&T, &T) -> Ordering,
{
    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => compare(r, l) == Ordering::Less,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };
        let next = if take_right { right.next() } else { left.next() };
        merged.extend(next);
    }
    merged
}

#[cfg(test)]
#[path = "tests/sort_tests.rs"]
mod tests;
