//! Myers shortest-edit-script core
//!
//! Classic greedy O((N+M)·D) search with the per-D furthest-reaching
//! vectors recorded for backtracking. Common prefix and suffix are matched
//! before the search so D reflects only the true edit region.

use super::{Segment, SegmentBuilder, SegmentKind};

pub(crate) fn diff<T: PartialEq>(a: &[T], b: &[T]) -> Vec<Segment> {
    let mut builder = SegmentBuilder::default();

    let mut start = 0;
    while start < a.len() && start < b.len() && a[start] == b[start] {
        start += 1;
    }

    let mut end1 = a.len();
    let mut end2 = b.len();
    while end1 > start && end2 > start && a[end1 - 1] == b[end2 - 1] {
        end1 -= 1;
        end2 -= 1;
    }

    builder.push(SegmentKind::Match, start);

    let mid1 = &a[start..end1];
    let mid2 = &b[start..end2];

    if mid1.is_empty() {
        builder.push(SegmentKind::In2, mid2.len());
    } else if mid2.is_empty() {
        builder.push(SegmentKind::In1, mid1.len());
    } else {
        for (kind, len) in middle_runs(mid1, mid2) {
            builder.push(kind, len);
        }
    }

    builder.push(SegmentKind::Match, a.len() - end1);

    builder.into_segments()
}

/// Edit script for the trimmed middle, as forward-ordered run-length
/// `(kind, len)` pairs. Both inputs are non-empty and differ at their
/// first and last elements.
fn middle_runs<T: PartialEq>(a: &[T], b: &[T]) -> Vec<(SegmentKind, usize)> {
    let n = a.len() as isize;
    let m = b.len() as isize;
    let offset = n + m;
    let width = (2 * offset + 1) as usize;

    let at = |k: isize| (k + offset) as usize;

    let mut v = vec![0isize; width];
    let mut trace: Vec<Vec<isize>> = Vec::new();
    let mut found_d = 0;

    'outer: for d in 0..=offset {
        trace.push(v.clone());

        let mut k = -d;
        while k <= d {
            let take_down = k == -d || (k != d && v[at(k - 1)] < v[at(k + 1)]);

            let mut x = if take_down { v[at(k + 1)] } else { v[at(k - 1)] + 1 };
            let mut y = x - k;

            while x < n && y < m && a[x as usize] == b[y as usize] {
                x += 1;
                y += 1;
            }

            v[at(k)] = x;

            if x >= n && y >= m {
                found_d = d;
                break 'outer;
            }

            k += 2;
        }
    }

    // Walk the recorded vectors backwards, emitting one op per edit plus
    // the snakes between them.
    let mut ops_rev: Vec<SegmentKind> = Vec::new();
    let mut x = n;
    let mut y = m;

    for d in (1..=found_d).rev() {
        let v = &trace[d as usize];
        let k = x - y;

        let take_down = k == -d || (k != d && v[at(k - 1)] < v[at(k + 1)]);
        let prev_k = if take_down { k + 1 } else { k - 1 };
        let prev_x = v[at(prev_k)];
        let prev_y = prev_x - prev_k;

        while x > prev_x && y > prev_y {
            ops_rev.push(SegmentKind::Match);
            x -= 1;
            y -= 1;
        }

        ops_rev.push(if take_down {
            SegmentKind::In2
        } else {
            SegmentKind::In1
        });

        x = prev_x;
        y = prev_y;
    }

    while x > 0 && y > 0 {
        ops_rev.push(SegmentKind::Match);
        x -= 1;
        y -= 1;
    }

    let mut runs: Vec<(SegmentKind, usize)> = Vec::new();

    for kind in ops_rev.into_iter().rev() {
        match runs.last_mut() {
            Some((last, len)) if *last == kind => *len += 1,
            _ => runs.push((kind, 1)),
        }
    }

    runs
}
