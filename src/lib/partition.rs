//! Splitting groups into contiguous per-worker ranges for Phase II.
//!
//! A greedy forward scan gives each worker whole groups until it holds about
//! `M / threads` features, always leaving at least one group for every worker
//! still to come. The last worker takes whatever remains. This is a heuristic
//! balance, not an optimal packing.

use crate::reference::GroupIndex;
use std::ops::Range;

/// Number of workers actually used for `threads` requested over `num_features`
/// features: never more workers than features.
#[must_use]
pub fn effective_workers(num_features: usize, threads: usize) -> usize {
    threads.max(1).min(num_features.max(1))
}

/// Partition the groups of `groups` into at most `threads` contiguous ranges of
/// group ids covering `0..m` exactly once. Empty ranges are not returned.
#[must_use]
pub fn partition_groups(groups: &GroupIndex, threads: usize) -> Vec<Range<usize>> {
    let m = groups.num_groups();
    let workers = effective_workers(groups.num_features(), threads);
    let quotient = groups.num_features() / workers;

    let mut ranges = Vec::with_capacity(workers);
    let mut cur = 0;
    for i in 0..workers {
        let start = cur;
        let mut features = 0;
        while m - cur > workers - i - 1 && (i == workers - 1 || features < quotient) {
            features += groups.group_size(cur);
            cur += 1;
        }
        if cur > start {
            ranges.push(start..cur);
        }
    }
    ranges
}
