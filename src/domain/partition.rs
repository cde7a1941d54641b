//! Splits the grid's flat working span into per-worker ranges (static
//! scheduling) or into a task list for the coordinator (dynamic
//! scheduling).

use std::ops::Range;

/// Smallest cell count a coordinator task may carry.
pub const MIN_BLOCK_SIZE: usize = 512;

/// Round `value` up to the next multiple of `multiple`.
fn round_multiple(value: usize, multiple: usize) -> usize {
    debug_assert!(multiple != 0);
    value.div_ceil(multiple) * multiple
}

/// Cut `span` into at most `workers` contiguous ranges of near-equal
/// size.
///
/// With `grain == 0` the chunk is `ceil(len / workers)`; a larger grain
/// replaces it, producing fewer ranges. When `block > 1` the chunk is
/// rounded up to a block multiple so the blocked kernel runs full
/// blocks everywhere except possibly the last range. The returned
/// ranges are non-empty, disjoint, ordered, and cover `span` exactly.
pub fn ranges(span: Range<usize>, workers: usize, grain: usize, block: usize) -> Vec<Range<usize>> {
    let len = span.len();
    let workers = workers.max(1);
    let mut chunk = len.div_ceil(workers).max(grain).max(1);
    if block > 1 {
        chunk = round_multiple(chunk, block);
    }

    let mut out = Vec::with_capacity(workers);
    let mut start = span.start;
    while start < span.end {
        let end = span.end.min(start + chunk);
        out.push(start..end);
        start = end;
    }
    tracing::debug!(len, workers, chunk, ranges = out.len(), "static partition");
    out
}

/// Build the coordinator's task list over `span`.
///
/// `num_tasks` is clamped so every task holds at least `min_block`
/// cells. Few tasks (up to twice the worker count) are split evenly;
/// beyond that the sizes follow a decreasing cubic profile: every task
/// keeps a `min_block` floor and the remaining cells are distributed
/// with weight `(T - i)^3`. Early tasks are large and late tasks small,
/// so workers picking up the tail of a generation idle less.
///
/// Sizes always sum to the span length; the integer rounding remainder
/// goes to task 0.
pub fn tasks(
    span: Range<usize>,
    workers: usize,
    num_tasks: usize,
    min_block: usize,
) -> Vec<Range<usize>> {
    let len = span.len();
    let workers = workers.max(1);
    let min_block = min_block.max(1);
    let max_tasks = (len / min_block).max(1);
    let count = num_tasks.clamp(1, max_tasks);

    let sizes = if count <= 2 * workers {
        even_sizes(len, count)
    } else {
        cubic_sizes(len, count, min_block)
    };
    debug_assert_eq!(sizes.iter().sum::<usize>(), len);

    let mut out = Vec::with_capacity(count);
    let mut start = span.start;
    for size in sizes {
        out.push(start..start + size);
        start += size;
    }
    debug_assert_eq!(start, span.end);
    tracing::debug!(len, workers, tasks = out.len(), "task partition");
    out
}

/// `count` sizes differing by at most one, summing to `len`.
fn even_sizes(len: usize, count: usize) -> Vec<usize> {
    let chunk = len / count;
    let rest = len % count;
    (0..count)
        .map(|i| chunk + usize::from(i < rest))
        .collect()
}

/// Decreasing cubic size profile summing to `len`, each size at least
/// `min_block`.
fn cubic_sizes(len: usize, count: usize, min_block: usize) -> Vec<usize> {
    // `count` was clamped against len / min_block, so the floor fits.
    let spare = len - min_block * count;
    let total_weight: u128 = (1..=count as u128).map(|i| i * i * i).sum();

    let mut sizes: Vec<usize> = (0..count)
        .map(|i| {
            let weight = (count - i) as u128;
            let extra = (spare as u128 * weight * weight * weight) / total_weight;
            min_block + extra as usize
        })
        .collect();

    let assigned: usize = sizes.iter().sum();
    sizes[0] += len - assigned;
    sizes
}
