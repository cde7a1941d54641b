//! Stencil kernel: applies the Life rule to a flat index range,
//! reading the grid's read buffer and writing its write buffer.
//!
//! Ranges come from the partitioner and never touch the top or bottom
//! halo rows, so every neighbor read stays in bounds. The kernel writes
//! nothing outside its range and reads nothing from the write buffer;
//! two kernels on disjoint ranges can run concurrently.

use std::ops::Range;

use super::grid::Grid;
use super::rules;

/// Width of the blocked kernel's scratch array.
pub const BLOCK: usize = 16;

/// Compute the next generation over `range`, one cell at a time.
///
/// The top/bottom neighbor indices are carried alongside `pos` instead
/// of being rederived per cell; they advance in lockstep.
pub fn compute(grid: &Grid, range: Range<usize>) {
    let stride = grid.padded_cols();
    let mut top = range.start - stride;
    let mut bottom = range.start + stride;
    for pos in range {
        let neighbors = grid.count_neighbors(pos, top, bottom);
        grid.write_flat(pos, rules::next_state(grid.read_flat(pos), neighbors));
        top += 1;
        bottom += 1;
    }
}

/// Compute the next generation over `range` in blocks of [`BLOCK`]
/// cells: the neighbor counts of a whole block are gathered into
/// `scratch` first, then the rule is applied element-wise. The trailing
/// partial block falls back to [`compute`].
///
/// Produces exactly the same cells as [`compute`]; the split loop is
/// what lets the compiler vectorize the counting pass.
pub fn compute_blocked(grid: &Grid, scratch: &mut [u8; BLOCK], range: Range<usize>) {
    let mut pos = range.start;
    while pos + BLOCK <= range.end {
        for (k, count) in scratch.iter_mut().enumerate() {
            *count = grid.count_neighbors_flat(pos + k);
        }
        for (k, &count) in scratch.iter().enumerate() {
            let p = pos + k;
            grid.write_flat(p, rules::next_state(grid.read_flat(p), count));
        }
        pos += BLOCK;
    }
    compute(grid, pos..range.end);
}
