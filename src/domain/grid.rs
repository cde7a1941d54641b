use std::io::BufRead;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Error;

/// Grid is the 2D toroidal playing field, double-buffered for
/// read/write generation stepping.
///
/// The stored field is enlarged by a one-cell halo on all four sides:
/// a logical 3x3 grid occupies 5x5 cells. `copy_border` mirrors the
/// opposite interior edges into the halo, which lets the neighbor count
/// read all eight adjacent cells without any wrap arithmetic.
///
/// ```text
///  _ _ _ _ _
/// |_|_|_|_|_|
/// |_|x|x|x|_|
/// |_|x|x|x|_|
/// |_|x|x|x|_|
/// |_|_|_|_|_|
/// ```
///
/// Cells are `AtomicBool` accessed with `Relaxed` ordering; the grid is
/// shared by every worker thread. Happens-before between a generation's
/// writes and the next generation's reads is established by the
/// synchronization substrate (barrier or coordinator), never by the
/// cell accesses themselves. Within a generation workers write disjoint
/// ranges of the write buffer and only read the read buffer.
#[derive(Debug)]
pub struct Grid {
    rows: usize,
    cols: usize,
    /// Padded row width, `cols + 2`.
    pcols: usize,
    /// Total cells per buffer, `(rows + 2) * (cols + 2)`.
    len: usize,
    bufs: [Box<[AtomicBool]>; 2],
    /// Index of the buffer currently acting as `Read`.
    front: AtomicUsize,
}

/// Grids up to this many cells per side are printed in debug runs.
pub const MAX_PRINTABLE_GRID: usize = 32;

impl Grid {
    /// Allocate an all-dead grid of `rows x cols` interior cells.
    ///
    /// Both buffers are allocated up front; no cell storage is ever
    /// reallocated afterwards. Fails on zero dimensions and surfaces
    /// allocation failure as [`Error::Alloc`] instead of aborting.
    pub fn new(rows: usize, cols: usize) -> Result<Self, Error> {
        if rows == 0 || cols == 0 {
            return Err(Error::Dimensions { rows, cols });
        }
        let len = rows
            .checked_add(2)
            .and_then(|r| cols.checked_add(2).and_then(|c| r.checked_mul(c)))
            .ok_or(Error::Alloc {
                rows,
                cols,
                bytes: usize::MAX,
            })?;

        let alloc = |len: usize| -> Result<Box<[AtomicBool]>, Error> {
            let mut cells = Vec::new();
            cells.try_reserve_exact(len).map_err(|_| Error::Alloc {
                rows,
                cols,
                bytes: len,
            })?;
            cells.resize_with(len, || AtomicBool::new(false));
            Ok(cells.into_boxed_slice())
        };

        Ok(Self {
            rows,
            cols,
            pcols: cols + 2,
            len,
            bufs: [alloc(len)?, alloc(len)?],
            front: AtomicUsize::new(0),
        })
    }

    /// Parse a grid from ASCII: one row per line, `'0'`/`'1'` only,
    /// all rows the same width, final newline optional.
    pub fn load_from_ascii<R: BufRead>(reader: R) -> Result<Self, Error> {
        let mut parsed: Vec<Vec<bool>> = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let mut cells = Vec::with_capacity(line.len());
            for (j, byte) in line.bytes().enumerate() {
                match byte {
                    b'0' => cells.push(false),
                    b'1' => cells.push(true),
                    _ => {
                        return Err(Error::InvalidByte {
                            row: i + 1,
                            col: j + 1,
                            byte: byte as char,
                        });
                    }
                }
            }
            let expected = parsed.first().map(Vec::len);
            match expected {
                None if cells.is_empty() => return Err(Error::EmptyInput),
                Some(expected) if cells.len() != expected => {
                    return Err(Error::RaggedRow {
                        row: i + 1,
                        expected,
                        got: cells.len(),
                    });
                }
                _ => parsed.push(cells),
            }
        }
        let Some(first) = parsed.first() else {
            return Err(Error::EmptyInput);
        };

        let grid = Self::new(parsed.len(), first.len())?;
        for (i, row) in parsed.iter().enumerate() {
            for (j, &alive) in row.iter().enumerate() {
                grid.set(i + 1, j + 1, alive);
            }
        }
        Ok(grid)
    }

    /// Fill every cell of the read buffer with a seeded coin flip.
    /// The halo is filled too and must be fixed with `copy_border`
    /// before stepping, exactly like any other initial state.
    pub fn random_fill(&self, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        for cell in &self.read_buf()[..] {
            cell.store(rng.random::<bool>(), Ordering::Relaxed);
        }
    }

    /// Interior height.
    pub fn height(&self) -> usize {
        self.rows
    }

    /// Interior width.
    pub fn width(&self) -> usize {
        self.cols
    }

    /// Total cells per buffer, halo included.
    pub fn size(&self) -> usize {
        self.len
    }

    /// Padded row width (`cols + 2`), the stride of the flat layout.
    pub(crate) fn padded_cols(&self) -> usize {
        self.pcols
    }

    /// Flat index of padded coordinates. Row 0 and column 0 address the
    /// halo; interior cell `(r, c)` lives at `(r + 1, c + 1)`.
    #[inline]
    fn idx(&self, i: usize, j: usize) -> usize {
        debug_assert!(i <= self.rows + 1 && j <= self.cols + 1);
        i * self.pcols + j
    }

    #[inline]
    fn read_buf(&self) -> &[AtomicBool] {
        &self.bufs[self.front.load(Ordering::Relaxed)]
    }

    #[inline]
    fn write_buf(&self) -> &[AtomicBool] {
        &self.bufs[1 - self.front.load(Ordering::Relaxed)]
    }

    /// Read a cell of the current generation, padded coordinates.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> bool {
        self.read_buf()[self.idx(i, j)].load(Ordering::Relaxed)
    }

    /// Set a cell of the current generation, padded coordinates.
    pub fn set(&self, i: usize, j: usize, alive: bool) {
        self.read_buf()[self.idx(i, j)].store(alive, Ordering::Relaxed);
    }

    /// Set a cell of the next generation, padded coordinates.
    pub fn set_write(&self, i: usize, j: usize, alive: bool) {
        self.write_buf()[self.idx(i, j)].store(alive, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn read_flat(&self, pos: usize) -> bool {
        self.read_buf()[pos].load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn write_flat(&self, pos: usize, alive: bool) {
        self.write_buf()[pos].store(alive, Ordering::Relaxed);
    }

    /// Count the live cells among the eight neighbors of `pos`, given
    /// the flat indices of the cells directly above and below it. The
    /// halo guarantees all eight reads are in bounds for any interior
    /// position.
    #[inline]
    pub fn count_neighbors(&self, pos: usize, pos_top: usize, pos_bottom: usize) -> u8 {
        let read = self.read_buf();
        read[pos_top - 1].load(Ordering::Relaxed) as u8
            + read[pos_top].load(Ordering::Relaxed) as u8
            + read[pos_top + 1].load(Ordering::Relaxed) as u8
            + read[pos - 1].load(Ordering::Relaxed) as u8
            + read[pos + 1].load(Ordering::Relaxed) as u8
            + read[pos_bottom - 1].load(Ordering::Relaxed) as u8
            + read[pos_bottom].load(Ordering::Relaxed) as u8
            + read[pos_bottom + 1].load(Ordering::Relaxed) as u8
    }

    /// [`Self::count_neighbors`] with the vertical offsets derived from
    /// the row stride.
    #[inline]
    pub fn count_neighbors_flat(&self, pos: usize) -> u8 {
        self.count_neighbors(pos, pos - self.pcols, pos + self.pcols)
    }

    /// Exchange the read and write buffers. Constant time: only the
    /// front index flips, cell storage stays where it is.
    pub fn swap(&self) {
        self.front.fetch_xor(1, Ordering::Relaxed);
    }

    /// Refresh the halo of the read buffer so it mirrors the opposite
    /// interior edges, with the corners wrapping diagonally.
    ///
    /// Must run once before generation 0 and once per serial phase;
    /// running it twice in a row is a no-op.
    pub fn copy_border(&self) {
        let read = self.read_buf();
        let copy = |dst: usize, src: usize| {
            read[dst].store(read[src].load(Ordering::Relaxed), Ordering::Relaxed);
        };

        // Top and bottom halo rows mirror the far interior rows.
        for j in 1..=self.cols {
            copy(self.idx(0, j), self.idx(self.rows, j));
            copy(self.idx(self.rows + 1, j), self.idx(1, j));
        }
        // Side halo columns mirror the far interior columns.
        for i in 1..=self.rows {
            copy(self.idx(i, 0), self.idx(i, self.cols));
            copy(self.idx(i, self.cols + 1), self.idx(i, 1));
        }
        // Corners wrap diagonally.
        copy(self.idx(0, 0), self.idx(self.rows, self.cols));
        copy(self.idx(0, self.cols + 1), self.idx(self.rows, 1));
        copy(self.idx(self.rows + 1, 0), self.idx(1, self.cols));
        copy(self.idx(self.rows + 1, self.cols + 1), self.idx(1, 1));
    }

    /// The flat range the stencil runs over: interior rows end to end.
    ///
    /// The range deliberately includes the side halo cells of the
    /// middle rows; the values computed into them are overwritten by
    /// `copy_border` before anything reads them, and covering the full
    /// span keeps the kernel free of per-row bounds handling.
    pub fn interior_span(&self) -> Range<usize> {
        self.pcols + 1..self.len - self.pcols - 1
    }

    /// Snapshot of the interior in row-major order.
    pub fn interior_cells(&self) -> Vec<bool> {
        let mut cells = Vec::with_capacity(self.rows * self.cols);
        for i in 1..=self.rows {
            for j in 1..=self.cols {
                cells.push(self.get(i, j));
            }
        }
        cells
    }

    /// Number of live interior cells.
    pub fn alive_count(&self) -> usize {
        self.interior_cells().iter().filter(|&&c| c).count()
    }

    /// Serialize the interior as ASCII rows of `'0'`/`'1'`. Round-trips
    /// through [`Self::load_from_ascii`].
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity(self.rows * (self.cols + 1));
        for i in 1..=self.rows {
            for j in 1..=self.cols {
                out.push(if self.get(i, j) { '1' } else { '0' });
            }
            out.push('\n');
        }
        out
    }

    /// Print the interior on stdout with a title line.
    pub fn print(&self, title: &str) {
        println!(
            "{title} Grid (rows: {}, columns: {}):",
            self.rows, self.cols
        );
        self.dump();
    }

    /// Print the interior rows on stdout, cells separated by spaces.
    pub fn dump(&self) {
        for i in 1..=self.rows {
            let mut line = String::with_capacity(2 * self.cols);
            for j in 1..=self.cols {
                if j > 1 {
                    line.push(' ');
                }
                line.push(if self.get(i, j) { '1' } else { '0' });
            }
            println!("{line}");
        }
    }
}
