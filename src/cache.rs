//! Direct-mapped cache model and access-traced grid views.
//!
//! The kernels never touch this module. Tests, benches, and the report
//! driver wrap the operands in [`TracedGrid`]/[`TracedGridMut`], which
//! report every element access to a shared [`CacheSim`] before delegating
//! to the plain view. Addresses are in units of one `i32` word: a grid's
//! element `(row, col)` lives at `base + row * cols + col`, mirroring the
//! row-major layout the kernels are tuned against.

use std::cell::RefCell;

use crate::grid::{at, Grid, GridMut, MatrixRead, MatrixWrite};
use crate::{LANE, SETS};

/// Outcome of a single cache access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Hit,
    Miss,
}

/// Direct-mapped cache: [`SETS`] sets, one way each, [`LANE`] ints per line.
///
/// Loads and stores are not distinguished; either kind of access fills the
/// line, and a conflicting tag in the target set is evicted. This is the
/// geometry the kernels are tuned for, so the counters it produces are the
/// crate's acceptance measure.
#[derive(Debug, Clone)]
pub struct CacheSim {
    tags: [Option<usize>; SETS],
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl CacheSim {
    /// Creates a cold cache.
    pub fn new() -> Self {
        CacheSim {
            tags: [None; SETS],
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    /// Accesses the word at `word` (an index in `i32` units) and updates
    /// the counters.
    pub fn touch(&mut self, word: usize) -> Access {
        let line = word / LANE;
        let set = line % SETS;
        let tag = line / SETS;

        match self.tags[set] {
            Some(resident) if resident == tag => {
                self.hits += 1;
                Access::Hit
            }
            Some(_) => {
                self.evictions += 1;
                self.misses += 1;
                self.tags[set] = Some(tag);
                Access::Miss
            }
            None => {
                self.misses += 1;
                self.tags[set] = Some(tag);
                Access::Miss
            }
        }
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Flushes all lines and zeroes the counters.
    pub fn reset(&mut self) {
        *self = CacheSim::new();
    }
}

impl Default for CacheSim {
    fn default() -> Self {
        CacheSim::new()
    }
}

/// Rounds `len` words up to a whole number of cache spans.
///
/// Placing the destination at `aligned_span(source_len)` reproduces the
/// layout the kernels are tuned against: two operands allocated back to
/// back, with both base addresses congruent modulo the cache capacity, so
/// corresponding rows of the two matrices alias the same sets.
pub fn aligned_span(len: usize) -> usize {
    let span = LANE * SETS;
    len.div_ceil(span) * span
}

/// Read view that reports each access to a shared cache simulator.
pub struct TracedGrid<'a> {
    inner: Grid<'a>,
    base: usize,
    sim: &'a RefCell<CacheSim>,
}

impl<'a> TracedGrid<'a> {
    /// Wraps `inner` so reads touch `sim`, with the grid's first element
    /// at word address `base`.
    pub fn new(inner: Grid<'a>, base: usize, sim: &'a RefCell<CacheSim>) -> Self {
        TracedGrid { inner, base, sim }
    }
}

impl MatrixRead for TracedGrid<'_> {
    fn rows(&self) -> usize {
        self.inner.rows()
    }

    fn cols(&self) -> usize {
        self.inner.cols()
    }

    fn get(&self, row: usize, col: usize) -> i32 {
        self.sim
            .borrow_mut()
            .touch(self.base + at(row, col, self.inner.cols()));
        self.inner.get(row, col)
    }
}

/// Write view that reports each access to a shared cache simulator.
pub struct TracedGridMut<'a> {
    inner: GridMut<'a>,
    base: usize,
    sim: &'a RefCell<CacheSim>,
}

impl<'a> TracedGridMut<'a> {
    /// Wraps `inner` so reads and writes touch `sim`, with the grid's
    /// first element at word address `base`.
    pub fn new(inner: GridMut<'a>, base: usize, sim: &'a RefCell<CacheSim>) -> Self {
        TracedGridMut { inner, base, sim }
    }
}

impl MatrixRead for TracedGridMut<'_> {
    fn rows(&self) -> usize {
        MatrixRead::rows(&self.inner)
    }

    fn cols(&self) -> usize {
        MatrixRead::cols(&self.inner)
    }

    fn get(&self, row: usize, col: usize) -> i32 {
        self.sim
            .borrow_mut()
            .touch(self.base + at(row, col, MatrixRead::cols(&self.inner)));
        self.inner.get(row, col)
    }
}

impl MatrixWrite for TracedGridMut<'_> {
    fn rows(&self) -> usize {
        MatrixWrite::rows(&self.inner)
    }

    fn cols(&self) -> usize {
        MatrixWrite::cols(&self.inner)
    }

    fn set(&mut self, row: usize, col: usize, value: i32) {
        self.sim
            .borrow_mut()
            .touch(self.base + at(row, col, MatrixWrite::cols(&self.inner)));
        self.inner.set(row, col, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cold_miss_then_hits_within_line() {
        let mut sim = CacheSim::new();

        assert_eq!(sim.touch(0), Access::Miss);
        for word in 1..LANE {
            assert_eq!(sim.touch(word), Access::Hit);
        }
        assert_eq!(sim.misses(), 1);
        assert_eq!(sim.hits(), (LANE - 1) as u64);
        assert_eq!(sim.evictions(), 0);
    }

    #[test]
    fn test_conflicting_lines_evict_each_other() {
        let mut sim = CacheSim::new();
        // Two words one cache capacity apart map to the same set with
        // different tags.
        let stride = LANE * SETS;

        assert_eq!(sim.touch(0), Access::Miss);
        assert_eq!(sim.touch(stride), Access::Miss);
        assert_eq!(sim.touch(0), Access::Miss);
        assert_eq!(sim.evictions(), 2);
    }

    #[test]
    fn test_distinct_sets_do_not_interfere() {
        let mut sim = CacheSim::new();

        for set in 0..SETS {
            assert_eq!(sim.touch(set * LANE), Access::Miss);
        }
        for set in 0..SETS {
            assert_eq!(sim.touch(set * LANE), Access::Hit);
        }
        assert_eq!(sim.evictions(), 0);
    }

    #[test]
    fn test_reset() {
        let mut sim = CacheSim::new();
        sim.touch(0);
        sim.touch(LANE * SETS);
        sim.reset();

        assert_eq!(sim.hits(), 0);
        assert_eq!(sim.misses(), 0);
        assert_eq!(sim.touch(0), Access::Miss);
    }

    #[test]
    fn test_aligned_span() {
        let span = LANE * SETS;
        assert_eq!(aligned_span(1), span);
        assert_eq!(aligned_span(span), span);
        assert_eq!(aligned_span(span + 1), 2 * span);
        assert_eq!(aligned_span(32 * 32), 32 * 32);
    }

    #[test]
    fn test_traced_views_count_accesses() {
        let a_data: Vec<i32> = (0..64).collect();
        let mut b_data = vec![0i32; 64];
        let sim = RefCell::new(CacheSim::new());

        let a = TracedGrid::new(Grid::from_slice(8, 8, &a_data).unwrap(), 0, &sim);
        let mut b = TracedGridMut::new(
            GridMut::from_slice(8, 8, &mut b_data).unwrap(),
            aligned_span(64),
            &sim,
        );

        // One full row of the source is one line: a miss and 7 hits.
        let mut sum = 0;
        for col in 0..8 {
            sum += a.get(0, col);
        }
        assert_eq!(sum, 28);
        assert_eq!(sim.borrow().misses(), 1);
        assert_eq!(sim.borrow().hits(), 7);

        // The destination base sits on its own span: first write misses.
        b.set(0, 0, 99);
        assert_eq!(sim.borrow().misses(), 2);
        assert_eq!(b_data[0], 99);
    }
}
