//! Uniform-bucket broad-phase index
//!
//! Entities are bucketed by the cell containing their center. A radius query
//! returns everything in the cells its bounding square touches, so results are
//! a superset of the true hits and callers run an exact test afterwards.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use glam::Vec2;

use crate::consts::DEFAULT_CELL_SIZE;

/// Grids kept per cell size between ticks
pub const GRID_POOL_LIMIT: usize = 4;

/// Bucket map sizes above this are dropped on clear instead of recycled
const MAX_RETAINED_BUCKETS: usize = 4096;

type CellKey = (i32, i32);

#[derive(Debug, Clone)]
pub struct SpatialGrid<K> {
    cell_size: f32,
    buckets: HashMap<CellKey, Vec<K>>,
    len: usize,
    /// Every key inserted since the last clear
    keys: HashSet<K>,
    /// Some key was inserted more than once; queries must de-duplicate
    has_duplicates: bool,
}

impl<K: Copy + Eq + Hash> SpatialGrid<K> {
    pub fn new(cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            DEFAULT_CELL_SIZE
        };
        Self {
            cell_size,
            buckets: HashMap::new(),
            len: 0,
            keys: HashSet::new(),
            has_duplicates: false,
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of inserted entries
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    fn cell_coord(&self, v: f32) -> i32 {
        (v / self.cell_size).floor() as i32
    }

    /// Cell containing a point
    pub fn cell_of(&self, pos: Vec2) -> CellKey {
        (self.cell_coord(pos.x), self.cell_coord(pos.y))
    }

    /// Append an entity to its cell's bucket
    pub fn insert(&mut self, key: K, pos: Vec2) {
        let cell = self.cell_of(pos);
        self.buckets.entry(cell).or_default().push(key);
        self.len += 1;
        if !self.keys.insert(key) {
            self.has_duplicates = true;
        }
    }

    /// De-duplicated entities in every cell overlapping the query square.
    ///
    /// Cells are visited x-major then y, and entries within a cell in
    /// insertion order, so the result order is deterministic.
    pub fn query_radius(&self, center: Vec2, radius: f32) -> Vec<K> {
        let mut out = Vec::new();
        self.query_radius_into(center, radius, &mut out);
        out
    }

    /// Same as [`query_radius`](Self::query_radius), reusing `out`
    pub fn query_radius_into(&self, center: Vec2, radius: f32, out: &mut Vec<K>) {
        out.clear();
        if self.len == 0 {
            return;
        }
        let radius = radius.abs();
        let min_x = self.cell_coord(center.x - radius);
        let max_x = self.cell_coord(center.x + radius);
        let min_y = self.cell_coord(center.y - radius);
        let max_y = self.cell_coord(center.y + radius);

        let buckets = (min_x..=max_x)
            .flat_map(|cx| (min_y..=max_y).map(move |cy| (cx, cy)))
            .filter_map(|cell| self.buckets.get(&cell));

        if self.has_duplicates {
            let mut seen = HashSet::new();
            for bucket in buckets {
                out.extend(bucket.iter().copied().filter(|key| seen.insert(*key)));
            }
        } else {
            for bucket in buckets {
                out.extend_from_slice(bucket);
            }
        }
    }

    /// Empty every bucket, keeping the allocation for the next fill
    pub fn clear(&mut self) {
        if self.buckets.len() > MAX_RETAINED_BUCKETS {
            self.buckets.clear();
        } else {
            for bucket in self.buckets.values_mut() {
                bucket.clear();
            }
        }
        self.keys.clear();
        self.len = 0;
        self.has_duplicates = false;
    }
}

/// Small cache of cleared grids keyed by cell size
#[derive(Debug, Clone)]
pub struct GridPool<K> {
    grids: HashMap<u32, Vec<SpatialGrid<K>>>,
    limit: usize,
}

impl<K> Default for GridPool<K> {
    fn default() -> Self {
        Self {
            grids: HashMap::new(),
            limit: GRID_POOL_LIMIT,
        }
    }
}

impl<K: Copy + Eq + Hash> GridPool<K> {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            grids: HashMap::new(),
            limit,
        }
    }

    /// An empty grid for `cell_size`, recycled when one is cached
    pub fn acquire(&mut self, cell_size: f32) -> SpatialGrid<K> {
        let fresh = SpatialGrid::new(cell_size);
        let key = fresh.cell_size().to_bits();
        match self.grids.get_mut(&key).and_then(|cached| cached.pop()) {
            Some(mut grid) => {
                grid.clear();
                grid
            }
            None => fresh,
        }
    }

    /// Clear and cache a grid, dropping it when the cache for its size is full
    pub fn release(&mut self, mut grid: SpatialGrid<K>) {
        grid.clear();
        let cached = self.grids.entry(grid.cell_size().to_bits()).or_default();
        if cached.len() < self.limit {
            cached.push(grid);
        }
    }

    /// Cached grids for one cell size
    pub fn cached(&self, cell_size: f32) -> usize {
        self.grids
            .get(&cell_size.to_bits())
            .map(|c| c.len())
            .unwrap_or(0)
    }
}
