//! Per-chunk vertex deduplication
//!
//! Two structures cooperate while a chunk is extracted:
//!
//! - [`VertexCache`] memoizes the interpolation result of each geometric edge,
//!   so the four cubes around an edge resolve it once.
//! - [`VertexTable`] hands out vertex ids in first-seen order, keyed by the
//!   resolved point itself.
//!
//! Both live for exactly one chunk and are never shared between workers.

use isocrate_core::Point3d;
use std::collections::HashMap;

/// Identity of a cube edge: its two endpoint grid coordinates, lower first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    lo: [usize; 3],
    hi: [usize; 3],
}

impl EdgeKey {
    /// Build a key from endpoints given in either order
    pub fn new(a: [usize; 3], b: [usize; 3]) -> Self {
        if a <= b {
            Self { lo: a, hi: b }
        } else {
            Self { lo: b, hi: a }
        }
    }

    /// Lower endpoint
    pub fn lo(&self) -> [usize; 3] {
        self.lo
    }

    /// Upper endpoint
    pub fn hi(&self) -> [usize; 3] {
        self.hi
    }
}

/// Memo of interpolated edge crossings
#[derive(Debug, Default)]
pub struct VertexCache {
    edges: HashMap<EdgeKey, Option<Point3d>>,
    hits: usize,
    misses: usize,
}

impl VertexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached crossing for `key`, computing it on first request
    ///
    /// "No crossing" results are memoized as well.
    pub fn resolve<F>(&mut self, key: EdgeKey, compute: F) -> Option<Point3d>
    where
        F: FnOnce() -> Option<Point3d>,
    {
        if let Some(&cached) = self.edges.get(&key) {
            self.hits += 1;
            return cached;
        }

        self.misses += 1;
        let point = compute();
        self.edges.insert(key, point);
        point
    }

    /// Number of distinct edges resolved so far
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}

/// Bit pattern of a point, with negative zero folded into positive zero
type PointKey = [u64; 3];

fn point_key(p: &Point3d) -> PointKey {
    [
        (p.x + 0.0).to_bits(),
        (p.y + 0.0).to_bits(),
        (p.z + 0.0).to_bits(),
    ]
}

/// Append-only ordered dictionary from point to vertex id
#[derive(Debug, Default)]
pub struct VertexTable {
    ids: HashMap<PointKey, usize>,
    vertices: Vec<Point3d>,
}

impl VertexTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of `point`, allocating the next id if it has not been seen
    pub fn id_for(&mut self, point: Point3d) -> usize {
        let vertices = &mut self.vertices;
        *self.ids.entry(point_key(&point)).or_insert_with(|| {
            vertices.push(point);
            vertices.len() - 1
        })
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Vertices in creation order
    pub fn into_vertices(self) -> Vec<Point3d> {
        self.vertices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_key_is_unordered() {
        let a = [1, 2, 3];
        let b = [1, 2, 4];
        assert_eq!(EdgeKey::new(a, b), EdgeKey::new(b, a));
        assert_eq!(EdgeKey::new(b, a).lo(), a);
        assert_eq!(EdgeKey::new(b, a).hi(), b);
    }

    #[test]
    fn test_cache_computes_once() {
        let mut cache = VertexCache::new();
        let key = EdgeKey::new([0, 0, 0], [1, 0, 0]);
        let mut calls = 0;

        let first = cache.resolve(key, || {
            calls += 1;
            Some(Point3d::new(0.5, 0.0, 0.0))
        });
        let second = cache.resolve(key, || {
            calls += 1;
            Some(Point3d::new(9.0, 9.0, 9.0))
        });

        assert_eq!(calls, 1);
        assert_eq!(first, second);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_cache_memoizes_no_crossing() {
        let mut cache = VertexCache::new();
        let key = EdgeKey::new([0, 0, 0], [0, 1, 0]);

        assert!(cache.resolve(key, || None).is_none());
        assert!(cache.resolve(key, || Some(Point3d::origin())).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_vertex_table_first_seen_order() {
        let mut table = VertexTable::new();
        let a = Point3d::new(0.5, 0.0, 0.0);
        let b = Point3d::new(0.0, 0.5, 0.0);

        assert_eq!(table.id_for(a), 0);
        assert_eq!(table.id_for(b), 1);
        assert_eq!(table.id_for(a), 0);
        assert_eq!(table.len(), 2);
        assert_eq!(table.into_vertices(), vec![a, b]);
    }

    #[test]
    fn test_vertex_table_folds_negative_zero() {
        let mut table = VertexTable::new();
        let id = table.id_for(Point3d::new(0.0, 1.0, 2.0));
        assert_eq!(table.id_for(Point3d::new(-0.0, 1.0, 2.0)), id);
    }
}
