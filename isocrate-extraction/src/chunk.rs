//! Chunk extraction
//!
//! Runs marching cubes over every cube of one (sub)volume and accumulates a
//! chunk-local indexed mesh. Coordinates are local to the chunk view; the
//! merger translates them into grid space.

use crate::cache::{EdgeKey, VertexCache, VertexTable};
use crate::classify::classify_cube;
use crate::grid::Scalar;
use crate::interpolation::interpolate_edge;
use crate::tables::{edge_endpoints, EDGE_CORNERS};
use isocrate_core::Point3d;
use itertools::iproduct;
use ndarray::ArrayView3;

/// Counters collected while extracting one chunk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkStats {
    /// Cubes enumerated
    pub cubes: usize,
    /// Cubes whose case produced at least one triangle
    pub active_cubes: usize,
    /// Triangles discarded because one of their edges had no crossing
    pub dropped_triangles: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
}

/// Chunk-local indexed mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkMesh {
    /// Vertices in creation order, in chunk-local grid coordinates
    pub vertices: Vec<Point3d>,
    /// Triangles in generation order, indexing `vertices`
    pub triangles: Vec<[usize; 3]>,
    pub stats: ChunkStats,
}

impl ChunkMesh {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.triangles.is_empty()
    }
}

/// Marching cubes driver for a single chunk
///
/// Owns its vertex cache and vertex table; nothing is shared with other
/// chunks.
pub struct ChunkExtractor<'a, T> {
    samples: ArrayView3<'a, T>,
    threshold: f64,
    cache: VertexCache,
    table: VertexTable,
    triangles: Vec<[usize; 3]>,
    stats: ChunkStats,
}

impl<'a, T: Scalar> ChunkExtractor<'a, T> {
    pub fn new(samples: ArrayView3<'a, T>, threshold: f64) -> Self {
        Self {
            samples,
            threshold,
            cache: VertexCache::new(),
            table: VertexTable::new(),
            triangles: Vec::new(),
            stats: ChunkStats::default(),
        }
    }

    /// Visit every cube and return the accumulated mesh
    ///
    /// A view with fewer than 2 samples along any axis has no cubes and yields
    /// an empty mesh.
    pub fn run(mut self) -> ChunkMesh {
        let (nx, ny, nz) = self.samples.dim();
        if nx >= 2 && ny >= 2 && nz >= 2 {
            for (x, y, z) in iproduct!(0..nx - 1, 0..ny - 1, 0..nz - 1) {
                self.process_cube([x, y, z]);
            }
        }

        self.stats.cache_hits = self.cache.hits();
        self.stats.cache_misses = self.cache.misses();

        ChunkMesh {
            vertices: self.table.into_vertices(),
            triangles: self.triangles,
            stats: self.stats,
        }
    }

    fn process_cube(&mut self, anchor: [usize; 3]) {
        self.stats.cubes += 1;

        let (case, values) = classify_cube(&self.samples, anchor, self.threshold);
        if case.is_trivial() {
            return;
        }
        self.stats.active_cubes += 1;

        for edges in case.triangles() {
            let points = [
                self.resolve_edge(anchor, &values, edges[0]),
                self.resolve_edge(anchor, &values, edges[1]),
                self.resolve_edge(anchor, &values, edges[2]),
            ];

            let [Some(a), Some(b), Some(c)] = points else {
                self.stats.dropped_triangles += 1;
                continue;
            };

            let face = [
                self.table.id_for(a),
                self.table.id_for(b),
                self.table.id_for(c),
            ];
            self.triangles.push(face);
        }
    }

    fn resolve_edge(&mut self, anchor: [usize; 3], values: &[f64; 8], edge: usize) -> Option<Point3d> {
        let (p1, p2) = edge_endpoints(anchor, edge);
        let [c1, c2] = EDGE_CORNERS[edge];
        let threshold = self.threshold;

        self.cache.resolve(EdgeKey::new(p1, p2), || {
            interpolate_edge(p1, values[c1], p2, values[c2], threshold)
        })
    }
}

/// Extract the isosurface of one chunk view
pub fn extract_chunk<T: Scalar>(samples: ArrayView3<'_, T>, threshold: f64) -> ChunkMesh {
    ChunkExtractor::new(samples, threshold).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array3;

    #[test]
    fn test_uniform_volume_is_empty() {
        let below = Array3::<u8>::from_elem((4, 4, 4), 10);
        let mesh = extract_chunk(below.view(), 128.0);
        assert!(mesh.is_empty());
        assert_eq!(mesh.stats.cubes, 27);
        assert_eq!(mesh.stats.active_cubes, 0);

        let above = Array3::<u8>::from_elem((4, 4, 4), 250);
        assert!(extract_chunk(above.view(), 128.0).is_empty());
    }

    #[test]
    fn test_thin_view_has_no_cubes() {
        let flat = Array3::<u8>::from_elem((5, 1, 5), 255);
        let mesh = extract_chunk(flat.view(), 128.0);
        assert!(mesh.is_empty());
        assert_eq!(mesh.stats.cubes, 0);
    }

    #[test]
    fn test_single_corner_emits_one_triangle() {
        let mut samples = Array3::<u8>::zeros((2, 2, 2));
        samples[(0, 0, 0)] = 200;

        let mesh = extract_chunk(samples.view(), 100.0);
        assert_eq!(mesh.triangles.len(), 1);
        assert_eq!(mesh.vertices.len(), 3);

        // Crossings at t = 0.5 on the three edges leaving corner 0.
        let mut points = mesh.vertices.clone();
        points.sort_by(|a, b| (a.x, a.y, a.z).partial_cmp(&(b.x, b.y, b.z)).unwrap());
        assert_relative_eq!(points[0], Point3d::new(0.0, 0.0, 0.5));
        assert_relative_eq!(points[1], Point3d::new(0.0, 0.5, 0.0));
        assert_relative_eq!(points[2], Point3d::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn test_single_background_corner_emits_one_triangle() {
        let mut samples = Array3::<u8>::from_elem((2, 2, 2), 200);
        samples[(1, 1, 1)] = 0;

        let mesh = extract_chunk(samples.view(), 100.0);
        assert_eq!(mesh.triangles.len(), 1);
        for v in &mesh.vertices {
            let on_corner_axes = [v.x, v.y, v.z].iter().filter(|&&c| c == 1.0).count();
            assert_eq!(on_corner_axes, 2);
        }
    }

    #[test]
    fn test_shared_edge_produces_one_vertex() {
        // Two cubes along x share the face at x = 1. Raising the samples at
        // x = 1 on the y = 0, z = 0 line puts a crossing on shared edges.
        let mut samples = Array3::<u8>::zeros((3, 2, 2));
        samples[(1, 0, 0)] = 255;

        let mesh = extract_chunk(samples.view(), 128.0);
        assert_eq!(mesh.triangles.len(), 2);

        // One crossing on each x edge, plus the y and z edges at x = 1 that
        // both cubes resolve.
        assert_eq!(mesh.vertices.len(), 4);

        let shared_y = mesh
            .vertices
            .iter()
            .position(|v| v.x == 1.0 && v.z == 0.0 && v.y > 0.0)
            .unwrap();
        let users = mesh
            .triangles
            .iter()
            .filter(|t| t.contains(&shared_y))
            .count();
        assert_eq!(users, 2);
        assert!(mesh.stats.cache_hits > 0);
    }

    #[test]
    fn test_uncrossed_edge_drops_whole_triangle() {
        let mut samples = Array3::<f32>::zeros((2, 2, 2));
        samples[(0, 0, 0)] = 200.0;
        samples[(1, 0, 0)] = f32::NAN;

        let mesh = extract_chunk(samples.view(), 128.0);
        assert_eq!(mesh.stats.active_cubes, 1);
        assert_eq!(mesh.stats.dropped_triangles, 1);
        assert!(mesh.triangles.is_empty());
        assert!(mesh.vertices.is_empty());
    }

    #[test]
    fn test_nan_samples_never_produce_nan_vertices() {
        let samples = Array3::from_shape_fn((5, 5, 5), |(x, y, z)| {
            if (x + y + z) % 7 == 3 {
                f32::NAN
            } else {
                ((x * 37 + y * 91 + z * 53) % 256) as f32
            }
        });
        let mesh = extract_chunk(samples.view(), 128.0);

        assert!(mesh.stats.dropped_triangles > 0);
        assert!(!mesh.triangles.is_empty());
        for v in &mesh.vertices {
            assert!(v.x.is_finite() && v.y.is_finite() && v.z.is_finite());
        }
        for tri in &mesh.triangles {
            assert!(tri.iter().all(|&i| i < mesh.vertices.len()));
        }
    }

    #[test]
    fn test_indices_stay_in_bounds() {
        let samples = Array3::from_shape_fn((6, 6, 6), |(x, y, z)| ((x * 37 + y * 91 + z * 53) % 256) as u8);
        let mesh = extract_chunk(samples.view(), 128.0);

        assert!(!mesh.triangles.is_empty());
        for tri in &mesh.triangles {
            assert!(tri.iter().all(|&i| i < mesh.vertices.len()));
        }
        assert_eq!(mesh.stats.dropped_triangles, 0);
    }
}
