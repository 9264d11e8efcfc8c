//! Merging chunk meshes into one global mesh

use crate::scheduler::ChunkResult;
use isocrate_core::{Error, Point3f, Result, TriangleMesh};

/// Sequential fold of chunk results into a global indexed mesh
///
/// Results may arrive in any order. Vertex ids depend on arrival order; the
/// geometry and connectivity of the merged mesh do not.
#[derive(Debug)]
pub struct MeshMerger {
    dims: [usize; 3],
    mesh: TriangleMesh,
    vertex_offset: usize,
    merged_chunks: usize,
}

impl MeshMerger {
    /// Create a merger for chunks of a grid with `dims` samples per axis
    pub fn new(dims: [usize; 3]) -> Self {
        Self {
            dims,
            mesh: TriangleMesh::new(),
            vertex_offset: 0,
            merged_chunks: 0,
        }
    }

    /// Translate one chunk result into grid space and append it
    ///
    /// Empty results are skipped. A chunk that does not fit the grid, or whose
    /// triangles reference vertices it does not own, is rejected and leaves the
    /// merged mesh untouched.
    pub fn merge(&mut self, result: ChunkResult) -> Result<()> {
        let ChunkResult { chunk, mesh } = result;

        let fits = (0..3).all(|axis| {
            chunk.lower[axis] <= chunk.upper[axis] && chunk.upper[axis] < self.dims[axis]
        });
        if !fits {
            return Err(Error::MalformedOffset {
                chunk: chunk.index,
                offset: chunk.offset(),
                dims: self.dims,
            });
        }

        if mesh.is_empty() {
            return Ok(());
        }

        let local_count = mesh.vertices.len();
        if let Some(bad) = mesh.triangles.iter().find(|t| t.iter().any(|&i| i >= local_count)) {
            return Err(Error::MalformedChunk(format!(
                "Chunk {:?} triangle {:?} exceeds its {} vertices",
                chunk.index, bad, local_count
            )));
        }

        let [ox, oy, oz] = chunk.offset().map(|o| o as f64);
        self.mesh.vertices.extend(mesh.vertices.iter().map(|v| {
            Point3f::new((v.x + ox) as f32, (v.y + oy) as f32, (v.z + oz) as f32)
        }));

        let base = self.vertex_offset;
        self.mesh
            .faces
            .extend(mesh.triangles.iter().map(|t| t.map(|i| i + base)));

        self.vertex_offset += local_count;
        self.merged_chunks += 1;
        Ok(())
    }

    /// Number of non-empty chunks merged so far
    pub fn merged_chunks(&self) -> usize {
        self.merged_chunks
    }

    /// Running global vertex offset
    pub fn vertex_offset(&self) -> usize {
        self.vertex_offset
    }

    /// Finish merging and hand over the mesh
    pub fn finish(self) -> TriangleMesh {
        self.mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkMesh;
    use crate::scheduler::Chunk;
    use approx::assert_relative_eq;
    use isocrate_core::Point3d;

    fn chunk_result(index: [usize; 3], lower: [usize; 3], upper: [usize; 3], n: usize) -> ChunkResult {
        let vertices = (0..n).map(|i| Point3d::new(i as f64 + 0.5, 0.0, 1.0)).collect();
        let triangles = (0..n / 3).map(|t| [3 * t, 3 * t + 1, 3 * t + 2]).collect();
        ChunkResult {
            chunk: Chunk::new(index, lower, upper),
            mesh: ChunkMesh {
                vertices,
                triangles,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_offsets_translate_and_reindex() {
        let mut merger = MeshMerger::new([8, 8, 8]);
        merger.merge(chunk_result([1, 0, 0], [4, 0, 0], [7, 4, 4], 3)).unwrap();
        merger.merge(chunk_result([0, 1, 0], [0, 4, 0], [4, 7, 4], 6)).unwrap();
        assert_eq!(merger.vertex_offset(), 9);

        let mesh = merger.finish();
        assert_eq!(mesh.vertex_count(), 9);
        assert_eq!(mesh.faces, vec![[0, 1, 2], [3, 4, 5], [6, 7, 8]]);
        assert_relative_eq!(mesh.vertices[0], Point3f::new(4.5, 0.0, 1.0));
        assert_relative_eq!(mesh.vertices[3], Point3f::new(0.5, 4.0, 1.0));
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_empty_chunks_do_not_advance_offset() {
        let mut merger = MeshMerger::new([8, 8, 8]);
        merger.merge(chunk_result([0, 0, 0], [0, 0, 0], [4, 4, 4], 0)).unwrap();
        assert_eq!(merger.vertex_offset(), 0);
        assert_eq!(merger.merged_chunks(), 0);

        merger.merge(chunk_result([1, 1, 1], [4, 4, 4], [7, 7, 7], 3)).unwrap();
        let mesh = merger.finish();
        assert_eq!(mesh.faces, vec![[0, 1, 2]]);
    }

    #[test]
    fn test_order_changes_ids_not_geometry() {
        let a = chunk_result([0, 0, 0], [0, 0, 0], [4, 4, 4], 3);
        let b = chunk_result([1, 0, 0], [4, 0, 0], [7, 4, 4], 6);

        let mut forward = MeshMerger::new([8, 8, 8]);
        forward.merge(a.clone()).unwrap();
        forward.merge(b.clone()).unwrap();
        let forward = forward.finish();

        let mut backward = MeshMerger::new([8, 8, 8]);
        backward.merge(b).unwrap();
        backward.merge(a).unwrap();
        let backward = backward.finish();

        let triangles = |m: &TriangleMesh| {
            let mut tris: Vec<Vec<(u32, u32, u32)>> = m
                .faces
                .iter()
                .map(|f| {
                    f.iter()
                        .map(|&i| {
                            let v = m.vertices[i];
                            (v.x.to_bits(), v.y.to_bits(), v.z.to_bits())
                        })
                        .collect()
                })
                .collect();
            tris.sort();
            tris
        };
        assert_ne!(forward.vertices, backward.vertices);
        assert_eq!(triangles(&forward), triangles(&backward));
    }

    #[test]
    fn test_offset_outside_grid_is_rejected() {
        let mut merger = MeshMerger::new([8, 8, 8]);
        let result = merger.merge(chunk_result([2, 0, 0], [8, 0, 0], [12, 4, 4], 3));
        assert!(matches!(result, Err(Error::MalformedOffset { .. })));
        assert_eq!(merger.finish().vertex_count(), 0);
    }

    #[test]
    fn test_dangling_triangle_is_rejected() {
        let mut result = chunk_result([0, 0, 0], [0, 0, 0], [4, 4, 4], 3);
        result.mesh.triangles.push([0, 1, 7]);

        let mut merger = MeshMerger::new([8, 8, 8]);
        assert!(matches!(merger.merge(result), Err(Error::MalformedChunk(_))));
        assert_eq!(merger.vertex_offset(), 0);
    }
}
