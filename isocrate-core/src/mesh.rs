//! Mesh data structures and functionality

use crate::error::{Error, Result};
use crate::point::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An indexed triangle mesh
///
/// Faces hold zero-based indices into `vertices`. No normals are stored; the
/// extraction engine hands geometry and connectivity only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub vertices: Vec<Point3f>,
    pub faces: Vec<[usize; 3]>,
}

impl TriangleMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create a mesh from vertices and faces
    pub fn from_vertices_and_faces(vertices: Vec<Point3f>, faces: Vec<[usize; 3]>) -> Self {
        Self { vertices, faces }
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Add a vertex to the mesh
    pub fn add_vertex(&mut self, vertex: Point3f) -> usize {
        let index = self.vertices.len();
        self.vertices.push(vertex);
        index
    }

    /// Add a face to the mesh
    pub fn add_face(&mut self, face: [usize; 3]) {
        self.faces.push(face);
    }

    /// Check that every face index refers to an existing vertex
    pub fn validate(&self) -> Result<()> {
        let count = self.vertices.len();
        for (face_idx, face) in self.faces.iter().enumerate() {
            if let Some(&bad) = face.iter().find(|&&v| v >= count) {
                return Err(Error::InvalidData(format!(
                    "Face {} references vertex {} but mesh has {} vertices",
                    face_idx, bad, count
                )));
            }
        }
        Ok(())
    }

    /// Axis-aligned bounds of the vertex set, `None` for an empty mesh
    pub fn bounding_box(&self) -> Option<(Point3f, Point3f)> {
        let first = *self.vertices.first()?;
        let bounds = self.vertices.iter().fold((first, first), |(min, max), v| {
            (
                Point3f::new(min.x.min(v.x), min.y.min(v.y), min.z.min(v.z)),
                Point3f::new(max.x.max(v.x), max.y.max(v.y), max.z.max(v.z)),
            )
        });
        Some(bounds)
    }

    /// Count undirected edges used by exactly one face
    ///
    /// A closed surface has none.
    pub fn boundary_edge_count(&self) -> usize {
        let mut uses: HashMap<(usize, usize), usize> = HashMap::new();
        for face in &self.faces {
            for i in 0..3 {
                let a = face[i];
                let b = face[(i + 1) % 3];
                *uses.entry((a.min(b), a.max(b))).or_insert(0) += 1;
            }
        }
        uses.values().filter(|&&n| n == 1).count()
    }

    /// Clear the mesh
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.faces.clear();
    }
}

impl Default for TriangleMesh {
    fn default() -> Self {
        Self::new()
    }
}
