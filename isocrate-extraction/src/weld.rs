//! Seam welding
//!
//! Neighboring chunks emit their own copy of every vertex on a shared face.
//! Welding collapses vertices that quantize to the same cell and renumbers the
//! survivors in first-seen order.

use isocrate_core::{Error, Point3f, Result, TriangleMesh};
use std::collections::HashMap;
use tracing::info;

/// Merge vertices closer than `tolerance` per axis and drop collapsed faces
pub fn weld_vertices(mesh: &TriangleMesh, tolerance: f32) -> Result<TriangleMesh> {
    if !tolerance.is_finite() || tolerance <= 0.0 {
        return Err(Error::InvalidConfig(format!(
            "Weld tolerance must be positive and finite, got {}",
            tolerance
        )));
    }
    mesh.validate()?;

    let inv = 1.0 / tolerance as f64;
    let quantize = |p: &Point3f| -> [i64; 3] {
        [p.x, p.y, p.z].map(|c| (c as f64 * inv).round() as i64)
    };

    let mut cells: HashMap<[i64; 3], usize> = HashMap::with_capacity(mesh.vertex_count());
    let mut vertices: Vec<Point3f> = Vec::new();
    let remap: Vec<usize> = mesh
        .vertices
        .iter()
        .map(|p| {
            *cells.entry(quantize(p)).or_insert_with(|| {
                vertices.push(*p);
                vertices.len() - 1
            })
        })
        .collect();

    let faces: Vec<[usize; 3]> = mesh
        .faces
        .iter()
        .map(|f| f.map(|i| remap[i]))
        .filter(|[a, b, c]| a != b && b != c && a != c)
        .collect();

    info!(
        vertices_before = mesh.vertex_count(),
        vertices_after = vertices.len(),
        faces_dropped = mesh.face_count() - faces.len(),
        "welded seam vertices"
    );

    Ok(TriangleMesh::from_vertices_and_faces(vertices, faces))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_vertices_collapse() {
        let vertices = vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(1.0, 1.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
        ];
        let mesh = TriangleMesh::from_vertices_and_faces(vertices, vec![[0, 1, 2], [3, 4, 5]]);

        let welded = weld_vertices(&mesh, 1e-4).unwrap();
        assert_eq!(welded.vertex_count(), 4);
        assert_eq!(welded.faces, vec![[0, 1, 2], [1, 3, 2]]);
    }

    #[test]
    fn test_near_vertices_within_tolerance_merge() {
        let vertices = vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
            Point3f::new(1.00001, 0.0, 0.0),
        ];
        let mesh = TriangleMesh::from_vertices_and_faces(vertices, vec![[0, 1, 2], [3, 2, 0]]);

        let welded = weld_vertices(&mesh, 1e-3).unwrap();
        assert_eq!(welded.vertex_count(), 3);
        assert_eq!(welded.faces, vec![[0, 1, 2], [1, 2, 0]]);
    }

    #[test]
    fn test_collapsed_faces_are_dropped() {
        let vertices = vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
        ];
        let mesh = TriangleMesh::from_vertices_and_faces(vertices, vec![[0, 1, 2], [0, 2, 3]]);

        let welded = weld_vertices(&mesh, 1e-4).unwrap();
        assert_eq!(welded.face_count(), 1);
        assert!(welded.validate().is_ok());
    }

    #[test]
    fn test_invalid_tolerance_rejected() {
        let mesh = TriangleMesh::new();
        assert!(matches!(weld_vertices(&mesh, 0.0), Err(Error::InvalidConfig(_))));
        assert!(matches!(weld_vertices(&mesh, f32::NAN), Err(Error::InvalidConfig(_))));
        assert!(weld_vertices(&mesh, 1e-4).unwrap().is_empty());
    }
}
