//! PLY format support

use crate::{MeshReader, MeshWriter};
use isocrate_core::{Error, Point3f, Result, TriangleMesh};
use ply_rs::{
    parser::Parser,
    ply::{
        Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType,
        ScalarType,
    },
    writer::Writer,
};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

pub struct PlyReader;
pub struct PlyWriter;

impl PlyReader {
    /// Parse a PLY stream (ASCII or binary) into a mesh
    pub fn read_from<R: Read>(reader: R) -> Result<TriangleMesh> {
        let mut reader = BufReader::new(reader);
        let parser = Parser::<DefaultElement>::new();
        let ply = parser.read_ply(&mut reader)?;

        let mut vertices = Vec::new();
        if let Some(vertex_element) = ply.payload.get("vertex") {
            for vertex in vertex_element {
                let x = extract_property_value(vertex, "x")?;
                let y = extract_property_value(vertex, "y")?;
                let z = extract_property_value(vertex, "z")?;
                vertices.push(Point3f::new(x, y, z));
            }
        }

        let mut faces = Vec::new();
        if let Some(face_element) = ply.payload.get("face") {
            for face in face_element {
                let indices = extract_face_indices(face)?;
                if indices.len() < 3 {
                    return Err(Error::InvalidData(format!(
                        "Face with {} vertices",
                        indices.len()
                    )));
                }
                for i in 1..indices.len() - 1 {
                    faces.push([indices[0], indices[i], indices[i + 1]]);
                }
            }
        }

        let mesh = TriangleMesh::from_vertices_and_faces(vertices, faces);
        mesh.validate()?;
        Ok(mesh)
    }
}

impl MeshReader for PlyReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
        Self::read_from(File::open(path)?)
    }
}

impl PlyWriter {
    /// Write `mesh` as ASCII PLY
    ///
    /// ply-rs 0.1 omits list counts in binary bodies, so faces are only ever
    /// written as text.
    pub fn write_to<W: Write>(mesh: &TriangleMesh, mut writer: W) -> Result<()> {
        let mut ply = Ply::<DefaultElement>::new();
        ply.header.encoding = Encoding::Ascii;
        ply.header.comments.push("isocrate isosurface".to_string());

        let mut vertex_element = ElementDef::new("vertex".to_string());
        vertex_element.count = mesh.vertices.len();
        for axis in ["x", "y", "z"] {
            vertex_element.properties.add(PropertyDef::new(
                axis.to_string(),
                PropertyType::Scalar(ScalarType::Float),
            ));
        }
        ply.header.elements.add(vertex_element);

        let mut face_element = ElementDef::new("face".to_string());
        face_element.count = mesh.faces.len();
        face_element.properties.add(PropertyDef::new(
            "vertex_indices".to_string(),
            PropertyType::List(ScalarType::UChar, ScalarType::UInt),
        ));
        ply.header.elements.add(face_element);

        let vertices = mesh
            .vertices
            .iter()
            .map(|v| {
                let mut element = DefaultElement::new();
                element.insert("x".to_string(), Property::Float(v.x));
                element.insert("y".to_string(), Property::Float(v.y));
                element.insert("z".to_string(), Property::Float(v.z));
                element
            })
            .collect();
        ply.payload.insert("vertex".to_string(), vertices);

        let mut faces = Vec::with_capacity(mesh.faces.len());
        for face in &mesh.faces {
            let indices = face
                .iter()
                .map(|&i| {
                    u32::try_from(i).map_err(|_| {
                        Error::InvalidData(format!("Vertex index {} exceeds PLY range", i))
                    })
                })
                .collect::<Result<Vec<u32>>>()?;
            let mut element = DefaultElement::new();
            element.insert("vertex_indices".to_string(), Property::ListUInt(indices));
            faces.push(element);
        }
        ply.payload.insert("face".to_string(), faces);

        Writer::new().write_ply(&mut writer, &mut ply)?;
        writer.flush()?;
        Ok(())
    }
}

impl MeshWriter for PlyWriter {
    fn write_mesh<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)?;
        Self::write_to(mesh, BufWriter::new(file))?;
        debug!(path = %path.display(), faces = mesh.face_count(), "wrote PLY mesh");
        Ok(())
    }
}

/// Extract a property value as f32 from a PLY element
fn extract_property_value(element: &DefaultElement, name: &str) -> Result<f32> {
    match element.get(name) {
        Some(Property::Float(val)) => Ok(*val),
        Some(Property::Double(val)) => Ok(*val as f32),
        Some(Property::Int(val)) => Ok(*val as f32),
        Some(Property::UInt(val)) => Ok(*val as f32),
        Some(Property::Short(val)) => Ok(*val as f32),
        Some(Property::UShort(val)) => Ok(*val as f32),
        _ => Err(Error::InvalidData(format!(
            "Property '{}' not found or invalid type",
            name
        ))),
    }
}

/// Extract face indices from a PLY face element
fn extract_face_indices(element: &DefaultElement) -> Result<Vec<usize>> {
    let to_index = |idx: i64| {
        usize::try_from(idx)
            .map_err(|_| Error::InvalidData(format!("Negative face index {}", idx)))
    };

    match element.get("vertex_indices").or_else(|| element.get("vertex_index")) {
        Some(Property::ListInt(indices)) => indices.iter().map(|&i| to_index(i as i64)).collect(),
        Some(Property::ListUInt(indices)) => indices.iter().map(|&i| to_index(i as i64)).collect(),
        Some(Property::ListShort(indices)) => indices.iter().map(|&i| to_index(i as i64)).collect(),
        Some(Property::ListUShort(indices)) => indices.iter().map(|&i| to_index(i as i64)).collect(),
        Some(Property::ListUChar(indices)) => indices.iter().map(|&i| to_index(i as i64)).collect(),
        _ => Err(Error::InvalidData("Face indices not found".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Cursor;

    fn tetrahedron() -> TriangleMesh {
        TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.5, 1.0, 0.0),
                Point3f::new(0.5, 0.5, 1.0),
            ],
            vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [0, 3, 2]],
        )
    }

    #[test]
    fn test_ply_roundtrip() {
        let mesh = tetrahedron();
        let mut buffer = Vec::new();
        PlyWriter::write_to(&mesh, &mut buffer).unwrap();

        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.contains("format ascii 1.0"));
        assert!(text.lines().any(|l| l.trim() == "3 0 2 1"));

        let loaded = PlyReader::read_from(Cursor::new(buffer)).unwrap();
        assert_eq!(loaded.faces, mesh.faces);
        for (a, b) in mesh.vertices.iter().zip(&loaded.vertices) {
            assert_relative_eq!(a, b);
        }
    }

    #[test]
    fn test_written_file_reads_back() {
        let path = std::env::temp_dir().join("isocrate_ply_writer_file.ply");
        let mesh = tetrahedron();
        PlyWriter::write_mesh(&mesh, &path).unwrap();
        let loaded = PlyReader::read_mesh(&path).unwrap();
        assert_eq!(loaded.faces, mesh.faces);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_binary_little_endian_input_is_read() {
        let mut bytes = b"ply\nformat binary_little_endian 1.0\nelement vertex 3\nproperty float x\nproperty float y\nproperty float z\nelement face 1\nproperty list uchar int vertex_indices\nend_header\n".to_vec();
        for v in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes.push(3);
        for i in [0i32, 1, 2] {
            bytes.extend_from_slice(&i.to_le_bytes());
        }

        let mesh = PlyReader::read_from(Cursor::new(bytes)).unwrap();
        assert_eq!(mesh.faces, vec![[0, 1, 2]]);
        assert_relative_eq!(mesh.vertices[1], Point3f::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_ascii_polygon_faces_are_triangulated() {
        let ply_content = "ply\nformat ascii 1.0\nelement vertex 4\nproperty float x\nproperty float y\nproperty float z\nelement face 1\nproperty list uchar int vertex_indices\nend_header\n0 0 0\n1 0 0\n1 1 0\n0 1 0\n4 0 1 2 3\n";
        let mesh = PlyReader::read_from(Cursor::new(ply_content)).unwrap();

        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.faces, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn test_dangling_face_index_rejected() {
        let ply_content = "ply\nformat ascii 1.0\nelement vertex 3\nproperty float x\nproperty float y\nproperty float z\nelement face 1\nproperty list uchar int vertex_indices\nend_header\n0 0 0\n1 0 0\n1 1 0\n3 0 1 5\n";
        let result = PlyReader::read_from(Cursor::new(ply_content));
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_invalid_header_rejected() {
        assert!(PlyReader::read_from(Cursor::new("not_ply\n")).is_err());
    }
}
