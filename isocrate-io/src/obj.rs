//! Wavefront OBJ format support
//!
//! Only geometry is handled: `v` records and `f` records. Texture and normal
//! references in faces (`f 1/2/3`) are accepted and ignored; polygons with more
//! than three corners are fan-triangulated.

use crate::{MeshReader, MeshWriter};
use isocrate_core::{Error, Point3f, Result, TriangleMesh};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

pub struct ObjReader;
pub struct ObjWriter;

impl ObjReader {
    /// Parse an OBJ stream into a mesh
    pub fn read_from<R: BufRead>(reader: R) -> Result<TriangleMesh> {
        let mut mesh = TriangleMesh::new();
        let mut polygon = Vec::new();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let mut tokens = line.split_whitespace();

            match tokens.next() {
                Some("v") => {
                    let mut coords = [0.0f32; 3];
                    for c in coords.iter_mut() {
                        *c = parse_coord(tokens.next(), line_no)?;
                    }
                    mesh.add_vertex(Point3f::new(coords[0], coords[1], coords[2]));
                }
                Some("f") => {
                    polygon.clear();
                    for token in tokens {
                        polygon.push(parse_index(token, mesh.vertex_count(), line_no)?);
                    }
                    if polygon.len() < 3 {
                        return Err(Error::InvalidData(format!(
                            "Line {}: face needs at least 3 vertices",
                            line_no + 1
                        )));
                    }
                    for i in 1..polygon.len() - 1 {
                        mesh.add_face([polygon[0], polygon[i], polygon[i + 1]]);
                    }
                }
                _ => {}
            }
        }

        Ok(mesh)
    }
}

impl MeshReader for ObjReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
        let file = File::open(path)?;
        Self::read_from(BufReader::new(file))
    }
}

impl ObjWriter {
    /// Write `mesh` as OBJ text with 1-based face indices
    pub fn write_to<W: Write>(mesh: &TriangleMesh, mut writer: W) -> Result<()> {
        writeln!(writer, "# isocrate isosurface")?;
        writeln!(writer, "# vertices {} faces {}", mesh.vertex_count(), mesh.face_count())?;

        for v in &mesh.vertices {
            writeln!(writer, "v {} {} {}", v.x, v.y, v.z)?;
        }
        for [a, b, c] in &mesh.faces {
            writeln!(writer, "f {} {} {}", a + 1, b + 1, c + 1)?;
        }

        writer.flush()?;
        Ok(())
    }
}

impl MeshWriter for ObjWriter {
    fn write_mesh<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)?;
        Self::write_to(mesh, BufWriter::new(file))?;
        debug!(path = %path.display(), faces = mesh.face_count(), "wrote OBJ mesh");
        Ok(())
    }
}

fn parse_coord(token: Option<&str>, line_no: usize) -> Result<f32> {
    token
        .and_then(|t| t.parse::<f32>().ok())
        .ok_or_else(|| Error::InvalidData(format!("Line {}: invalid vertex coordinate", line_no + 1)))
}

/// Resolve a face corner such as `7`, `7/1` or `7//3` to a 0-based index
fn parse_index(token: &str, vertex_count: usize, line_no: usize) -> Result<usize> {
    let invalid = || Error::InvalidData(format!("Line {}: invalid face index '{}'", line_no + 1, token));

    let raw = token
        .split('/')
        .next()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(invalid)?;

    // Negative indices count back from the most recent vertex
    let index = if raw < 0 { vertex_count as i64 + raw } else { raw - 1 };
    if index < 0 || index >= vertex_count as i64 {
        return Err(invalid());
    }
    Ok(index as usize)
}
