//! Core data structures for isocrate
//!
//! This crate provides the types shared by the extraction engine and the mesh
//! writers: point aliases, the indexed triangle mesh, and the common error type.

pub mod point;
pub mod mesh;
pub mod error;

pub use point::*;
pub use mesh::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3};

// Type aliases for easier imports
pub type Mesh = TriangleMesh;
