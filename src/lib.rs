//! # isocrate
//!
//! Parallel isosurface extraction from dense scalar volumes for Rust.
//!
//! This is the umbrella crate that provides convenient access to all isocrate
//! functionality. You can use this crate to get everything in one place, or use
//! individual crates for more granular control over dependencies.
//!
//! ## Features
//!
//! - **Core**: Mesh and point types, shared error type
//! - **Extraction**: Chunked marching cubes with parallel workers and seam welding
//! - **I/O**: OBJ and PLY mesh files
//!
//! ## Quick Start
//!
//! ```rust
//! use isocrate::prelude::*;
//!
//! let grid = ScalarGrid::from_fn([16, 16, 16], |x, y, z| {
//!     let d2 = (x as f64 - 8.0).powi(2) + (y as f64 - 8.0).powi(2) + (z as f64 - 8.0).powi(2);
//!     if d2 < 25.0 { 255u8 } else { 0u8 }
//! });
//!
//! let mesh = marching_cubes(&grid, 128.0, 2)?;
//! assert!(mesh.face_count() > 0);
//! # Ok::<(), isocrate::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: Enables core, extraction, and io
//! - `core`: Core data structures (always enabled)
//! - `extraction`: Marching cubes extraction
//! - `io`: Mesh file formats
//! - `all`: Enables all features

// Re-export core functionality
pub use isocrate_core::*;

// Re-export sub-crates
#[cfg(feature = "extraction")]
pub use isocrate_extraction as extraction;

#[cfg(feature = "io")]
pub use isocrate_io as io;

/// Convenient imports for common use cases
pub mod prelude {
    pub use isocrate_core::*;

    #[cfg(feature = "extraction")]
    pub use isocrate_extraction::{
        marching_cubes, weld_vertices, ExtractionConfig, IsosurfaceExtractor, Scalar, ScalarGrid,
    };

    #[cfg(feature = "io")]
    pub use isocrate_io::{read_mesh, write_mesh, MeshReader, MeshWriter};
}
