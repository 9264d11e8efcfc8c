//! # isocrate Extraction
//!
//! Marching cubes isosurface extraction from dense scalar volumes.
//!
//! A volume is split into overlapping chunks, each chunk is triangulated on its
//! own worker with a private vertex cache, and the partial meshes are merged
//! into one indexed mesh. Seam vertices produced independently by neighboring
//! chunks can be welded afterwards.
//!
//! ```rust
//! use isocrate_extraction::{ExtractionConfig, IsosurfaceExtractor, ScalarGrid};
//!
//! let grid = ScalarGrid::from_fn([8, 8, 8], |x, y, z| {
//!     let d = ((x as f64 - 4.0).powi(2) + (y as f64 - 4.0).powi(2) + (z as f64 - 4.0).powi(2)).sqrt();
//!     (128.0 + 40.0 * (2.7 - d)).clamp(0.0, 255.0) as f32
//! });
//!
//! let config = ExtractionConfig::default().with_threshold(128.0).with_divisions(2);
//! let mesh = IsosurfaceExtractor::new(config).extract(&grid).unwrap();
//! assert!(mesh.face_count() > 0);
//! ```

pub mod grid;
pub mod tables;
pub mod interpolation;
pub mod cache;
pub mod classify;
pub mod chunk;
pub mod scheduler;
pub mod merge;
pub mod weld;
pub mod parallel;
pub mod extractor;

// Re-export commonly used items
pub use grid::{Scalar, ScalarGrid};
pub use interpolation::{crossing_fraction, interpolate_edge};
pub use cache::{EdgeKey, VertexCache, VertexTable};
pub use classify::{classify_corners, classify_cube, CubeCase};
pub use chunk::{extract_chunk, ChunkExtractor, ChunkMesh, ChunkStats};
pub use scheduler::{plan_chunks, Chunk, ChunkResult, SpatialScheduler};
pub use merge::MeshMerger;
pub use weld::weld_vertices;
pub use extractor::{marching_cubes, ExtractionConfig, IsosurfaceExtractor};
