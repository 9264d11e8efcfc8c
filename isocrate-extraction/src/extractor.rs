//! Top-level isosurface extraction

use crate::grid::{Scalar, ScalarGrid};
use crate::merge::MeshMerger;
use crate::scheduler::SpatialScheduler;
use crate::weld::weld_vertices;
use isocrate_core::{Error, Result, TriangleMesh};
use serde::{Deserialize, Serialize};
use std::sync::atomic::AtomicBool;
use std::time::Instant;
use tracing::info;

/// Configuration for marching cubes extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Scalar value of the isosurface; samples at or above it count as inside
    pub threshold: f64,
    /// Chunks per axis; must evenly divide every grid extent
    pub divisions: usize,
    /// Collapse duplicate vertices on chunk seams after merging
    pub weld_seams: bool,
    /// Distance under which two vertices are welded
    pub weld_tolerance: f32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            threshold: 128.0,
            divisions: 1,
            weld_seams: true,
            weld_tolerance: 1e-4,
        }
    }
}

impl ExtractionConfig {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_divisions(mut self, divisions: usize) -> Self {
        self.divisions = divisions;
        self
    }

    pub fn with_weld_seams(mut self, weld_seams: bool) -> Self {
        self.weld_seams = weld_seams;
        self
    }

    pub fn with_weld_tolerance(mut self, weld_tolerance: f32) -> Self {
        self.weld_tolerance = weld_tolerance;
        self
    }

    /// Check the settings that do not depend on the grid
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "Threshold must be finite, got {}",
                self.threshold
            )));
        }
        if self.divisions == 0 {
            return Err(Error::InvalidConfig(
                "Divisions must be at least 1".to_string(),
            ));
        }
        if self.weld_seams && !(self.weld_tolerance.is_finite() && self.weld_tolerance > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "Weld tolerance must be positive and finite, got {}",
                self.weld_tolerance
            )));
        }
        Ok(())
    }
}

/// Chunked, parallel marching cubes
///
/// Extraction runs on the global pool from [`crate::parallel`]. Calling it
/// from inside a task of a single-threaded pool deadlocks, since the calling
/// thread blocks while it waits for chunk results.
#[derive(Debug, Clone, Default)]
pub struct IsosurfaceExtractor {
    config: ExtractionConfig,
}

impl IsosurfaceExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extract the isosurface of `grid`
    pub fn extract<T: Scalar>(&self, grid: &ScalarGrid<T>) -> Result<TriangleMesh> {
        self.run(grid, None)
    }

    /// Extract the isosurface, stopping early once `cancel` is set
    ///
    /// A cancelled run returns [`Error::Cancelled`] and no partial mesh.
    pub fn extract_with_cancel<T: Scalar>(
        &self,
        grid: &ScalarGrid<T>,
        cancel: &AtomicBool,
    ) -> Result<TriangleMesh> {
        self.run(grid, Some(cancel))
    }

    /// Extract and merge without welding, keeping one vertex copy per chunk
    /// on every seam
    pub fn extract_unwelded<T: Scalar>(&self, grid: &ScalarGrid<T>) -> Result<TriangleMesh> {
        self.config.validate()?;
        self.merge_chunks(grid, None)
    }

    fn run<T: Scalar>(&self, grid: &ScalarGrid<T>, cancel: Option<&AtomicBool>) -> Result<TriangleMesh> {
        self.config.validate()?;
        let start = Instant::now();
        info!(
            dims = ?grid.dimensions(),
            threshold = self.config.threshold,
            divisions = self.config.divisions,
            "starting isosurface extraction"
        );

        let merged = self.merge_chunks(grid, cancel)?;
        let mesh = if self.config.weld_seams && self.config.divisions > 1 {
            weld_vertices(&merged, self.config.weld_tolerance)?
        } else {
            merged
        };

        info!(
            vertices = mesh.vertex_count(),
            faces = mesh.face_count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "isosurface extraction finished"
        );
        Ok(mesh)
    }

    fn merge_chunks<T: Scalar>(
        &self,
        grid: &ScalarGrid<T>,
        cancel: Option<&AtomicBool>,
    ) -> Result<TriangleMesh> {
        let scheduler = SpatialScheduler::new(grid, self.config.threshold, self.config.divisions)?;
        let mut merger = MeshMerger::new(grid.dimensions());
        scheduler.run(cancel, |result| merger.merge(result))?;
        Ok(merger.finish())
    }
}

/// Extract the isosurface at `threshold` with `divisions` chunks per axis
///
/// Convenience wrapper around [`IsosurfaceExtractor`] with seam welding on.
pub fn marching_cubes<T: Scalar>(
    grid: &ScalarGrid<T>,
    threshold: f64,
    divisions: usize,
) -> Result<TriangleMesh> {
    let config = ExtractionConfig::default()
        .with_threshold(threshold)
        .with_divisions(divisions);
    IsosurfaceExtractor::new(config).extract(grid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sphere(n: usize, radius: f64) -> ScalarGrid<f32> {
        let c = (n / 2) as f64;
        ScalarGrid::from_fn([n, n, n], |x, y, z| {
            let d = ((x as f64 - c).powi(2) + (y as f64 - c).powi(2) + (z as f64 - c).powi(2)).sqrt();
            (128.0 + 40.0 * (radius - d)).clamp(0.0, 255.0) as f32
        })
    }

    #[test]
    fn test_default_config() {
        let config = ExtractionConfig::default();
        assert_eq!(config.threshold, 128.0);
        assert_eq!(config.divisions, 1);
        assert!(config.weld_seams);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let zero = ExtractionConfig::default().with_divisions(0);
        assert!(matches!(zero.validate(), Err(Error::InvalidConfig(_))));

        let nan = ExtractionConfig::default().with_threshold(f64::NAN);
        assert!(nan.validate().is_err());

        let tolerance = ExtractionConfig::default().with_weld_tolerance(-1.0);
        assert!(tolerance.validate().is_err());
        assert!(tolerance.with_weld_seams(false).validate().is_ok());
    }

    #[test]
    fn test_welding_removes_seam_duplicates() {
        let grid = sphere(8, 2.7);
        let config = ExtractionConfig::default().with_divisions(2);
        let extractor = IsosurfaceExtractor::new(config);

        let raw = extractor.extract_unwelded(&grid).unwrap();
        let welded = extractor.extract(&grid).unwrap();
        assert!(welded.vertex_count() < raw.vertex_count());
        assert_eq!(welded.face_count(), raw.face_count());
        assert_eq!(welded.boundary_edge_count(), 0);
    }

    #[test]
    fn test_marching_cubes_wrapper() {
        let grid = sphere(8, 2.7);
        let mesh = marching_cubes(&grid, 128.0, 1).unwrap();
        assert!(mesh.face_count() > 0);
        assert!(mesh.validate().is_ok());
    }
}
