//! Spatial decomposition and parallel dispatch
//!
//! The grid is cut into `divisions³` chunks. Neighboring chunks share one
//! sample layer on their common faces, so every cube of the grid belongs to
//! exactly one chunk. Each chunk is extracted by an independent worker with its
//! own vertex cache; results come back to the calling thread in completion
//! order.

use crate::chunk::{extract_chunk, ChunkMesh};
use crate::grid::{Scalar, ScalarGrid};
use crate::parallel;
use isocrate_core::{Error, Result};
use itertools::iproduct;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// Axis-aligned sub-volume of the grid, bounds inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chunk {
    /// Position of the chunk in the decomposition, `(cx, cy, cz)`
    pub index: [usize; 3],
    /// First sample covered along each axis
    pub lower: [usize; 3],
    /// Last sample covered along each axis
    pub upper: [usize; 3],
}

impl Chunk {
    pub fn new(index: [usize; 3], lower: [usize; 3], upper: [usize; 3]) -> Self {
        Self {
            index,
            lower,
            upper,
        }
    }

    /// Translation from chunk-local to grid coordinates
    pub fn offset(&self) -> [usize; 3] {
        self.lower
    }

    /// Samples covered along each axis
    pub fn sample_dims(&self) -> [usize; 3] {
        std::array::from_fn(|axis| (self.upper[axis] + 1).saturating_sub(self.lower[axis]))
    }
}

/// Mesh extracted from one chunk, still in chunk-local coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkResult {
    pub chunk: Chunk,
    pub mesh: ChunkMesh,
}

/// Partition a grid of `dims` samples into `divisions` chunks per axis
///
/// Every axis extent must be a multiple of `divisions`; anything else is
/// rejected instead of silently dropping the remainder. Chunk `c` along an
/// axis covers samples `c * size ..= (c + 1) * size`, clamped to the last
/// sample of the grid.
pub fn plan_chunks(dims: [usize; 3], divisions: usize) -> Result<Vec<Chunk>> {
    for (axis, &extent) in dims.iter().enumerate() {
        if divisions == 0 || extent % divisions != 0 {
            return Err(Error::InvalidDecomposition {
                axis,
                extent,
                divisions,
            });
        }
    }

    if dims.contains(&0) {
        return Ok(Vec::new());
    }

    let size: [usize; 3] = std::array::from_fn(|axis| dims[axis] / divisions);
    let chunks = iproduct!(0..divisions, 0..divisions, 0..divisions)
        .map(|(cx, cy, cz)| {
            let index = [cx, cy, cz];
            let lower: [usize; 3] = std::array::from_fn(|axis| index[axis] * size[axis]);
            let upper: [usize; 3] =
                std::array::from_fn(|axis| (lower[axis] + size[axis]).min(dims[axis] - 1));
            Chunk::new(index, lower, upper)
        })
        .collect();

    Ok(chunks)
}

/// Dispatches chunk extraction over a shared, read-only grid
pub struct SpatialScheduler<'g, T> {
    grid: &'g ScalarGrid<T>,
    threshold: f64,
    chunks: Vec<Chunk>,
}

impl<'g, T: Scalar> SpatialScheduler<'g, T> {
    /// Plan the decomposition up front; fails before any work is dispatched
    pub fn new(grid: &'g ScalarGrid<T>, threshold: f64, divisions: usize) -> Result<Self> {
        let chunks = plan_chunks(grid.dimensions(), divisions)?;
        Ok(Self {
            grid,
            threshold,
            chunks,
        })
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Extract every chunk and hand each result to `on_result`
    ///
    /// `on_result` runs on the calling thread only, one result at a time, in
    /// whatever order the workers finish. The first error, from a worker or
    /// from `on_result`, stops dispatching queued chunks and is returned once
    /// in-flight workers have drained. Setting `cancel` has the same effect
    /// and yields [`Error::Cancelled`].
    pub fn run<F>(&self, cancel: Option<&AtomicBool>, on_result: F) -> Result<()>
    where
        F: FnMut(ChunkResult) -> Result<()>,
    {
        if parallel::is_parallel_enabled() {
            self.run_parallel(cancel, on_result)
        } else {
            self.run_sequential(cancel, on_result)
        }
    }

    /// Extract a single chunk of the grid
    pub fn extract(&self, chunk: &Chunk) -> Result<ChunkResult> {
        let view = self.grid.chunk_view(chunk)?;
        let mesh = extract_chunk(view, self.threshold);

        debug!(
            chunk = ?chunk.index,
            vertices = mesh.vertices.len(),
            triangles = mesh.triangles.len(),
            dropped = mesh.stats.dropped_triangles,
            cache_hits = mesh.stats.cache_hits,
            "chunk extracted"
        );

        Ok(ChunkResult {
            chunk: *chunk,
            mesh,
        })
    }

    fn run_sequential<F>(&self, cancel: Option<&AtomicBool>, mut on_result: F) -> Result<()>
    where
        F: FnMut(ChunkResult) -> Result<()>,
    {
        for chunk in &self.chunks {
            if is_set(cancel) {
                warn!(chunk = ?chunk.index, "extraction cancelled");
                return Err(Error::Cancelled);
            }
            on_result(self.extract(chunk)?)?;
        }
        Ok(())
    }

    fn run_parallel<F>(&self, cancel: Option<&AtomicBool>, mut on_result: F) -> Result<()>
    where
        F: FnMut(ChunkResult) -> Result<()>,
    {
        let pool = parallel::get_thread_pool()?;
        let abort = AtomicBool::new(false);
        let (tx, rx) = crossbeam_channel::unbounded::<Result<Option<ChunkResult>>>();

        pool.in_place_scope(|scope| {
            for chunk in &self.chunks {
                let tx = tx.clone();
                let abort = &abort;
                scope.spawn(move |_| {
                    let message = if abort.load(Ordering::Relaxed) || is_set(cancel) {
                        Ok(None)
                    } else {
                        self.extract(chunk).map(Some)
                    };
                    // The receiver outlives the scope, so this cannot fail.
                    let _ = tx.send(message);
                });
            }
            drop(tx);

            let mut outcome = Ok(());
            let mut received = 0;
            for message in rx.iter() {
                received += 1;
                if outcome.is_err() {
                    continue;
                }

                outcome = match message {
                    Ok(Some(_)) | Ok(None) if is_set(cancel) => Err(Error::Cancelled),
                    Ok(Some(result)) => on_result(result),
                    Ok(None) => Err(Error::Cancelled),
                    Err(e) => Err(e),
                };

                if outcome.is_err() {
                    abort.store(true, Ordering::Relaxed);
                    if matches!(outcome, Err(Error::Cancelled)) {
                        warn!(received, total = self.chunks.len(), "extraction cancelled");
                    }
                }
            }

            if outcome.is_ok() && received != self.chunks.len() {
                return Err(Error::Algorithm(format!(
                    "Received {} of {} chunk results",
                    received,
                    self.chunks.len()
                )));
            }
            outcome
        })
    }
}

fn is_set(flag: Option<&AtomicBool>) -> bool {
    flag.is_some_and(|f| f.load(Ordering::Relaxed))
}
