//! Dense scalar volumes
//!
//! A `ScalarGrid` is the read-only input of an extraction run: a 3D array of
//! intensity samples indexed `(x, y, z)`. Samples may be any ordered numeric
//! type; the engine compares and interpolates them as `f64`.

use crate::scheduler::Chunk;
use isocrate_core::{Error, Result};
use ndarray::{s, Array2, Array3, ArrayView2, ArrayView3, Axis};

/// Numeric sample type stored in a scalar grid
pub trait Scalar: Copy + PartialOrd + Send + Sync + 'static {
    /// Widen the sample for threshold comparison and interpolation
    ///
    /// 64-bit integers above 2^53 in magnitude lose precision.
    fn to_f64(self) -> f64;
}

macro_rules! impl_scalar {
    ($($ty:ty),*) => {
        $(
            impl Scalar for $ty {
                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

impl_scalar!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

/// 3D grid of scalar samples
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarGrid<T> {
    samples: Array3<T>,
}

impl<T: Scalar + Default> ScalarGrid<T> {
    /// Create a grid filled with `T::default()`
    pub fn new(dimensions: [usize; 3]) -> Self {
        Self {
            samples: Array3::default((dimensions[0], dimensions[1], dimensions[2])),
        }
    }
}

impl<T: Scalar> ScalarGrid<T> {
    /// Wrap an existing array, indexed `[x, y, z]`
    pub fn from_array(samples: Array3<T>) -> Self {
        Self { samples }
    }

    /// Build a grid by evaluating `f(x, y, z)` at every sample
    pub fn from_fn<F>(dimensions: [usize; 3], mut f: F) -> Self
    where
        F: FnMut(usize, usize, usize) -> T,
    {
        let samples = Array3::from_shape_fn(
            (dimensions[0], dimensions[1], dimensions[2]),
            |(x, y, z)| f(x, y, z),
        );
        Self { samples }
    }

    /// Stack equally sized 2D slices along the first axis
    ///
    /// Slice `i` becomes the samples with `x == i`, matching the order in
    /// which a volume loader reads sorted image files.
    pub fn from_slices(slices: &[Array2<T>]) -> Result<Self> {
        let first = slices
            .first()
            .ok_or_else(|| Error::InvalidData("No slices to stack".to_string()))?;
        let shape = first.dim();

        if let Some((idx, slice)) = slices.iter().enumerate().find(|(_, s)| s.dim() != shape) {
            return Err(Error::InvalidData(format!(
                "Slice {} has shape {:?}, expected {:?}",
                idx,
                slice.dim(),
                shape
            )));
        }

        let views: Vec<ArrayView2<T>> = slices.iter().map(|s| s.view()).collect();
        let samples = ndarray::stack(Axis(0), &views)
            .map_err(|e| Error::InvalidData(format!("Failed to stack slices: {}", e)))?;

        Ok(Self { samples })
    }

    /// Grid dimensions `[x, y, z]`
    pub fn dimensions(&self) -> [usize; 3] {
        let (x, y, z) = self.samples.dim();
        [x, y, z]
    }

    /// Total number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the grid holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Get sample at grid coordinates (with bounds checking)
    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<T> {
        self.samples.get((x, y, z)).copied()
    }

    /// Set sample at grid coordinates
    pub fn set(&mut self, x: usize, y: usize, z: usize, value: T) -> Result<()> {
        let dims = self.dimensions();
        match self.samples.get_mut((x, y, z)) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(Error::InvalidData(format!(
                "Grid coordinates ({}, {}, {}) out of bounds for dimensions {:?}",
                x, y, z, dims
            ))),
        }
    }

    /// Borrow the whole grid
    pub fn view(&self) -> ArrayView3<'_, T> {
        self.samples.view()
    }

    /// Borrow the samples covered by a chunk, bounds inclusive
    pub fn chunk_view(&self, chunk: &Chunk) -> Result<ArrayView3<'_, T>> {
        let dims = self.dimensions();
        let fits = (0..3).all(|axis| {
            chunk.lower[axis] <= chunk.upper[axis] && chunk.upper[axis] < dims[axis]
        });
        if !fits {
            return Err(Error::MalformedOffset {
                chunk: chunk.index,
                offset: chunk.offset(),
                dims,
            });
        }

        let [x0, y0, z0] = chunk.lower;
        let [x1, y1, z1] = chunk.upper;
        Ok(self.samples.slice(s![x0..=x1, y0..=y1, z0..=z1]))
    }

    /// Minimum and maximum sample, `None` for an empty grid
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.samples.iter().map(|v| v.to_f64()).fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }
}

impl<T: Scalar> From<Array3<T>> for ScalarGrid<T> {
    fn from(samples: Array3<T>) -> Self {
        Self::from_array(samples)
    }
}
