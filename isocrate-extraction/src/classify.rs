//! Cube classification

use crate::grid::Scalar;
use crate::tables::{corner_position, triangle_edges, EDGE_TABLE};
use ndarray::ArrayView3;

/// 8-bit marching cubes case: bit `i` is set when corner `i` is at or above
/// the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CubeCase(u8);

impl CubeCase {
    pub fn from_index(index: u8) -> Self {
        Self(index)
    }

    pub fn index(self) -> u8 {
        self.0
    }

    /// All corners on the same side of the threshold
    pub fn is_trivial(self) -> bool {
        self.0 == 0 || self.0 == u8::MAX
    }

    /// Mask of the cube edges crossed by the surface
    pub fn crossed_edges(self) -> u16 {
        EDGE_TABLE[self.0 as usize]
    }

    /// Triangles of this case, each as three cube edge indices
    pub fn triangles(self) -> impl Iterator<Item = [usize; 3]> {
        triangle_edges(self.0)
            .chunks_exact(3)
            .map(|t| [t[0] as usize, t[1] as usize, t[2] as usize])
    }

    pub fn triangle_count(self) -> usize {
        triangle_edges(self.0).len() / 3
    }
}

/// Classify a cube from its corner samples, given in corner order
pub fn classify_corners(values: &[f64; 8], threshold: f64) -> CubeCase {
    let index = values
        .iter()
        .enumerate()
        .filter(|&(_, &v)| threshold <= v)
        .fold(0u8, |acc, (i, _)| acc | (1 << i));
    CubeCase(index)
}

/// Read the 8 corners of the cube anchored at `anchor` and classify it
///
/// Returns the case together with the widened corner samples.
///
/// # Panics
///
/// Panics if `anchor + 1` is outside `samples` along any axis.
pub fn classify_cube<T: Scalar>(
    samples: &ArrayView3<'_, T>,
    anchor: [usize; 3],
    threshold: f64,
) -> (CubeCase, [f64; 8]) {
    let values: [f64; 8] = std::array::from_fn(|corner| {
        let [x, y, z] = corner_position(anchor, corner);
        samples[(x, y, z)].to_f64()
    });
    (classify_corners(&values, threshold), values)
}
