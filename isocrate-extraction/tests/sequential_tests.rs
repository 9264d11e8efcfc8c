//! Extraction with parallelism disabled
//!
//! Lives in its own test binary since the thread pool configuration is
//! process-wide.

use isocrate_extraction::parallel::{init_thread_pool, is_parallel_enabled, ThreadPoolConfig};
use isocrate_extraction::*;

#[test]
fn test_sequential_matches_geometry() {
    init_thread_pool(ThreadPoolConfig::default().with_enabled(false)).unwrap();
    assert!(!is_parallel_enabled());

    let grid = ScalarGrid::from_fn([8, 8, 8], |x, y, z| {
        let d = ((x as f64 - 4.0).powi(2) + (y as f64 - 4.0).powi(2) + (z as f64 - 4.0).powi(2)).sqrt();
        (128.0 + 40.0 * (2.7 - d)).clamp(0.0, 255.0) as f32
    });

    let single = marching_cubes(&grid, 128.0, 1).unwrap();
    let chunked = marching_cubes(&grid, 128.0, 2).unwrap();

    assert!(single.face_count() > 0);
    assert_eq!(single.face_count(), chunked.face_count());
    assert_eq!(single.vertex_count(), chunked.vertex_count());
    assert_eq!(chunked.boundary_edge_count(), 0);
}
