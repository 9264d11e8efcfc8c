//! Sphere extraction demo
//!
//! Builds a u8 volume holding a smooth sphere, extracts its isosurface with
//! chunked parallel marching cubes and writes the mesh to OBJ or PLY.

use anyhow::{ensure, Context, Result};
use clap::Parser;
use isocrate_extraction::parallel::{init_thread_pool, ThreadPoolConfig};
use isocrate_extraction::{ExtractionConfig, IsosurfaceExtractor, ScalarGrid};
use std::path::PathBuf;
use std::time::Instant;

/// Extract the isosurface of a synthetic sphere volume
#[derive(Parser, Debug)]
#[command(name = "extract_sphere")]
#[command(about = "Extracts a sphere isosurface with chunked marching cubes")]
struct Args {
    /// Samples per axis
    #[arg(long, default_value_t = 64)]
    size: usize,

    /// Sphere radius in samples (default: 40% of size)
    #[arg(long)]
    radius: Option<f64>,

    /// Isosurface threshold
    #[arg(long, default_value_t = 128.0)]
    threshold: f64,

    /// Chunks per axis; must divide size
    #[arg(long, default_value_t = 4)]
    divisions: usize,

    /// Worker threads (default: one per core)
    #[arg(long)]
    threads: Option<usize>,

    /// Keep duplicate vertices on chunk seams
    #[arg(long)]
    no_weld: bool,

    /// Distance under which seam vertices are welded
    #[arg(long, default_value_t = 1e-4)]
    weld_tolerance: f32,

    /// Output mesh (.obj or .ply)
    #[arg(short, long, default_value = "sphere.obj")]
    output: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();
    ensure!(args.size >= 2, "size must be at least 2, got {}", args.size);

    let mut pool = ThreadPoolConfig::default();
    if let Some(threads) = args.threads {
        pool = pool.with_threads(threads);
    }
    init_thread_pool(pool).context("Failed to initialize thread pool")?;

    let radius = args.radius.unwrap_or(args.size as f64 * 0.4);
    let center = (args.size - 1) as f64 / 2.0;
    let grid = ScalarGrid::from_fn([args.size; 3], |x, y, z| {
        let d = ((x as f64 - center).powi(2) + (y as f64 - center).powi(2) + (z as f64 - center).powi(2))
            .sqrt();
        (128.0 + 32.0 * (radius - d)).clamp(0.0, 255.0) as u8
    });

    println!("isocrate sphere extraction");
    println!("==========================");
    println!("Volume: {0}x{0}x{0} samples, radius {1:.2}", args.size, radius);
    println!("Threshold: {}, divisions: {}", args.threshold, args.divisions);

    let config = ExtractionConfig::default()
        .with_threshold(args.threshold)
        .with_divisions(args.divisions)
        .with_weld_seams(!args.no_weld)
        .with_weld_tolerance(args.weld_tolerance);

    let start = Instant::now();
    let mesh = IsosurfaceExtractor::new(config)
        .extract(&grid)
        .context("Extraction failed")?;
    let elapsed = start.elapsed();

    println!(
        "\nExtracted {} vertices and {} faces in {:.2?}",
        mesh.vertex_count(),
        mesh.face_count(),
        elapsed
    );
    println!("Open boundary edges: {}", mesh.boundary_edge_count());
    if let Some((min, max)) = mesh.bounding_box() {
        println!(
            "Bounds: ({:.2}, {:.2}, {:.2}) - ({:.2}, {:.2}, {:.2})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
    }

    isocrate_io::write_mesh(&mesh, &args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    println!("Wrote {}", args.output.display());

    Ok(())
}
