use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use gridmesh::{AxisOrder, Object3D, RasterSource, TopologyMode};

mod asc;
mod heightmap;

use asc::AscRaster;
use heightmap::HeightmapRaster;

/// `dem2obj` - converts single-band elevation rasters into OBJ
/// tessellations: one vertex per cell placed by the raster's affine
/// transform, two triangles (or one quad) per 2x2 cell neighborhood.
#[derive(Parser, Debug, Clone)]
#[command(name = "dem2obj", version)]
struct Args {
    /// Input rasters: ESRI ASCII grids (.asc/.agr) or image heightmaps
    /// (.png/.tif/.tiff/.bmp, georeferenced by a world file when present).
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output OBJ path (single input only; default: input path with the
    /// extension replaced by .obj).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Computes X-OFFSET_X, Y-OFFSET_Y, Z-OFFSET_Z before writing
    /// (default: min(X) min(Y) 0).
    #[arg(
        long,
        num_args = 3,
        value_names = ["OFFSET_X", "OFFSET_Y", "OFFSET_Z"],
        allow_negative_numbers = true
    )]
    offset: Option<Vec<f64>>,

    /// Order in which vertex coordinates are written ('yzx' is what
    /// Blender expects).
    #[arg(long, default_value = "yzx")]
    order: String,

    /// Quadrilateral tessellation instead of triangular.
    #[arg(short, long)]
    quad: bool,

    /// Print processing details (debug-level logging; RUST_LOG overrides).
    #[arg(short, long)]
    verbose: bool,
}

/// Picks a raster backend from the input extension.
fn open_source(path: &Path) -> Result<Box<dyn RasterSource>> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "asc" | "agr" => Ok(Box::new(AscRaster::open(path)?)),
        "png" | "tif" | "tiff" | "bmp" => Ok(Box::new(HeightmapRaster::open(path)?)),
        _ => bail!("unsupported raster format: '{}'", path.display()),
    }
}

fn process_one(path: &Path, args: &Args, order: AxisOrder, mode: TopologyMode) -> Result<()> {
    let source = open_source(path)?;

    let offset = args
        .offset
        .as_ref()
        .map(|values| [values[0], values[1], values[2]]);

    let mesh = Object3D::from_raster(source.as_ref(), offset, mode)
        .with_context(|| format!("building mesh from '{}'", path.display()))?;

    let written = mesh
        .write_obj(args.output.as_deref(), order)
        .with_context(|| format!("writing tessellation for '{}'", path.display()))?;

    info!(
        "OK {} -> {} ({} vertices, {} faces)",
        path.display(),
        written.display(),
        mesh.vertices().len(),
        mesh.faces().len()
    );

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default()
            .default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .init();

    if args.output.is_some() && args.inputs.len() > 1 {
        bail!(
            "--output only applies to a single input, got {}",
            args.inputs.len()
        );
    }

    let order: AxisOrder = args.order.parse()?;
    let mode = if args.quad {
        TopologyMode::Quad
    } else {
        TopologyMode::Triangle
    };

    // Each raster gets its own Object3D; nothing is shared between inputs.
    let failures = AtomicUsize::new(0);
    args.inputs.par_iter().for_each(|input| {
        if let Err(err) = process_one(input, &args, order, mode) {
            warn!("{}: {:#}", input.display(), err);
            failures.fetch_add(1, Ordering::Relaxed);
        }
    });

    let failed = failures.load(Ordering::Relaxed);
    if failed > 0 {
        bail!("{} of {} inputs failed", failed, args.inputs.len());
    }

    Ok(())
}
