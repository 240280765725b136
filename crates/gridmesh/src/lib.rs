//! Grid-to-mesh conversion for single-band elevation rasters.
//!
//! Takes a regular grid of height samples with a known origin and pixel
//! spacing and turns it into a 3D polygon mesh in Wavefront OBJ text:
//!
//! - one vertex per raster cell, row-major, placed by the affine
//!   pixel-to-world transform;
//! - two triangles (fixed top-left to bottom-right diagonal) or one quad
//!   per 2x2 cell neighborhood;
//! - an offset subtracted from every vertex, by default the minimum-x /
//!   minimum-y corner with z untouched, so downstream tools see geometry
//!   near the origin;
//! - 1-based face indices and a caller-chosen output column order.
//!
//! Raster decoding is a collaborator, not part of this crate: anything
//! implementing [`RasterSource`] can feed the builders. [`InMemoryRaster`]
//! covers callers that already hold a grid.

pub mod error;
pub mod mesh;
pub mod obj;
pub mod raster;

pub use error::{MeshError, MeshResult};
pub use mesh::{face_topology, vertex_grid, Face, Object3D, TopologyMode};
pub use obj::AxisOrder;
pub use raster::{ElevationGrid, InMemoryRaster, RasterGeometry, RasterSource};
