//! Raster geometry and elevation access.
//!
//! The mesh builders never read raster files themselves; they consume a
//! [`RasterSource`] that supplies grid dimensions, the affine
//! pixel-to-world transform and one bulk elevation read.

use crate::error::{MeshError, MeshResult};

/// Axis-aligned raster geometry: grid dimensions plus the mapping
/// `x = col * pixel_size_x + origin_x`, `y = row * pixel_size_y + origin_y`.
///
/// Immutable once read from a source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterGeometry {
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
    /// World x of the grid origin (top-left cell).
    pub origin_x: f64,
    /// World y of the grid origin (top-left cell).
    pub origin_y: f64,
    /// World units per column step.
    pub pixel_size_x: f64,
    /// World units per row step; negative for north-up rasters.
    pub pixel_size_y: f64,
}

impl RasterGeometry {
    /// Builds a geometry from a 6-coefficient geo-transform
    /// `[origin_x, pixel_size_x, rot, origin_y, rot, pixel_size_y]`.
    ///
    /// Only the four axis-aligned coefficients are used; the two rotation
    /// terms are ignored.
    pub fn from_geo_transform(width: usize, height: usize, transform: [f64; 6]) -> Self {
        Self {
            width,
            height,
            origin_x: transform[0],
            pixel_size_x: transform[1],
            origin_y: transform[3],
            pixel_size_y: transform[5],
        }
    }

    /// Checks the preconditions the builders rely on, before any vertex
    /// generation happens.
    ///
    /// Zero dimensions are a source error; a zero pixel size, or a vertex
    /// count that does not fit the `u32` face index space, is a geometry
    /// error.
    pub fn validate(&self, path: &str) -> MeshResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(MeshError::source(
                path,
                format!("raster has zero dimensions ({} x {})", self.width, self.height),
            ));
        }

        if self.pixel_size_x == 0.0 || self.pixel_size_y == 0.0 {
            return Err(MeshError::geometry(
                path,
                format!(
                    "pixel size must be non-zero, got ({}, {})",
                    self.pixel_size_x, self.pixel_size_y
                ),
            ));
        }

        match self.width.checked_mul(self.height) {
            Some(cells) if cells <= u32::MAX as usize => Ok(()),
            _ => Err(MeshError::geometry(
                path,
                format!(
                    "{} x {} cells exceed the face index space",
                    self.width, self.height
                ),
            )),
        }
    }
}

/// Row-major elevation samples with their grid dimensions.
///
/// No-data values are not interpreted here; whatever the source supplies
/// (including NaN) flows through to the vertex z coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationGrid {
    width: usize,
    height: usize,
    samples: Vec<f64>,
}

impl ElevationGrid {
    /// Wraps `samples` (row-major, top row first) after checking that the
    /// length agrees with the stated dimensions. `source` names the raster
    /// in the error on disagreement.
    pub fn new(
        source: &str,
        width: usize,
        height: usize,
        samples: Vec<f64>,
    ) -> MeshResult<Self> {
        let expected = width * height;
        if samples.len() != expected {
            return Err(MeshError::source(
                source,
                format!(
                    "elevation grid holds {} samples, expected {} ({} x {})",
                    samples.len(),
                    expected,
                    width,
                    height
                ),
            ));
        }

        Ok(Self {
            width,
            height,
            samples,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// The sample at `row`, `col`.
    ///
    /// Panics when indexed outside the grid, like any slice access.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.samples[row * self.width + col]
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }
}

/// A single-band raster, opened and ready to be read once.
///
/// This is the seam between raster decoding (file formats, drivers) and
/// the mesh builders: the builders only ever see this trait.
pub trait RasterSource {
    /// Path or name of the raster; used in error messages, the OBJ header
    /// and the default output destination.
    fn identifier(&self) -> &str;

    /// Grid dimensions and affine transform.
    fn geometry(&self) -> MeshResult<RasterGeometry>;

    /// The full height x width sample matrix, row-major, top row first.
    /// Called once per build.
    fn read_elevation(&self) -> MeshResult<ElevationGrid>;
}

/// A raster already resident in memory, for callers that compute their
/// grids (and for tests).
#[derive(Debug, Clone)]
pub struct InMemoryRaster {
    identifier: String,
    geometry: RasterGeometry,
    samples: Vec<f64>,
}

impl InMemoryRaster {
    pub fn new(
        identifier: impl Into<String>,
        geometry: RasterGeometry,
        samples: Vec<f64>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            geometry,
            samples,
        }
    }
}

impl RasterSource for InMemoryRaster {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn geometry(&self) -> MeshResult<RasterGeometry> {
        Ok(self.geometry)
    }

    fn read_elevation(&self) -> MeshResult<ElevationGrid> {
        ElevationGrid::new(
            &self.identifier,
            self.geometry.width,
            self.geometry.height,
            self.samples.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geo_transform_keeps_only_axis_aligned_coefficients() {
        let geometry =
            RasterGeometry::from_geo_transform(10, 5, [100.0, 2.5, 9.0, 200.0, 9.0, -2.5]);
        assert_eq!(geometry.width, 10);
        assert_eq!(geometry.height, 5);
        assert_eq!(geometry.origin_x, 100.0);
        assert_eq!(geometry.origin_y, 200.0);
        assert_eq!(geometry.pixel_size_x, 2.5);
        assert_eq!(geometry.pixel_size_y, -2.5);
    }

    #[test]
    fn zero_dimensions_are_a_source_error() {
        let geometry = RasterGeometry::from_geo_transform(0, 5, [0.0, 1.0, 0.0, 0.0, 0.0, -1.0]);
        assert!(matches!(
            geometry.validate("empty.asc"),
            Err(MeshError::Source { .. })
        ));
    }

    #[test]
    fn zero_pixel_size_is_a_geometry_error() {
        let geometry = RasterGeometry::from_geo_transform(4, 4, [0.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        assert!(matches!(
            geometry.validate("flat.asc"),
            Err(MeshError::Geometry { .. })
        ));
    }

    #[test]
    fn elevation_grid_shape_must_match() {
        let err = ElevationGrid::new("short.asc", 3, 3, vec![0.0; 7]).unwrap_err();
        assert!(matches!(err, MeshError::Source { .. }));
        assert!(format!("{err}").contains("7 samples"));
    }

    #[test]
    fn elevation_grid_is_row_major() {
        let grid = ElevationGrid::new("g.asc", 3, 2, (0..6).map(f64::from).collect()).unwrap();
        assert_eq!(grid.get(0, 2), 2.0);
        assert_eq!(grid.get(1, 0), 3.0);
    }
}
