//! Image heightmap raster source.
//!
//! Any format the `image` crate is built with here (PNG, TIFF, BMP) is
//! decoded to 16-bit luminance and the raw sample value becomes the
//! elevation. Georeferencing comes from a sibling "world file" when one
//! exists; otherwise the raster is a unit-spaced north-up grid anchored
//! at the origin.

use std::fs;
use std::path::{Path, PathBuf};

use gridmesh::{ElevationGrid, MeshError, MeshResult, RasterGeometry, RasterSource};

/// An image heightmap decoded into memory.
pub struct HeightmapRaster {
    identifier: String,
    geometry: RasterGeometry,
    samples: Vec<f64>,
}

/// The usable part of a world file: pixel sizes plus the world position of
/// the CENTER of the top-left pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
struct WorldTransform {
    pixel_size_x: f64,
    pixel_size_y: f64,
    center_x: f64,
    center_y: f64,
}

// Plain heightmaps with no georeferencing get a unit north-up lattice.
const UNIT_GRID: WorldTransform = WorldTransform {
    pixel_size_x: 1.0,
    pixel_size_y: -1.0,
    center_x: 0.5,
    center_y: -0.5,
};

impl HeightmapRaster {
    /// Decodes `path` and resolves its georeferencing.
    pub fn open(path: &Path) -> MeshResult<Self> {
        let identifier = path.to_string_lossy().into_owned();

        let decoded = image::open(path).map_err(|err| {
            MeshError::source(identifier.as_str(), format!("cannot decode image: {err}"))
        })?;
        let luma = decoded.into_luma16();
        let (width, height) = luma.dimensions();
        let samples: Vec<f64> = luma.into_raw().into_iter().map(f64::from).collect();

        let transform = match world_file_for(path) {
            Some(world_path) => {
                let text = fs::read_to_string(&world_path).map_err(|err| {
                    MeshError::source(
                        identifier.as_str(),
                        format!("cannot read world file '{}': {err}", world_path.display()),
                    )
                })?;
                parse_world_file(&identifier, &text)?
            }
            None => UNIT_GRID,
        };

        Ok(Self {
            identifier,
            geometry: geometry_from(transform, width, height),
            samples,
        })
    }
}

impl RasterSource for HeightmapRaster {
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

/// World files place the CENTER of the top-left pixel; the geometry wants
/// the pixel's outer corner.
fn geometry_from(transform: WorldTransform, width: u32, height: u32) -> RasterGeometry {
    RasterGeometry {
        width: width as usize,
        height: height as usize,
        origin_x: transform.center_x - transform.pixel_size_x / 2.0,
        origin_y: transform.center_y - transform.pixel_size_y / 2.0,
        pixel_size_x: transform.pixel_size_x,
        pixel_size_y: transform.pixel_size_y,
    }
}

/// Looks for a sibling world file next to the image.
fn world_file_for(path: &Path) -> Option<PathBuf> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())?
        .to_ascii_lowercase();

    let mut candidates = vec![format!("{ext}w"), "wld".to_owned()];
    // Three-letter extensions also have a compressed form: first and last
    // letter plus 'w' (.tif -> .tfw, .png -> .pgw).
    let letters: Vec<char> = ext.chars().collect();
    if letters.len() == 3 {
        candidates.insert(1, format!("{}{}w", letters[0], letters[2]));
    }

    candidates
        .iter()
        .map(|candidate| path.with_extension(candidate))
        .find(|world| world.is_file())
}

/// Parses the six-line world file: x pixel size, two rotation terms (must
/// be zero; rotated rasters are unsupported), y pixel size, then the world
/// coordinates of the center of the top-left pixel.
fn parse_world_file(identifier: &str, text: &str) -> MeshResult<WorldTransform> {
    let fail = |message: String| MeshError::source(identifier, message);

    let values: Vec<f64> = text
        .split_whitespace()
        .map(|token| {
            token
                .parse::<f64>()
                .map_err(|_| fail(format!("bad world file value '{token}'")))
        })
        .collect::<MeshResult<_>>()?;

    if values.len() != 6 {
        return Err(fail(format!(
            "world file must hold 6 values, found {}",
            values.len()
        )));
    }

    if values[1] != 0.0 || values[2] != 0.0 {
        return Err(fail("rotated rasters are not supported".to_owned()));
    }

    Ok(WorldTransform {
        pixel_size_x: values[0],
        pixel_size_y: values[3],
        center_x: values[4],
        center_y: values[5],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_file_values_map_in_order() {
        let transform =
            parse_world_file("hill.tif", "10.0\n0.0\n0.0\n-10.0\n430005.0\n4579995.0\n").unwrap();
        assert_eq!(
            transform,
            WorldTransform {
                pixel_size_x: 10.0,
                pixel_size_y: -10.0,
                center_x: 430_005.0,
                center_y: 4_579_995.0,
            }
        );
    }

    #[test]
    fn corner_origin_is_half_a_pixel_out_from_the_center() {
        let transform =
            parse_world_file("hill.tif", "10.0 0.0 0.0 -10.0 430005.0 4579995.0").unwrap();
        let geometry = geometry_from(transform, 4, 3);
        assert_eq!(geometry.origin_x, 430_000.0);
        assert_eq!(geometry.origin_y, 4_580_000.0);
    }

    #[test]
    fn unreferenced_images_get_a_unit_north_up_grid() {
        let geometry = geometry_from(UNIT_GRID, 4, 3);
        assert_eq!(geometry.origin_x, 0.0);
        assert_eq!(geometry.origin_y, 0.0);
        assert_eq!(geometry.pixel_size_x, 1.0);
        assert_eq!(geometry.pixel_size_y, -1.0);
    }

    #[test]
    fn rotated_world_files_are_rejected() {
        let err = parse_world_file("hill.tif", "10.0 0.1 0.0 -10.0 0.0 0.0").unwrap_err();
        assert!(format!("{err}").contains("rotated"));
    }

    #[test]
    fn short_world_files_are_rejected() {
        let err = parse_world_file("hill.tif", "10.0 0.0 0.0").unwrap_err();
        assert!(format!("{err}").contains("6 values"));
    }
}
