//! ESRI ASCII grid raster source.
//!
//! The format is a short keyword header (`ncols`, `nrows`,
//! `xllcorner`/`xllcenter`, `yllcorner`/`yllcenter`, `cellsize` and an
//! optional `nodata_value`) followed by `ncols * nrows` samples, top row
//! first. Keys are case-insensitive and may appear in any order. No-data
//! samples are kept literally; nothing downstream interprets them.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use gridmesh::{ElevationGrid, MeshError, MeshResult, RasterGeometry, RasterSource};

/// An ESRI ASCII grid loaded into memory.
#[derive(Debug, Clone)]
pub struct AscRaster {
    identifier: String,
    geometry: RasterGeometry,
    samples: Vec<f64>,
}

impl AscRaster {
    /// Reads and parses `path` in one pass.
    pub fn open(path: &Path) -> MeshResult<Self> {
        let identifier = path.to_string_lossy().into_owned();

        let text = fs::read_to_string(path).map_err(|err| {
            MeshError::source(identifier.as_str(), format!("cannot read file: {err}"))
        })?;

        let (geometry, samples) = parse_asc(&identifier, &text)?;

        Ok(Self {
            identifier,
            geometry,
            samples,
        })
    }
}

impl RasterSource for AscRaster {
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

/// Splits the header keywords from the sample stream and maps the header
/// onto an axis-aligned geometry with a top-left origin and a negative
/// row step.
fn parse_asc(identifier: &str, text: &str) -> MeshResult<(RasterGeometry, Vec<f64>)> {
    let fail = |message: String| MeshError::source(identifier, message);

    let mut header: HashMap<String, f64> = HashMap::new();
    let mut samples: Vec<f64> = Vec::new();
    let mut tokens = text.split_whitespace();

    while let Some(token) = tokens.next() {
        if token
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
        {
            if !samples.is_empty() {
                return Err(fail(format!(
                    "unexpected keyword '{token}' after sample data"
                )));
            }

            let value = tokens
                .next()
                .ok_or_else(|| fail(format!("header keyword '{token}' has no value")))?;
            let value: f64 = value.parse().map_err(|_| {
                fail(format!(
                    "header keyword '{token}' has a non-numeric value '{value}'"
                ))
            })?;

            header.insert(token.to_ascii_lowercase(), value);
        } else {
            let sample: f64 = token
                .parse()
                .map_err(|_| fail(format!("bad elevation sample '{token}'")))?;
            samples.push(sample);
        }
    }

    let field = |name: &str| header.get(name).copied();
    let required =
        |name: &str| field(name).ok_or_else(|| fail(format!("header is missing '{name}'")));
    let dimension = |name: &str| -> MeshResult<usize> {
        let value = required(name)?;
        if value.fract() != 0.0 || value < 1.0 {
            return Err(fail(format!(
                "'{name}' must be a positive integer, got {value}"
            )));
        }
        Ok(value as usize)
    };

    let ncols = dimension("ncols")?;
    let nrows = dimension("nrows")?;

    let cellsize = required("cellsize")?;
    if cellsize <= 0.0 {
        return Err(fail(format!("'cellsize' must be positive, got {cellsize}")));
    }

    // Corner-registered grids state the edge directly; center-registered
    // ones are shifted by half a cell.
    let west = match (field("xllcorner"), field("xllcenter")) {
        (Some(corner), None) => corner,
        (None, Some(center)) => center - cellsize / 2.0,
        (Some(_), Some(_)) => {
            return Err(fail("both 'xllcorner' and 'xllcenter' present".to_owned()))
        }
        (None, None) => {
            return Err(fail(
                "header is missing 'xllcorner' or 'xllcenter'".to_owned(),
            ))
        }
    };
    let south = match (field("yllcorner"), field("yllcenter")) {
        (Some(corner), None) => corner,
        (None, Some(center)) => center - cellsize / 2.0,
        (Some(_), Some(_)) => {
            return Err(fail("both 'yllcorner' and 'yllcenter' present".to_owned()))
        }
        (None, None) => {
            return Err(fail(
                "header is missing 'yllcorner' or 'yllcenter'".to_owned(),
            ))
        }
    };

    if samples.len() != ncols * nrows {
        return Err(fail(format!(
            "expected {} samples ({ncols} x {nrows}), found {}",
            ncols * nrows,
            samples.len()
        )));
    }

    // Samples run top row first, so the origin sits on the NORTH edge and
    // rows step south.
    let geometry = RasterGeometry {
        width: ncols,
        height: nrows,
        origin_x: west,
        origin_y: south + nrows as f64 * cellsize,
        pixel_size_x: cellsize,
        pixel_size_y: -cellsize,
    };

    Ok((geometry, samples))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRID: &str = "\
ncols 3
nrows 2
xllcorner 100.0
yllcorner 200.0
cellsize 10.0
NODATA_value -9999
1 2 3
4 -9999 6
";

    #[test]
    fn corner_registered_header_maps_to_a_north_edge_origin() {
        let (geometry, samples) = parse_asc("grid.asc", GRID).unwrap();
        assert_eq!(geometry.width, 3);
        assert_eq!(geometry.height, 2);
        assert_eq!(geometry.origin_x, 100.0);
        assert_eq!(geometry.origin_y, 220.0);
        assert_eq!(geometry.pixel_size_x, 10.0);
        assert_eq!(geometry.pixel_size_y, -10.0);
        assert_eq!(samples, vec![1.0, 2.0, 3.0, 4.0, -9999.0, 6.0]);
    }

    #[test]
    fn center_registration_shifts_by_half_a_cell() {
        let text = GRID
            .replace("xllcorner 100.0", "xllcenter 100.0")
            .replace("yllcorner 200.0", "yllcenter 200.0");
        let (geometry, _) = parse_asc("grid.asc", &text).unwrap();
        assert_eq!(geometry.origin_x, 95.0);
        assert_eq!(geometry.origin_y, 215.0);
    }

    #[test]
    fn no_data_samples_pass_through_literally() {
        let (_, samples) = parse_asc("grid.asc", GRID).unwrap();
        assert_eq!(samples[4], -9999.0);
    }

    #[test]
    fn sample_count_must_match_the_header() {
        let text = GRID.replace("ncols 3", "ncols 4");
        let err = parse_asc("grid.asc", &text).unwrap_err();
        assert!(format!("{err}").contains("expected 8 samples"));
    }

    #[test]
    fn missing_keys_are_reported_by_name() {
        let text = GRID.replace("cellsize 10.0\n", "");
        let err = parse_asc("grid.asc", &text).unwrap_err();
        assert!(format!("{err}").contains("cellsize"));
    }

    #[test]
    fn header_keys_are_case_insensitive() {
        let text = GRID.replace("ncols", "NCOLS").replace("cellsize", "CELLSIZE");
        assert!(parse_asc("grid.asc", &text).is_ok());
    }
}
