//! Grid-to-mesh transformation: vertices from raster geometry, faces from
//! the 2x2 cell neighborhoods, composed by [`Object3D`].

use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{MeshError, MeshResult};
use crate::obj::{self, AxisOrder};
use crate::raster::{ElevationGrid, RasterGeometry, RasterSource};

/// Face generation scheme: two triangles per grid cell, or one quad.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TopologyMode {
    Triangle,
    Quad,
}

impl fmt::Display for TopologyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TopologyMode::Triangle => "triangle",
            TopologyMode::Quad => "quad",
        };

        f.write_str(s)
    }
}

/// A mesh face as 1-based vertex indices, ready for OBJ output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Face {
    Triangle([u32; 3]),
    Quad([u32; 4]),
}

impl Face {
    /// The face's vertex indices: three of them, or four for a quad.
    pub fn indices(&self) -> &[u32] {
        match self {
            Face::Triangle(indices) => indices,
            Face::Quad(indices) => indices,
        }
    }
}

/// Computes the world-space vertex grid and returns it together with the
/// offset actually subtracted.
///
/// One vertex per raster cell, row-major. When `offset` is `None` it
/// defaults to `(min x, min y, 0)`; the minimum depends on the sign of
/// the pixel sizes, so for a north-up raster (negative row step) the
/// minimum y is the last row's, not the origin's. z is never auto-offset.
///
/// Panics if `grid`'s shape disagrees with `geometry`; callers going
/// through [`Object3D::from_raster`] get that reported as an error first.
pub fn vertex_grid(
    geometry: &RasterGeometry,
    grid: &ElevationGrid,
    offset: Option<[f64; 3]>,
) -> (Vec<[f64; 3]>, [f64; 3]) {
    assert!(
        grid.width() == geometry.width && grid.height() == geometry.height,
        "elevation grid shape must match the raster geometry"
    );

    let xs: Vec<f64> = (0..geometry.width)
        .map(|col| col as f64 * geometry.pixel_size_x + geometry.origin_x)
        .collect();
    let ys: Vec<f64> = (0..geometry.height)
        .map(|row| row as f64 * geometry.pixel_size_y + geometry.origin_y)
        .collect();

    let offset = offset.unwrap_or_else(|| {
        let min_x = xs.iter().copied().fold(f64::INFINITY, f64::min);
        let min_y = ys.iter().copied().fold(f64::INFINITY, f64::min);
        [min_x, min_y, 0.0]
    });

    debug!("removed offset: [{}, {}, {}]", offset[0], offset[1], offset[2]);

    let mut vertices = Vec::with_capacity(geometry.width * geometry.height);
    for (row, &y) in ys.iter().enumerate() {
        for (col, &x) in xs.iter().enumerate() {
            vertices.push([
                x - offset[0],
                y - offset[1],
                grid.get(row, col) - offset[2],
            ]);
        }
    }

    (vertices, offset)
}

/// Generates faces over every 2x2 cell neighborhood, row-major over the
/// anchors, with 1-based indices.
///
/// The corners of the cell anchored at `(row, col)` are the flat indices
/// `a`, `a + width`, `a + width + 1`, `a + 1` with `a = row * width + col`.
/// Quad mode emits them as one face; triangle mode splits along the fixed
/// top-left to bottom-right diagonal. A grid with fewer than two rows or
/// columns has no 2x2 neighborhood and yields no faces.
///
/// `width * height` must fit in `u32`; [`Object3D::from_raster`] checks
/// this before building.
pub fn face_topology(width: usize, height: usize, mode: TopologyMode) -> Vec<Face> {
    if width < 2 || height < 2 {
        return Vec::new();
    }

    let cells = (width - 1) * (height - 1);
    let mut faces = Vec::with_capacity(match mode {
        TopologyMode::Triangle => cells * 2,
        TopologyMode::Quad => cells,
    });

    for row in 0..height - 1 {
        for col in 0..width - 1 {
            // 1-based corner indices of the cell anchored at (row, col).
            let a = (row * width + col) as u32 + 1;
            let below = a + width as u32;

            match mode {
                TopologyMode::Quad => {
                    faces.push(Face::Quad([a, below, below + 1, a + 1]));
                }
                TopologyMode::Triangle => {
                    faces.push(Face::Triangle([a, below, below + 1]));
                    faces.push(Face::Triangle([a, below + 1, a + 1]));
                }
            }
        }
    }

    faces
}

/// A raster turned into mesh geometry, ready for OBJ serialization.
///
/// [`Object3D::from_raster`] performs the whole build, so there is no
/// partially-built state to misuse. The result is immutable and can be
/// written any number of times, to different destinations.
#[derive(Debug, Clone)]
pub struct Object3D {
    source: String,
    offset: [f64; 3],
    mode: TopologyMode,
    vertices: Vec<[f64; 3]>,
    faces: Vec<Face>,
}

impl Object3D {
    /// Builds the full mesh from `source`.
    ///
    /// `offset` is subtracted from every vertex; `None` means the
    /// `(min x, min y, 0)` default. The offset actually used is recorded
    /// on the object and queryable via [`Object3D::offset`].
    pub fn from_raster<S>(
        source: &S,
        offset: Option<[f64; 3]>,
        mode: TopologyMode,
    ) -> MeshResult<Self>
    where
        S: RasterSource + ?Sized,
    {
        let id = source.identifier();
        let geometry = source.geometry()?;
        geometry.validate(id)?;

        let grid = source.read_elevation()?;
        if grid.width() != geometry.width || grid.height() != geometry.height {
            return Err(MeshError::source(
                id,
                format!(
                    "elevation grid is {} x {} but the geometry says {} x {}",
                    grid.width(),
                    grid.height(),
                    geometry.width,
                    geometry.height
                ),
            ));
        }

        let (vertices, offset) = vertex_grid(&geometry, &grid, offset);
        let faces = face_topology(geometry.width, geometry.height, mode);

        debug!(
            "built {} vertices and {} {} faces from '{}'",
            vertices.len(),
            faces.len(),
            mode,
            id
        );

        Ok(Self {
            source: id.to_owned(),
            offset,
            mode,
            vertices,
            faces,
        })
    }

    /// Identifier of the raster this mesh came from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The offset subtracted from every vertex, whether supplied by the
    /// caller or computed as the default.
    pub fn offset(&self) -> [f64; 3] {
        self.offset
    }

    pub fn topology(&self) -> TopologyMode {
        self.mode
    }

    pub fn vertices(&self) -> &[[f64; 3]] {
        &self.vertices
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Serializes the mesh to `path`, or (when no path is given) to the
    /// source identifier with its extension replaced by `obj`. Returns the
    /// path written. Repeatable; the mesh is not consumed.
    pub fn write_obj(&self, path: Option<&Path>, order: AxisOrder) -> MeshResult<PathBuf> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_destination(&self.source),
        };

        obj::write_obj_file(&path, self, order)?;
        Ok(path)
    }

    /// Serializes the mesh into any writer, for callers that manage their
    /// own destinations.
    pub fn write_obj_to<W: Write>(&self, writer: &mut W, order: AxisOrder) -> io::Result<()> {
        obj::write_obj(writer, self, order)
    }
}

fn default_destination(source: &str) -> PathBuf {
    Path::new(source).with_extension("obj")
}
