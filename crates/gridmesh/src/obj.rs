//! Wavefront OBJ serialization.
//!
//! Output layout (plain UTF-8 text, one record per line):
//!
//! ```text
//! # Tessellation generated from file: '<input>'
//! # vertex coordinates order: yzx
//! # Vertices: <N>
//! # Faces: <M>
//! v <c0> <c1> <c2>           one line per vertex, columns permuted per order
//!                            (blank line)
//! f <i0> <i1> <i2> [<i3>]    one line per face, indices 1-based
//! ```
//!
//! Coordinates use Rust's default float formatting: the shortest
//! round-trip representation, locale independent, no fixed precision.
//! Faces carry three or four indices depending on the topology mode.

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use crate::error::{MeshError, MeshResult};
use crate::mesh::Object3D;

/// A validated permutation of the `x`, `y`, `z` output columns.
///
/// `"yzx"` writes the y component first, then z, then x (the layout
/// Blender imports without remapping). Parsed once per write; anything
/// that is not a permutation of exactly `xyz` is rejected before any
/// output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AxisOrder {
    // columns[i] is the vertex component written in output column i.
    columns: [usize; 3],
}

impl AxisOrder {
    /// The identity order `xyz`.
    pub const XYZ: AxisOrder = AxisOrder { columns: [0, 1, 2] };

    /// Applies the permutation to one vertex.
    pub fn permute(&self, vertex: [f64; 3]) -> [f64; 3] {
        [
            vertex[self.columns[0]],
            vertex[self.columns[1]],
            vertex[self.columns[2]],
        ]
    }
}

impl FromStr for AxisOrder {
    type Err = MeshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |message: &str| MeshError::AxisOrder {
            order: s.to_owned(),
            message: message.to_owned(),
        };

        if s.chars().count() != 3 {
            return Err(invalid("expected exactly three axis letters"));
        }

        let mut columns = [0usize; 3];
        let mut seen = [false; 3];

        for (slot, ch) in columns.iter_mut().zip(s.chars()) {
            let axis = match ch {
                'x' => 0,
                'y' => 1,
                'z' => 2,
                _ => return Err(invalid("only the letters x, y and z are allowed")),
            };

            if seen[axis] {
                return Err(invalid("each axis must appear exactly once"));
            }

            seen[axis] = true;
            *slot = axis;
        }

        Ok(AxisOrder { columns })
    }
}

impl fmt::Display for AxisOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const LETTERS: [char; 3] = ['x', 'y', 'z'];
        for &axis in &self.columns {
            write!(f, "{}", LETTERS[axis])?;
        }

        Ok(())
    }
}

/// Writes the mesh as OBJ text into `writer`.
pub fn write_obj<W: Write>(writer: &mut W, mesh: &Object3D, order: AxisOrder) -> io::Result<()> {
    writeln!(
        writer,
        "# Tessellation generated from file: '{}'",
        mesh.source()
    )?;
    writeln!(writer, "# vertex coordinates order: {order}")?;
    writeln!(writer, "# Vertices: {}", mesh.vertices().len())?;
    writeln!(writer, "# Faces: {}", mesh.faces().len())?;

    for &vertex in mesh.vertices() {
        let [c0, c1, c2] = order.permute(vertex);
        writeln!(writer, "v {c0} {c1} {c2}")?;
    }

    writeln!(writer)?;

    for face in mesh.faces() {
        write!(writer, "f")?;
        for index in face.indices() {
            write!(writer, " {index}")?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

/// Creates (or overwrites) `path` and writes the mesh there.
///
/// The destination handle is buffered and released on every exit path. No
/// atomicity: a failure part-way through may leave a truncated file.
pub fn write_obj_file<P: AsRef<Path>>(
    path: P,
    mesh: &Object3D,
    order: AxisOrder,
) -> MeshResult<()> {
    let path = path.as_ref();
    let io_err = |source: io::Error| MeshError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    write_obj(&mut writer, mesh, order).map_err(io_err)?;
    writer.flush().map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::TopologyMode;
    use crate::raster::{InMemoryRaster, RasterGeometry};

    fn sample_mesh(mode: TopologyMode) -> Object3D {
        let geometry =
            RasterGeometry::from_geo_transform(2, 2, [0.0, 1.0, 0.0, 0.0, 0.0, -1.0]);
        let source = InMemoryRaster::new("tile.asc", geometry, vec![10.0, 20.0, 30.0, 40.0]);
        Object3D::from_raster(&source, None, mode).unwrap()
    }

    fn render(mesh: &Object3D, order: AxisOrder) -> String {
        let mut out = Vec::new();
        write_obj(&mut out, mesh, order).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn vertex_lines(text: &str) -> Vec<[f64; 3]> {
        text.lines()
            .filter(|line| line.starts_with("v "))
            .map(|line| {
                let mut fields = line
                    .split_whitespace()
                    .skip(1)
                    .map(|token| token.parse::<f64>().unwrap());
                [
                    fields.next().unwrap(),
                    fields.next().unwrap(),
                    fields.next().unwrap(),
                ]
            })
            .collect()
    }

    #[test]
    fn axis_order_parses_every_permutation() {
        for order in ["xyz", "xzy", "yxz", "yzx", "zxy", "zyx"] {
            assert_eq!(order.parse::<AxisOrder>().unwrap().to_string(), order);
        }
    }

    #[test]
    fn axis_order_rejects_non_permutations() {
        for order in ["", "xy", "xyzz", "xxy", "abc", "xyw", "XYZ"] {
            assert!(
                matches!(order.parse::<AxisOrder>(), Err(MeshError::AxisOrder { .. })),
                "'{order}' should be rejected"
            );
        }
    }

    #[test]
    fn header_lists_source_order_and_counts() {
        let text = render(&sample_mesh(TopologyMode::Triangle), AxisOrder::XYZ);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "# Tessellation generated from file: 'tile.asc'");
        assert_eq!(lines[1], "# vertex coordinates order: xyz");
        assert_eq!(lines[2], "# Vertices: 4");
        assert_eq!(lines[3], "# Faces: 2");
    }

    #[test]
    fn identity_order_writes_raw_coordinates() {
        let mesh = sample_mesh(TopologyMode::Triangle);
        let text = render(&mesh, AxisOrder::XYZ);
        assert_eq!(vertex_lines(&text), mesh.vertices());
    }

    #[test]
    fn yzx_order_permutes_the_columns() {
        let mesh = sample_mesh(TopologyMode::Triangle);
        let text = render(&mesh, "yzx".parse().unwrap());
        let expected: Vec<[f64; 3]> = mesh
            .vertices()
            .iter()
            .map(|&[x, y, z]| [y, z, x])
            .collect();
        assert_eq!(vertex_lines(&text), expected);
    }

    #[test]
    fn blank_line_separates_vertices_from_faces() {
        let text = render(&sample_mesh(TopologyMode::Triangle), AxisOrder::XYZ);
        let lines: Vec<&str> = text.lines().collect();
        // 4 header lines + 4 vertices, then the separator.
        assert_eq!(lines[8], "");
        assert!(lines[9].starts_with("f "));
    }

    #[test]
    fn triangle_faces_follow_the_fixed_diagonal() {
        let text = render(&sample_mesh(TopologyMode::Triangle), AxisOrder::XYZ);
        let faces: Vec<&str> = text.lines().filter(|line| line.starts_with("f ")).collect();
        assert_eq!(faces, ["f 1 3 4", "f 1 4 2"]);
    }

    #[test]
    fn quad_faces_write_four_indices() {
        let text = render(&sample_mesh(TopologyMode::Quad), AxisOrder::XYZ);
        let faces: Vec<&str> = text.lines().filter(|line| line.starts_with("f ")).collect();
        assert_eq!(faces, ["f 1 3 4 2"]);
    }
}
