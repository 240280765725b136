//! Error types for raster-to-mesh conversion.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building or serializing a mesh.
///
/// Every variant carries the path or identifier that failed; nothing in
/// this crate retries, so each error is terminal for the invocation.
#[derive(Debug, Error)]
pub enum MeshError {
    /// The raster source cannot be read, or what it supplied is
    /// inconsistent (zero dimensions, elevation grid shape disagreeing
    /// with the geometry).
    #[error("raster source '{path}': {message}")]
    Source { path: String, message: String },

    /// The raster geometry cannot produce a mesh: a zero pixel size, or a
    /// vertex count that does not fit the face index space.
    #[error("raster geometry of '{path}': {message}")]
    Geometry { path: String, message: String },

    /// The axis-order string is not a permutation of exactly `xyz`.
    #[error("invalid axis order '{order}': {message}")]
    AxisOrder { order: String, message: String },

    /// The output destination cannot be created or written.
    #[error("failed to write '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl MeshError {
    /// A source-class error for `path`.
    pub fn source(path: impl Into<String>, message: impl Into<String>) -> Self {
        MeshError::Source {
            path: path.into(),
            message: message.into(),
        }
    }

    /// A geometry-class error for `path`.
    pub fn geometry(path: impl Into<String>, message: impl Into<String>) -> Self {
        MeshError::Geometry {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for mesh construction and serialization.
pub type MeshResult<T> = std::result::Result<T, MeshError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_name_the_failing_input() {
        let err = MeshError::source("dtm.asc", "header is missing 'ncols'");
        assert_eq!(
            format!("{err}"),
            "raster source 'dtm.asc': header is missing 'ncols'"
        );

        let err = MeshError::AxisOrder {
            order: "xxy".into(),
            message: "each axis must appear exactly once".into(),
        };
        assert!(format!("{err}").contains("xxy"));
    }
}
