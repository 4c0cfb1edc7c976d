//! Mesh file I/O.
//!
//! Currently supports Wavefront OBJ. The [`load`] and [`save`] helpers
//! dispatch on the file extension; use the format module directly for
//! format-specific options.

pub mod obj;

use std::path::Path;

use crate::error::{MeshError, Result};
use crate::mesh::PolyMesh;

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Load a mesh, choosing the format from the file extension.
pub fn load(path: impl AsRef<Path>) -> Result<PolyMesh> {
    let path = path.as_ref();
    match extension(path).as_str() {
        "obj" => obj::load(path),
        ext => Err(MeshError::UnsupportedFormat {
            extension: ext.to_string(),
        }),
    }
}

/// Save a mesh, choosing the format from the file extension.
pub fn save(mesh: &PolyMesh, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    match extension(path).as_str() {
        "obj" => obj::save(mesh, path),
        ext => Err(MeshError::UnsupportedFormat {
            extension: ext.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_extension() {
        let mesh = PolyMesh::new();
        assert!(matches!(
            save(&mesh, "/tmp/mesh.xyz"),
            Err(MeshError::UnsupportedFormat { .. })
        ));
        assert!(matches!(
            load("/tmp/mesh.xyz"),
            Err(MeshError::UnsupportedFormat { .. })
        ));
    }
}
