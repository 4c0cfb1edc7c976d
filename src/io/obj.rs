//! Wavefront OBJ reader and writer.
//!
//! The writer emits live elements only, renumbering vertices densely so a
//! mesh with soft-deleted elements exports cleanly without a prior garbage
//! collection. Vertex normals, vertex texture coordinates and face colors
//! are written on request when the corresponding attribute is registered;
//! face colors go to a `.mat` material side-car file referenced via
//! `mtllib`/`usemtl`, one material per distinct color.
//!
//! The reader accepts `v`, `vt`, `vn` and `f` records, resolves negative
//! (relative) indices, and skips faces the kernel rejects (with a warning)
//! instead of failing the whole load, so slightly broken files still
//! produce the manifold subset of their geometry.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::{Point3, Vector2, Vector3};

use crate::error::{MeshError, Result};
use crate::mesh::{PolyMesh, VertexId};

/// What the OBJ writer should emit besides positions and faces.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    /// Write per-vertex normals (`vn`). Requires the normal attribute.
    pub vertex_normal: bool,
    /// Write per-vertex texture coordinates (`vt`). Requires the texcoord
    /// attribute.
    pub vertex_texcoord: bool,
    /// Write per-face colors as materials in a `.mat` side-car file.
    /// Requires the face color attribute.
    pub face_color: bool,
    /// Binary output. OBJ is a text format; requesting this fails.
    pub binary: bool,
}

/// Save a mesh with default options (positions and faces only).
pub fn save(mesh: &PolyMesh, path: impl AsRef<Path>) -> Result<()> {
    save_with(mesh, path, &WriteOptions::default())
}

/// Save a mesh with explicit writer options.
pub fn save_with(mesh: &PolyMesh, path: impl AsRef<Path>, options: &WriteOptions) -> Result<()> {
    let path = path.as_ref();
    if options.binary {
        return Err(MeshError::UnsupportedOption {
            option: "binary",
            format: "OBJ",
        });
    }
    if options.vertex_normal && !mesh.has_vertex_normals() {
        return Err(MeshError::PropertyNotFound {
            name: crate::mesh::VERTEX_NORMAL.to_string(),
        });
    }
    if options.vertex_texcoord && !mesh.has_vertex_texcoords() {
        return Err(MeshError::PropertyNotFound {
            name: crate::mesh::VERTEX_TEXCOORD.to_string(),
        });
    }
    if options.face_color && !mesh.has_face_colors() {
        return Err(MeshError::PropertyNotFound {
            name: crate::mesh::FACE_COLOR.to_string(),
        });
    }

    // One material per distinct face color, in order of first appearance.
    let mut materials: Vec<Vector3<f64>> = Vec::new();
    if options.face_color {
        for f in mesh.faces() {
            let color = mesh.face_color(f)?;
            if !materials.contains(&color) {
                materials.push(color);
            }
        }
        let mat_path = path.with_extension("mat");
        let mut mat = BufWriter::new(File::create(&mat_path)?);
        for (i, color) in materials.iter().enumerate() {
            writeln!(mat, "newmtl mat{i}")?;
            writeln!(mat, "Ka 0.5 0.5 0.5")?;
            writeln!(mat, "Kd {} {} {}", color.x, color.y, color.z)?;
            writeln!(mat, "illum 1")?;
        }
    }

    let mut out = BufWriter::new(File::create(path)?);
    let num_vertices = mesh.vertices().count();
    let num_faces = mesh.faces().count();
    writeln!(out, "# {num_vertices} vertices, {num_faces} faces")?;

    if options.face_color {
        if let Some(name) = path.with_extension("mat").file_name().and_then(|n| n.to_str()) {
            writeln!(out, "mtllib {name}")?;
        }
    }

    // Live vertices get dense 1-based indices in iteration order.
    let mut remap = vec![0usize; mesh.num_vertices()];
    let mut next_index = 0usize;
    for v in mesh.vertices() {
        next_index += 1;
        remap[v.index()] = next_index;

        let p = mesh.point(v);
        writeln!(out, "v {} {} {}", p.x, p.y, p.z)?;
        if options.vertex_texcoord {
            let uv = mesh.vertex_texcoord(v)?;
            writeln!(out, "vt {} {}", uv.x, uv.y)?;
        }
        if options.vertex_normal {
            let n = mesh.vertex_normal(v)?;
            writeln!(out, "vn {} {} {}", n.x, n.y, n.z)?;
        }
    }

    let mut last_material: Option<usize> = None;
    for f in mesh.faces() {
        if options.face_color {
            let color = mesh.face_color(f)?;
            let material = materials.iter().position(|c| *c == color);
            if material != last_material {
                if let Some(m) = material {
                    writeln!(out, "usemtl mat{m}")?;
                }
                last_material = material;
            }
        }
        write!(out, "f")?;
        for v in mesh.face_vertices(f) {
            let i = remap[v.index()];
            match (options.vertex_texcoord, options.vertex_normal) {
                (false, false) => write!(out, " {i}")?,
                (true, false) => write!(out, " {i}/{i}")?,
                (false, true) => write!(out, " {i}//{i}")?,
                (true, true) => write!(out, " {i}/{i}/{i}")?,
            }
        }
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

fn parse_f64(token: &str, path: &Path, line: usize) -> Result<f64> {
    token.parse().map_err(|_| MeshError::LoadError {
        path: path.to_path_buf(),
        message: format!("malformed number {token:?} on line {line}"),
    })
}

/// Resolve a 1-based or negative (relative) OBJ index against `len` items.
fn resolve_index(raw: i64, len: usize) -> Option<usize> {
    if raw > 0 && (raw as usize) <= len {
        Some(raw as usize - 1)
    } else if raw < 0 && (-raw as usize) <= len {
        Some(len - (-raw as usize))
    } else {
        None
    }
}

/// Load a mesh from an OBJ file.
pub fn load(path: impl AsRef<Path>) -> Result<PolyMesh> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let mut mesh = PolyMesh::new();
    let mut texcoords: Vec<Vector2<f64>> = Vec::new();
    let mut normals: Vec<Vector3<f64>> = Vec::new();
    let mut skipped = 0usize;

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let lineno = lineno + 1;
        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };
        match keyword {
            "v" => {
                let mut coord = [0.0f64; 3];
                for c in &mut coord {
                    let token = tokens.next().ok_or_else(|| MeshError::LoadError {
                        path: path.to_path_buf(),
                        message: format!("truncated vertex on line {lineno}"),
                    })?;
                    *c = parse_f64(token, path, lineno)?;
                }
                mesh.add_vertex(Point3::new(coord[0], coord[1], coord[2]));
            }
            "vt" => {
                let u = tokens.next().unwrap_or("0");
                let v = tokens.next().unwrap_or("0");
                texcoords.push(Vector2::new(
                    parse_f64(u, path, lineno)?,
                    parse_f64(v, path, lineno)?,
                ));
            }
            "vn" => {
                let mut coord = [0.0f64; 3];
                for c in &mut coord {
                    let token = tokens.next().unwrap_or("0");
                    *c = parse_f64(token, path, lineno)?;
                }
                normals.push(Vector3::new(coord[0], coord[1], coord[2]));
            }
            "f" => {
                let mut verts: Vec<VertexId> = Vec::new();
                let mut corner_texcoords: Vec<Option<usize>> = Vec::new();
                let mut corner_normals: Vec<Option<usize>> = Vec::new();
                for token in tokens {
                    let mut parts = token.split('/');
                    let v_part = parts.next().unwrap_or("");
                    let raw: i64 = v_part.parse().map_err(|_| MeshError::LoadError {
                        path: path.to_path_buf(),
                        message: format!("malformed face index {token:?} on line {lineno}"),
                    })?;
                    let index = resolve_index(raw, mesh.num_vertices()).ok_or_else(|| {
                        MeshError::LoadError {
                            path: path.to_path_buf(),
                            message: format!("face index {raw} out of range on line {lineno}"),
                        }
                    })?;
                    verts.push(VertexId::new(index));
                    corner_texcoords.push(
                        parts
                            .next()
                            .and_then(|t| t.parse::<i64>().ok())
                            .and_then(|raw| resolve_index(raw, texcoords.len())),
                    );
                    corner_normals.push(
                        parts
                            .next()
                            .and_then(|t| t.parse::<i64>().ok())
                            .and_then(|raw| resolve_index(raw, normals.len())),
                    );
                }
                match mesh.add_face(&verts) {
                    Ok(_) => {
                        for ((&v, uv), n) in verts
                            .iter()
                            .zip(corner_texcoords)
                            .zip(corner_normals)
                        {
                            if let Some(t) = uv {
                                if !mesh.has_vertex_texcoords() {
                                    mesh.request_vertex_texcoords()?;
                                }
                                mesh.set_vertex_texcoord(v, texcoords[t])?;
                            }
                            if let Some(n) = n {
                                if !mesh.has_vertex_normals() {
                                    mesh.request_vertex_normals()?;
                                }
                                mesh.set_vertex_normal(v, normals[n])?;
                            }
                        }
                    }
                    Err(err) => {
                        skipped += 1;
                        log::warn!("{}:{lineno}: skipping face: {err}", path.display());
                    }
                }
            }
            // Grouping, materials and smoothing are ignored on input.
            _ => {}
        }
    }
    if skipped > 0 {
        log::warn!(
            "{}: skipped {skipped} non-manifold or degenerate faces",
            path.display()
        );
    }
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::FaceId;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tessera-{}-{}", std::process::id(), name))
    }

    fn square() -> PolyMesh {
        let mut mesh = PolyMesh::new();
        let v0 = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let v1 = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let v2 = mesh.add_vertex(Point3::new(1.0, 1.0, 0.0));
        let v3 = mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
        mesh.add_face(&[v0, v1, v2]).unwrap();
        mesh.add_face(&[v0, v2, v3]).unwrap();
        mesh
    }

    #[test]
    fn test_save_load_round_trip() {
        let mesh = square();
        let path = temp_path("round-trip.obj");
        save(&mesh, &path).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.num_vertices(), 4);
        assert_eq!(loaded.num_faces(), 2);
        assert_eq!(loaded.num_edges(), 5);
        for v in loaded.vertices() {
            assert_eq!(loaded.point(v), mesh.point(v));
        }
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_save_skips_deleted_and_renumbers() {
        let mut mesh = square();
        mesh.delete_face(FaceId::new(0), true).unwrap();
        // No garbage collection: the writer must renumber on its own.
        let path = temp_path("renumber.obj");
        save(&mesh, &path).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.num_vertices(), 3);
        assert_eq!(loaded.num_faces(), 1);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_binary_not_supported() {
        let mesh = square();
        let options = WriteOptions {
            binary: true,
            ..WriteOptions::default()
        };
        assert!(matches!(
            save_with(&mesh, temp_path("binary.obj"), &options),
            Err(MeshError::UnsupportedOption {
                option: "binary",
                format: "OBJ",
            })
        ));
    }

    #[test]
    fn test_normals_require_attribute() {
        let mesh = square();
        let options = WriteOptions {
            vertex_normal: true,
            ..WriteOptions::default()
        };
        assert!(matches!(
            save_with(&mesh, temp_path("normals.obj"), &options),
            Err(MeshError::PropertyNotFound { .. })
        ));
    }

    #[test]
    fn test_normals_round_trip() {
        let mut mesh = square();
        mesh.update_vertex_normals().unwrap();
        let path = temp_path("with-normals.obj");
        let options = WriteOptions {
            vertex_normal: true,
            ..WriteOptions::default()
        };
        save_with(&mesh, &path, &options).unwrap();

        let loaded = load(&path).unwrap();
        assert!(loaded.has_vertex_normals());
        for v in loaded.vertices() {
            let n = loaded.vertex_normal(v).unwrap();
            assert!((n - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-9);
        }
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_face_colors_write_material_side_car() {
        let mut mesh = square();
        mesh.request_face_colors().unwrap();
        mesh.set_face_color(FaceId::new(0), Vector3::new(1.0, 0.0, 0.0))
            .unwrap();
        mesh.set_face_color(FaceId::new(1), Vector3::new(0.0, 1.0, 0.0))
            .unwrap();

        let path = temp_path("colors.obj");
        let options = WriteOptions {
            face_color: true,
            ..WriteOptions::default()
        };
        save_with(&mesh, &path, &options).unwrap();

        let obj_text = std::fs::read_to_string(&path).unwrap();
        assert!(obj_text.contains("mtllib"));
        assert!(obj_text.contains("usemtl mat0"));
        assert!(obj_text.contains("usemtl mat1"));

        let mat_path = path.with_extension("mat");
        let mat_text = std::fs::read_to_string(&mat_path).unwrap();
        assert!(mat_text.contains("newmtl mat0"));
        assert!(mat_text.contains("Kd 1 0 0"));
        std::fs::remove_file(&path).ok();
        std::fs::remove_file(&mat_path).ok();
    }

    #[test]
    fn test_load_skips_bad_faces() {
        let path = temp_path("bad-face.obj");
        // The last face repeats a vertex and must be skipped, not fatal.
        std::fs::write(
            &path,
            "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3\nf 1 3 3\n",
        )
        .unwrap();
        let mesh = load(&path).unwrap();
        assert_eq!(mesh.num_faces(), 1);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_negative_indices() {
        let path = temp_path("negative.obj");
        std::fs::write(&path, "v 0 0 0\nv 1 0 0\nv 1 1 0\nf -3 -2 -1\n").unwrap();
        let mesh = load(&path).unwrap();
        assert_eq!(mesh.num_faces(), 1);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            load("/nonexistent/mesh.obj"),
            Err(MeshError::Io(_))
        ));
    }
}
