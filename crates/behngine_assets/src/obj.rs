//! Wavefront OBJ reader.
//!
//! A single pass over the text that accumulates positions, texture coordinates,
//! normals and face corners into flat arrays. Only geometry is read: grouping,
//! smoothing groups and material statements are skipped.

use std::{
    collections::HashMap,
    fmt,
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use glam::Vec3;
use serde::Deserialize;
use thiserror::Error;

use crate::assets::{MeshData, Vertex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ObjLoadOptions {
    /// Mirror the mesh vertically (negates Y of positions and normals).
    pub flip_y: bool,
    /// Fan-triangulate polygons with more than three corners.
    pub triangulate: bool,
    pub keep_normals: bool,
    pub keep_texcoords: bool,
}

impl Default for ObjLoadOptions {
    fn default() -> Self {
        Self {
            flip_y: false,
            triangulate: true,
            keep_normals: true,
            keep_texcoords: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Position,
    TexCoord,
    Normal,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ElementKind::Position => "position",
            ElementKind::TexCoord => "texture coordinate",
            ElementKind::Normal => "normal",
        })
    }
}

#[derive(Debug, Error)]
pub enum ObjError {
    #[error("failed to read OBJ data: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: `{keyword}` expects at least {expected} values, found {found}")]
    MissingComponent {
        line: usize,
        keyword: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: invalid number `{token}`")]
    InvalidNumber { line: usize, token: String },

    #[error("line {line}: invalid face index `{token}`")]
    InvalidIndex { line: usize, token: String },

    #[error("line {line}: {kind} index {index} is out of range ({count} defined)")]
    IndexOutOfRange {
        line: usize,
        kind: ElementKind,
        index: i64,
        count: usize,
    },

    #[error("line {line}: face has {corners} corners, at least 3 are required")]
    DegenerateFace { line: usize, corners: usize },

    #[error("face {face} has {corners} corners; load with triangulation enabled")]
    NonTriangularFace { face: usize, corners: usize },

    #[error("the OBJ data has no faces")]
    NoFaces,
}

/// One face corner, 0-based indices into the flat arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceCorner {
    pub position: u32,
    pub texcoord: Option<u32>,
    pub normal: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjMesh {
    /// `x, y, z` triples.
    pub positions: Vec<f32>,
    /// `u, v` pairs.
    pub texcoords: Vec<f32>,
    /// `x, y, z` triples.
    pub normals: Vec<f32>,
    /// Face corners in draw order, faces laid out back to back.
    pub corners: Vec<FaceCorner>,
    /// Number of corners of each face.
    pub face_arities: Vec<u32>,
}

impl ObjMesh {
    pub fn position_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn texcoord_count(&self) -> usize {
        self.texcoords.len() / 2
    }

    pub fn normal_count(&self) -> usize {
        self.normals.len() / 3
    }

    pub fn face_count(&self) -> usize {
        self.face_arities.len()
    }

    /// Position indices of every corner, the classic flat index array.
    pub fn indices(&self) -> Vec<u32> {
        self.corners.iter().map(|c| c.position).collect()
    }

    pub fn is_triangulated(&self) -> bool {
        self.face_arities.iter().all(|&arity| arity == 3)
    }

    fn position(&self, index: u32) -> Vec3 {
        let i = index as usize * 3;
        Vec3::from_slice(&self.positions[i..i + 3])
    }

    fn texcoord(&self, index: u32) -> [f32; 2] {
        let i = index as usize * 2;
        [self.texcoords[i], self.texcoords[i + 1]]
    }

    fn normal(&self, index: u32) -> [f32; 3] {
        let i = index as usize * 3;
        [self.normals[i], self.normals[i + 1], self.normals[i + 2]]
    }

    /// Builds an indexed triangle list. Identical corners share a vertex;
    /// corners without a normal get an area-weighted smooth normal.
    pub fn to_mesh_data(&self) -> Result<MeshData, ObjError> {
        if self.corners.is_empty() {
            return Err(ObjError::NoFaces);
        }

        if let Some((face, &arity)) = self
            .face_arities
            .iter()
            .enumerate()
            .find(|(_, arity)| **arity != 3)
        {
            return Err(ObjError::NonTriangularFace {
                face,
                corners: arity as usize,
            });
        }

        let mut lookup: HashMap<FaceCorner, u32> = HashMap::with_capacity(self.corners.len());
        let mut vertices: Vec<Vertex> = Vec::new();
        let mut vertex_corners: Vec<FaceCorner> = Vec::new();
        let mut indices = Vec::with_capacity(self.corners.len());

        for corner in &self.corners {
            let index = *lookup.entry(*corner).or_insert_with(|| {
                vertices.push(Vertex {
                    position: self.position(corner.position).to_array(),
                    normal: corner.normal.map(|n| self.normal(n)).unwrap_or([0.0; 3]),
                    uv: corner.texcoord.map(|t| self.texcoord(t)).unwrap_or([0.0; 2]),
                });
                vertex_corners.push(*corner);
                (vertices.len() - 1) as u32
            });
            indices.push(index);
        }

        if vertex_corners.iter().any(|c| c.normal.is_none()) {
            let smooth = self.smooth_normals();
            for (vertex, corner) in vertices.iter_mut().zip(&vertex_corners) {
                if corner.normal.is_none() {
                    vertex.normal = smooth[corner.position as usize].to_array();
                }
            }
        }

        Ok(MeshData { vertices, indices })
    }

    /// Per-position normals accumulated from the (unnormalised) face normals of
    /// every triangle that touches the position.
    fn smooth_normals(&self) -> Vec<Vec3> {
        let mut accumulated = vec![Vec3::ZERO; self.position_count()];

        for triangle in self.corners.chunks_exact(3) {
            let a = self.position(triangle[0].position);
            let b = self.position(triangle[1].position);
            let c = self.position(triangle[2].position);
            let face_normal = (b - a).cross(c - a);

            for corner in triangle {
                accumulated[corner.position as usize] += face_normal;
            }
        }

        accumulated
            .into_iter()
            .map(|n| n.try_normalize().unwrap_or(Vec3::Y))
            .collect()
    }
}

pub fn load_obj(path: impl AsRef<Path>, options: &ObjLoadOptions) -> Result<ObjMesh, ObjError> {
    let file = File::open(path.as_ref())?;
    parse_obj(BufReader::new(file), options)
}

pub fn parse_obj_str(source: &str, options: &ObjLoadOptions) -> Result<ObjMesh, ObjError> {
    parse_obj(source.as_bytes(), options)
}

pub fn parse_obj<R: BufRead>(reader: R, options: &ObjLoadOptions) -> Result<ObjMesh, ObjError> {
    let mut mesh = ObjMesh::default();
    let mut face: Vec<FaceCorner> = Vec::new();

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = number + 1;
        let line = line.trim();

        if line.len() < 2 || line.starts_with('#') {
            continue;
        }

        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };
        let fields: Vec<&str> = tokens.collect();

        match keyword {
            "v" => {
                let [x, y, z] = parse_floats::<3>(line_no, "v", &fields, 3)?;
                let y = if options.flip_y { -y } else { y };
                mesh.positions.extend_from_slice(&[x, y, z]);
            }
            "vt" => {
                let [u, v] = parse_floats::<2>(line_no, "vt", &fields, 1)?;
                mesh.texcoords.extend_from_slice(&[u, v]);
            }
            "vn" => {
                let [x, y, z] = parse_floats::<3>(line_no, "vn", &fields, 3)?;
                let y = if options.flip_y { -y } else { y };
                mesh.normals.extend_from_slice(&[x, y, z]);
            }
            "f" => {
                face.clear();
                for token in &fields {
                    face.push(parse_corner(line_no, token, &mesh, options)?);
                }

                if face.len() < 3 {
                    return Err(ObjError::DegenerateFace {
                        line: line_no,
                        corners: face.len(),
                    });
                }

                // Mirroring flips the winding; reverse it back.
                if options.flip_y {
                    face.reverse();
                }

                if options.triangulate {
                    for i in 1..face.len() - 1 {
                        mesh.corners
                            .extend_from_slice(&[face[0], face[i], face[i + 1]]);
                        mesh.face_arities.push(3);
                    }
                } else {
                    mesh.corners.extend_from_slice(&face);
                    mesh.face_arities.push(face.len() as u32);
                }
            }
            other => log::trace!("line {line_no}: skipping `{other}`"),
        }
    }

    log::debug!(
        "parsed OBJ: {} positions, {} texcoords, {} normals, {} faces",
        mesh.position_count(),
        mesh.texcoord_count(),
        mesh.normal_count(),
        mesh.face_count()
    );

    Ok(mesh)
}

/// Parses up to `N` floats; missing trailing values stay zero, extra ones are ignored.
fn parse_floats<const N: usize>(
    line: usize,
    keyword: &'static str,
    fields: &[&str],
    required: usize,
) -> Result<[f32; N], ObjError> {
    if fields.len() < required {
        return Err(ObjError::MissingComponent {
            line,
            keyword,
            expected: required,
            found: fields.len(),
        });
    }

    let mut values = [0.0; N];
    for (value, token) in values.iter_mut().zip(fields) {
        *value = token
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| ObjError::InvalidNumber {
                line,
                token: token.to_string(),
            })?;
    }
    Ok(values)
}

fn parse_corner(
    line: usize,
    token: &str,
    mesh: &ObjMesh,
    options: &ObjLoadOptions,
) -> Result<FaceCorner, ObjError> {
    let mut parts = token.split('/');
    let position = parts.next().unwrap_or_default();
    let texcoord = parts.next().filter(|s| !s.is_empty());
    let normal = parts.next().filter(|s| !s.is_empty());

    if parts.next().is_some() {
        return Err(ObjError::InvalidIndex {
            line,
            token: token.to_string(),
        });
    }

    let position = resolve_index(line, position, ElementKind::Position, mesh.position_count())?;

    let texcoord = match texcoord {
        Some(raw) if options.keep_texcoords => Some(resolve_index(
            line,
            raw,
            ElementKind::TexCoord,
            mesh.texcoord_count(),
        )?),
        _ => None,
    };

    let normal = match normal {
        Some(raw) if options.keep_normals => Some(resolve_index(
            line,
            raw,
            ElementKind::Normal,
            mesh.normal_count(),
        )?),
        _ => None,
    };

    Ok(FaceCorner {
        position,
        texcoord,
        normal,
    })
}

/// Turns a 1-based (or negative, relative) OBJ index into a 0-based one.
fn resolve_index(line: usize, raw: &str, kind: ElementKind, count: usize) -> Result<u32, ObjError> {
    let value: i64 = raw.parse().map_err(|_| ObjError::InvalidIndex {
        line,
        token: raw.to_string(),
    })?;

    let resolved = match value {
        0 => {
            return Err(ObjError::InvalidIndex {
                line,
                token: raw.to_string(),
            });
        }
        v if v > 0 => v - 1,
        v => count as i64 + v,
    };

    if resolved < 0 || resolved >= count as i64 {
        return Err(ObjError::IndexOutOfRange {
            line,
            kind,
            index: value,
            count,
        });
    }

    Ok(resolved as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUBE: &str = "\
# unit cube, quads only
o Cube
v -1 -1  1
v  1 -1  1
v -1  1  1
v  1  1  1
v -1  1 -1
v  1  1 -1
v -1 -1 -1
v  1 -1 -1
s off
f 1 2 4 3
f 3 4 6 5
f 5 6 8 7
f 7 8 2 1
f 2 8 6 4
f 7 1 3 5
";

    const TEXTURED_TRIANGLE: &str = "\
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
vt 1 0
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1
";

    fn defaults() -> ObjLoadOptions {
        ObjLoadOptions::default()
    }

    #[test]
    fn reads_flat_arrays() {
        let mesh = parse_obj_str(TEXTURED_TRIANGLE, &defaults()).unwrap();

        assert_eq!(mesh.positions, vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        assert_eq!(mesh.texcoords, vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
        assert_eq!(mesh.normals, vec![0.0, 0.0, 1.0]);
        assert_eq!(mesh.indices(), vec![0, 1, 2]);
        assert_eq!(mesh.corners[1], FaceCorner {
            position: 1,
            texcoord: Some(1),
            normal: Some(0),
        });
    }

    #[test]
    fn quads_are_fan_triangulated() {
        let mesh = parse_obj_str(CUBE, &defaults()).unwrap();

        assert_eq!(mesh.position_count(), 8);
        assert_eq!(mesh.face_count(), 12);
        assert!(mesh.is_triangulated());
        assert_eq!(&mesh.indices()[..6], &[0, 1, 3, 0, 3, 2]);
    }

    #[test]
    fn polygons_kept_without_triangulation() {
        let options = ObjLoadOptions {
            triangulate: false,
            ..defaults()
        };
        let mesh = parse_obj_str(CUBE, &options).unwrap();

        assert_eq!(mesh.face_count(), 6);
        assert_eq!(mesh.face_arities, vec![4; 6]);
        assert_eq!(mesh.indices().len(), 24);
        assert!(matches!(
            mesh.to_mesh_data(),
            Err(ObjError::NonTriangularFace { face: 0, corners: 4 })
        ));
    }

    #[test]
    fn corner_forms() {
        let source = "\
v 0 0 0
v 1 0 0
v 0 1 0
vt 0.5 0.5
vn 0 0 1
f 1 2/1 3//1
";
        let mesh = parse_obj_str(source, &defaults()).unwrap();
        assert_eq!(
            mesh.corners,
            vec![
                FaceCorner { position: 0, texcoord: None, normal: None },
                FaceCorner { position: 1, texcoord: Some(0), normal: None },
                FaceCorner { position: 2, texcoord: None, normal: Some(0) },
            ]
        );
    }

    #[test]
    fn negative_indices_are_relative() {
        let source = "\
v 0 0 0
v 1 0 0
v 0 1 0
f -3 -2 -1
v 5 5 5
f 1 -1 3
";
        let mesh = parse_obj_str(source, &defaults()).unwrap();
        assert_eq!(mesh.indices(), vec![0, 1, 2, 0, 3, 2]);
    }

    #[test]
    fn flip_y_mirrors_and_keeps_winding() {
        let options = ObjLoadOptions {
            flip_y: true,
            ..defaults()
        };
        let mesh = parse_obj_str(TEXTURED_TRIANGLE, &options).unwrap();

        assert_eq!(mesh.positions[7], -1.0);
        assert_eq!(mesh.normals, vec![0.0, -0.0, 1.0]);
        assert_eq!(mesh.indices(), vec![2, 1, 0]);

        // The mirrored triangle still faces +Z when built with smooth normals.
        let options = ObjLoadOptions {
            flip_y: true,
            keep_normals: false,
            ..defaults()
        };
        let data = parse_obj_str(TEXTURED_TRIANGLE, &options)
            .unwrap()
            .to_mesh_data()
            .unwrap();
        assert_eq!(data.vertices[0].normal, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn dropping_attributes() {
        let options = ObjLoadOptions {
            keep_normals: false,
            keep_texcoords: false,
            ..defaults()
        };
        let mesh = parse_obj_str(TEXTURED_TRIANGLE, &options).unwrap();
        assert!(mesh.corners.iter().all(|c| c.normal.is_none() && c.texcoord.is_none()));
        // Raw arrays are still read.
        assert_eq!(mesh.normal_count(), 1);
    }

    #[test]
    fn optional_components() {
        let source = "\
v 1 2 3 0.5
vt 0.25
vt 0.5 0.75 0.0
";
        let mesh = parse_obj_str(source, &defaults()).unwrap();
        assert_eq!(mesh.positions, vec![1.0, 2.0, 3.0]);
        assert_eq!(mesh.texcoords, vec![0.25, 0.0, 0.5, 0.75]);
    }

    #[test]
    fn unknown_statements_and_blank_lines_are_skipped() {
        let source = "\n\nmtllib scene.mtl\ng group\nusemtl steel\n#v 9 9 9\nl 1 2\nv 1 1 1\n";
        let mesh = parse_obj_str(source, &defaults()).unwrap();
        assert_eq!(mesh.position_count(), 1);
        assert_eq!(mesh.face_count(), 0);
    }

    #[test]
    fn bad_number_reports_line() {
        let err = parse_obj_str("v 0 0 0\nv 1 abc 0\n", &defaults()).unwrap_err();
        match err {
            ObjError::InvalidNumber { line, token } => {
                assert_eq!(line, 2);
                assert_eq!(token, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(
            parse_obj_str("v 0 NaN 0\n", &defaults()),
            Err(ObjError::InvalidNumber { line: 1, .. })
        ));
    }

    #[test]
    fn missing_components() {
        assert!(matches!(
            parse_obj_str("v 1 2\n", &defaults()),
            Err(ObjError::MissingComponent { line: 1, keyword: "v", expected: 3, found: 2 })
        ));
        assert!(matches!(
            parse_obj_str("vn 0 1\n", &defaults()),
            Err(ObjError::MissingComponent { keyword: "vn", .. })
        ));
    }

    #[test]
    fn index_errors() {
        let base = "v 0 0 0\nv 1 0 0\nv 0 1 0\n";

        assert!(matches!(
            parse_obj_str(&format!("{base}f 0 1 2\n"), &defaults()),
            Err(ObjError::InvalidIndex { line: 4, .. })
        ));
        assert!(matches!(
            parse_obj_str(&format!("{base}f 1 2 4\n"), &defaults()),
            Err(ObjError::IndexOutOfRange {
                line: 4,
                kind: ElementKind::Position,
                index: 4,
                count: 3,
            })
        ));
        assert!(matches!(
            parse_obj_str(&format!("{base}f 1 2 -4\n"), &defaults()),
            Err(ObjError::IndexOutOfRange { index: -4, .. })
        ));
        assert!(matches!(
            parse_obj_str(&format!("{base}f 1/1 2 3\n"), &defaults()),
            Err(ObjError::IndexOutOfRange { kind: ElementKind::TexCoord, .. })
        ));
        assert!(matches!(
            parse_obj_str(&format!("{base}f 1/x 2 3\n"), &defaults()),
            Err(ObjError::InvalidIndex { .. })
        ));
        assert!(matches!(
            parse_obj_str(&format!("{base}f 1/1/1/1 2 3\n"), &defaults()),
            Err(ObjError::InvalidIndex { .. })
        ));
    }

    #[test]
    fn faces_need_three_corners() {
        let source = "v 0 0 0\nv 1 0 0\nf 1 2\n";
        assert!(matches!(
            parse_obj_str(source, &defaults()),
            Err(ObjError::DegenerateFace { line: 3, corners: 2 })
        ));
    }

    #[test]
    fn shared_corners_become_shared_vertices() {
        let data = parse_obj_str(CUBE, &defaults())
            .unwrap()
            .to_mesh_data()
            .unwrap();

        assert_eq!(data.vertices.len(), 8);
        assert_eq!(data.indices.len(), 36);
        assert_eq!(data.triangle_count(), 12);
    }

    #[test]
    fn smooth_normals_point_outwards() {
        let data = parse_obj_str(CUBE, &defaults())
            .unwrap()
            .to_mesh_data()
            .unwrap();

        for vertex in &data.vertices {
            let position = Vec3::from(vertex.position);
            let normal = Vec3::from(vertex.normal);
            assert!((normal.length() - 1.0).abs() < 1e-5);
            assert!(normal.dot(position) > 0.0, "{normal:?} at {position:?}");
        }
    }

    #[test]
    fn explicit_normals_and_uvs_are_kept() {
        let data = parse_obj_str(TEXTURED_TRIANGLE, &defaults())
            .unwrap()
            .to_mesh_data()
            .unwrap();

        assert_eq!(data.vertices.len(), 3);
        assert_eq!(data.vertices[1].uv, [1.0, 0.0]);
        assert!(data.vertices.iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
    }

    #[test]
    fn loads_from_disk() {
        let path = std::env::temp_dir().join(format!("behngine-obj-{}.obj", std::process::id()));
        std::fs::write(&path, TEXTURED_TRIANGLE).unwrap();

        let mesh = load_obj(&path, &defaults()).unwrap();
        assert_eq!(mesh.face_count(), 1);

        std::fs::remove_file(&path).unwrap();
        assert!(matches!(load_obj(&path, &defaults()), Err(ObjError::Io(_))));
    }

    #[test]
    fn points_without_faces_are_rejected() {
        let mesh = parse_obj_str("v 0 0 0\nv 1 0 0\nv 0 1 0\n", &defaults()).unwrap();
        assert_eq!(mesh.positions.len(), 9);
        assert_eq!(mesh.face_count(), 0);
        assert!(matches!(mesh.to_mesh_data(), Err(ObjError::NoFaces)));
    }
}
