//! Wavefront OBJ loading for triangle meshes.
//!
//! Only positions, normals and faces are read. Every face corner becomes its own
//! vertex, and the mesh is recentered and rescaled so it frames like the cube.

use crate::mesh::{IndexData, MeshData, Vertex};

use log::{debug, warn};
use thiserror::Error;

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Largest extent of a loaded mesh, matching the two unit wide cube.
pub const DEFAULT_EXTENT: f32 = 2.0;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read OBJ data: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: invalid {kind} record")]
    InvalidRecord { line: usize, kind: &'static str },
    #[error("OBJ data contains no triangles")]
    Empty,
}

pub fn load(path: &Path, extent: f32) -> Result<MeshData, Error> {
    let file = File::open(path)?;
    let mesh = parse(BufReader::new(file), extent)?;
    debug!(
        "Loaded {} vertices from '{}'.",
        mesh.vertices.len(),
        path.display()
    );
    Ok(mesh)
}

pub fn parse<R: BufRead>(reader: R, extent: f32) -> Result<MeshData, Error> {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();
    let mut vertices: Vec<Vertex> = Vec::new();
    let mut skipped_faces = 0;

    for (number, line) in reader.split(b'\n').enumerate() {
        // Comments may carry bytes in any encoding.
        let line = String::from_utf8_lossy(&line?).into_owned();
        let content = match line.find('#') {
            Some(comment) => &line[..comment],
            None => &line[..],
        };
        let mut tokens = content.split_whitespace();
        match tokens.next() {
            Some("v") => positions.push(parse_vector(tokens, number + 1, "position")?),
            Some("vn") => normals.push(parse_vector(tokens, number + 1, "normal")?),
            Some("f") => {
                let corners: Option<Vec<_>> = tokens
                    .map(|token| parse_corner(token, positions.len(), normals.len()))
                    .collect();
                match corners {
                    Some(corners) if corners.len() >= 3 => {
                        // Fan triangulation around the first corner.
                        for i in 1..corners.len() - 1 {
                            for &(position, normal) in
                                [corners[0], corners[i], corners[i + 1]].iter()
                            {
                                let normal = normal.map_or([0.0, 1.0, 0.0], |n| normals[n]);
                                vertices.push(Vertex::new(
                                    positions[position],
                                    color_from_normal(normal),
                                ));
                            }
                        }
                    }
                    _ => skipped_faces += 1,
                }
            }
            _ => {}
        }
    }

    if skipped_faces > 0 {
        warn!("Skipped {} malformed OBJ faces.", skipped_faces);
    }
    if vertices.is_empty() {
        return Err(Error::Empty);
    }

    normalize(&mut vertices, extent);

    let indices = (0..vertices.len() as u32).collect();
    Ok(MeshData {
        vertices,
        indices: IndexData::from_u32(indices),
    })
}

fn parse_vector<'a, I>(tokens: I, line: usize, kind: &'static str) -> Result<[f32; 3], Error>
where
    I: Iterator<Item = &'a str>,
{
    let values: Vec<f32> = tokens
        .take(3)
        .map(str::parse)
        .collect::<Result<_, _>>()
        .map_err(|_| Error::InvalidRecord { line, kind })?;
    match values[..] {
        [x, y, z] => Ok([x, y, z]),
        _ => Err(Error::InvalidRecord { line, kind }),
    }
}

/// Parses `v`, `v/vt`, `v//vn` or `v/vt/vn` into zero based indices.
fn parse_corner(
    token: &str,
    position_count: usize,
    normal_count: usize,
) -> Option<(usize, Option<usize>)> {
    let mut parts = token.split('/');
    let position = resolve_index(parts.next()?, position_count)?;
    let _texcoord = parts.next();
    let normal = match parts.next() {
        Some(part) if !part.is_empty() => resolve_index(part, normal_count),
        _ => None,
    };
    Some((position, normal))
}

fn resolve_index(token: &str, count: usize) -> Option<usize> {
    let index: usize = token.parse().ok()?;
    if index >= 1 && index <= count {
        Some(index - 1)
    } else {
        None
    }
}

fn color_from_normal(normal: [f32; 3]) -> [f32; 4] {
    [
        normal[0] * 0.5 + 0.5,
        normal[1] * 0.5 + 0.5,
        normal[2] * 0.5 + 0.5,
        1.0,
    ]
}

fn normalize(vertices: &mut [Vertex], extent: f32) {
    let mut min = vertices[0].position;
    let mut max = vertices[0].position;
    for vertex in vertices.iter() {
        for axis in 0..3 {
            min[axis] = min[axis].min(vertex.position[axis]);
            max[axis] = max[axis].max(vertex.position[axis]);
        }
    }

    let center = [
        (min[0] + max[0]) * 0.5,
        (min[1] + max[1]) * 0.5,
        (min[2] + max[2]) * 0.5,
    ];
    let max_extent = (max[0] - min[0]).max(max[1] - min[1]).max(max[2] - min[2]);
    if max_extent <= 0.0 {
        return;
    }

    let scale = extent / max_extent;
    for vertex in vertices.iter_mut() {
        for axis in 0..3 {
            vertex.position[axis] = (vertex.position[axis] - center[axis]) * scale;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(source: &str) -> Result<MeshData, Error> {
        parse(source.as_bytes(), DEFAULT_EXTENT)
    }

    #[test]
    fn triangle_with_normals_is_centered_and_scaled() {
        let mesh = parse_str(
            "# triangle\n\
             v 0 0 0\n\
             v 4 0 0\n\
             v 0 2 0\n\
             vn 0 0 -1\n\
             f 1//1 2//1 3//1\n",
        )
        .unwrap();

        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.indices, IndexData::U16(vec![0, 1, 2]));
        assert_eq!(mesh.vertices[0].position, [-1.0, -0.5, 0.0]);
        assert_eq!(mesh.vertices[1].position, [1.0, -0.5, 0.0]);
        assert_eq!(mesh.vertices[2].position, [-1.0, 0.5, 0.0]);
        assert_eq!(mesh.vertices[0].color, [0.5, 0.5, 0.0, 1.0]);
    }

    #[test]
    fn texcoord_forms_and_missing_normals_are_accepted() {
        let mesh = parse_str(
            "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvn 1 0 0\n\
             f 1/1/1 2/1/1 3/1/1\n\
             f 1/1 2/1 3/1\n\
             f 1 2 3\n",
        )
        .unwrap();

        assert_eq!(mesh.vertices.len(), 9);
        assert_eq!(mesh.vertices[0].color, [1.0, 0.5, 0.5, 1.0]);
        // Faces without normals are shaded as facing up.
        assert_eq!(mesh.vertices[3].color, [0.5, 1.0, 0.5, 1.0]);
        assert_eq!(mesh.vertices[8].color, [0.5, 1.0, 0.5, 1.0]);
    }

    #[test]
    fn quads_are_fan_triangulated() {
        let mesh = parse_str("v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n").unwrap();
        assert_eq!(mesh.vertices.len(), 6);
        let positions: Vec<_> = mesh.vertices.iter().map(|v| v.position).collect();
        assert_eq!(positions[0], positions[3]);
        assert_eq!(positions[2], positions[4]);
        assert_eq!(mesh.indices, IndexData::U16(vec![0, 1, 2, 3, 4, 5]));
    }

    #[test]
    fn faces_with_out_of_range_indices_are_skipped() {
        let mesh = parse_str(
            "v 0 0 0\nv 1 0 0\nv 0 1 0\n\
             f 1 2 9\n\
             f 0 1 2\n\
             f 1 2\n\
             f 1 2 3\n",
        )
        .unwrap();
        assert_eq!(mesh.vertices.len(), 3);
    }

    #[test]
    fn non_utf8_comment_bytes_are_tolerated() {
        let source = b"# \xCA\xF3\xE1\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let mesh = parse(&source[..], DEFAULT_EXTENT).unwrap();
        assert_eq!(mesh.vertices.len(), 3);
    }

    #[test]
    fn trailing_comments_are_ignored() {
        let mesh = parse_str("v 0 0 0 # origin
v 1 0 0
v 0 1 0
f 1 2 3 # tri
").unwrap();
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.indices, IndexData::U16(vec![0, 1, 2]));
    }

    #[test]
    fn malformed_vectors_are_errors() {
        match parse_str("v 1 2\n") {
            Err(Error::InvalidRecord { line: 1, kind }) => assert_eq!(kind, "position"),
            other => panic!("unexpected result {:?}", other),
        }
        match parse_str("v 0 0 0\nvn x 0 0\n") {
            Err(Error::InvalidRecord { line: 2, kind }) => assert_eq!(kind, "normal"),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn meshes_without_faces_are_empty() {
        assert!(matches!(parse_str("v 0 0 0\n"), Err(Error::Empty)));
        assert!(matches!(parse_str(""), Err(Error::Empty)));
    }

    #[test]
    fn largest_axis_matches_requested_extent() {
        let mesh = parse(
            "v -3 0 0\nv 7 1 0\nv 0 0 2\nf 1 2 3\n".as_bytes(),
            5.0,
        )
        .unwrap();
        let xs: Vec<f32> = mesh.vertices.iter().map(|v| v.position[0]).collect();
        let width = xs.iter().cloned().fold(f32::MIN, f32::max)
            - xs.iter().cloned().fold(f32::MAX, f32::min);
        assert!((width - 5.0).abs() < 1e-5);
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = load(Path::new("does/not/exist.obj"), DEFAULT_EXTENT);
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
