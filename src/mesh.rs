pub mod obj;

use bytemuck::{Pod, Zeroable};

use std::mem;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl Vertex {
    pub const STRIDE: usize = mem::size_of::<Vertex>();
    pub const POSITION_OFFSET: usize = 0;
    pub const COLOR_OFFSET: usize = mem::size_of::<[f32; 3]>();

    pub const fn new(position: [f32; 3], color: [f32; 4]) -> Self {
        Vertex { position, color }
    }
}

const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const BLACK: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
const GREEN: [f32; 4] = [0.0, 1.0, 0.0, 1.0];
const BLUE: [f32; 4] = [0.0, 0.0, 1.0, 1.0];
const YELLOW: [f32; 4] = [1.0, 1.0, 0.0, 1.0];
const CYAN: [f32; 4] = [0.0, 1.0, 1.0, 1.0];
const MAGENTA: [f32; 4] = [1.0, 0.0, 1.0, 1.0];

pub const CUBE_VERTICES: [Vertex; 8] = [
    Vertex::new([-1.0, -1.0, -1.0], WHITE),
    Vertex::new([-1.0, 1.0, -1.0], BLACK),
    Vertex::new([1.0, 1.0, -1.0], RED),
    Vertex::new([1.0, -1.0, -1.0], GREEN),
    Vertex::new([-1.0, -1.0, 1.0], BLUE),
    Vertex::new([-1.0, 1.0, 1.0], YELLOW),
    Vertex::new([1.0, 1.0, 1.0], CYAN),
    Vertex::new([1.0, -1.0, 1.0], MAGENTA),
];

/// Clockwise triangles, two per face.
#[rustfmt::skip]
pub const CUBE_INDICES: [u16; 36] = [
    // front
    0, 1, 2,
    0, 2, 3,
    // back
    4, 6, 5,
    4, 7, 6,
    // left
    4, 5, 1,
    4, 1, 0,
    // right
    3, 2, 6,
    3, 6, 7,
    // top
    1, 5, 6,
    1, 6, 2,
    // bottom
    4, 0, 3,
    4, 3, 7,
];

#[derive(Clone, Debug, PartialEq)]
pub enum IndexData {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl IndexData {
    /// Uses 16-bit indices whenever every index fits.
    pub fn from_u32(indices: Vec<u32>) -> Self {
        if indices.iter().all(|&i| i <= u32::from(u16::max_value())) {
            IndexData::U16(indices.into_iter().map(|i| i as u16).collect())
        } else {
            IndexData::U32(indices)
        }
    }

    pub fn len(&self) -> usize {
        match self {
            IndexData::U16(indices) => indices.len(),
            IndexData::U32(indices) => indices.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn index_size(&self) -> usize {
        match self {
            IndexData::U16(_) => mem::size_of::<u16>(),
            IndexData::U32(_) => mem::size_of::<u32>(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            IndexData::U16(indices) => bytemuck::cast_slice(indices),
            IndexData::U32(indices) => bytemuck::cast_slice(indices),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: IndexData,
}

impl MeshData {
    pub fn cube() -> Self {
        MeshData {
            vertices: CUBE_VERTICES.to_vec(),
            indices: IndexData::U16(CUBE_INDICES.to_vec()),
        }
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_is_position_then_color() {
        assert_eq!(Vertex::STRIDE, 28);
        assert_eq!(Vertex::COLOR_OFFSET, 12);
    }

    #[test]
    fn cube_has_twelve_triangles_over_eight_corners() {
        let cube = MeshData::cube();
        assert_eq!(cube.vertices.len(), 8);
        assert_eq!(cube.index_count(), 36);
        assert_eq!(cube.indices.index_size(), 2);
        assert!(CUBE_INDICES.iter().all(|&i| (i as usize) < cube.vertices.len()));
        assert_eq!(cube.vertex_bytes().len(), 8 * 28);
        assert_eq!(cube.indices.as_bytes().len(), 36 * 2);
    }

    #[test]
    fn cube_corners_are_unit_extents() {
        for vertex in CUBE_VERTICES.iter() {
            for coordinate in vertex.position.iter() {
                assert_eq!(coordinate.abs(), 1.0);
            }
            assert_eq!(vertex.color[3], 1.0);
        }
    }

    #[test]
    fn every_cube_corner_is_referenced_by_three_faces() {
        let mut uses = [0; 8];
        for &index in CUBE_INDICES.iter() {
            uses[index as usize] += 1;
        }
        assert_eq!(uses.iter().sum::<i32>(), 36);
        assert!(uses.iter().all(|&n| n >= 3));
    }

    #[test]
    fn narrow_indices_when_they_fit() {
        assert_eq!(
            IndexData::from_u32(vec![0, 1, 65535]),
            IndexData::U16(vec![0, 1, 65535])
        );
        let wide = IndexData::from_u32(vec![0, 65536]);
        assert_eq!(wide.index_size(), 4);
        assert_eq!(wide.as_bytes().len(), 8);
    }
}
