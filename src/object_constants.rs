use bytemuck::{Pod, Zeroable};
use cgmath::{Matrix4, SquareMatrix};

/// Hardware constant buffer views must be multiples of this size.
pub const CONSTANT_BUFFER_ALIGNMENT: usize = 256;

pub const fn constant_buffer_byte_size(byte_size: usize) -> usize {
    (byte_size + CONSTANT_BUFFER_ALIGNMENT - 1) & !(CONSTANT_BUFFER_ALIGNMENT - 1)
}

/// Per-object data bound at register `b0`.
///
/// The matrix is stored column-major, which is the default HLSL packing, so the
/// shader multiplies it on the left of a column vector.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ObjectConstants {
    pub world_view_proj: [[f32; 4]; 4],
}

impl ObjectConstants {
    pub fn new(world_view_proj: Matrix4<f32>) -> Self {
        ObjectConstants {
            world_view_proj: world_view_proj.into(),
        }
    }
}

impl Default for ObjectConstants {
    fn default() -> Self {
        Self::new(Matrix4::identity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::mem;

    #[test]
    fn sizes_round_up_to_256_bytes() {
        assert_eq!(constant_buffer_byte_size(0), 0);
        assert_eq!(constant_buffer_byte_size(1), 256);
        assert_eq!(constant_buffer_byte_size(64), 256);
        assert_eq!(constant_buffer_byte_size(256), 256);
        assert_eq!(constant_buffer_byte_size(257), 512);
        assert_eq!(constant_buffer_byte_size(300), 512);
    }

    #[test]
    fn constants_hold_a_single_matrix() {
        assert_eq!(mem::size_of::<ObjectConstants>(), 64);
        assert_eq!(
            constant_buffer_byte_size(mem::size_of::<ObjectConstants>()),
            256
        );
    }

    #[test]
    fn default_is_identity() {
        let constants = ObjectConstants::default();
        for (i, column) in constants.world_view_proj.iter().enumerate() {
            for (j, value) in column.iter().enumerate() {
                assert_eq!(*value, if i == j { 1.0 } else { 0.0 });
            }
        }
    }

    #[test]
    fn matrix_is_stored_by_columns() {
        let translation = Matrix4::from_translation(cgmath::Vector3::new(1.0, 2.0, 3.0));
        let constants = ObjectConstants::new(translation);
        assert_eq!(constants.world_view_proj[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(bytemuck::bytes_of(&constants).len(), 64);
    }
}
