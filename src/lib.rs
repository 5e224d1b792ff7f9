pub mod camera;
pub mod cli;
pub mod game_timer;
pub mod mesh;
pub mod object_constants;
pub mod scene;

#[cfg(windows)]
pub mod cube_app;
#[cfg(windows)]
pub mod game_core;
#[cfg(windows)]
pub mod graphics;

use bitflags::bitflags;

bitflags! {
    pub struct ContextFlags: u32 {
        const ALLOW_TEARING = 0b0000_0001;
        const FORCE_WARP = 0b0000_0010;
        const DEBUG_LAYER = 0b0000_0100;
    }
}

impl Default for ContextFlags {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            ContextFlags::DEBUG_LAYER
        } else {
            ContextFlags::empty()
        }
    }
}

#[derive(Clone, Debug)]
pub struct ContextParams {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub back_buffer_count: u32,
    pub clear_color: [f32; 4],
    pub flags: ContextFlags,
}

impl ContextParams {
    pub const DEFAULT_WIDTH: u32 = 800;
    pub const DEFAULT_HEIGHT: u32 = 600;

    pub fn new(window_title: String, window_width: u32, window_height: u32) -> Self {
        Self {
            window_title,
            window_width,
            window_height,
            back_buffer_count: 2,
            clear_color: [0.690, 0.769, 0.871, 1.0],
            flags: ContextFlags::default(),
        }
    }
}

impl Default for ContextParams {
    fn default() -> Self {
        Self::new(
            "DirectX 12 Cube".to_string(),
            Self::DEFAULT_WIDTH,
            Self::DEFAULT_HEIGHT,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_match_lab_window() {
        let params = ContextParams::default();
        assert_eq!(params.window_width, 800);
        assert_eq!(params.window_height, 600);
        assert_eq!(params.back_buffer_count, 2);
        assert!(!params.flags.contains(ContextFlags::FORCE_WARP));
        assert!(!params.flags.contains(ContextFlags::ALLOW_TEARING));
    }

    #[test]
    fn debug_layer_follows_build_profile() {
        assert_eq!(
            ContextFlags::default().contains(ContextFlags::DEBUG_LAYER),
            cfg!(debug_assertions)
        );
    }
}
