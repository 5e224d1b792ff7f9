use crate::scene::{FillMode, SceneParams};
use crate::{ContextFlags, ContextParams};

use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cubelab", about = "Draws a rotating cube with Direct3D 12")]
pub struct Args {
    /// Client area width in pixels.
    #[arg(long, default_value_t = ContextParams::DEFAULT_WIDTH)]
    pub width: u32,

    /// Client area height in pixels.
    #[arg(long, default_value_t = ContextParams::DEFAULT_HEIGHT)]
    pub height: u32,

    /// Force using the software (WARP) adapter.
    #[arg(long, short = 'w')]
    pub warp: bool,

    /// Present without vsync when the display supports tearing.
    #[arg(long)]
    pub tearing: bool,

    /// Enable the D3D12 runtime debug layer.
    #[arg(long, overrides_with = "no_debug_layer")]
    pub debug_layer: bool,

    /// Disable the D3D12 runtime debug layer.
    #[arg(long, overrides_with = "debug_layer")]
    pub no_debug_layer: bool,

    /// Draw this OBJ mesh instead of the cube.
    #[arg(long, value_name = "FILE")]
    pub mesh: Option<PathBuf>,

    /// Load precompiled `color_vs.cso` and `color_ps.cso` from this directory.
    #[arg(long, value_name = "DIR")]
    pub shader_dir: Option<PathBuf>,

    /// Spin speed in radians per second.
    #[arg(long, default_value_t = 1.0)]
    pub rotation_speed: f32,

    /// Start in wireframe mode.
    #[arg(long)]
    pub wireframe: bool,
}

impl Args {
    pub fn context_params(&self) -> ContextParams {
        let mut params = ContextParams::new(
            "DirectX 12 Cube".to_string(),
            self.width.max(1),
            self.height.max(1),
        );

        params.flags.set(ContextFlags::FORCE_WARP, self.warp);
        params.flags.set(ContextFlags::ALLOW_TEARING, self.tearing);
        if self.debug_layer {
            params.flags.insert(ContextFlags::DEBUG_LAYER);
        } else if self.no_debug_layer {
            params.flags.remove(ContextFlags::DEBUG_LAYER);
        }
        params
    }

    pub fn scene_params(&self) -> SceneParams {
        SceneParams {
            rotation_speed: self.rotation_speed,
            fill_mode: if self.wireframe {
                FillMode::Wireframe
            } else {
                FillMode::Solid
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("cubelab").chain(args.iter().cloned())).unwrap()
    }

    #[test]
    fn defaults_describe_the_lab_window() {
        let args = parse(&[]);
        let params = args.context_params();
        assert_eq!((params.window_width, params.window_height), (800, 600));
        assert!(!params.flags.contains(ContextFlags::FORCE_WARP));
        assert_eq!(
            params.flags.contains(ContextFlags::DEBUG_LAYER),
            cfg!(debug_assertions)
        );
        assert_eq!(args.scene_params().fill_mode, FillMode::Solid);
        assert!(args.mesh.is_none());
    }

    #[test]
    fn flags_map_onto_context_flags() {
        let params = parse(&["--warp", "--tearing", "--no-debug-layer"]).context_params();
        assert!(params.flags.contains(ContextFlags::FORCE_WARP));
        assert!(params.flags.contains(ContextFlags::ALLOW_TEARING));
        assert!(!params.flags.contains(ContextFlags::DEBUG_LAYER));

        let params = parse(&["--debug-layer"]).context_params();
        assert!(params.flags.contains(ContextFlags::DEBUG_LAYER));
    }

    #[test]
    fn last_debug_layer_switch_wins() {
        let args = parse(&["--debug-layer", "--no-debug-layer"]);
        assert!(!args.context_params().flags.contains(ContextFlags::DEBUG_LAYER));
    }

    #[test]
    fn zero_sized_window_is_clamped() {
        let params = parse(&["--width", "0", "--height", "0"]).context_params();
        assert_eq!((params.window_width, params.window_height), (1, 1));
    }

    #[test]
    fn scene_options_are_forwarded() {
        let args = parse(&[
            "--wireframe",
            "--rotation-speed",
            "0.5",
            "--mesh",
            "bunny.obj",
        ]);
        let scene = args.scene_params();
        assert_eq!(scene.fill_mode, FillMode::Wireframe);
        assert_eq!(scene.rotation_speed, 0.5);
        assert_eq!(args.mesh, Some(PathBuf::from("bunny.obj")));
    }
}
