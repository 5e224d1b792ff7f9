use cubelab::cli::Args;

use clap::Parser;
use env_logger::Env;
use log::error;

use std::process;

#[cfg(windows)]
fn run(args: &Args) -> Result<(), cubelab::game_core::Error> {
    use cubelab::cube_app::CubeApp;
    use cubelab::game_core::GameCore;
    use cubelab::graphics::ShaderSource;
    use cubelab::mesh::{obj, MeshData};

    use log::info;

    let mesh = match &args.mesh {
        Some(path) => {
            info!("Loading mesh from {}.", path.display());
            obj::load(path, obj::DEFAULT_EXTENT)?
        }
        None => MeshData::cube(),
    };
    let shader_source = match &args.shader_dir {
        Some(dir) => ShaderSource::Precompiled(dir.clone()),
        None => ShaderSource::Embedded,
    };

    let app = CubeApp::new(mesh, shader_source, &args.scene_params());
    GameCore::new(app).run(&args.context_params())
}

#[cfg(not(windows))]
fn run(_args: &Args) -> Result<(), String> {
    Err("Direct3D 12 is only available on Windows".to_string())
}

fn main() {
    let env = Env::default()
        .filter_or("CUBELAB_LOG", "info")
        .write_style_or("CUBELAB_LOG_STYLE", "auto");
    env_logger::init_from_env(env);

    let args = Args::parse();
    if let Err(e) = run(&args) {
        error!("{}", e);
        process::exit(1);
    }
}
