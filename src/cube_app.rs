use crate::game_core::GameApp;
use crate::game_timer::GameTimer;
use crate::graphics::{self, Context, Renderer, ShaderSource};
use crate::mesh::MeshData;
use crate::scene::{DragButton, SceneParams, SceneState};

use log::info;

use winit::event::{MouseButton, VirtualKeyCode};

/// Spins a mesh in front of an orbiting camera.
pub struct CubeApp {
    scene: SceneState,
    mesh: MeshData,
    shader_source: ShaderSource,
    renderer: Option<Renderer>,
}

impl CubeApp {
    pub fn new(mesh: MeshData, shader_source: ShaderSource, params: &SceneParams) -> Self {
        CubeApp {
            scene: SceneState::new(params),
            mesh,
            shader_source,
            renderer: None,
        }
    }
}

fn drag_button(button: MouseButton) -> Option<DragButton> {
    match button {
        MouseButton::Left => Some(DragButton::Left),
        MouseButton::Right => Some(DragButton::Right),
        _ => None,
    }
}

impl GameApp for CubeApp {
    fn activate(&mut self, context: &mut Context) -> Result<(), graphics::Error> {
        self.renderer = Some(Renderer::new(context, &self.mesh, &self.shader_source)?);
        Ok(())
    }

    fn deactivate(&mut self) {
        self.renderer = None;
    }

    fn update(&mut self, timer: &GameTimer, context: &Context) {
        self.scene.update(timer.delta_time() as f32);
        if let Some(renderer) = &mut self.renderer {
            renderer.update(&self.scene.constants(context.aspect_ratio()));
        }
    }

    fn render(&mut self, context: &Context) {
        if let Some(renderer) = &self.renderer {
            renderer.draw(context.command_list(), self.scene.fill_mode);
        }
    }

    fn on_mouse_down(&mut self, button: MouseButton, x: f32, y: f32) {
        if let Some(button) = drag_button(button) {
            self.scene.begin_drag(button, x, y);
        }
    }

    fn on_mouse_up(&mut self, button: MouseButton) {
        if let Some(button) = drag_button(button) {
            self.scene.end_drag(button);
        }
    }

    fn on_mouse_move(&mut self, x: f32, y: f32) {
        self.scene.cursor_moved(x, y);
    }

    fn on_key_down(&mut self, key: VirtualKeyCode) {
        if key == VirtualKeyCode::Key1 {
            self.scene.toggle_fill_mode();
            info!("Fill mode set to {:?}.", self.scene.fill_mode);
        }
    }
}
