use crate::camera::{perspective_fov_lh, OrbitCamera};
use crate::object_constants::ObjectConstants;

use cgmath::{Matrix4, Rad};

use std::f32::consts::PI;

const FIELD_OF_VIEW: Rad<f32> = Rad(0.25 * PI);
const NEAR_PLANE: f32 = 1.0;
const FAR_PLANE: f32 = 1000.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FillMode {
    Solid,
    Wireframe,
}

impl FillMode {
    pub fn toggle(self) -> Self {
        match self {
            FillMode::Solid => FillMode::Wireframe,
            FillMode::Wireframe => FillMode::Solid,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DragButton {
    Left,
    Right,
}

#[derive(Clone, Debug)]
pub struct SceneParams {
    /// Cube spin around the vertical axis, in radians per second.
    pub rotation_speed: f32,
    pub fill_mode: FillMode,
}

impl Default for SceneParams {
    fn default() -> Self {
        SceneParams {
            rotation_speed: 1.0,
            fill_mode: FillMode::Solid,
        }
    }
}

pub struct SceneState {
    pub camera: OrbitCamera,
    pub fill_mode: FillMode,
    rotation: Rad<f32>,
    rotation_speed: f32,
    drag: Option<DragButton>,
    last_cursor: (f32, f32),
}

impl SceneState {
    pub fn new(params: &SceneParams) -> Self {
        SceneState {
            camera: OrbitCamera::new(),
            fill_mode: params.fill_mode,
            rotation: Rad(0.0),
            rotation_speed: params.rotation_speed,
            drag: None,
            last_cursor: (0.0, 0.0),
        }
    }

    pub fn rotation(&self) -> Rad<f32> {
        self.rotation
    }

    pub fn update(&mut self, delta_time: f32) {
        let angle = (self.rotation.0 + self.rotation_speed * delta_time) % (2.0 * PI);
        self.rotation = Rad(angle);
    }

    pub fn world(&self) -> Matrix4<f32> {
        Matrix4::from_angle_y(self.rotation)
    }

    pub fn constants(&self, aspect_ratio: f32) -> ObjectConstants {
        let projection = perspective_fov_lh(FIELD_OF_VIEW, aspect_ratio, NEAR_PLANE, FAR_PLANE);
        ObjectConstants::new(projection * self.camera.view() * self.world())
    }

    pub fn toggle_fill_mode(&mut self) {
        self.fill_mode = self.fill_mode.toggle();
    }

    pub fn begin_drag(&mut self, button: DragButton, x: f32, y: f32) {
        self.drag = Some(button);
        self.last_cursor = (x, y);
    }

    pub fn end_drag(&mut self, button: DragButton) {
        if self.drag == Some(button) {
            self.drag = None;
        }
    }

    /// Left drag orbits the camera, right drag moves it closer or further.
    pub fn cursor_moved(&mut self, x: f32, y: f32) {
        let dx = x - self.last_cursor.0;
        let dy = y - self.last_cursor.1;
        match self.drag {
            Some(DragButton::Left) => self.camera.rotate(dx, dy),
            Some(DragButton::Right) => self.camera.zoom(dx, dy),
            None => {}
        }
        self.last_cursor = (x, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use cgmath::{Matrix, SquareMatrix, Vector4};

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn fill_mode_toggles_back_and_forth() {
        let mut scene = SceneState::new(&SceneParams::default());
        assert_eq!(scene.fill_mode, FillMode::Solid);
        scene.toggle_fill_mode();
        assert_eq!(scene.fill_mode, FillMode::Wireframe);
        scene.toggle_fill_mode();
        assert_eq!(scene.fill_mode, FillMode::Solid);
    }

    #[test]
    fn rotation_advances_with_time_and_wraps() {
        let mut scene = SceneState::new(&SceneParams {
            rotation_speed: 2.0,
            fill_mode: FillMode::Solid,
        });
        scene.update(0.25);
        assert!(approx(scene.rotation().0, 0.5));
        scene.update(PI);
        assert!(scene.rotation().0 < 2.0 * PI);
        assert!(approx(scene.rotation().0, 0.5));
    }

    #[test]
    fn cube_center_projects_inside_depth_range() {
        let scene = SceneState::new(&SceneParams::default());
        let constants = scene.constants(800.0 / 600.0);
        let m = Matrix4::from(constants.world_view_proj);
        let clip = m * Vector4::new(0.0, 0.0, 0.0, 1.0);
        let depth = clip.z / clip.w;
        assert!(approx(clip.x / clip.w, 0.0));
        assert!(approx(clip.y / clip.w, 0.0));
        assert!(depth > 0.0 && depth < 1.0);
        assert!(approx(clip.w, scene.camera.radius));
    }

    #[test]
    fn world_is_pure_rotation() {
        let mut scene = SceneState::new(&SceneParams::default());
        scene.update(0.7);
        let world = scene.world();
        let product = world * world.transpose();
        assert!(approx(product.x.x, 1.0));
        assert!(approx(product.y.y, 1.0));
        assert!(approx(product.z.z, 1.0));
        assert!(approx(world.determinant(), 1.0));
    }

    #[test]
    fn left_drag_orbits_and_right_drag_zooms() {
        let mut scene = SceneState::new(&SceneParams::default());
        let start = scene.camera;

        scene.cursor_moved(100.0, 100.0);
        assert_eq!(scene.camera, start);

        scene.begin_drag(DragButton::Left, 100.0, 100.0);
        scene.cursor_moved(140.0, 100.0);
        assert!(approx(scene.camera.theta - start.theta, 10f32.to_radians()));
        scene.end_drag(DragButton::Left);

        scene.begin_drag(DragButton::Right, 0.0, 0.0);
        scene.cursor_moved(100.0, 0.0);
        assert!(approx(scene.camera.radius, start.radius + 0.5));

        // Releasing a different button keeps the drag alive.
        scene.end_drag(DragButton::Left);
        scene.cursor_moved(200.0, 0.0);
        assert!(approx(scene.camera.radius, start.radius + 1.0));
    }
}
