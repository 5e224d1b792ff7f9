use cgmath::{Deg, Matrix4, Point3, Rad, Vector3};

use std::f32::consts::PI;

const DEGREES_PER_PIXEL: Deg<f32> = Deg(0.25);
const ZOOM_PER_PIXEL: f32 = 0.005;
const MIN_PHI: f32 = 0.1;
const MAX_PHI: f32 = PI - 0.1;
const MIN_RADIUS: f32 = 3.0;
const MAX_RADIUS: f32 = 15.0;

/// Camera orbiting the origin on a sphere, in spherical coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OrbitCamera {
    pub theta: f32,
    pub phi: f32,
    pub radius: f32,
}

impl OrbitCamera {
    pub fn new() -> Self {
        Default::default()
    }

    /// Each pixel of mouse movement is a quarter of a degree.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        let dx = Rad::from(DEGREES_PER_PIXEL * dx).0;
        let dy = Rad::from(DEGREES_PER_PIXEL * dy).0;

        self.theta += dx;
        self.phi = (self.phi + dy).max(MIN_PHI).min(MAX_PHI);
    }

    pub fn zoom(&mut self, dx: f32, dy: f32) {
        let delta = ZOOM_PER_PIXEL * dx - ZOOM_PER_PIXEL * dy;
        self.radius = (self.radius + delta).max(MIN_RADIUS).min(MAX_RADIUS);
    }

    pub fn eye(&self) -> Point3<f32> {
        Point3::new(
            self.radius * self.phi.sin() * self.theta.cos(),
            self.radius * self.phi.cos(),
            self.radius * self.phi.sin() * self.theta.sin(),
        )
    }

    pub fn view(&self) -> Matrix4<f32> {
        Matrix4::look_at_lh(self.eye(), Point3::new(0.0, 0.0, 0.0), Vector3::unit_y())
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        OrbitCamera {
            theta: 1.5 * PI,
            phi: PI / 4.0,
            radius: 5.0,
        }
    }
}

/// Left-handed perspective projection mapping view depth `[near, far]` to `[0, 1]`.
pub fn perspective_fov_lh(fov_y: Rad<f32>, aspect: f32, near: f32, far: f32) -> Matrix4<f32> {
    let h = 1.0 / (fov_y.0 * 0.5).tan();
    let w = h / aspect;
    let range = far / (far - near);

    // Column-major: the third column carries view depth into w.
    #[rustfmt::skip]
    let projection = Matrix4::new(
        w, 0.0, 0.0, 0.0,
        0.0, h, 0.0, 0.0,
        0.0, 0.0, range, 1.0,
        0.0, 0.0, -range * near, 0.0,
    );
    projection
}

#[cfg(test)]
mod tests {
    use super::*;

    use cgmath::{Transform, Vector4};

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn default_eye_sits_on_negative_z_above_origin() {
        let eye = OrbitCamera::new().eye();
        let expected = 5.0 * (PI / 4.0).sin();
        assert!(approx(eye.x, 0.0), "{:?}", eye);
        assert!(approx(eye.y, 5.0 * (PI / 4.0).cos()), "{:?}", eye);
        assert!(approx(eye.z, -expected), "{:?}", eye);
    }

    #[test]
    fn view_places_origin_in_front_of_camera() {
        let camera = OrbitCamera::new();
        let origin = camera.view().transform_point(Point3::new(0.0, 0.0, 0.0));
        assert!(approx(origin.x, 0.0));
        assert!(approx(origin.y, 0.0));
        assert!(approx(origin.z, camera.radius));
    }

    #[test]
    fn phi_is_clamped_away_from_poles() {
        let mut camera = OrbitCamera::new();
        camera.rotate(0.0, 100_000.0);
        assert!(approx(camera.phi, MAX_PHI));
        camera.rotate(0.0, -100_000.0);
        assert!(approx(camera.phi, MIN_PHI));
    }

    #[test]
    fn rotate_uses_quarter_degree_per_pixel() {
        let mut camera = OrbitCamera::new();
        let theta = camera.theta;
        camera.rotate(4.0, 0.0);
        assert!(approx(camera.theta - theta, 1f32.to_radians()));
    }

    #[test]
    fn zoom_is_clamped() {
        let mut camera = OrbitCamera::new();
        camera.zoom(200.0, 0.0);
        assert!(approx(camera.radius, 6.0));
        camera.zoom(1e6, 0.0);
        assert!(approx(camera.radius, MAX_RADIUS));
        camera.zoom(0.0, 1e6);
        assert!(approx(camera.radius, MIN_RADIUS));
    }

    #[test]
    fn projection_maps_near_and_far_to_unit_depth() {
        let projection = perspective_fov_lh(Rad(0.25 * PI), 4.0 / 3.0, 1.0, 1000.0);

        let near = projection * Vector4::new(0.0, 0.0, 1.0, 1.0);
        assert!(approx(near.z / near.w, 0.0));

        let far = projection * Vector4::new(0.0, 0.0, 1000.0, 1.0);
        assert!(approx(far.z / far.w, 1.0));

        // w carries view depth for the perspective divide.
        let mid = projection * Vector4::new(0.0, 0.0, 10.0, 1.0);
        assert!(approx(mid.w, 10.0));
    }

    #[test]
    fn projection_scales_x_by_aspect() {
        let projection = perspective_fov_lh(Rad(0.5 * PI), 2.0, 1.0, 10.0);
        let p = projection * Vector4::new(1.0, 1.0, 1.0, 1.0);
        assert!(approx(p.x, 0.5));
        assert!(approx(p.y, 1.0));
    }
}
