use glam::{Mat4, Vec3};

const MAX_PITCH_DEGREES: f32 = 89.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Projection {
    pub fov_y_radians: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_y_radians: 60.0f32.to_radians(),
            aspect_ratio: 4.0 / 3.0,
            near: 0.1,
            far: 2000.0,
        }
    }
}

impl Projection {
    pub fn new(fov_y_degrees: f32, near: f32, far: f32) -> Self {
        Self {
            fov_y_radians: fov_y_degrees.to_radians(),
            near,
            far,
            ..Default::default()
        }
    }

    /// Keeps the aspect ratio in sync with the drawable size.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if height == 0 {
            return;
        }
        self.aspect_ratio = width as f32 / height as f32;
    }

    /// Computes the "Projection Matrix" (View -> Clip)
    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_radians, self.aspect_ratio, self.near, self.far)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraMovement {
    Forward,
    Backward,
    Left,
    Right,
    Raise,
    Lower,
}

/// Free-flying viewport camera driven by yaw/pitch angles (degrees).
#[derive(Clone, Debug)]
pub struct FlyCamera {
    pub position: Vec3,
    pub front: Vec3,
    pub up: Vec3,
    pub world_up: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    /// Units per second.
    pub speed: f32,
    /// Degrees per pixel of mouse travel.
    pub sensitivity: f32,
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 10.0), -90.0, 0.0)
    }
}

impl FlyCamera {
    pub fn new(position: Vec3, yaw: f32, pitch: f32) -> Self {
        let mut camera = Self {
            position,
            front: -Vec3::Z,
            up: Vec3::Y,
            world_up: Vec3::Y,
            yaw,
            pitch: pitch.clamp(-MAX_PITCH_DEGREES, MAX_PITCH_DEGREES),
            speed: 5.0,
            sensitivity: 0.1,
        };
        camera.update_vectors();
        camera
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    pub fn right(&self) -> Vec3 {
        self.front.cross(self.up).normalize()
    }

    pub fn translate(&mut self, movement: CameraMovement, delta_seconds: f32) {
        let distance = self.speed * delta_seconds;
        match movement {
            CameraMovement::Forward => self.position += self.front * distance,
            CameraMovement::Backward => self.position -= self.front * distance,
            CameraMovement::Left => self.position -= self.right() * distance,
            CameraMovement::Right => self.position += self.right() * distance,
            CameraMovement::Raise => self.position += self.up * distance,
            CameraMovement::Lower => self.position -= self.up * distance,
        }
    }

    /// Applies a cursor offset in pixels. Screen Y grows downwards.
    pub fn look(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.sensitivity;
        self.pitch = (self.pitch - dy * self.sensitivity)
            .clamp(-MAX_PITCH_DEGREES, MAX_PITCH_DEGREES);
        self.update_vectors();
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();
        let right = self.front.cross(self.world_up).normalize();
        self.up = right.cross(self.front).normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_looks_down_negative_z() {
        let camera = FlyCamera::default();
        assert!(camera.front.abs_diff_eq(-Vec3::Z, 1e-5));
        assert!(camera.up.abs_diff_eq(Vec3::Y, 1e-5));
        assert!(camera.right().abs_diff_eq(Vec3::X, 1e-5));
    }

    #[test]
    fn movement_scales_with_speed_and_delta() {
        let mut camera = FlyCamera::new(Vec3::ZERO, -90.0, 0.0);
        camera.speed = 2.0;

        camera.translate(CameraMovement::Forward, 0.5);
        assert!(camera.position.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-5));

        camera.translate(CameraMovement::Right, 1.0);
        assert!(camera.position.abs_diff_eq(Vec3::new(2.0, 0.0, -1.0), 1e-5));

        camera.translate(CameraMovement::Raise, 0.25);
        assert!(camera.position.abs_diff_eq(Vec3::new(2.0, 0.5, -1.0), 1e-5));

        camera.translate(CameraMovement::Backward, 0.5);
        camera.translate(CameraMovement::Left, 1.0);
        camera.translate(CameraMovement::Lower, 0.25);
        assert!(camera.position.abs_diff_eq(Vec3::ZERO, 1e-5));
    }

    #[test]
    fn pitch_is_clamped() {
        let mut camera = FlyCamera::default();
        camera.look(0.0, -10_000.0);
        assert_eq!(camera.pitch, MAX_PITCH_DEGREES);
        assert!(camera.front.y > 0.99);
        camera.look(0.0, 10_000.0);
        assert_eq!(camera.pitch, -MAX_PITCH_DEGREES);
    }

    #[test]
    fn yaw_turns_towards_positive_x() {
        let mut camera = FlyCamera::default();
        camera.sensitivity = 1.0;
        camera.look(90.0, 0.0);
        assert!(camera.front.abs_diff_eq(Vec3::X, 1e-5), "{:?}", camera.front);
    }

    #[test]
    fn view_matrix_moves_world_opposite_to_camera() {
        let camera = FlyCamera::new(Vec3::new(0.0, 0.0, 5.0), -90.0, 0.0);
        let p = camera.view_matrix().transform_point3(Vec3::ZERO);
        assert!(p.abs_diff_eq(Vec3::new(0.0, 0.0, -5.0), 1e-5));
    }

    #[test]
    fn projection_tracks_viewport() {
        let mut projection = Projection::default();
        projection.set_viewport(1024, 768);
        assert!((projection.aspect_ratio - 4.0 / 3.0).abs() < 1e-6);
        projection.set_viewport(800, 0);
        assert!((projection.aspect_ratio - 4.0 / 3.0).abs() < 1e-6);
        projection.set_viewport(1920, 1080);
        assert!((projection.aspect_ratio - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn projection_defaults() {
        let projection = Projection::new(60.0, 0.1, 2000.0);
        assert_eq!(projection, Projection::default());
    }
}
