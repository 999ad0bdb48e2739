use glam::{Mat4, Quat, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_xyz(x: f32, y: f32, z: f32) -> Self {
        Self {
            translation: Vec3::new(x, y, z),
            ..Default::default()
        }
    }

    /// Builds a rotation from a rotation vector: its length is the angle in
    /// radians, its direction the axis. A zero vector means no rotation.
    pub fn from_rotation_vector(rotation: Vec3) -> Quat {
        let angle = rotation.length();
        if angle > 0.0 {
            Quat::from_axis_angle(rotation / angle, angle)
        } else {
            Quat::IDENTITY
        }
    }

    pub fn with_rotation_vector(mut self, rotation: Vec3) -> Self {
        self.rotation = Self::from_rotation_vector(rotation);
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Rotates the object around the Y axis (Global Up)
    pub fn rotate_y(&mut self, angle_radians: f32) {
        self.rotation = Quat::from_rotation_y(angle_radians) * self.rotation;
    }

    // --- Matrices ---

    /// Creates the Model Matrix (Local -> World), `T * R * S`.
    pub fn compute_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    // --- Directions ---

    /// Returns the "Forward" direction (-Z) relative to current rotation
    pub fn forward(&self) -> Vec3 {
        self.rotation * -Vec3::Z
    }

    /// Returns the "Right" direction (+X) relative to current rotation
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Returns the "Up" direction (+Y) relative to current rotation
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }
}
