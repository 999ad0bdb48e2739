use behngine_assets::{Handle, MeshData};
use behngine_core::transform::Transform;
use glam::{Mat4, Vec3};
use uuid::Uuid;

pub const DEFAULT_OBJECT_COLOR: Vec3 = Vec3::new(1.0, 0.5, 0.31);
pub const FALLBACK_LIGHT_POSITION: Vec3 = Vec3::new(1.2, 1.0, 2.0);

/// A drawable mesh placed in the world.
#[derive(Debug, Clone)]
pub struct Object {
    pub id: Uuid,
    pub name: String,
    pub transform: Transform,
    pub color: Vec3,
    pub mesh: Handle<MeshData>,
}

impl Object {
    pub fn new(name: impl Into<String>, mesh: Handle<MeshData>, transform: Transform) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            transform,
            color: DEFAULT_OBJECT_COLOR,
            mesh,
        }
    }

    pub fn with_color(mut self, color: Vec3) -> Self {
        self.color = color;
        self
    }

    pub fn model_matrix(&self) -> Mat4 {
        self.transform.compute_matrix()
    }
}

/// A point light. It is also drawn, using `mesh`, so it can be seen in the scene.
#[derive(Debug, Clone)]
pub struct Light {
    pub id: Uuid,
    pub position: Vec3,
    pub color: Vec3,
    pub mesh: Handle<MeshData>,
}

impl Light {
    pub fn new(position: Vec3, color: Vec3, mesh: Handle<MeshData>) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            color,
            mesh,
        }
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
    }
}

/// Light parameters fed to the shading pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    pub position: Vec3,
    pub color: Vec3,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            position: FALLBACK_LIGHT_POSITION,
            color: Vec3::ONE,
        }
    }
}

#[derive(Debug, Default)]
pub struct Scene {
    pub objects: Vec<Object>,
    pub lights: Vec<Light>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn_object(&mut self, object: Object) -> Uuid {
        let id = object.id;
        log::debug!("Spawned object '{}' ({id})", object.name);
        self.objects.push(object);
        id
    }

    pub fn spawn_light(&mut self, light: Light) -> Uuid {
        let id = light.id;
        log::debug!("Spawned light at {} ({id})", light.position);
        self.lights.push(light);
        id
    }

    pub fn object(&self, id: Uuid) -> Option<&Object> {
        self.objects.iter().find(|object| object.id == id)
    }

    pub fn object_mut(&mut self, id: Uuid) -> Option<&mut Object> {
        self.objects.iter_mut().find(|object| object.id == id)
    }

    /// Only the first light takes part in shading.
    pub fn primary_light(&self) -> Option<&Light> {
        self.lights.first()
    }

    pub fn lighting(&self) -> Lighting {
        self.primary_light()
            .map(|light| Lighting {
                position: light.position,
                color: light.color,
            })
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.lights.is_empty()
    }
}
