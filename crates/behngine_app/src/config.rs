use std::{
    fs, io,
    path::{Path, PathBuf},
};

use behngine_assets::ObjLoadOptions;
use behngine_core::camera::{FlyCamera, Projection};
use behngine_renderer::{RendererSettings, ShadingMode};
use behngine_window::WindowSettings;
use glam::Vec3;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "behngine.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config `{path}`: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowSettings,
    pub camera: CameraConfig,
    pub render: RenderConfig,
    pub import: ObjLoadOptions,
    pub scene: SceneConfig,
}

impl AppConfig {
    pub fn from_json(source: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_json::from_str(source).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&source, path)
    }

    /// A missing file yields the defaults; anything else that goes wrong is an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match Self::load(path) {
            Err(ConfigError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                log::info!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                Ok(config)
            }
            Err(error) => Err(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    /// Degrees; -90 looks down -Z.
    pub yaw: f32,
    pub pitch: f32,
    pub speed: f32,
    pub sensitivity: f32,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 10.0],
            yaw: -90.0,
            pitch: 0.0,
            speed: 5.0,
            sensitivity: 0.1,
            fov_degrees: 60.0,
            near: 0.1,
            far: 2000.0,
        }
    }
}

impl CameraConfig {
    pub fn fly_camera(&self) -> FlyCamera {
        let mut camera = FlyCamera::new(Vec3::from(self.position), self.yaw, self.pitch);
        camera.speed = self.speed;
        camera.sensitivity = self.sensitivity;
        camera
    }

    pub fn projection(&self) -> Projection {
        Projection::new(self.fov_degrees, self.near, self.far)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub vsync: bool,
    pub clear_color: [f64; 4],
    pub shading: ShadingMode,
    pub wireframe: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let settings = RendererSettings::default();
        Self {
            vsync: settings.vsync,
            clear_color: settings.clear_color,
            shading: settings.shading,
            wireframe: settings.wireframe,
        }
    }
}

impl From<&RenderConfig> for RendererSettings {
    fn from(config: &RenderConfig) -> Self {
        Self {
            vsync: config.vsync,
            clear_color: config.clear_color,
            shading: config.shading,
            wireframe: config.wireframe,
        }
    }
}

/// Where an object's geometry comes from.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MeshSource {
    /// Relative paths resolve against `scene.asset_dir`.
    Obj { path: PathBuf },
    Triangle,
    Square,
    Sphere {
        #[serde(default = "default_sphere_radius")]
        radius: f32,
        #[serde(default = "default_sphere_resolution")]
        slices: u32,
        #[serde(default = "default_sphere_resolution")]
        stacks: u32,
    },
}

fn default_sphere_radius() -> f32 {
    0.5
}

fn default_sphere_resolution() -> u32 {
    6
}

fn default_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn default_object_color() -> [f32; 3] {
    behngine_scene::DEFAULT_OBJECT_COLOR.to_array()
}

fn default_light_color() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ObjectConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub mesh: MeshSource,
    #[serde(default)]
    pub position: [f32; 3],
    /// Rotation vector: direction is the axis, length the angle in radians.
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default = "default_scale")]
    pub scale: [f32; 3],
    #[serde(default = "default_object_color")]
    pub color: [f32; 3],
}

impl ObjectConfig {
    pub fn obj(path: &str, position: [f32; 3]) -> Self {
        Self {
            name: None,
            mesh: MeshSource::Obj { path: path.into() },
            position,
            rotation: [0.0; 3],
            scale: default_scale(),
            color: default_object_color(),
        }
    }

    pub fn display_name(&self) -> String {
        match (&self.name, &self.mesh) {
            (Some(name), _) => name.clone(),
            (None, MeshSource::Obj { path }) => path.display().to_string(),
            (None, MeshSource::Triangle) => "triangle".to_string(),
            (None, MeshSource::Square) => "square".to_string(),
            (None, MeshSource::Sphere { .. }) => "sphere".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LightConfig {
    pub position: [f32; 3],
    #[serde(default = "default_light_color")]
    pub color: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub asset_dir: PathBuf,
    pub objects: Vec<ObjectConfig>,
    pub lights: Vec<LightConfig>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            asset_dir: PathBuf::from("resources/obj"),
            objects: vec![
                ObjectConfig::obj("tree.obj", [-4.0, 0.0, 0.0]),
                ObjectConfig::obj("cube.obj", [0.0, 0.0, 0.0]),
                ObjectConfig::obj("tree.obj", [4.0, 0.0, 0.0]),
            ],
            lights: vec![LightConfig {
                position: [-2.0, 0.0, 1.0],
                color: [1.0, 0.5, 0.5],
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> AppConfig {
        AppConfig::from_json(json, Path::new("test.json")).unwrap()
    }

    #[test]
    fn empty_object_is_the_default_demo() {
        let config = parse("{}");

        assert_eq!(config.window, WindowSettings::default());
        assert_eq!(config.camera, CameraConfig::default());
        assert_eq!(config.import, ObjLoadOptions::default());
        assert_eq!(config.scene.asset_dir, PathBuf::from("resources/obj"));

        let positions: Vec<_> = config.scene.objects.iter().map(|o| o.position).collect();
        assert_eq!(positions, vec![[-4.0, 0.0, 0.0], [0.0, 0.0, 0.0], [4.0, 0.0, 0.0]]);
        assert_eq!(config.scene.objects[1].mesh, MeshSource::Obj { path: "cube.obj".into() });
        assert_eq!(config.scene.lights[0].color, [1.0, 0.5, 0.5]);
    }

    #[test]
    fn parses_every_mesh_source() {
        let config = parse(
            r#"{
                "render": { "shading": "flat", "wireframe": true },
                "import": { "flip_y": true },
                "scene": {
                    "objects": [
                        { "mesh": { "kind": "obj", "path": "teapot.obj" }, "scale": [2, 2, 2] },
                        { "name": "floor", "mesh": { "kind": "square" }, "rotation": [-1.5708, 0, 0] },
                        { "mesh": { "kind": "triangle" }, "color": [0, 1, 0] },
                        { "mesh": { "kind": "sphere", "radius": 2.0 } }
                    ],
                    "lights": [{ "position": [0, 5, 0] }]
                }
            }"#,
        );

        assert_eq!(config.render.shading, ShadingMode::Flat);
        assert!(config.render.wireframe);
        assert!(config.import.flip_y);
        assert!(config.import.triangulate);

        let objects = &config.scene.objects;
        assert_eq!(objects.len(), 4);
        assert_eq!(objects[0].scale, [2.0, 2.0, 2.0]);
        assert_eq!(objects[0].display_name(), "teapot.obj");
        assert_eq!(objects[1].display_name(), "floor");
        assert_eq!(objects[1].mesh, MeshSource::Square);
        assert_eq!(objects[2].color, [0.0, 1.0, 0.0]);
        assert_eq!(objects[2].scale, [1.0, 1.0, 1.0]);
        assert_eq!(
            objects[3].mesh,
            MeshSource::Sphere {
                radius: 2.0,
                slices: 6,
                stacks: 6
            }
        );

        assert_eq!(config.scene.lights, vec![LightConfig {
            position: [0.0, 5.0, 0.0],
            color: [1.0, 1.0, 1.0]
        }]);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let error = AppConfig::from_json("{ \"window\": 3 }", Path::new("bad.json")).unwrap_err();
        assert!(matches!(error, ConfigError::Json { .. }));
        assert!(error.to_string().contains("bad.json"));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("behngine-definitely-missing.json");
        let config = AppConfig::load_or_default(&path).unwrap();
        assert_eq!(config.scene.objects.len(), 3);
    }

    #[test]
    fn loads_from_disk() {
        let path = std::env::temp_dir().join(format!("behngine-config-{}.json", std::process::id()));
        fs::write(&path, r#"{ "window": { "title": "demo" }, "camera": { "speed": 12.5 } }"#).unwrap();

        let config = AppConfig::load(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.window.title, "demo");
        assert_eq!(config.camera.speed, 12.5);
        assert_eq!(config.camera.fly_camera().speed, 12.5);
    }

    #[test]
    fn render_config_converts_to_settings() {
        let settings = RendererSettings::from(&RenderConfig::default());
        assert_eq!(settings, RendererSettings::default());
    }
}
