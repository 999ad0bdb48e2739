use std::{collections::HashMap, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use behngine_assets::{AssetEvent, AssetServer, Assets, Handle, MeshData, primitives};
use behngine_core::{
    IoTaskPool,
    camera::{CameraMovement, FlyCamera, Projection},
    transform::Transform,
};
use behngine_input::{CursorLock, InputState, actions};
use behngine_renderer::{FrameView, Renderer, RendererSettings};
use behngine_scene::{Light, Object, Scene};
use behngine_window::{AppControl, EngineApp, FrameContext, apply_cursor_lock};
use glam::Vec3;
use winit::window::Window;

use crate::config::{AppConfig, MeshSource, ObjectConfig};

const LIGHT_MARKER_RADIUS: f32 = 0.5;
const LIGHT_MARKER_RESOLUTION: u32 = 6;

const MOVEMENT_BINDINGS: [(behngine_input::ActionId, CameraMovement); 6] = [
    (actions::VIEWPORT_FORWARD, CameraMovement::Forward),
    (actions::VIEWPORT_BACKWARDS, CameraMovement::Backward),
    (actions::VIEWPORT_LEFT, CameraMovement::Left),
    (actions::VIEWPORT_RIGHT, CameraMovement::Right),
    (actions::VIEWPORT_RAISE, CameraMovement::Raise),
    (actions::VIEWPORT_LOWER, CameraMovement::Lower),
];

/// The interactive scene viewer: a fly camera over a handful of meshes and lights.
pub struct Viewer {
    config: AppConfig,

    // Keeps the IO runtime alive for the asset server.
    _io_pool: IoTaskPool,
    asset_server: AssetServer,
    meshes: Assets<MeshData>,
    scene: Scene,

    camera: FlyCamera,
    projection: Projection,
    cursor: CursorLock,

    renderer: Option<Renderer>,
}

impl Viewer {
    pub fn new(config: AppConfig) -> Result<Self> {
        let io_pool = IoTaskPool::new().context("failed to start the IO runtime")?;
        let asset_server = AssetServer::new(io_pool.handle());

        Ok(Self {
            camera: config.camera.fly_camera(),
            projection: config.camera.projection(),
            cursor: CursorLock::new(config.window.cursor_locked),
            config,
            _io_pool: io_pool,
            asset_server,
            meshes: Assets::default(),
            scene: Scene::new(),
            renderer: None,
        })
    }

    /// Spawns every configured object and light. OBJ files are requested from
    /// the asset server (each path once); built-in shapes are created in place.
    fn spawn_scene(&mut self) {
        let mut requested: HashMap<PathBuf, Handle<MeshData>> = HashMap::new();

        for object in self.config.scene.objects.clone() {
            let mesh = self.mesh_for(&object, &mut requested);
            let transform = Transform::from_xyz(object.position[0], object.position[1], object.position[2])
                .with_rotation_vector(Vec3::from(object.rotation))
                .with_scale(Vec3::from(object.scale));

            self.scene.spawn_object(
                Object::new(object.display_name(), mesh, transform).with_color(Vec3::from(object.color)),
            );
        }

        if !self.config.scene.lights.is_empty() {
            let marker = self.meshes.add(primitives::uv_sphere(
                LIGHT_MARKER_RADIUS,
                LIGHT_MARKER_RESOLUTION,
                LIGHT_MARKER_RESOLUTION,
            ));
            for light in &self.config.scene.lights {
                self.scene
                    .spawn_light(Light::new(Vec3::from(light.position), Vec3::from(light.color), marker));
            }
        }

        log::info!(
            "Scene ready: {} objects, {} lights, {} meshes loading",
            self.scene.objects.len(),
            self.scene.lights.len(),
            self.asset_server.pending()
        );
    }

    fn mesh_for(&mut self, object: &ObjectConfig, requested: &mut HashMap<PathBuf, Handle<MeshData>>) -> Handle<MeshData> {
        match &object.mesh {
            MeshSource::Obj { path } => {
                let path = self.config.scene.asset_dir.join(path);
                *requested
                    .entry(path)
                    .or_insert_with_key(|path| self.asset_server.load_mesh(path, self.config.import))
            }
            MeshSource::Triangle => self.meshes.add(primitives::triangle()),
            MeshSource::Square => self.meshes.add(primitives::square()),
            MeshSource::Sphere { radius, slices, stacks } => {
                self.meshes.add(primitives::uv_sphere(*radius, *slices, *stacks))
            }
        }
    }

    /// Moves finished loads into the asset store and uploads whatever the GPU
    /// doesn't have yet.
    fn sync_meshes(&mut self) {
        for event in self.asset_server.flush(&mut self.meshes) {
            if let AssetEvent::Failed { path, .. } = event {
                log::warn!("Objects using {} will not be drawn", path.display());
            }
        }

        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        for (handle, data) in self.meshes.iter() {
            if !renderer.has_mesh(handle) {
                renderer.upload_mesh(handle, data);
            }
        }
    }

    fn frame_view(&self) -> FrameView {
        FrameView {
            projection: self.projection.matrix(),
            view: self.camera.view_matrix(),
        }
    }
}

/// Flies the camera for every held movement action.
fn move_camera(camera: &mut FlyCamera, input: &InputState, delta_seconds: f32) {
    for (action, movement) in MOVEMENT_BINDINGS {
        if input.is_held(action) {
            camera.translate(movement, delta_seconds);
        }
    }
}

impl EngineApp for Viewer {
    fn init(&mut self, window: Arc<Window>) -> Result<()> {
        let size = window.inner_size();
        self.projection.set_viewport(size.width, size.height);

        let renderer = Renderer::new(
            window,
            size.width,
            size.height,
            RendererSettings::from(&self.config.render),
        )
        .context("failed to initialize the renderer")?;
        self.renderer = Some(renderer);

        self.spawn_scene();
        self.sync_meshes();
        Ok(())
    }

    fn update(&mut self, ctx: &mut FrameContext) -> AppControl {
        let input = ctx.input;

        if input.just_pressed(actions::QUIT_PROGRAM) {
            log::info!("Quitting 3D rendering engine after {:.1}s", ctx.time.elapsed_seconds());
            return AppControl::Exit;
        }

        self.sync_meshes();

        move_camera(&mut self.camera, input, ctx.time.delta_seconds());

        if self.cursor.is_locked() {
            let (dx, dy) = input.mouse_delta;
            if dx != 0.0 || dy != 0.0 {
                self.camera.look(dx, dy);
            }
        }

        if input.just_pressed(actions::CHANGE_CURSOR_LOCK_STATE) {
            if let Some(locked) = self.cursor.toggle(ctx.now) {
                apply_cursor_lock(ctx.window, locked);
            }
        }

        if input.just_pressed(actions::TOGGLE_WIREFRAME) {
            if let Some(renderer) = self.renderer.as_mut() {
                let enabled = renderer.set_wireframe(!renderer.wireframe());
                log::info!("Wireframe {}", if enabled { "on" } else { "off" });
            }
        }

        if input.just_pressed(actions::CYCLE_SHADING) {
            if let Some(renderer) = self.renderer.as_mut() {
                renderer.set_shading(renderer.shading().next());
            }
        }

        if input.just_pressed(actions::INPUT_TEST) {
            log::info!("Input test!");
        }

        AppControl::Continue
    }

    fn render(&mut self) -> Result<()> {
        let view = self.frame_view();
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.render(&self.scene, &view)?;
        }
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.projection.set_viewport(width, height);
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.resize(width, height);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LightConfig;
    use behngine_input::{InputMap, KeyCode, PhysicalInputId};

    fn primitive_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.scene.objects = vec![
            ObjectConfig {
                name: Some("floor".into()),
                mesh: MeshSource::Square,
                position: [0.0, -1.0, 0.0],
                rotation: [-std::f32::consts::FRAC_PI_2, 0.0, 0.0],
                scale: [10.0, 10.0, 1.0],
                color: [0.5, 0.5, 0.5],
            },
            ObjectConfig {
                name: None,
                mesh: MeshSource::Triangle,
                position: [1.0, 0.0, 0.0],
                rotation: [0.0; 3],
                scale: [1.0; 3],
                color: [1.0, 0.0, 0.0],
            },
        ];
        config.scene.lights = vec![
            LightConfig {
                position: [0.0, 3.0, 0.0],
                color: [1.0, 1.0, 1.0],
            },
            LightConfig {
                position: [5.0, 3.0, 0.0],
                color: [0.0, 0.0, 1.0],
            },
        ];
        config
    }

    #[test]
    fn spawns_primitives_without_io() {
        let mut viewer = Viewer::new(primitive_config()).unwrap();
        viewer.spawn_scene();

        assert_eq!(viewer.scene.objects.len(), 2);
        assert_eq!(viewer.scene.lights.len(), 2);
        assert_eq!(viewer.asset_server.pending(), 0);
        // Two shapes plus one marker sphere shared by both lights.
        assert_eq!(viewer.meshes.len(), 3);
        assert_eq!(viewer.scene.lights[0].mesh, viewer.scene.lights[1].mesh);

        let floor = &viewer.scene.objects[0];
        assert_eq!(floor.name, "floor");
        assert_eq!(floor.color, Vec3::new(0.5, 0.5, 0.5));
        assert_eq!(floor.transform.translation, Vec3::new(0.0, -1.0, 0.0));
        // Laid flat: its local up now points along -Z.
        assert!(floor.transform.up().abs_diff_eq(-Vec3::Z, 1e-5));
        assert_eq!(viewer.scene.objects[1].name, "triangle");

        let marker = viewer.meshes.get(viewer.scene.lights[0].mesh).unwrap();
        assert_eq!(marker.vertices.len(), 7 * 7);
    }

    #[test]
    fn default_scene_requests_each_obj_once() {
        let mut config = AppConfig::default();
        config.scene.asset_dir = std::env::temp_dir().join("behngine-missing-assets");
        let mut viewer = Viewer::new(config).unwrap();
        viewer.spawn_scene();

        assert_eq!(viewer.scene.objects.len(), 3);
        assert_eq!(viewer.scene.lights.len(), 1);
        // tree.obj is shared by two objects.
        assert_eq!(viewer.asset_server.pending(), 2);
        assert_eq!(viewer.scene.objects[0].mesh, viewer.scene.objects[2].mesh);
        assert_ne!(viewer.scene.objects[0].mesh, viewer.scene.objects[1].mesh);

        let light = &viewer.scene.lights[0];
        assert_eq!(light.position, Vec3::new(-2.0, 0.0, 1.0));
        assert_eq!(light.color, Vec3::new(1.0, 0.5, 0.5));
    }

    #[test]
    fn held_actions_fly_the_camera() {
        let map = InputMap::viewport_defaults();
        let mut input = InputState::default();
        input.press(PhysicalInputId::key(KeyCode::KeyW));
        input.press(PhysicalInputId::key(KeyCode::Space));
        map.apply(&mut input);

        let mut camera = FlyCamera::default();
        let start = camera.position;
        move_camera(&mut camera, &input, 0.5);

        // Speed 5 for half a second, forward (-Z) and up.
        assert!(camera.position.abs_diff_eq(start + Vec3::new(0.0, 2.5, -2.5), 1e-4));
    }

    #[test]
    fn idle_input_keeps_the_camera_still() {
        let map = InputMap::viewport_defaults();
        let mut input = InputState::default();
        map.apply(&mut input);

        let mut camera = FlyCamera::default();
        let start = camera.position;
        move_camera(&mut camera, &input, 1.0);
        assert_eq!(camera.position, start);
    }

    #[test]
    fn frame_view_uses_camera_and_projection() {
        let viewer = Viewer::new(AppConfig::default()).unwrap();
        let view = viewer.frame_view();
        assert_eq!(view.view, viewer.camera.view_matrix());
        assert_eq!(view.projection, viewer.projection.matrix());
    }
}
