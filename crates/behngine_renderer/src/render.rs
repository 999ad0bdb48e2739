use std::collections::{HashMap, HashSet};

use behngine_assets::{Handle, MeshData};
use behngine_scene::{Lighting, Scene};
use glam::{Mat4, Vec3};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;
use wgpu::{Device, Queue, Surface, SurfaceConfiguration, SurfaceError, util::DeviceExt};

use crate::{
    mesh::GpuMesh,
    programs::{DrawItem, GpuProgram, GpuProgramRenderContext, MeshProgram, MeshProgramInit},
    shaders::{self, SHADER_FLAT, SHADER_LIGHT, SHADER_PHONG, ShaderError, ShaderSource},
    texture::TextureHelper,
    uniforms::{PerspectiveBlock, PhongBlock},
};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("the surface is not supported by the selected adapter")]
    UnsupportedSurface,

    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error("the GPU ran out of memory while acquiring a frame")]
    OutOfMemory,
}

/// Which program draws the scene objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShadingMode {
    #[default]
    Phong,
    Flat,
}

impl ShadingMode {
    pub fn next(self) -> Self {
        match self {
            ShadingMode::Phong => ShadingMode::Flat,
            ShadingMode::Flat => ShadingMode::Phong,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RendererSettings {
    pub vsync: bool,
    pub clear_color: [f64; 4],
    pub shading: ShadingMode,
    pub wireframe: bool,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            vsync: true,
            clear_color: [0.52, 0.80, 0.96, 1.0],
            shading: ShadingMode::Phong,
            wireframe: false,
        }
    }
}

/// Camera matrices for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameView {
    pub projection: Mat4,
    pub view: Mat4,
}

/// What happened after the surface refused to hand out a frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    Reconfigured,
    SkipFrame,
    Fatal,
}

/// A program compiled in fill mode, plus a line-mode twin when the adapter
/// supports it.
struct ProgramVariants {
    fill: MeshProgram,
    line: Option<MeshProgram>,
}

impl ProgramVariants {
    fn select(&self, wireframe: bool) -> &MeshProgram {
        match (&self.line, wireframe) {
            (Some(line), true) => line,
            _ => &self.fill,
        }
    }
}

// Uniform storage for one draw, kept across frames.
struct DrawUniforms {
    perspective: wgpu::Buffer,
    phong: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

pub struct Renderer {
    surface: Surface<'static>,
    device: Device,
    queue: Queue,
    config: SurfaceConfiguration,
    depth_texture: wgpu::TextureView,

    uniforms_layout: wgpu::BindGroupLayout,
    phong_program: ProgramVariants,
    flat_program: ProgramVariants,
    light_program: ProgramVariants,

    meshes: HashMap<Handle<MeshData>, GpuMesh>,
    draw_uniforms: HashMap<Uuid, DrawUniforms>,

    settings: RendererSettings,
    supports_wireframe: bool,
}

impl Renderer {
    pub fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        settings: RendererSettings,
    ) -> Result<Self, RenderError> {
        log::info!("Initializing GPU");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance.create_surface(target)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))?;

        let info = adapter.get_info();
        log::info!("Using adapter: {} ({:?})", info.name, info.backend);

        let supports_wireframe = adapter.features().contains(wgpu::Features::POLYGON_MODE_LINE);
        let required_features = if supports_wireframe {
            wgpu::Features::POLYGON_MODE_LINE
        } else {
            wgpu::Features::empty()
        };

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("behngine device"),
            required_features,
            ..Default::default()
        }))?;

        let caps = surface.get_capabilities(&adapter);
        let format = choose_surface_format(&caps.formats).ok_or(RenderError::UnsupportedSurface)?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: choose_present_mode(&caps.present_modes, settings.vsync),
            desired_maximum_frame_latency: 2,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let depth_texture = TextureHelper::create_depth_texture(&device, config.width, config.height, "Depth Texture");
        let uniforms_layout = create_uniforms_layout(&device);

        let ctx = GpuProgramRenderContext {
            device: &device,
            format: config.format,
        };
        let phong_program = build_program(&ctx, &uniforms_layout, &SHADER_PHONG, supports_wireframe)?;
        let flat_program = build_program(&ctx, &uniforms_layout, &SHADER_FLAT, supports_wireframe)?;
        let light_program = build_program(&ctx, &uniforms_layout, &SHADER_LIGHT, supports_wireframe)?;

        log::info!("Pipelines compiled ({format:?}, {:?})", config.present_mode);

        let wireframe_requested = settings.wireframe;

        let mut renderer = Self {
            surface,
            device,
            queue,
            config,
            depth_texture,
            uniforms_layout,
            phong_program,
            flat_program,
            light_program,
            meshes: HashMap::new(),
            draw_uniforms: HashMap::new(),
            settings: RendererSettings {
                wireframe: false,
                ..settings
            },
            supports_wireframe,
        };
        renderer.set_wireframe(wireframe_requested);
        Ok(renderer)
    }

    pub fn upload_mesh(&mut self, handle: Handle<MeshData>, data: &MeshData) {
        if data.indices.is_empty() || data.vertices.is_empty() {
            log::warn!("Skipping upload of empty mesh {:?}", handle);
            return;
        }

        let mesh = GpuMesh::upload(&self.device, data, &handle.id.to_string());
        log::debug!(
            "Uploaded mesh {:?}: {} vertices, {} indices",
            handle,
            data.vertices.len(),
            mesh.index_count
        );
        self.meshes.insert(handle, mesh);
    }

    pub fn has_mesh(&self, handle: Handle<MeshData>) -> bool {
        self.meshes.contains_key(&handle)
    }

    /// Reconfigures the surface and the depth buffer. A zero-sized window is
    /// ignored until it gets a real size again.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture = TextureHelper::create_depth_texture(&self.device, width, height, "Depth Texture");
    }

    /// Returns the mode actually in effect.
    pub fn set_wireframe(&mut self, enabled: bool) -> bool {
        if enabled && !self.supports_wireframe {
            log::warn!("Wireframe requested but the adapter has no POLYGON_MODE_LINE; staying filled");
            self.settings.wireframe = false;
        } else {
            self.settings.wireframe = enabled;
        }
        self.settings.wireframe
    }

    pub fn wireframe(&self) -> bool {
        self.settings.wireframe
    }

    pub fn set_shading(&mut self, shading: ShadingMode) {
        log::info!("Shading: {shading:?}");
        self.settings.shading = shading;
    }

    pub fn shading(&self) -> ShadingMode {
        self.settings.shading
    }

    pub fn render(&mut self, scene: &Scene, frame: &FrameView) -> Result<(), RenderError> {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(error) => {
                return match self.handle_surface_error(error) {
                    SurfaceErrorAction::Fatal => Err(RenderError::OutOfMemory),
                    SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => Ok(()),
                };
            }
        };
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let lighting = scene.lighting();
        let mut live = HashSet::with_capacity(scene.objects.len() + scene.lights.len());

        // 1. Update uniforms for everything that can be drawn this frame.
        let mut object_draws = Vec::with_capacity(scene.objects.len());
        for object in &scene.objects {
            if !self.meshes.contains_key(&object.mesh) {
                continue;
            }
            let model = object.model_matrix();
            let perspective = PerspectiveBlock::new(frame.projection, frame.view, model);
            let phong = PhongBlock::new(frame.view, model, object.color, &lighting);
            self.write_draw_uniforms(object.id, &perspective, &phong);
            live.insert(object.id);
            object_draws.push((object.id, object.mesh));
        }

        let mut light_draws = Vec::with_capacity(scene.lights.len());
        for light in &scene.lights {
            if !self.meshes.contains_key(&light.mesh) {
                continue;
            }
            let model = light.model_matrix();
            let perspective = PerspectiveBlock::new(frame.projection, frame.view, model);
            let phong = PhongBlock::new(
                frame.view,
                model,
                Vec3::ONE,
                &Lighting {
                    position: light.position,
                    color: light.color,
                },
            );
            self.write_draw_uniforms(light.id, &perspective, &phong);
            live.insert(light.id);
            light_draws.push((light.id, light.mesh));
        }

        self.draw_uniforms.retain(|id, _| live.contains(id));

        // 2. Resolve draw items against the GPU caches.
        let object_items = self.draw_items(&object_draws);
        let light_items = self.draw_items(&light_draws);

        let object_program = match self.settings.shading {
            ShadingMode::Phong => &self.phong_program,
            ShadingMode::Flat => &self.flat_program,
        }
        .select(self.settings.wireframe);
        let light_program = self.light_program.select(self.settings.wireframe);

        let [r, g, b, a] = self.settings.clear_color;
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            object_program.record(&mut render_pass, &object_items);
            light_program.record(&mut render_pass, &light_items);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    fn handle_surface_error(&mut self, error: SurfaceError) -> SurfaceErrorAction {
        match error {
            SurfaceError::Lost | SurfaceError::Outdated => {
                log::warn!("Surface {error}; reconfiguring");
                self.surface.configure(&self.device, &self.config);
                SurfaceErrorAction::Reconfigured
            }
            SurfaceError::OutOfMemory => {
                log::error!("Surface out of memory");
                SurfaceErrorAction::Fatal
            }
            // Timeout and anything transient.
            _ => {
                log::warn!("Skipping frame: {error}");
                SurfaceErrorAction::SkipFrame
            }
        }
    }

    fn write_draw_uniforms(&mut self, id: Uuid, perspective: &PerspectiveBlock, phong: &PhongBlock) {
        if let Some(uniforms) = self.draw_uniforms.get(&id) {
            self.queue
                .write_buffer(&uniforms.perspective, 0, bytemuck::bytes_of(perspective));
            self.queue.write_buffer(&uniforms.phong, 0, bytemuck::bytes_of(phong));
            return;
        }

        let perspective = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Perspective Block"),
            contents: bytemuck::bytes_of(perspective),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let phong = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Phong Block"),
            contents: bytemuck::bytes_of(phong),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Draw Bind Group"),
            layout: &self.uniforms_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: perspective.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: phong.as_entire_binding(),
                },
            ],
        });

        self.draw_uniforms.insert(
            id,
            DrawUniforms {
                perspective,
                phong,
                bind_group,
            },
        );
    }

    fn draw_items(&self, draws: &[(Uuid, Handle<MeshData>)]) -> Vec<DrawItem<'_>> {
        draws
            .iter()
            .filter_map(|(id, mesh)| {
                Some(DrawItem {
                    mesh: self.meshes.get(mesh)?,
                    uniforms: &self.draw_uniforms.get(id)?.bind_group,
                })
            })
            .collect()
    }
}

fn create_uniforms_layout(device: &Device) -> wgpu::BindGroupLayout {
    let uniform_entry = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    };

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Draw Uniforms Layout"),
        entries: &[
            // --- BINDING 0: PerspectiveBlock ---
            uniform_entry(0),
            // --- BINDING 1: PhongBlock ---
            uniform_entry(1),
        ],
    })
}

fn build_program(
    ctx: &GpuProgramRenderContext,
    uniforms_layout: &wgpu::BindGroupLayout,
    source: &ShaderSource,
    with_wireframe: bool,
) -> Result<ProgramVariants, ShaderError> {
    let shader = shaders::compile(ctx.device, source)?;

    let init = |polygon_mode| MeshProgramInit {
        label: source.name,
        shader: shader.clone(),
        uniforms_layout: uniforms_layout.clone(),
        polygon_mode,
    };

    let fill = MeshProgram::new(ctx, &init(wgpu::PolygonMode::Fill));
    let line = with_wireframe.then(|| MeshProgram::new(ctx, &init(wgpu::PolygonMode::Line)));
    Ok(ProgramVariants { fill, line })
}

fn choose_surface_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    let preferred = [
        wgpu::TextureFormat::Bgra8UnormSrgb,
        wgpu::TextureFormat::Rgba8UnormSrgb,
    ];
    preferred
        .into_iter()
        .find(|format| formats.contains(format))
        .or_else(|| formats.first().copied())
}

fn choose_present_mode(available: &[wgpu::PresentMode], vsync: bool) -> wgpu::PresentMode {
    if !vsync && available.contains(&wgpu::PresentMode::Immediate) {
        wgpu::PresentMode::Immediate
    } else {
        wgpu::PresentMode::Fifo
    }
}
