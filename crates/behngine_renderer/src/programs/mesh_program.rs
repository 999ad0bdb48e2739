use wgpu::RenderPipeline;

use crate::{
    mesh::{GpuMesh, GpuVertex},
    programs::{GpuProgram, GpuProgramRenderContext},
    shaders::{FRAGMENT_ENTRY, VERTEX_ENTRY},
    texture::TextureHelper,
};

pub struct MeshProgramInit {
    pub label: &'static str,
    pub shader: wgpu::ShaderModule,
    pub uniforms_layout: wgpu::BindGroupLayout,
    pub polygon_mode: wgpu::PolygonMode,
}

/// One mesh plus the bind group holding its uniform blocks.
pub struct DrawItem<'a> {
    pub mesh: &'a GpuMesh,
    pub uniforms: &'a wgpu::BindGroup,
}

/// Draws indexed triangle lists with a single shader and a single bind group
/// per draw at group 0.
pub struct MeshProgram {
    pipeline: RenderPipeline,
}

impl GpuProgram for MeshProgram {
    type InitData = MeshProgramInit;
    type DrawData<'a> = &'a [DrawItem<'a>];

    fn new(ctx: &GpuProgramRenderContext, init: &Self::InitData) -> Self {
        let layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&format!("{} Pipeline Layout", init.label)),
                bind_group_layouts: &[&init.uniforms_layout],
                push_constant_ranges: &[],
            });

        let pipeline = ctx
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                cache: None,
                label: Some(init.label),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &init.shader,
                    entry_point: Some(VERTEX_ENTRY),
                    compilation_options: Default::default(),
                    buffers: &[GpuVertex::desc()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &init.shader,
                    entry_point: Some(FRAGMENT_ENTRY),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: ctx.format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: TextureHelper::DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    // OBJ winding is not reliable across exporters.
                    cull_mode: None,
                    polygon_mode: init.polygon_mode,
                    unclipped_depth: false,
                    conservative: false,
                },
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            });

        Self { pipeline }
    }

    fn record<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>, items: Self::DrawData<'a>) {
        if items.is_empty() {
            return;
        }

        render_pass.set_pipeline(&self.pipeline);

        for item in items {
            render_pass.set_bind_group(0, item.uniforms, &[]);
            render_pass.set_vertex_buffer(0, item.mesh.vertex_buffer.slice(..));
            render_pass.set_index_buffer(item.mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..item.mesh.index_count, 0, 0..1);
        }
    }
}
