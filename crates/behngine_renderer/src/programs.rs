pub mod mesh_program;

pub use mesh_program::{DrawItem, MeshProgram, MeshProgramInit};

/// Holds common WGPU references to simplify function signatures.
pub struct GpuProgramRenderContext<'a> {
    pub device: &'a wgpu::Device,
    pub format: wgpu::TextureFormat,
}

pub trait GpuProgram {
    /// Data required to build the pipeline.
    type InitData;

    /// Data required to draw a frame.
    type DrawData<'a>
    where
        Self: 'a;

    /// Creates the pipeline layout and the pipeline itself.
    fn new(ctx: &GpuProgramRenderContext, init_data: &Self::InitData) -> Self;

    /// Encodes the draw calls into the render pass.
    fn record<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>, data: Self::DrawData<'a>);
}
