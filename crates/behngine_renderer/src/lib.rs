pub mod mesh;
pub mod programs;
mod render;
pub mod shaders;
mod texture;
pub mod uniforms;

pub use render::{FrameView, RenderError, Renderer, RendererSettings, ShadingMode, SurfaceErrorAction};
pub use shaders::{SHADER_FLAT, SHADER_LIGHT, SHADER_PHONG, ShaderError, ShaderSource};
