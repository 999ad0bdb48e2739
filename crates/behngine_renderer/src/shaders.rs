use thiserror::Error;

/// A named WGSL program. Every source exposes `vs_main` and `fs_main`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderSource {
    pub name: &'static str,
    pub code: &'static str,
}

/// Solid colour, no lighting.
pub const SHADER_FLAT: ShaderSource = ShaderSource {
    name: "flat",
    code: include_str!("shaders/flat.wgsl"),
};

/// Ambient + diffuse + specular from a single point light.
pub const SHADER_PHONG: ShaderSource = ShaderSource {
    name: "phong",
    code: include_str!("shaders/phong.wgsl"),
};

/// Plain white, for light markers.
pub const SHADER_LIGHT: ShaderSource = ShaderSource {
    name: "light",
    code: include_str!("shaders/light.wgsl"),
};

pub const ALL_SHADERS: [ShaderSource; 3] = [SHADER_FLAT, SHADER_PHONG, SHADER_LIGHT];

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("failed to compile shader `{name}`: {message}")]
    Compile { name: &'static str, message: String },
}

/// Creates the shader module inside a validation error scope, so a broken
/// shader comes back as an error instead of a device-lost panic later on.
pub fn compile(device: &wgpu::Device, source: &ShaderSource) -> Result<wgpu::ShaderModule, ShaderError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(source.name),
        source: wgpu::ShaderSource::Wgsl(source.code.into()),
    });

    if let Some(error) = pollster::block_on(device.pop_error_scope()) {
        log::error!("Shader `{}` failed to compile: {error}", source.name);
        return Err(ShaderError::Compile {
            name: source.name,
            message: error.to_string(),
        });
    }

    log::debug!("Compiled shader `{}`", source.name);
    Ok(module)
}
