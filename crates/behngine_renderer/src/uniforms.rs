use behngine_scene::Lighting;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

// #[repr(C)] keeps the field order the WGSL structs expect.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct PerspectiveBlock {
    pub project: [[f32; 4]; 4],
    pub camera: [[f32; 4]; 4],
    pub world: [[f32; 4]; 4],
}

impl PerspectiveBlock {
    pub fn new(projection: Mat4, view: Mat4, model: Mat4) -> Self {
        Self {
            project: projection.to_cols_array_2d(),
            camera: view.to_cols_array_2d(),
            world: model.to_cols_array_2d(),
        }
    }
}

/// Per-draw lighting inputs. Colours and positions are padded to vec4.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct PhongBlock {
    pub normal_matrix: [[f32; 4]; 4],
    pub object_color: [f32; 4],
    pub light_color: [f32; 4],
    pub light_pos: [f32; 4],
}

impl PhongBlock {
    pub fn new(view: Mat4, model: Mat4, color: Vec3, lighting: &Lighting) -> Self {
        Self {
            normal_matrix: normal_matrix(view * model).to_cols_array_2d(),
            object_color: color.extend(1.0).to_array(),
            light_color: lighting.color.extend(1.0).to_array(),
            light_pos: lighting.position.extend(1.0).to_array(),
        }
    }
}

/// Inverse transpose of the model-view matrix, so normals survive
/// non-uniform scaling. Falls back to identity for singular matrices.
pub fn normal_matrix(model_view: Mat4) -> Mat4 {
    // Small scales have tiny determinants; only zero or a non-finite inverse is singular.
    if model_view.determinant() == 0.0 {
        return Mat4::IDENTITY;
    }
    let inverse = model_view.inverse();
    if !inverse.is_finite() {
        return Mat4::IDENTITY;
    }
    inverse.transpose()
}
