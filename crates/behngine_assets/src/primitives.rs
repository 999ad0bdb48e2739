use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::Vec3;

use crate::assets::{MeshData, Vertex};

fn flat(position: [f32; 3], uv: [f32; 2]) -> Vertex {
    Vertex {
        position,
        normal: [0.0, 0.0, 1.0],
        uv,
    }
}

/// A single triangle in the XY plane, facing +Z.
pub fn triangle() -> MeshData {
    MeshData {
        vertices: vec![
            flat([-0.5, -0.5, 0.0], [0.0, 1.0]),
            flat([0.5, -0.5, 0.0], [1.0, 1.0]),
            flat([0.0, 0.5, 0.0], [0.5, 0.0]),
        ],
        indices: vec![0, 1, 2],
    }
}

/// A unit square in the XY plane, facing +Z.
pub fn square() -> MeshData {
    MeshData {
        vertices: vec![
            flat([0.5, 0.5, 0.0], [1.0, 0.0]),
            flat([0.5, -0.5, 0.0], [1.0, 1.0]),
            flat([-0.5, -0.5, 0.0], [0.0, 1.0]),
            flat([-0.5, 0.5, 0.0], [0.0, 0.0]),
        ],
        indices: vec![0, 3, 1, 1, 3, 2],
    }
}

/// Latitude/longitude sphere. Rings run from the north pole (`phi = π/2`)
/// down to the south pole; each ring repeats its first vertex at the seam.
pub fn uv_sphere(radius: f32, slices: u32, stacks: u32) -> MeshData {
    let slices = slices.max(3);
    let stacks = stacks.max(2);

    let mut vertices = Vec::with_capacity(((stacks + 1) * (slices + 1)) as usize);
    for i in 0..=stacks {
        let phi = FRAC_PI_2 - i as f32 * PI / stacks as f32;
        for j in 0..=slices {
            let theta = j as f32 * TAU / slices as f32;

            let direction = Vec3::new(phi.cos() * theta.cos(), phi.sin(), phi.cos() * theta.sin());
            vertices.push(Vertex {
                position: (direction * radius).to_array(),
                normal: direction.normalize_or_zero().to_array(),
                uv: [j as f32 / slices as f32, i as f32 / stacks as f32],
            });
        }
    }

    let mut indices = Vec::with_capacity((stacks * slices * 6) as usize);
    for i in 0..stacks {
        for j in 0..slices {
            let k = i * (slices + 1) + j;
            indices.extend_from_slice(&[k, k + slices + 1, k + 1]);
            indices.extend_from_slice(&[k + 1, k + slices + 1, k + slices + 2]);
        }
    }

    MeshData { vertices, indices }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face_normal(mesh: &MeshData, tri: usize) -> Vec3 {
        let [a, b, c] = [0, 1, 2].map(|k| Vec3::from(mesh.vertices[mesh.indices[tri * 3 + k] as usize].position));
        (b - a).cross(c - a)
    }

    #[test]
    fn flat_shapes_face_the_viewer() {
        for mesh in [triangle(), square()] {
            for tri in 0..mesh.triangle_count() {
                assert!(face_normal(&mesh, tri).z > 0.0);
            }
        }
        assert_eq!(square().vertices.len(), 4);
        assert_eq!(square().indices.len(), 6);
    }

    #[test]
    fn sphere_counts() {
        let sphere = uv_sphere(0.5, 6, 6);
        assert_eq!(sphere.vertices.len(), 7 * 7);
        assert_eq!(sphere.indices.len(), 6 * 6 * 6);

        let max = *sphere.indices.iter().max().unwrap();
        assert_eq!(max as usize, sphere.vertices.len() - 1);
    }

    #[test]
    fn sphere_vertices_lie_on_radius() {
        let sphere = uv_sphere(2.0, 8, 5);
        for vertex in &sphere.vertices {
            let length = Vec3::from(vertex.position).length();
            assert!((length - 2.0).abs() < 1e-4);
        }
        // First ring is the north pole.
        assert!(Vec3::from(sphere.vertices[0].position).abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 1e-4));
    }

    #[test]
    fn sphere_first_cell_indices() {
        let sphere = uv_sphere(1.0, 6, 6);
        assert_eq!(&sphere.indices[..6], &[0, 7, 1, 1, 7, 8]);
    }

    #[test]
    fn sphere_clamps_degenerate_resolution() {
        let sphere = uv_sphere(1.0, 0, 0);
        assert_eq!(sphere.vertices.len(), 3 * 4);
    }
}
