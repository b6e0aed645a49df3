//! Procedural edge meshes for the glow decoration

use bevy_math::Vec3;
use std::f32::consts::{PI, TAU};

use crate::fragment::Mesh;

#[derive(Clone, Copy, Debug)]
pub struct SphereOptions {
    pub radius: f32,
    pub stacks: u32,
    pub slices: u32,
}

impl Default for SphereOptions {
    fn default() -> Self {
        Self {
            radius: 1.0,
            stacks: 12,
            slices: 24,
        }
    }
}

/// Closed circle in the XY plane, facing the default camera
pub fn ring(radius: f32, segments: u32) -> Mesh {
    let segments = segments.max(3);
    let positions: Vec<Vec3> = (0..segments)
        .map(|i| {
            let theta = i as f32 / segments as f32 * TAU;
            Vec3::new(radius * theta.cos(), radius * theta.sin(), 0.0)
        })
        .collect();
    let indices: Vec<u32> = (0..segments).collect();
    Mesh::from_line_strip(positions, &indices, true)
}

/// UV sphere as a triangle list, reduced to its unique edges
pub fn uv_sphere(opts: SphereOptions) -> Mesh {
    let stacks = opts.stacks.max(2);
    let slices = opts.slices.max(3);

    let mut positions = Vec::with_capacity(((stacks + 1) * (slices + 1)) as usize);
    for stack in 0..=stacks {
        let phi = stack as f32 / stacks as f32 * PI;
        for slice in 0..=slices {
            let theta = slice as f32 / slices as f32 * TAU;
            positions.push(Vec3::new(
                opts.radius * phi.sin() * theta.cos(),
                opts.radius * phi.cos(),
                opts.radius * phi.sin() * theta.sin(),
            ));
        }
    }

    let row = slices + 1;
    let mut indices = Vec::with_capacity((stacks * slices * 6) as usize);
    for stack in 0..stacks {
        for slice in 0..slices {
            let i0 = stack * row + slice;
            let i1 = i0 + 1;
            let i2 = (stack + 1) * row + slice;
            let i3 = i2 + 1;
            indices.extend_from_slice(&[i0, i2, i1, i1, i2, i3]);
        }
    }

    Mesh::from_triangles(positions, &indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_is_closed() {
        let mesh = ring(2.0, 16);
        assert_eq!(mesh.vertex_count(), 16);
        assert_eq!(mesh.edge_count(), 16);
        for p in &mesh.positions {
            assert!((p.length() - 2.0).abs() < 1e-5);
            assert_eq!(p.z, 0.0);
        }
    }

    #[test]
    fn test_sphere_vertices_on_radius() {
        let mesh = uv_sphere(SphereOptions {
            radius: 1.5,
            stacks: 4,
            slices: 8,
        });
        assert_eq!(mesh.vertex_count(), 5 * 9);
        assert!(mesh.edge_count() > 0);
        for p in &mesh.positions {
            assert!((p.length() - 1.5).abs() < 1e-4);
        }
    }
}
