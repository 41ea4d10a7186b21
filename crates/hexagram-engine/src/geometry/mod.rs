//! Procedural shape generators.
//!
//! Generators are pure: identical inputs give bit-identical vertex lists.
//! Every shape is an unindexed triangle list, three consecutive vertices per
//! triangle, with no vertex shared between triangles.

mod circle;
mod error;
mod star;

pub use circle::{circle, MIN_SEGMENTS};
pub use error::GeometryError;
pub use star::star;

use crate::coords::Vec3;

/// Ordered triangle-list vertices of one renderable unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    vertices: Vec<Vec3>,
}

impl Shape {
    pub(crate) fn from_vertices(vertices: Vec<Vec3>) -> Self {
        debug_assert!(vertices.len() % 3 == 0, "triangle list length must be a multiple of 3");
        Self { vertices }
    }

    #[inline]
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Iterates triangles as `[a, b, c]` in emission order.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.vertices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Positions as a flat `x, y, z, x, y, z, ...` stream.
    #[inline]
    pub fn as_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.vertices)
    }
}
