//! Static scene assembly.
//!
//! The scene is built once at setup: three shapes are concatenated into one
//! position stream and one parallel color stream. Vertex `i` owns
//! `positions[3i..3i+3]` and `colors[4i..4i+4]`; the two streams always hold
//! the same number of vertices.

mod config;

pub use config::SceneConfig;

use crate::geometry::{circle, star, GeometryError, Shape};
use crate::paint::Color;

/// Components per vertex in the position stream.
pub const POSITION_STRIDE: usize = 3;

/// Components per vertex in the color stream.
pub const COLOR_STRIDE: usize = 4;

/// Fill of the star.
pub const ACCENT: Color = Color::from_premul(0.6, 0.5, 0.8, 1.0);

/// Shapes of the scene, in draw order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SceneShape {
    OuterCircle,
    InnerCircle,
    Star,
}

impl SceneShape {
    pub const DRAW_ORDER: [SceneShape; 3] =
        [SceneShape::OuterCircle, SceneShape::InnerCircle, SceneShape::Star];

    /// Per-vertex color of every vertex in this shape.
    pub const fn fill(self) -> Color {
        match self {
            SceneShape::OuterCircle | SceneShape::InnerCircle => Color::WHITE,
            SceneShape::Star => ACCENT,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            SceneShape::OuterCircle => "outer circle",
            SceneShape::InnerCircle => "inner circle",
            SceneShape::Star => "star",
        }
    }
}

/// Contiguous run of vertices, interpreted as a triangle list.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct VertexRange {
    pub start: u32,
    pub count: u32,
}

impl VertexRange {
    #[inline]
    pub const fn new(start: u32, count: u32) -> Self {
        Self { start, count }
    }

    #[inline]
    pub const fn end(self) -> u32 {
        self.start.saturating_add(self.count)
    }
}

/// Where one shape lives inside the scene streams.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ShapeRange {
    pub shape: SceneShape,
    pub range: VertexRange,
}

/// Immutable vertex data for the whole scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    positions: Vec<f32>,
    colors: Vec<f32>,
    ranges: Vec<ShapeRange>,
}

impl Scene {
    /// Generates every shape of `config` and packs them in draw order.
    pub fn build(config: &SceneConfig) -> Result<Self, GeometryError> {
        let mut scene = Scene {
            positions: Vec::new(),
            colors: Vec::new(),
            ranges: Vec::with_capacity(SceneShape::DRAW_ORDER.len()),
        };

        for shape in SceneShape::DRAW_ORDER {
            let geometry = match shape {
                SceneShape::OuterCircle => circle(config.outer_radius, config.circle_segments)?,
                SceneShape::InnerCircle => circle(config.inner_radius, config.circle_segments)?,
                SceneShape::Star => star(config.star_radius)?,
            };
            scene.push(shape, &geometry)?;
        }

        log::debug!(
            "scene built: {} vertices across {} shapes",
            scene.vertex_count(),
            scene.ranges.len()
        );

        Ok(scene)
    }

    fn push(&mut self, shape: SceneShape, geometry: &Shape) -> Result<(), GeometryError> {
        let start = self.vertex_count();
        let count = geometry.vertex_count();
        let end = start + count;
        let to_u32 = |n: usize| u32::try_from(n).map_err(|_| GeometryError::TooManyVertices(end));

        self.ranges.push(ShapeRange {
            shape,
            range: VertexRange::new(to_u32(start)?, to_u32(count)?),
        });
        to_u32(end)?;

        self.positions.extend_from_slice(geometry.as_flat());

        let fill = shape.fill().to_array();
        self.colors.reserve(count * COLOR_STRIDE);
        for _ in 0..count {
            self.colors.extend_from_slice(&fill);
        }

        Ok(())
    }

    /// Flat position stream, [`POSITION_STRIDE`] components per vertex.
    #[inline]
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Flat color stream, [`COLOR_STRIDE`] components per vertex.
    #[inline]
    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    /// Shape ranges in draw order.
    #[inline]
    pub fn ranges(&self) -> &[ShapeRange] {
        &self.ranges
    }

    pub fn range(&self, shape: SceneShape) -> Option<VertexRange> {
        self.ranges.iter().find(|r| r.shape == shape).map(|r| r.range)
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / POSITION_STRIDE
    }
}
