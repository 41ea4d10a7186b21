use std::f32::consts::PI;

use crate::coords::Vec3;

use super::error::{check_radius, GeometryError};
use super::Shape;

const TRIANGLE_A: [f32; 3] = [0.0, PI * 2.0 / 3.0, PI * 4.0 / 3.0];
const TRIANGLE_B: [f32; 3] = [PI, PI * 5.0 / 3.0, PI * 7.0 / 3.0];

/// Six-pointed star built from two overlapping equilateral triangles.
///
/// Both triangles have circumradius `radius` around the origin; the second is
/// the first with every corner advanced by π. There is no center vertex, so
/// the result is exactly 6 vertices.
pub fn star(radius: f32) -> Result<Shape, GeometryError> {
    check_radius(radius)?;

    let vertices = TRIANGLE_A
        .iter()
        .chain(TRIANGLE_B.iter())
        .map(|&angle| Vec3::polar(radius, angle))
        .collect();

    Ok(Shape::from_vertices(vertices))
}
