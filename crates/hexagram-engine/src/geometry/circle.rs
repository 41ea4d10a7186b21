use std::f32::consts::TAU;

use crate::coords::Vec3;

use super::error::{check_radius, GeometryError};
use super::Shape;

/// Fewest segments that still enclose an area.
pub const MIN_SEGMENTS: u32 = 3;

/// Triangle-fan approximation of a circle centered at the origin.
///
/// Segment `i` is the triangle `(center, angle_i, angle_i+1)` with
/// `angle_i = 2π·i / segments`, so every triangle shares the center and winds
/// counter-clockwise. The result holds `segments * 3` vertices.
pub fn circle(radius: f32, segments: u32) -> Result<Shape, GeometryError> {
    check_radius(radius)?;
    if segments < MIN_SEGMENTS {
        return Err(GeometryError::TooFewSegments(segments));
    }

    let mut vertices = Vec::with_capacity(segments as usize * 3);
    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * TAU;
        let theta2 = ((i + 1) as f32 / segments as f32) * TAU;

        vertices.extend([
            Vec3::zero(),
            Vec3::polar(radius, theta1),
            Vec3::polar(radius, theta2),
        ]);
    }

    Ok(Shape::from_vertices(vertices))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-6;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < EPS
    }

    #[test]
    fn vertex_count_is_three_per_segment() {
        for segments in [3, 4, 7, 64, 100] {
            let shape = circle(1.0, segments).unwrap();
            assert_eq!(shape.vertex_count(), segments as usize * 3);
            assert_eq!(shape.triangle_count(), segments as usize);
        }
    }

    #[test]
    fn boundary_vertices_lie_on_radius() {
        let r = 0.4;
        let shape = circle(r, 64).unwrap();
        for tri in shape.triangles() {
            assert_eq!(tri[0], Vec3::zero());
            assert!((tri[1].length() - r).abs() < EPS);
            assert!((tri[2].length() - r).abs() < EPS);
        }
    }

    #[test]
    fn quarter_segments_hit_the_axes() {
        let shape = circle(0.5, 4).unwrap();
        let v = shape.vertices();
        assert_eq!(v.len(), 12);
        assert_eq!(v[0], Vec3::zero());
        assert!(approx(v[1], Vec3::new(0.5, 0.0, 0.0)));
        assert!(approx(v[2], Vec3::new(0.0, 0.5, 0.0)));
        // Last segment closes the fan back at angle 2π.
        assert!(approx(v[11], Vec3::new(0.5, 0.0, 0.0)));
    }

    #[test]
    fn consecutive_segments_share_an_edge_point() {
        let shape = circle(1.0, 16).unwrap();
        let tris: Vec<_> = shape.triangles().collect();
        for pair in tris.windows(2) {
            assert_eq!(pair[0][2], pair[1][1]);
        }
    }

    #[test]
    fn winding_is_counter_clockwise() {
        let shape = circle(1.0, 8).unwrap();
        for [a, b, c] in shape.triangles() {
            let cross = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
            assert!(cross > 0.0);
        }
    }

    #[test]
    fn is_deterministic() {
        assert_eq!(circle(0.5, 64).unwrap(), circle(0.5, 64).unwrap());
    }

    #[test]
    fn rejects_too_few_segments() {
        assert_eq!(circle(1.0, 2), Err(GeometryError::TooFewSegments(2)));
        assert_eq!(circle(1.0, 0), Err(GeometryError::TooFewSegments(0)));
    }

    #[test]
    fn rejects_non_positive_radius() {
        assert_eq!(circle(0.0, 8), Err(GeometryError::InvalidRadius(0.0)));
        assert_eq!(circle(-1.0, 8), Err(GeometryError::InvalidRadius(-1.0)));
        assert!(circle(f32::NAN, 8).is_err());
        assert!(circle(f32::INFINITY, 8).is_err());
    }
}
