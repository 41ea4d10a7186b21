use std::fmt;

/// Rejected geometry parameters.
///
/// Generators never coerce bad input into a degenerate shape; the caller gets
/// one of these instead.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum GeometryError {
    /// Radius is zero, negative, or not finite.
    InvalidRadius(f32),
    /// A circle needs at least [`MIN_SEGMENTS`](super::MIN_SEGMENTS) segments.
    TooFewSegments(u32),
    /// The assembled vertex count does not fit a `u32` draw range.
    TooManyVertices(usize),
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRadius(r) => write!(f, "radius must be positive and finite, got {r}"),
            Self::TooFewSegments(n) => write!(
                f,
                "circle needs at least {} segments, got {n}",
                super::MIN_SEGMENTS
            ),
            Self::TooManyVertices(n) => write!(f, "{n} vertices exceed the u32 draw range"),
        }
    }
}

impl std::error::Error for GeometryError {}

pub(super) fn check_radius(radius: f32) -> Result<(), GeometryError> {
    if radius.is_finite() && radius > 0.0 {
        Ok(())
    } else {
        Err(GeometryError::InvalidRadius(radius))
    }
}
