//! Coordinate types shared by geometry and renderers.
//!
//! Canonical CPU space for geometry is normalized device coordinates:
//! - origin at the center of the viewport
//! - +X right, +Y up
//! - the visible square spans [-1, 1] on both axes

mod vec3;
mod viewport;

pub use vec3::Vec3;
pub use viewport::ViewportRect;
