use core::ops::Sub;

use bytemuck::{Pod, Zeroable};

/// 3D point in normalized device space.
///
/// `#[repr(C)]` so a slice of points can be viewed as a flat `[f32]` position
/// stream with a stride of three components.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0, z: 0.0 }
    }

    /// Point on the XY plane at `angle` radians and distance `radius` from the origin.
    #[inline]
    pub fn polar(radius: f32, angle: f32) -> Self {
        Self::new(angle.cos() * radius, angle.sin() * radius, 0.0)
    }

    /// Euclidean distance from the origin.
    #[inline]
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    #[inline]
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}
