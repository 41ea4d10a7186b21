/// Parameters of the static scene.
///
/// Defaults reproduce the demo: two concentric circles of radius 0.5 and 0.4
/// with 64 segments each, and a star of radius 0.4.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SceneConfig {
    pub outer_radius: f32,
    pub inner_radius: f32,
    pub star_radius: f32,
    pub circle_segments: u32,
}

impl SceneConfig {
    pub const fn new(
        outer_radius: f32,
        inner_radius: f32,
        star_radius: f32,
        circle_segments: u32,
    ) -> Self {
        Self {
            outer_radius,
            inner_radius,
            star_radius,
            circle_segments,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::new(0.5, 0.4, 0.4, 64)
    }
}
