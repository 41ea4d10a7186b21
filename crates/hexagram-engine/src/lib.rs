//! Hexagram engine crate.
//!
//! Geometry and scene generation, a narrow graphics backend contract with a
//! wgpu implementation, the animated render loop and the winit runtime that
//! drives it.

pub mod backend;
pub mod coords;
pub mod device;
pub mod geometry;
pub mod logging;
pub mod paint;
pub mod render;
pub mod scene;
pub mod time;
pub mod window;
