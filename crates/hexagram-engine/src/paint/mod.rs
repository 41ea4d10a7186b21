//! Color model shared by the scene builder and the backend.

pub mod color;

pub use color::Color;
