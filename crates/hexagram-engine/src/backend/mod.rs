//! Graphics backend contract.
//!
//! The render loop and setup sequence only talk to the GPU through
//! [`GraphicsBackend`]. The trait mirrors a classic immediate-mode API:
//! compile two stages, link them, upload vertex buffers, bind them to named
//! attributes, look up uniforms by name, then per frame clear, set a uniform
//! and draw vertex ranges.
//!
//! Handles are small copyable ids issued by the backend that created them.
//! Passing a handle to another backend instance is reported as
//! [`BackendError::UnknownHandle`] where it can be detected.

mod error;
mod pipeline;
mod reflect;
mod wgpu_backend;

#[cfg(test)]
pub(crate) mod recording;

use std::fmt;

pub use error::BackendError;
pub use wgpu_backend::WgpuBackend;

use crate::coords::ViewportRect;
use crate::paint::Color;
use crate::scene::VertexRange;

/// Programmable pipeline stage.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        })
    }
}

/// How a vertex range is assembled into primitives.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Primitive {
    /// Every 3 consecutive vertices form an independent triangle.
    Triangles,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ShaderId(pub(crate) usize);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ProgramId(pub(crate) usize);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BufferId(pub(crate) usize);

/// Resolved position of a scalar uniform.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct UniformLocation {
    pub(crate) program: ProgramId,
    pub(crate) block: usize,
    pub(crate) offset: u32,
}

/// Wires one vertex buffer to a named vertex-stage input.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AttributeBinding<'a> {
    pub buffer: BufferId,
    pub name: &'a str,
    /// Tightly packed `f32` components per vertex.
    pub components: u32,
}

/// Result of trying to open a frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrameStatus {
    /// A frame is open; draw calls may follow.
    Ready,
    /// The surface is temporarily unavailable; no frame was opened.
    Skipped,
}

/// Capability set the core needs from a rasterizing GPU API.
///
/// Setup-time calls (`compile_shader` through `uniform_location`) fail with a
/// [`BackendError`] that the setup sequence treats as fatal. Frame-time calls
/// must happen between a successful [`begin_frame`](Self::begin_frame) and
/// [`end_frame`](Self::end_frame).
pub trait GraphicsBackend {
    fn compile_shader(&mut self, source: &str, stage: ShaderStage) -> Result<ShaderId, BackendError>;

    fn link_program(&mut self, vertex: ShaderId, fragment: ShaderId) -> Result<ProgramId, BackendError>;

    /// Uploads an immutable vertex buffer.
    fn create_vertex_buffer(&mut self, data: &[f32]) -> Result<BufferId, BackendError>;

    /// Binds each buffer to the vertex input of the same name.
    ///
    /// An unknown name fails the whole call.
    fn bind_attributes(
        &mut self,
        program: ProgramId,
        bindings: &[AttributeBinding<'_>],
    ) -> Result<(), BackendError>;

    fn uniform_location(&self, program: ProgramId, name: &str) -> Result<UniformLocation, BackendError>;

    /// Size of the drawable surface in physical pixels.
    fn drawable_size(&self) -> (u32, u32);

    /// Follows a surface resize. Zero sizes are remembered but not applied.
    fn resize(&mut self, width: u32, height: u32);

    fn begin_frame(&mut self) -> Result<FrameStatus, BackendError>;

    fn set_viewport(&mut self, viewport: ViewportRect);

    fn clear(&mut self, color: Color) -> Result<(), BackendError>;

    fn use_program(&mut self, program: ProgramId) -> Result<(), BackendError>;

    fn set_uniform_scalar(&mut self, location: UniformLocation, value: f32) -> Result<(), BackendError>;

    fn draw(&mut self, primitive: Primitive, range: VertexRange) -> Result<(), BackendError>;

    /// Submits the frame's work and presents it.
    fn end_frame(&mut self) -> Result<(), BackendError>;

    /// Discards the open frame, if any, without presenting it.
    ///
    /// After this `begin_frame` can be called again.
    fn abort_frame(&mut self);
}

/// Vertex format for an attribute of `components` packed `f32`s.
pub(crate) fn float_format(components: u32) -> Option<wgpu::VertexFormat> {
    match components {
        1 => Some(wgpu::VertexFormat::Float32),
        2 => Some(wgpu::VertexFormat::Float32x2),
        3 => Some(wgpu::VertexFormat::Float32x3),
        4 => Some(wgpu::VertexFormat::Float32x4),
        _ => None,
    }
}
