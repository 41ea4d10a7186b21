use std::fmt;

use crate::scene::VertexRange;

use super::ShaderStage;

/// Failure reported by a [`GraphicsBackend`](super::GraphicsBackend).
#[derive(Debug, Clone, PartialEq)]
pub enum BackendError {
    /// Shader source failed to parse or validate.
    Compile { stage: ShaderStage, message: String },
    /// Two shader stages cannot form a program.
    Link(String),
    /// A handle that this backend never issued.
    UnknownHandle(&'static str),
    /// The vertex stage has no input with this name.
    UnknownAttribute(String),
    /// No uniform block of the program has a field with this name.
    UnknownUniform(String),
    /// The uniform exists but is not a scalar `f32`.
    UniformType(String),
    /// Attribute component count outside 1..=4.
    UnsupportedStride { name: String, components: u32 },
    /// A draw was issued for a program whose attributes were never bound.
    ProgramNotReady,
    /// A draw was issued with no program in use.
    NoProgram,
    /// The range reaches past the vertices held by the bound buffers.
    DrawOutOfRange { range: VertexRange, available: u32 },
    /// A frame-scoped call was made outside `begin_frame` / `end_frame`.
    NoActiveFrame,
    /// `begin_frame` was called while a frame was already open.
    FrameInProgress,
    /// The presentation surface failed in a way that cannot be recovered.
    Surface(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compile { stage, message } => {
                write!(f, "{stage} shader failed to compile: {message}")
            }
            Self::Link(msg) => write!(f, "program link failed: {msg}"),
            Self::UnknownHandle(kind) => write!(f, "unknown {kind} handle"),
            Self::UnknownAttribute(name) => write!(f, "vertex stage has no attribute `{name}`"),
            Self::UnknownUniform(name) => write!(f, "program has no uniform `{name}`"),
            Self::UniformType(name) => write!(f, "uniform `{name}` is not a scalar f32"),
            Self::UnsupportedStride { name, components } => write!(
                f,
                "attribute `{name}` has {components} components, expected 1 to 4"
            ),
            Self::ProgramNotReady => write!(f, "program attributes are not bound"),
            Self::NoProgram => write!(f, "draw issued with no program in use"),
            Self::DrawOutOfRange { range, available } => write!(
                f,
                "draw of vertices {}..{} exceeds the {available} available",
                range.start,
                range.end()
            ),
            Self::NoActiveFrame => write!(f, "no frame in progress"),
            Self::FrameInProgress => write!(f, "a frame is already in progress"),
            Self::Surface(msg) => write!(f, "surface error: {msg}"),
        }
    }
}

impl std::error::Error for BackendError {}
