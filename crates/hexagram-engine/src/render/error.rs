use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::backend::BackendError;
use crate::geometry::GeometryError;

/// Fatal failure while building a [`RenderLoop`](super::RenderLoop).
///
/// Nothing is retried; the partially built backend is dropped with the error.
#[derive(Debug)]
pub enum SetupError {
    /// No adapter, device or surface could be obtained.
    ContextUnavailable(anyhow::Error),
    /// A shader file could not be read.
    ShaderLoad { path: PathBuf, source: io::Error },
    /// Scene parameters were rejected by the geometry generators.
    Geometry(GeometryError),
    /// Compiling, linking or resolving a name failed.
    Backend(BackendError),
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContextUnavailable(e) => write!(f, "graphics context unavailable: {e:#}"),
            Self::ShaderLoad { path, .. } => {
                write!(f, "failed to load shader source {}", path.display())
            }
            Self::Geometry(e) => write!(f, "invalid scene geometry: {e}"),
            Self::Backend(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SetupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ContextUnavailable(e) => Some(&**e),
            Self::ShaderLoad { source, .. } => Some(source),
            Self::Geometry(e) => Some(e),
            Self::Backend(e) => Some(e),
        }
    }
}

impl From<GeometryError> for SetupError {
    fn from(e: GeometryError) -> Self {
        Self::Geometry(e)
    }
}

impl From<BackendError> for SetupError {
    fn from(e: BackendError) -> Self {
        Self::Backend(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn shader_load_chains_io_error() {
        let err = SetupError::ShaderLoad {
            path: PathBuf::from("shaders/main.vert.wgsl"),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(err.to_string(), "failed to load shader source shaders/main.vert.wgsl");
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("missing"));
    }

    #[test]
    fn backend_error_converts() {
        let err: SetupError = BackendError::UnknownUniform("time".into()).into();
        assert!(matches!(err, SetupError::Backend(BackendError::UnknownUniform(_))));
        assert_eq!(err.to_string(), "program has no uniform `time`");
    }
}
