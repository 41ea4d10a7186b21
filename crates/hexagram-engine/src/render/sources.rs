use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::backend::ShaderStage;

use super::SetupError;

/// Where the vertex and fragment WGSL sources come from.
#[derive(Debug, Clone)]
pub enum ShaderSources {
    /// Source text held in memory.
    Embedded {
        vertex: Cow<'static, str>,
        fragment: Cow<'static, str>,
    },
    /// A directory holding [`VERTEX_FILE`](Self::VERTEX_FILE) and
    /// [`FRAGMENT_FILE`](Self::FRAGMENT_FILE).
    Directory(PathBuf),
}

impl ShaderSources {
    pub const VERTEX_FILE: &'static str = "main.vert.wgsl";
    pub const FRAGMENT_FILE: &'static str = "main.frag.wgsl";

    /// The shaders compiled into this crate.
    pub fn builtin() -> Self {
        Self::Embedded {
            vertex: Cow::Borrowed(include_str!("shaders/main.vert.wgsl")),
            fragment: Cow::Borrowed(include_str!("shaders/main.frag.wgsl")),
        }
    }

    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self::Directory(path.into())
    }

    /// Returns the source text for `stage`, reading it from disk if needed.
    pub fn load(&self, stage: ShaderStage) -> Result<Cow<'_, str>, SetupError> {
        match self {
            Self::Embedded { vertex, fragment } => Ok(Cow::Borrowed(match stage {
                ShaderStage::Vertex => vertex.as_ref(),
                ShaderStage::Fragment => fragment.as_ref(),
            })),
            Self::Directory(dir) => read_source(&dir.join(match stage {
                ShaderStage::Vertex => Self::VERTEX_FILE,
                ShaderStage::Fragment => Self::FRAGMENT_FILE,
            }))
            .map(Cow::Owned),
        }
    }
}

impl Default for ShaderSources {
    fn default() -> Self {
        Self::builtin()
    }
}

fn read_source(path: &Path) -> Result<String, SetupError> {
    log::debug!("reading shader source {}", path.display());
    std::fs::read_to_string(path).map_err(|source| SetupError::ShaderLoad {
        path: path.to_path_buf(),
        source,
    })
}
