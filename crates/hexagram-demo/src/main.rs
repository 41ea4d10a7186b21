use anyhow::Result;

use hexagram_engine::device::GpuInit;
use hexagram_engine::logging::{init_logging, LoggingConfig};
use hexagram_engine::render::ShaderSources;
use hexagram_engine::window::{Runtime, RuntimeConfig};

/// Directory to load `main.vert.wgsl` / `main.frag.wgsl` from instead of
/// the built-in shaders.
const SHADER_DIR_VAR: &str = "HEXAGRAM_SHADER_DIR";

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let shaders = match std::env::var_os(SHADER_DIR_VAR) {
        Some(dir) => {
            log::info!("loading shaders from {}", dir.to_string_lossy());
            ShaderSources::directory(dir)
        }
        None => ShaderSources::builtin(),
    };

    let config = RuntimeConfig {
        title: "Two circles and a star".to_string(),
        shaders,
        ..RuntimeConfig::default()
    };

    Runtime::run(config, GpuInit::default())
}
