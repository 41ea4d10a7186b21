use crate::backend::{AttributeBinding, GraphicsBackend, ShaderStage};
use crate::paint::Color;
use crate::scene::{Scene, SceneConfig, COLOR_STRIDE, POSITION_STRIDE};

use super::frame_loop::SceneBuffers;
use super::{RenderLoop, SetupError, ShaderSources};

/// Vertex-stage input fed from the position stream.
pub const POSITION_ATTRIBUTE: &str = "position";

/// Vertex-stage input fed from the color stream.
pub const COLOR_ATTRIBUTE: &str = "color";

/// Scalar uniform receiving elapsed seconds.
pub const TIME_UNIFORM: &str = "time";

/// Builds every GPU resource the scene needs, in a fixed order.
///
/// Sources are loaded (vertex, then fragment) and compiled, the program is
/// linked, the scene is generated and uploaded, attributes are bound and the
/// time uniform is resolved. The first failure aborts the sequence and the
/// returned loop always holds a linked program with bound attributes.
pub fn setup<B: GraphicsBackend>(
    mut backend: B,
    sources: &ShaderSources,
    config: &SceneConfig,
    background: Color,
) -> Result<RenderLoop<B>, SetupError> {
    let vertex_src = sources.load(ShaderStage::Vertex)?;
    let fragment_src = sources.load(ShaderStage::Fragment)?;

    let vertex = backend.compile_shader(&vertex_src, ShaderStage::Vertex)?;
    log::debug!("vertex shader compiled");
    let fragment = backend.compile_shader(&fragment_src, ShaderStage::Fragment)?;
    log::debug!("fragment shader compiled");

    let program = backend.link_program(vertex, fragment)?;
    log::debug!("program linked");

    let scene = Scene::build(config)?;
    for shape in scene.ranges() {
        log::debug!(
            "{}: vertices {}..{}",
            shape.shape.label(),
            shape.range.start,
            shape.range.end()
        );
    }

    let positions = backend.create_vertex_buffer(scene.positions())?;
    let colors = backend.create_vertex_buffer(scene.colors())?;
    log::debug!("uploaded {} vertices", scene.vertex_count());

    backend.bind_attributes(
        program,
        &[
            AttributeBinding {
                buffer: positions,
                name: POSITION_ATTRIBUTE,
                components: POSITION_STRIDE as u32,
            },
            AttributeBinding {
                buffer: colors,
                name: COLOR_ATTRIBUTE,
                components: COLOR_STRIDE as u32,
            },
        ],
    )?;

    let time_uniform = backend.uniform_location(program, TIME_UNIFORM)?;
    log::debug!("setup complete");

    Ok(RenderLoop::new(
        backend,
        program,
        time_uniform,
        scene,
        SceneBuffers { positions, colors },
        background,
    ))
}
