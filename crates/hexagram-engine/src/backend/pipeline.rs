//! wgpu pipeline construction shared by programs.

use super::reflect::ProgramInterface;
use super::{float_format, AttributeBinding, BackendError, BufferId};

// ── blend ─────────────────────────────────────────────────────────────────

pub(super) fn premul_alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

// ── vertex layout ─────────────────────────────────────────────────────────

/// One vertex buffer slot holding a single tightly packed attribute.
#[derive(Debug, Copy, Clone)]
pub(super) struct AttributeSlot {
    pub attribute: wgpu::VertexAttribute,
    pub stride: u64,
}

impl AttributeSlot {
    pub(super) fn new(format: wgpu::VertexFormat, shader_location: u32) -> Self {
        Self {
            attribute: wgpu::VertexAttribute {
                format,
                offset: 0,
                shader_location,
            },
            stride: format.size(),
        }
    }

    fn layout(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: std::slice::from_ref(&self.attribute),
        }
    }
}

/// Vertex slots of a program after its attributes were bound.
#[derive(Debug, Clone)]
pub(super) struct ResolvedAttributes {
    /// One slot per binding, in binding order (slot index = buffer slot).
    pub slots: Vec<AttributeSlot>,
    pub buffers: Vec<BufferId>,
    /// Vertices every bound buffer can supply.
    pub vertex_capacity: u32,
}

/// Matches `bindings` against the vertex inputs of `interface`.
///
/// Every binding must name an existing input and every input must receive a
/// buffer. `buffer_len` returns the `f32` count of a buffer, or `None` for a
/// handle the backend does not know.
pub(super) fn resolve_attributes(
    interface: &ProgramInterface,
    bindings: &[AttributeBinding<'_>],
    buffer_len: impl Fn(BufferId) -> Option<usize>,
) -> Result<ResolvedAttributes, BackendError> {
    let mut slots = Vec::with_capacity(bindings.len());
    let mut buffers = Vec::with_capacity(bindings.len());
    let mut vertex_capacity = u32::MAX;

    for binding in bindings {
        let location = interface
            .attribute_location(binding.name)
            .ok_or_else(|| BackendError::UnknownAttribute(binding.name.to_string()))?;
        let format = float_format(binding.components).ok_or_else(|| BackendError::UnsupportedStride {
            name: binding.name.to_string(),
            components: binding.components,
        })?;
        let len = buffer_len(binding.buffer).ok_or(BackendError::UnknownHandle("buffer"))?;

        let vertices = len / binding.components as usize;
        vertex_capacity = vertex_capacity.min(u32::try_from(vertices).unwrap_or(u32::MAX));

        slots.push(AttributeSlot::new(format, location));
        buffers.push(binding.buffer);
    }

    for input in &interface.attributes {
        if !slots.iter().any(|s| s.attribute.shader_location == input.location) {
            return Err(BackendError::Link(format!(
                "vertex input `{}` at location {} has no buffer bound",
                input.name.as_deref().unwrap_or("<unnamed>"),
                input.location
            )));
        }
    }

    Ok(ResolvedAttributes {
        slots,
        buffers,
        vertex_capacity,
    })
}

// ── uniform block ─────────────────────────────────────────────────────────

/// Byte size of a uniform buffer holding a block of `size` bytes.
///
/// Uniform buffers are allocated in 16-byte rows.
pub(super) fn uniform_buffer_size(size: u64) -> u64 {
    size.max(16).div_ceil(16) * 16
}

// ── pipeline ──────────────────────────────────────────────────────────────

pub(super) struct StageModule<'a> {
    pub module: &'a wgpu::ShaderModule,
    pub entry_point: &'a str,
}

/// Builds an unindexed triangle-list pipeline without depth or culling.
pub(super) fn create_triangle_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    vertex: StageModule<'_>,
    fragment: StageModule<'_>,
    slots: &[AttributeSlot],
) -> wgpu::RenderPipeline {
    let buffers: Vec<wgpu::VertexBufferLayout<'_>> = slots.iter().map(AttributeSlot::layout).collect();

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("hexagram pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: vertex.module,
            entry_point: Some(vertex.entry_point),
            compilation_options: Default::default(),
            buffers: &buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: fragment.module,
            entry_point: Some(fragment.entry_point),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: Some(premul_alpha_blend()),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}
