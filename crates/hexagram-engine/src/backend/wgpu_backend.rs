use naga::valid::Capabilities;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::coords::ViewportRect;
use crate::device::{Gpu, GpuFrame, GpuInit};
use crate::paint::Color;
use crate::render::SetupError;
use crate::scene::VertexRange;

use super::pipeline::{self, StageModule};
use super::reflect::{self, ProgramInterface, StageInterface};
use super::{
    AttributeBinding, BackendError, BufferId, FrameStatus, GraphicsBackend, Primitive, ProgramId,
    ShaderId, ShaderStage, UniformLocation,
};

struct CompiledShader {
    module: wgpu::ShaderModule,
    interface: StageInterface,
}

struct VertexBuffer {
    buffer: wgpu::Buffer,
    /// Number of `f32` values held.
    len: usize,
}

struct BoundAttributes {
    pipeline: wgpu::RenderPipeline,
    buffers: Vec<BufferId>,
    vertex_capacity: u32,
}

struct Program {
    vertex: ShaderId,
    fragment: ShaderId,
    interface: ProgramInterface,
    layout: wgpu::PipelineLayout,
    uniform_buffers: Vec<wgpu::Buffer>,
    bind_group: wgpu::BindGroup,
    bound: Option<BoundAttributes>,
}

#[derive(Debug, Copy, Clone)]
struct DrawCall {
    program: ProgramId,
    range: VertexRange,
}

/// Runs `create` inside a validation error scope.
///
/// wgpu reports invalid descriptors to the device's uncaptured error handler,
/// which panics by default; the scope turns them into a value instead.
fn validated<T>(device: &wgpu::Device, create: impl FnOnce() -> T) -> Result<T, wgpu::Error> {
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = create();
    match pollster::block_on(scope.pop()) {
        Some(err) => Err(err),
        None => Ok(value),
    }
}

/// Work recorded between `begin_frame` and `end_frame`.
struct FrameRecording {
    gpu_frame: GpuFrame,
    clear: Option<wgpu::Color>,
    draws: Vec<DrawCall>,
}

/// [`GraphicsBackend`] over wgpu, presenting to a winit window.
///
/// Frame-time calls are recorded and encoded into a single render pass when
/// the frame ends. Uniform writes go through the queue and therefore apply
/// to every draw of the frame they are submitted with.
pub struct WgpuBackend<'w> {
    gpu: Gpu<'w>,
    shader_capabilities: Capabilities,
    shaders: Vec<CompiledShader>,
    programs: Vec<Program>,
    buffers: Vec<VertexBuffer>,
    current_program: Option<ProgramId>,
    viewport: Option<ViewportRect>,
    frame: Option<FrameRecording>,
}

impl<'w> WgpuBackend<'w> {
    /// Creates the GPU context for `window`.
    pub async fn new(window: &'w Window, init: GpuInit) -> Result<Self, SetupError> {
        let gpu = Gpu::new(window, init)
            .await
            .map_err(SetupError::ContextUnavailable)?;

        let shader_capabilities =
            reflect::shader_capabilities(gpu.device().features(), gpu.downlevel_flags());

        Ok(Self {
            gpu,
            shader_capabilities,
            shaders: Vec::new(),
            programs: Vec::new(),
            buffers: Vec::new(),
            current_program: None,
            viewport: None,
            frame: None,
        })
    }

    fn shader(&self, id: ShaderId) -> Result<&CompiledShader, BackendError> {
        self.shaders.get(id.0).ok_or(BackendError::UnknownHandle("shader"))
    }

    fn program(&self, id: ProgramId) -> Result<&Program, BackendError> {
        self.programs.get(id.0).ok_or(BackendError::UnknownHandle("program"))
    }

    fn frame_mut(&mut self) -> Result<&mut FrameRecording, BackendError> {
        self.frame.as_mut().ok_or(BackendError::NoActiveFrame)
    }

    fn encode(&self, recording: &mut FrameRecording) {
        let PhysicalSize { width, height } = self.gpu.size();
        let viewport = self
            .viewport
            .unwrap_or(ViewportRect::new(0, 0, width, height))
            .clamp_to(width, height);

        let load = match recording.clear {
            Some(color) => wgpu::LoadOp::Clear(color),
            None => wgpu::LoadOp::Load,
        };

        let mut rpass = recording
            .gpu_frame
            .encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("hexagram pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &recording.gpu_frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

        if viewport.is_empty() {
            return;
        }

        rpass.set_viewport(
            viewport.x as f32,
            viewport.y as f32,
            viewport.width as f32,
            viewport.height as f32,
            0.0,
            1.0,
        );

        for draw in &recording.draws {
            // Draws were validated when recorded.
            let Some(program) = self.programs.get(draw.program.0) else { continue };
            let Some(bound) = program.bound.as_ref() else { continue };

            rpass.set_pipeline(&bound.pipeline);
            rpass.set_bind_group(0, &program.bind_group, &[]);
            for (slot, id) in bound.buffers.iter().enumerate() {
                if let Some(vb) = self.buffers.get(id.0) {
                    rpass.set_vertex_buffer(slot as u32, vb.buffer.slice(..));
                }
            }
            rpass.draw(draw.range.start..draw.range.end(), 0..1);
        }
    }
}

impl GraphicsBackend for WgpuBackend<'_> {
    fn compile_shader(&mut self, source: &str, stage: ShaderStage) -> Result<ShaderId, BackendError> {
        let interface = reflect::reflect_wgsl(source, stage, self.shader_capabilities)?;

        let device = self.gpu.device();
        let module = validated(device, || {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(match stage {
                    ShaderStage::Vertex => "hexagram vertex shader",
                    ShaderStage::Fragment => "hexagram fragment shader",
                }),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
        })
        .map_err(|e| BackendError::Compile {
            stage,
            message: e.to_string(),
        })?;

        let id = ShaderId(self.shaders.len());
        self.shaders.push(CompiledShader { module, interface });
        Ok(id)
    }

    fn link_program(&mut self, vertex: ShaderId, fragment: ShaderId) -> Result<ProgramId, BackendError> {
        let interface = ProgramInterface::link(
            &self.shader(vertex)?.interface,
            &self.shader(fragment)?.interface,
        )?;

        let device = self.gpu.device();
        let (uniform_buffers, bind_group, layout) = validated(device, || {
            let uniform_buffers: Vec<wgpu::Buffer> = interface
                .uniforms
                .iter()
                .map(|block| {
                    device.create_buffer(&wgpu::BufferDescriptor {
                        label: Some("hexagram uniform buffer"),
                        size: pipeline::uniform_buffer_size(block.size),
                        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                        mapped_at_creation: false,
                    })
                })
                .collect();

            let layout_entries: Vec<wgpu::BindGroupLayoutEntry> = interface
                .uniforms
                .iter()
                .map(|block| wgpu::BindGroupLayoutEntry {
                    binding: block.binding,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(block.size),
                    },
                    count: None,
                })
                .collect();

            let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("hexagram bgl"),
                entries: &layout_entries,
            });

            let bind_entries: Vec<wgpu::BindGroupEntry<'_>> = interface
                .uniforms
                .iter()
                .zip(&uniform_buffers)
                .map(|(block, buffer)| wgpu::BindGroupEntry {
                    binding: block.binding,
                    resource: buffer.as_entire_binding(),
                })
                .collect();

            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("hexagram bind group"),
                layout: &bind_group_layout,
                entries: &bind_entries,
            });

            let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("hexagram pipeline layout"),
                bind_group_layouts: &[&bind_group_layout],
                immediate_size: 0,
            });

            (uniform_buffers, bind_group, layout)
        })
        .map_err(|e| BackendError::Link(e.to_string()))?;

        let id = ProgramId(self.programs.len());
        self.programs.push(Program {
            vertex,
            fragment,
            interface,
            layout,
            uniform_buffers,
            bind_group,
            bound: None,
        });
        Ok(id)
    }

    fn create_vertex_buffer(&mut self, data: &[f32]) -> Result<BufferId, BackendError> {
        let buffer = self
            .gpu
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("hexagram vertex buffer"),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let id = BufferId(self.buffers.len());
        self.buffers.push(VertexBuffer {
            buffer,
            len: data.len(),
        });
        Ok(id)
    }

    fn bind_attributes(
        &mut self,
        program: ProgramId,
        bindings: &[AttributeBinding<'_>],
    ) -> Result<(), BackendError> {
        let prog = self.program(program)?;
        let resolved = pipeline::resolve_attributes(&prog.interface, bindings, |id| {
            self.buffers.get(id.0).map(|b| b.len)
        })?;

        let vs = self.shader(prog.vertex)?;
        let fs = self.shader(prog.fragment)?;

        let device = self.gpu.device();
        let render_pipeline = validated(device, || {
            pipeline::create_triangle_pipeline(
                device,
                &prog.layout,
                self.gpu.surface_format(),
                StageModule {
                    module: &vs.module,
                    entry_point: &vs.interface.entry_point,
                },
                StageModule {
                    module: &fs.module,
                    entry_point: &fs.interface.entry_point,
                },
                &resolved.slots,
            )
        })
        .map_err(|e| BackendError::Link(e.to_string()))?;

        log::debug!(
            "program {} bound {} attribute(s), {} vertices available",
            program.0,
            resolved.slots.len(),
            resolved.vertex_capacity
        );

        self.programs[program.0].bound = Some(BoundAttributes {
            pipeline: render_pipeline,
            buffers: resolved.buffers,
            vertex_capacity: resolved.vertex_capacity,
        });
        Ok(())
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Result<UniformLocation, BackendError> {
        self.program(program)?.interface.scalar_uniform(program, name)
    }

    fn drawable_size(&self) -> (u32, u32) {
        let size = self.gpu.size();
        (size.width, size.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(PhysicalSize::new(width, height));
    }

    fn begin_frame(&mut self) -> Result<FrameStatus, BackendError> {
        if self.frame.is_some() {
            return Err(BackendError::FrameInProgress);
        }
        if !self.gpu.is_drawable() {
            return Ok(FrameStatus::Skipped);
        }

        let gpu_frame = match self.gpu.begin_frame() {
            Ok(frame) => frame,
            Err(err) => {
                let recovery = self.gpu.recover(&err);
                if !recovery.is_recoverable() {
                    return Err(BackendError::Surface(err.to_string()));
                }
                log::debug!("frame skipped after surface error ({err}): {recovery:?}");
                return Ok(FrameStatus::Skipped);
            }
        };

        self.viewport = None;
        self.frame = Some(FrameRecording {
            gpu_frame,
            clear: None,
            draws: Vec::new(),
        });
        Ok(FrameStatus::Ready)
    }

    fn set_viewport(&mut self, viewport: ViewportRect) {
        self.viewport = Some(viewport);
    }

    fn clear(&mut self, color: Color) -> Result<(), BackendError> {
        let frame = self.frame_mut()?;
        frame.clear = Some(wgpu::Color {
            r: f64::from(color.r),
            g: f64::from(color.g),
            b: f64::from(color.b),
            a: f64::from(color.a),
        });
        // A clear discards anything recorded before it.
        frame.draws.clear();
        Ok(())
    }

    fn use_program(&mut self, program: ProgramId) -> Result<(), BackendError> {
        self.program(program)?;
        self.current_program = Some(program);
        Ok(())
    }

    fn set_uniform_scalar(&mut self, location: UniformLocation, value: f32) -> Result<(), BackendError> {
        let program = self.program(location.program)?;
        let buffer = program
            .uniform_buffers
            .get(location.block)
            .ok_or(BackendError::UnknownHandle("uniform location"))?;

        self.gpu.queue().write_buffer(
            buffer,
            u64::from(location.offset),
            bytemuck::bytes_of(&value),
        );
        Ok(())
    }

    fn draw(&mut self, primitive: Primitive, range: VertexRange) -> Result<(), BackendError> {
        let Primitive::Triangles = primitive;

        if self.frame.is_none() {
            return Err(BackendError::NoActiveFrame);
        }
        let program = self.current_program.ok_or(BackendError::NoProgram)?;
        let bound = self
            .program(program)?
            .bound
            .as_ref()
            .ok_or(BackendError::ProgramNotReady)?;

        if range.end() > bound.vertex_capacity {
            return Err(BackendError::DrawOutOfRange {
                range,
                available: bound.vertex_capacity,
            });
        }

        self.frame_mut()?.draws.push(DrawCall { program, range });
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), BackendError> {
        let mut recording = self.frame.take().ok_or(BackendError::NoActiveFrame)?;
        self.encode(&mut recording);
        self.gpu.submit(recording.gpu_frame);
        Ok(())
    }

    fn abort_frame(&mut self) {
        // Dropping the surface texture unpresented releases the image.
        if self.frame.take().is_some() {
            log::debug!("frame aborted");
        }
    }
}
