//! In-memory backend that records every call.
//!
//! Shader reflection, linking and attribute resolution run for real, so name
//! lookups fail exactly where the wgpu backend would fail. Validation runs as
//! for a device without optional features.

use naga::valid::Capabilities;

use crate::coords::ViewportRect;
use crate::paint::Color;
use crate::scene::VertexRange;

use super::pipeline;
use super::reflect::{self, ProgramInterface, StageInterface};
use super::{
    AttributeBinding, BackendError, BufferId, FrameStatus, GraphicsBackend, Primitive, ProgramId,
    ShaderId, ShaderStage, UniformLocation,
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    CompileShader(ShaderStage),
    LinkProgram,
    /// Length in `f32`s.
    CreateVertexBuffer(usize),
    BindAttributes(Vec<String>),
    Resize(u32, u32),
    BeginFrame,
    SetViewport(ViewportRect),
    Clear(Color),
    UseProgram(ProgramId),
    SetUniform(UniformLocation, f32),
    Draw(Primitive, VertexRange),
    EndFrame,
    AbortFrame,
}

struct RecordedProgram {
    interface: ProgramInterface,
    vertex_capacity: Option<u32>,
}

pub(crate) struct RecordingBackend {
    pub calls: Vec<Call>,
    pub size: (u32, u32),
    /// Makes every `draw` fail after recording it.
    pub fail_draws: bool,
    /// Makes `begin_frame` report a skipped frame.
    pub skip_frames: bool,
    shaders: Vec<StageInterface>,
    programs: Vec<RecordedProgram>,
    buffers: Vec<usize>,
    current_program: Option<ProgramId>,
    in_frame: bool,
}

impl RecordingBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            calls: Vec::new(),
            size: (width, height),
            fail_draws: false,
            skip_frames: false,
            shaders: Vec::new(),
            programs: Vec::new(),
            buffers: Vec::new(),
            current_program: None,
            in_frame: false,
        }
    }

    pub fn draws(&self) -> Vec<VertexRange> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Draw(_, range) => Some(*range),
                _ => None,
            })
            .collect()
    }

    pub fn uniform_values(&self) -> Vec<f32> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::SetUniform(_, v) => Some(*v),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    fn program(&self, id: ProgramId) -> Result<&RecordedProgram, BackendError> {
        self.programs.get(id.0).ok_or(BackendError::UnknownHandle("program"))
    }
}

impl GraphicsBackend for RecordingBackend {
    fn compile_shader(&mut self, source: &str, stage: ShaderStage) -> Result<ShaderId, BackendError> {
        self.calls.push(Call::CompileShader(stage));
        let interface = reflect::reflect_wgsl(source, stage, Capabilities::empty())?;
        self.shaders.push(interface);
        Ok(ShaderId(self.shaders.len() - 1))
    }

    fn link_program(&mut self, vertex: ShaderId, fragment: ShaderId) -> Result<ProgramId, BackendError> {
        self.calls.push(Call::LinkProgram);
        let vs = self.shaders.get(vertex.0).ok_or(BackendError::UnknownHandle("shader"))?;
        let fs = self.shaders.get(fragment.0).ok_or(BackendError::UnknownHandle("shader"))?;
        let interface = ProgramInterface::link(vs, fs)?;
        self.programs.push(RecordedProgram {
            interface,
            vertex_capacity: None,
        });
        Ok(ProgramId(self.programs.len() - 1))
    }

    fn create_vertex_buffer(&mut self, data: &[f32]) -> Result<BufferId, BackendError> {
        self.calls.push(Call::CreateVertexBuffer(data.len()));
        self.buffers.push(data.len());
        Ok(BufferId(self.buffers.len() - 1))
    }

    fn bind_attributes(
        &mut self,
        program: ProgramId,
        bindings: &[AttributeBinding<'_>],
    ) -> Result<(), BackendError> {
        self.calls.push(Call::BindAttributes(
            bindings.iter().map(|b| b.name.to_string()).collect(),
        ));
        let resolved = pipeline::resolve_attributes(&self.program(program)?.interface, bindings, |id| {
            self.buffers.get(id.0).copied()
        })?;
        self.programs[program.0].vertex_capacity = Some(resolved.vertex_capacity);
        Ok(())
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Result<UniformLocation, BackendError> {
        self.program(program)?.interface.scalar_uniform(program, name)
    }

    fn drawable_size(&self) -> (u32, u32) {
        self.size
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.calls.push(Call::Resize(width, height));
        self.size = (width, height);
    }

    fn begin_frame(&mut self) -> Result<FrameStatus, BackendError> {
        self.calls.push(Call::BeginFrame);
        if self.in_frame {
            return Err(BackendError::FrameInProgress);
        }
        if self.skip_frames {
            return Ok(FrameStatus::Skipped);
        }
        self.in_frame = true;
        Ok(FrameStatus::Ready)
    }

    fn set_viewport(&mut self, viewport: ViewportRect) {
        self.calls.push(Call::SetViewport(viewport));
    }

    fn clear(&mut self, color: Color) -> Result<(), BackendError> {
        self.calls.push(Call::Clear(color));
        if !self.in_frame {
            return Err(BackendError::NoActiveFrame);
        }
        Ok(())
    }

    fn use_program(&mut self, program: ProgramId) -> Result<(), BackendError> {
        self.calls.push(Call::UseProgram(program));
        self.program(program)?;
        self.current_program = Some(program);
        Ok(())
    }

    fn set_uniform_scalar(&mut self, location: UniformLocation, value: f32) -> Result<(), BackendError> {
        self.calls.push(Call::SetUniform(location, value));
        self.program(location.program)?;
        Ok(())
    }

    fn draw(&mut self, primitive: Primitive, range: VertexRange) -> Result<(), BackendError> {
        self.calls.push(Call::Draw(primitive, range));
        if self.fail_draws {
            return Err(BackendError::Surface("injected draw failure".into()));
        }
        if !self.in_frame {
            return Err(BackendError::NoActiveFrame);
        }
        let program = self.current_program.ok_or(BackendError::NoProgram)?;
        let available = self
            .program(program)?
            .vertex_capacity
            .ok_or(BackendError::ProgramNotReady)?;
        if range.end() > available {
            return Err(BackendError::DrawOutOfRange { range, available });
        }
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), BackendError> {
        self.calls.push(Call::EndFrame);
        if !self.in_frame {
            return Err(BackendError::NoActiveFrame);
        }
        self.in_frame = false;
        Ok(())
    }

    fn abort_frame(&mut self) {
        self.calls.push(Call::AbortFrame);
        self.in_frame = false;
    }
}
