use std::time::Instant;

use crate::backend::{
    BackendError, BufferId, FrameStatus, GraphicsBackend, Primitive, ProgramId, UniformLocation,
};
use crate::coords::ViewportRect;
use crate::paint::Color;
use crate::scene::Scene;
use crate::time::AnimationClock;

/// Dark blue behind the scene.
pub const DEFAULT_BACKGROUND: Color = Color::from_premul(0.0, 0.0, 0.3, 1.0);

/// Asks the host to call [`RenderLoop::tick`] again on its next frame.
pub trait FrameScheduler {
    fn request_frame(&mut self);
}

impl<F: FnMut()> FrameScheduler for F {
    fn request_frame(&mut self) {
        self()
    }
}

/// What a single [`RenderLoop::tick`] did.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum FrameOutcome {
    /// The loop was never started; nothing happened.
    Idle,
    /// The backend had no surface to draw to this time.
    Skipped,
    Rendered {
        /// Seconds since `start`, as uploaded to the time uniform.
        elapsed: f32,
        /// Ticks since `start`, skipped frames included.
        frame_index: u64,
        /// Whether a successor frame was requested.
        scheduled_next: bool,
    },
}

#[derive(Debug, Copy, Clone)]
pub(super) struct SceneBuffers {
    pub positions: BufferId,
    pub colors: BufferId,
}

/// Animation state plus every handle produced by setup.
///
/// Stopped until [`start`](Self::start). While running, each tick requests
/// its successor before drawing, so a frame that fails has already scheduled
/// the next one. [`stop`](Self::stop) only clears the running flag: the
/// frame already requested still renders, and schedules nothing further.
pub struct RenderLoop<B> {
    backend: B,
    program: ProgramId,
    time_uniform: UniformLocation,
    scene: Scene,
    buffers: SceneBuffers,
    background: Color,
    clock: AnimationClock,
    running: bool,
}

impl<B: GraphicsBackend> RenderLoop<B> {
    pub(super) fn new(
        backend: B,
        program: ProgramId,
        time_uniform: UniformLocation,
        scene: Scene,
        buffers: SceneBuffers,
        background: Color,
    ) -> Self {
        Self {
            backend,
            program,
            time_uniform,
            scene,
            buffers,
            background,
            clock: AnimationClock::new(),
            running: false,
        }
    }

    /// Rebases the clock on `now` and requests the first frame.
    pub fn start(&mut self, now: Instant, scheduler: &mut impl FrameScheduler) {
        self.clock.start(now);
        self.running = true;
        log::info!("render loop started");
        scheduler.request_frame();
    }

    pub fn stop(&mut self) {
        if self.running {
            log::info!("render loop stopped");
        }
        self.running = false;
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Renders one frame at `now`.
    pub fn tick(
        &mut self,
        now: Instant,
        scheduler: &mut impl FrameScheduler,
    ) -> Result<FrameOutcome, BackendError> {
        let Some(time) = self.clock.tick(now) else {
            return Ok(FrameOutcome::Idle);
        };

        let scheduled_next = self.running;
        if scheduled_next {
            scheduler.request_frame();
        }

        if self.backend.begin_frame()? == FrameStatus::Skipped {
            log::trace!("frame {} skipped", time.frame_index);
            return Ok(FrameOutcome::Skipped);
        }

        if let Err(err) = self.record_frame(time.elapsed) {
            self.backend.abort_frame();
            return Err(err);
        }

        Ok(FrameOutcome::Rendered {
            elapsed: time.elapsed,
            frame_index: time.frame_index,
            scheduled_next,
        })
    }

    fn record_frame(&mut self, elapsed: f32) -> Result<(), BackendError> {
        let (width, height) = self.backend.drawable_size();
        self.backend.set_viewport(ViewportRect::square_fit(width, height));
        self.backend.clear(self.background)?;

        self.backend.use_program(self.program)?;
        self.backend.set_uniform_scalar(self.time_uniform, elapsed)?;

        for shape in self.scene.ranges() {
            self.backend.draw(Primitive::Triangles, shape.range)?;
        }

        self.backend.end_frame()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn program(&self) -> ProgramId {
        self.program
    }

    pub fn position_buffer(&self) -> BufferId {
        self.buffers.positions
    }

    pub fn color_buffer(&self) -> BufferId {
        self.buffers.colors
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
