use std::time::Instant;

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::backend::{GraphicsBackend, WgpuBackend};
use crate::device::GpuInit;
use crate::paint::Color;
use crate::render::{self, FrameOutcome, FrameScheduler, RenderLoop, ShaderSources};
use crate::scene::SceneConfig;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub background: Color,
    pub shaders: ShaderSources,
    pub scene: SceneConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "hexagram".to_string(),
            initial_size: LogicalSize::new(720.0, 720.0),
            background: render::DEFAULT_BACKGROUND,
            shaders: ShaderSources::default(),
            scene: SceneConfig::default(),
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the window, runs setup and renders until the window closes.
    ///
    /// Setup failures and frame errors end the event loop and are returned.
    pub fn run(config: RuntimeConfig, gpu_init: GpuInit) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    render_loop: RenderLoop<WgpuBackend<'this>>,
}

/// Schedules frames through winit redraw requests.
struct RedrawScheduler<'a>(&'a Window);

impl FrameScheduler for RedrawScheduler<'_> {
    fn request_frame(&mut self) {
        self.0.request_redraw();
    }
}

struct AppState {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    entry: Option<WindowEntry>,
    failure: Option<anyhow::Error>,
}

impl AppState {
    fn new(config: RuntimeConfig, gpu_init: GpuInit) -> Self {
        Self {
            config,
            gpu_init,
            entry: None,
            failure: None,
        }
    }

    fn create_window_entry(&self, event_loop: &ActiveEventLoop) -> Result<WindowEntry> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        let RuntimeConfig {
            background,
            shaders,
            scene,
            ..
        } = &self.config;

        let entry = WindowEntryTryBuilder {
            window,
            render_loop_builder: |w| {
                pollster::block_on(WgpuBackend::new(w, gpu_init))
                    .and_then(|backend| render::setup(backend, shaders, scene, *background))
            },
        }
        .try_build()
        .context("render setup failed")?;

        Ok(entry)
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.failure = Some(error);
        self.entry = None;
        event_loop.exit();
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || self.failure.is_some() {
            return;
        }

        let mut entry = match self.create_window_entry(event_loop) {
            Ok(entry) => entry,
            Err(e) => return self.fail(event_loop, e),
        };

        entry.with_mut(|fields| {
            let mut scheduler = RedrawScheduler(fields.window);
            fields.render_loop.start(Instant::now(), &mut scheduler);
        });

        self.entry = Some(entry);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // Frames are driven by redraw requests only.
        event_loop.set_control_flow(ControlFlow::Wait);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(entry) = self.entry.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                entry.with_render_loop_mut(|lp| lp.stop());
                self.entry = None;
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                resize(entry, new_size);
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let new_size = entry.with_window(|w| w.inner_size());
                resize(entry, new_size);
            }

            WindowEvent::RedrawRequested => {
                let result = entry.with_mut(|fields| {
                    let mut scheduler = RedrawScheduler(fields.window);
                    fields.render_loop.tick(Instant::now(), &mut scheduler)
                });

                match result {
                    Ok(FrameOutcome::Rendered { frame_index, .. }) => {
                        log::trace!("frame {frame_index} presented");
                    }
                    Ok(FrameOutcome::Skipped | FrameOutcome::Idle) => {}
                    Err(e) => {
                        let error = anyhow::Error::new(e).context("frame rendering failed");
                        self.fail(event_loop, error);
                    }
                }
            }

            _ => {}
        }
    }
}

fn resize(entry: &mut WindowEntry, size: PhysicalSize<u32>) {
    log::debug!("surface resized to {}x{}", size.width, size.height);
    entry.with_render_loop_mut(|lp| lp.backend_mut().resize(size.width, size.height));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_square_window() {
        let config = RuntimeConfig::default();
        assert_eq!(config.initial_size.width, config.initial_size.height);
        assert_eq!(config.background, render::DEFAULT_BACKGROUND);
        assert_eq!(config.scene, SceneConfig::default());
    }
}
