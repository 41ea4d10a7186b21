//! Setup sequence and per-frame render loop.
//!
//! [`setup`] turns a backend, two shader sources and a scene description into
//! a [`RenderLoop`]. The loop owns every handle it needs and is driven by the
//! host through [`RenderLoop::tick`], one call per scheduled frame.

mod error;
mod frame_loop;
mod setup;
mod sources;

pub use error::SetupError;
pub use frame_loop::{FrameOutcome, FrameScheduler, RenderLoop, DEFAULT_BACKGROUND};
pub use setup::{setup, COLOR_ATTRIBUTE, POSITION_ATTRIBUTE, TIME_UNIFORM};
pub use sources::ShaderSources;
