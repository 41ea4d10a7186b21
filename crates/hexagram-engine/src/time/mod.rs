//! Time subsystem.
//!
//! Provides the animation clock that feeds the `time` uniform. The clock takes
//! timestamps as arguments instead of reading the system clock itself, which
//! keeps the render loop testable with synthetic time.

mod animation_clock;

pub use animation_clock::{AnimationClock, AnimationTime};
