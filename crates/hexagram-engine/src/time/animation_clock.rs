use std::time::Instant;

/// Per-frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct AnimationTime {
    /// Seconds since the clock was started.
    pub elapsed: f32,

    /// Frames ticked since the clock was started.
    pub frame_index: u64,
}

/// Clock measuring seconds elapsed since an animation started.
///
/// The baseline is set by `start` and never moves on its own: stopping the
/// render loop leaves it in place, and only another `start` rebases it.
/// Elapsed time saturates at zero for timestamps earlier than the baseline,
/// so successive ticks with non-decreasing `now` never go backwards.
#[derive(Debug, Clone, Default)]
pub struct AnimationClock {
    baseline: Option<Instant>,
    frame_index: u64,
}

impl AnimationClock {
    pub const fn new() -> Self {
        Self {
            baseline: None,
            frame_index: 0,
        }
    }

    /// Records `now` as the baseline and resets the frame counter.
    pub fn start(&mut self, now: Instant) {
        self.baseline = Some(now);
        self.frame_index = 0;
    }

    #[inline]
    pub fn is_started(&self) -> bool {
        self.baseline.is_some()
    }

    /// Seconds between the baseline and `now`, or `None` before `start`.
    pub fn elapsed_at(&self, now: Instant) -> Option<f32> {
        self.baseline
            .map(|base| now.saturating_duration_since(base).as_secs_f32())
    }

    /// Takes a snapshot at `now` and advances the frame counter.
    pub fn tick(&mut self, now: Instant) -> Option<AnimationTime> {
        let elapsed = self.elapsed_at(now)?;

        let time = AnimationTime {
            elapsed,
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);

        Some(time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn unstarted_clock_has_no_time() {
        let mut clock = AnimationClock::new();
        assert!(!clock.is_started());
        assert!(clock.elapsed_at(Instant::now()).is_none());
        assert!(clock.tick(Instant::now()).is_none());
    }

    #[test]
    fn elapsed_is_measured_from_start() {
        let t0 = Instant::now();
        let mut clock = AnimationClock::new();
        clock.start(t0);
        assert_eq!(clock.elapsed_at(t0), Some(0.0));
        assert_eq!(clock.elapsed_at(t0 + Duration::from_secs(2)), Some(2.0));
        assert_eq!(clock.elapsed_at(t0 + Duration::from_millis(1500)), Some(1.5));
    }

    #[test]
    fn earlier_timestamps_saturate_to_zero() {
        let t0 = Instant::now();
        let mut clock = AnimationClock::new();
        clock.start(t0 + Duration::from_secs(1));
        assert_eq!(clock.elapsed_at(t0), Some(0.0));
    }

    #[test]
    fn ticks_are_monotonic_and_counted() {
        let t0 = Instant::now();
        let mut clock = AnimationClock::new();
        clock.start(t0);

        let mut last = 0.0;
        for i in 0..5u64 {
            let t = clock.tick(t0 + Duration::from_millis(16 * i)).unwrap();
            assert_eq!(t.frame_index, i);
            assert!(t.elapsed >= last);
            last = t.elapsed;
        }
    }

    #[test]
    fn restart_rebases() {
        let t0 = Instant::now();
        let mut clock = AnimationClock::new();
        clock.start(t0);
        clock.tick(t0 + Duration::from_secs(3));

        let t1 = t0 + Duration::from_secs(10);
        clock.start(t1);
        let t = clock.tick(t1 + Duration::from_secs(1)).unwrap();
        assert_eq!(t.elapsed, 1.0);
        assert_eq!(t.frame_index, 0);
    }
}
