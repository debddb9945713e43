//! Fixed timestep pacing.
//!
//! The world always advances in fixed ticks. When a run is paced against
//! the wall clock, real frame time is accumulated and converted into a
//! bounded number of ticks per frame.

use std::time::{Duration, Instant};

/// Most ticks run for one frame before the backlog is dropped.
const MAX_UPDATES: u32 = 10;

/// Largest frame delta accepted, in seconds.
const MAX_FRAME_DT: f32 = 0.25;

/// Fixed-step accumulator.
#[derive(Debug)]
pub struct FixedStep {
    fixed_dt: f32,
    accumulator: f32,
    last_frame: Instant,
    dropped: u64,
}

impl FixedStep {
    /// Create a clock ticking at `tick_rate` Hz.
    #[must_use]
    pub fn new(tick_rate: u32) -> Self {
        Self {
            fixed_dt: 1.0 / tick_rate.max(1) as f32,
            accumulator: 0.0,
            last_frame: Instant::now(),
            dropped: 0,
        }
    }

    /// Seconds per tick.
    #[must_use]
    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    /// Accumulate `dt` and return how many ticks should run now.
    pub fn accumulate(&mut self, dt: f32) -> u32 {
        self.accumulator += dt.clamp(0.0, MAX_FRAME_DT);
        let mut count = 0;

        while self.accumulator >= self.fixed_dt && count < MAX_UPDATES {
            self.accumulator -= self.fixed_dt;
            count += 1;
        }

        // Still behind, drop the backlog
        if self.accumulator > self.fixed_dt * 2.0 {
            self.dropped += 1;
            self.accumulator = 0.0;
        }

        count
    }

    /// Wall-clock seconds since the previous call.
    pub fn frame_delta(&mut self) -> f32 {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;
        dt
    }

    /// Sleep until the next tick is due.
    pub fn sleep_until_next(&self) {
        let remaining = self.fixed_dt - self.accumulator;
        if remaining > 0.001 {
            std::thread::sleep(Duration::from_secs_f32(remaining));
        }
    }

    /// Number of frames whose backlog was dropped.
    #[must_use]
    pub fn dropped_frames(&self) -> u64 {
        self.dropped
    }
}
