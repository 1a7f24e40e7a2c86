//! Frame clocks feeding the scheduler its delta time

use std::time::Instant;

/// Source of the per-frame delta time (seconds)
pub trait Clock {
    /// Advance to the next frame and return the seconds elapsed since the previous one
    fn tick(&mut self) -> f32;

    /// Delta time of the most recent tick
    fn delta_time(&self) -> f32;
}

/// Wall-clock timer for variable-rate frame loops
pub struct Timer {
    last_frame: Instant,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
    max_delta: f32,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer; deltas are clamped to a quarter second so a
    /// stalled frame cannot launch objects through geometry
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
            max_delta: 0.25,
        }
    }

    /// Override the delta clamp
    pub fn with_max_delta(mut self, max_delta: f32) -> Self {
        self.max_delta = max_delta.max(0.0);
        self
    }

    /// Get the total elapsed time since timer creation
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Clock for Timer {
    fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame).as_secs_f32();
        self.delta_time = elapsed.min(self.max_delta);
        self.total_time += self.delta_time;
        self.last_frame = now;
        self.frame_count += 1;
        self.delta_time
    }

    fn delta_time(&self) -> f32 {
        self.delta_time
    }
}

/// Constant-delta clock for deterministic stepping (tests, headless runs)
#[derive(Debug, Clone, Copy)]
pub struct FixedTimestep {
    delta: f32,
    frames: u64,
}

impl FixedTimestep {
    /// Create a clock that always reports `delta` seconds
    pub fn new(delta: f32) -> Self {
        Self { delta, frames: 0 }
    }

    /// Number of ticks so far
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Clock for FixedTimestep {
    fn tick(&mut self) -> f32 {
        self.frames += 1;
        self.delta
    }

    fn delta_time(&self) -> f32 {
        self.delta
    }
}
