//! Time management utilities

use std::time::{Duration, Instant};

/// High-precision timer for frame timing
///
/// The render loop calls [`Timer::update`] once per iteration and feeds
/// [`Timer::delta_time`] into the cameras so movement stays frame-rate independent.
pub struct Timer {
    last_frame: Instant,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Update the timer (should be called once per frame)
    pub fn update(&mut self) {
        let now = Instant::now();
        self.advance(now.duration_since(self.last_frame));
        self.last_frame = now;
    }

    /// Advance by an explicit duration, used by [`Timer::update`] and by tests
    pub fn advance(&mut self, elapsed: Duration) {
        self.delta_time = elapsed.as_secs_f32();
        self.total_time += self.delta_time;
        self.frame_count += 1;
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total elapsed time since timer creation
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the average FPS since timer creation
    pub fn average_fps(&self) -> f32 {
        if self.total_time > 0.0 {
            self.frame_count as f32 / self.total_time
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_accumulates() {
        let mut timer = Timer::new();
        timer.advance(Duration::from_millis(500));
        timer.advance(Duration::from_millis(250));

        assert!((timer.delta_time() - 0.25).abs() < 1e-6);
        assert!((timer.total_time() - 0.75).abs() < 1e-6);
        assert_eq!(timer.frame_count(), 2);
        assert!((timer.average_fps() - 2.0 / 0.75).abs() < 1e-3);
    }

    #[test]
    fn test_average_fps_without_time_is_zero() {
        let timer = Timer::new();
        assert_eq!(timer.average_fps(), 0.0);
    }
}
