//! Frame timing and scheduling.
//!
//! Provides clamped delta time, FPS limiting and the frame schedulers that
//! drive the game loop.

use ecosort_gameplay::{FixedDeltaScheduler, TickScheduler};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Frame timing manager.
#[derive(Debug)]
pub struct FrameTiming {
    /// Target frames per second
    target_fps: u32,
    /// Time budget per frame
    frame_budget: Duration,
    /// Time of last frame start
    last_frame: Instant,
    /// Maximum delta time handed to the simulation
    max_dt: f32,
    /// Recent frame times for averaging
    frame_times: VecDeque<f32>,
    /// Maximum samples for averaging
    max_samples: usize,
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self::new(60)
    }
}

impl FrameTiming {
    /// Create a new frame timing manager.
    ///
    /// # Arguments
    /// * `target_fps` - Target frames per second for frame limiting
    #[must_use]
    pub fn new(target_fps: u32) -> Self {
        let target_fps = target_fps.max(1);
        Self {
            target_fps,
            frame_budget: Duration::from_secs_f64(1.0 / f64::from(target_fps)),
            last_frame: Instant::now(),
            max_dt: 0.25,
            frame_times: VecDeque::with_capacity(120),
            max_samples: 120,
        }
    }

    /// Calculate delta time since last frame.
    /// Also stores the frame time for FPS calculation.
    pub fn delta_time(&mut self) -> f32 {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;

        // A long stall (debugger, window drag) must not teleport the character
        let clamped_dt = dt.min(self.max_dt);

        self.frame_times.push_back(clamped_dt);
        if self.frame_times.len() > self.max_samples {
            self.frame_times.pop_front();
        }

        clamped_dt
    }

    /// Sleep for the remainder of the frame budget.
    pub fn sleep_remainder(&self) {
        let elapsed = self.last_frame.elapsed();
        if elapsed < self.frame_budget {
            std::thread::sleep(self.frame_budget - elapsed);
        }
    }

    /// Get the current FPS (averaged over recent frames).
    #[must_use]
    pub fn current_fps(&self) -> f32 {
        let avg = self.average_frame_time_ms();
        if avg > 0.0 {
            1000.0 / avg
        } else {
            0.0
        }
    }

    /// Get the average frame time in milliseconds.
    #[must_use]
    pub fn average_frame_time_ms(&self) -> f32 {
        if self.frame_times.is_empty() {
            return 0.0;
        }

        (self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32) * 1000.0
    }

    /// Get the target FPS.
    #[must_use]
    pub fn target_fps(&self) -> u32 {
        self.target_fps
    }

    /// Reset timing (call after loading or restart).
    pub fn reset(&mut self) {
        self.last_frame = Instant::now();
        self.frame_times.clear();
    }
}

/// Handle that stops a scheduler from another owner.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    /// Creates a live handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Scheduler paced by the wall clock.
///
/// Each call sleeps out the rest of the previous frame's budget, then
/// reports the real elapsed time.
#[derive(Debug)]
pub struct WallClockScheduler {
    timing: FrameTiming,
    cancel: CancelHandle,
    first: bool,
}

impl WallClockScheduler {
    /// Creates a scheduler targeting `target_fps`.
    #[must_use]
    pub fn new(target_fps: u32, cancel: CancelHandle) -> Self {
        Self {
            timing: FrameTiming::new(target_fps),
            cancel,
            first: true,
        }
    }

    /// Frame timing statistics.
    #[must_use]
    pub fn timing(&self) -> &FrameTiming {
        &self.timing
    }
}

impl TickScheduler for WallClockScheduler {
    fn next_delta(&mut self) -> Option<f32> {
        if self.cancel.is_cancelled() {
            return None;
        }
        if self.first {
            self.first = false;
            self.timing.reset();
        } else {
            self.timing.sleep_remainder();
        }
        Some(self.timing.delta_time())
    }
}

/// Fixed-delta scheduler that also honours a cancel handle.
#[derive(Debug)]
pub struct SteppedScheduler {
    inner: FixedDeltaScheduler,
    cancel: CancelHandle,
}

impl SteppedScheduler {
    /// Produces `delta` until cancelled.
    #[must_use]
    pub fn new(delta: f32, cancel: CancelHandle) -> Self {
        Self {
            inner: FixedDeltaScheduler::unbounded(delta),
            cancel,
        }
    }
}

impl TickScheduler for SteppedScheduler {
    fn next_delta(&mut self) -> Option<f32> {
        if self.cancel.is_cancelled() {
            return None;
        }
        self.inner.next_delta()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_timing_creation() {
        let timing = FrameTiming::new(60);
        assert_eq!(timing.target_fps(), 60);
        assert_eq!(timing.current_fps(), 0.0);
    }

    #[test]
    fn test_frame_timing_delta() {
        let mut timing = FrameTiming::new(60);

        std::thread::sleep(Duration::from_millis(16));
        let dt = timing.delta_time();
        assert!(dt >= 0.015);
        assert!(dt < 0.5);
        assert!(timing.current_fps() > 0.0);
    }

    #[test]
    fn test_frame_timing_max_dt() {
        let mut timing = FrameTiming::new(60);

        std::thread::sleep(Duration::from_millis(300));
        let dt = timing.delta_time();

        assert!(dt <= timing.max_dt);
    }

    #[test]
    fn test_reset_timing() {
        let mut timing = FrameTiming::new(60);
        timing.frame_times.push_back(0.016);

        timing.reset();

        assert!(timing.frame_times.is_empty());
    }

    #[test]
    fn test_cancelled_wall_clock_stops() {
        let cancel = CancelHandle::new();
        let mut scheduler = WallClockScheduler::new(240, cancel.clone());

        assert!(scheduler.next_delta().is_some());
        cancel.cancel();
        assert!(scheduler.next_delta().is_none());
    }

    #[test]
    fn test_stepped_scheduler_honours_cancel() {
        let cancel = CancelHandle::new();
        let mut scheduler = SteppedScheduler::new(0.02, cancel.clone());

        assert_eq!(scheduler.next_delta(), Some(0.02));
        assert_eq!(scheduler.next_delta(), Some(0.02));
        cancel.cancel();
        assert_eq!(scheduler.next_delta(), None);
    }
}
