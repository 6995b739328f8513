//! Wall-clock throughput counter for benchmarking runs.

use std::time::{Duration, Instant};

/// Counts mask generations per wall-clock second.
///
/// The reading trails by up to a second: it reports the count from the
/// last completed one-second bucket, not a running average.
#[derive(Debug)]
pub(crate) struct ThroughputCounter {
    last_mark: Instant,
    frames_counted: u32,
    detector_fps: u32,
}

impl ThroughputCounter {
    pub fn new() -> Self {
        Self {
            last_mark: Instant::now(),
            frames_counted: 0,
            detector_fps: 0,
        }
    }

    /// Records one processed frame, rolling the bucket over when more
    /// than a second has passed since the last mark.
    pub fn tick(&mut self) {
        if self.last_mark.elapsed() > Duration::from_secs(1) {
            self.detector_fps = self.frames_counted;
            self.frames_counted = 0;
            self.last_mark = Instant::now();
        }
        self.frames_counted += 1;
    }

    /// Frames counted in the last completed second.
    #[inline]
    pub fn rate(&self) -> u32 {
        self.detector_fps
    }
}
