//! Video-source seam between the decoder and the extractor.
//!
//! The core only consumes fixed-size RGB frames delivered in
//! presentation order. This module defines that contract as a trait and
//! provides a deterministic in-process source for the demo driver and
//! tests. Real demuxing and decoding live behind the same trait in the
//! host application.

use super::Frame;
use thiserror::Error;

/// Errors reported by video sources.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// Frame metadata was queried before the first frame was read.
    #[error("no frame has been read from the source yet")]
    NotStarted,
    /// The underlying decoder failed to produce a frame.
    #[error("failed to decode frame: {0}")]
    Decode(String),
}

/// A decoded frame together with its presentation timestamp.
#[derive(Debug, Clone)]
pub struct TimedFrame {
    /// The decoded RGB pixels.
    pub frame: Frame,
    /// Presentation timestamp, in the source's own time base.
    pub pts: i64,
}

/// An ordered supplier of equally sized video frames.
///
/// Frames must be yielded in presentation order; the extractor assumes
/// this and silently mistracks on out-of-order delivery. Dimension
/// accessors fail with [`SourceError::NotStarted`] until the first
/// frame has been read.
pub trait VideoSource {
    /// Yields the next frame, or `None` when the stream is over.
    fn next_frame(&mut self) -> Result<Option<TimedFrame>, SourceError>;

    /// Frame rate of the stream in frames per second.
    fn fps(&self) -> f64;

    /// Total stream length, in the same time base as frame timestamps.
    fn length(&self) -> i64;

    /// Width of the stream's frames in pixels.
    fn frame_width(&self) -> Result<usize, SourceError>;

    /// Height of the stream's frames in pixels.
    fn frame_height(&self) -> Result<usize, SourceError>;
}

/// Deterministic synthetic source: a flat backdrop with one bright
/// block sliding horizontally, wrapping at the right edge.
///
/// Stands in for a decoder wherever real footage is unnecessary.
#[derive(Debug)]
pub struct SyntheticSource {
    width: usize,
    height: usize,
    fps: f64,
    frame_limit: u64,
    sequence: u64,
}

const BACKDROP: [u8; 3] = [96, 96, 96];
const BLOCK: [u8; 3] = [220, 64, 64];

impl SyntheticSource {
    /// Creates a source producing 300 frames of the given geometry.
    pub fn new(width: usize, height: usize, fps: f64) -> Self {
        Self {
            width,
            height,
            fps,
            frame_limit: 300,
            sequence: 0,
        }
    }

    /// Overrides the number of frames the source will yield.
    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.frame_limit = frames;
        self
    }

    fn render(&self, sequence: u64) -> Frame {
        let mut frame = Frame::zeroed(self.width, self.height, BACKDROP.len());
        for px in frame.data_mut().chunks_exact_mut(BACKDROP.len()) {
            px.copy_from_slice(&BACKDROP);
        }

        let block = (self.width / 6).max(2).min(self.width);
        let travel = self.width.saturating_sub(block).max(1);
        let left = (sequence as usize * 2) % travel;
        let top = self.height / 2 - (block / 2).min(self.height / 2);
        let bottom = (top + block).min(self.height);

        for y in top..bottom {
            for x in left..(left + block).min(self.width) {
                frame.pixel_mut(x, y).copy_from_slice(&BLOCK);
            }
        }
        frame
    }
}

impl VideoSource for SyntheticSource {
    fn next_frame(&mut self) -> Result<Option<TimedFrame>, SourceError> {
        if self.sequence >= self.frame_limit {
            return Ok(None);
        }
        let frame = self.render(self.sequence);
        let pts = self.sequence as i64;
        self.sequence += 1;
        Ok(Some(TimedFrame { frame, pts }))
    }

    fn fps(&self) -> f64 {
        self.fps
    }

    fn length(&self) -> i64 {
        self.frame_limit as i64
    }

    fn frame_width(&self) -> Result<usize, SourceError> {
        if self.sequence == 0 {
            return Err(SourceError::NotStarted);
        }
        Ok(self.width)
    }

    fn frame_height(&self) -> Result<usize, SourceError> {
        if self.sequence == 0 {
            return Err(SourceError::NotStarted);
        }
        Ok(self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::PixelBuffer;

    #[test]
    fn test_dimensions_unavailable_before_first_frame() {
        let source = SyntheticSource::new(30, 24, 30.0);
        assert!(matches!(source.frame_width(), Err(SourceError::NotStarted)));
        assert!(matches!(source.frame_height(), Err(SourceError::NotStarted)));
    }

    #[test]
    fn test_dimensions_after_first_frame() {
        let mut source = SyntheticSource::new(30, 24, 30.0);
        source.next_frame().unwrap();
        assert_eq!(source.frame_width().unwrap(), 30);
        assert_eq!(source.frame_height().unwrap(), 24);
    }

    #[test]
    fn test_frames_arrive_in_presentation_order() {
        let mut source = SyntheticSource::new(30, 24, 30.0).with_frame_limit(3);
        let mut last_pts = -1;
        while let Some(timed) = source.next_frame().unwrap() {
            assert!(timed.pts > last_pts);
            assert_eq!(timed.frame.total_size(), 30 * 24 * 3);
            last_pts = timed.pts;
        }
        assert_eq!(last_pts, 2);
        assert_eq!(source.length(), 3);
    }

    #[test]
    fn test_block_moves_between_frames() {
        let mut source = SyntheticSource::new(60, 30, 30.0).with_frame_limit(2);
        let first = source.next_frame().unwrap().unwrap();
        let second = source.next_frame().unwrap().unwrap();
        assert_ne!(first.frame.data(), second.frame.data());
    }
}
