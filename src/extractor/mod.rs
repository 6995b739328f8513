//! The streaming motion extraction core.
//!
//! One extractor owns everything a single video stream needs: the
//! downscaler and its scratch, the per-pixel background model, the
//! morphological filter, and the output mask. Frames go in one at a
//! time, in presentation order, and each call yields a mask borrowed
//! from the extractor:
//!
//! ```text
//! input frame -> downscale -> per-pixel update -> reference promotion
//!             -> mask -> erode -> dilate -> output mask
//! ```
//!
//! All stages are synchronous and single-threaded; callers wanting
//! parallelism run one extractor per stream.

mod background;
mod downscale;
mod morphology;
mod throughput;

use crate::config::{check_erosion, check_sensitivity, check_settle_time, ConfigError, DetectorSettings};
use crate::frame::{Frame, FrameError, PixelBuffer};
use background::BackgroundModel;
use downscale::Downscaler;
use morphology::MorphFilter;
use thiserror::Error;
use throughput::ThroughputCounter;
use tracing::{debug, info};

/// Fixed integer ratio by which source frames shrink before analysis.
pub const DOWNSCALE_RATIO: usize = 3;

/// Pixel depth handled by the core: 3-byte RGB throughout.
pub const BYTES_PER_PIXEL: usize = 3;

/// Errors from extractor construction.
#[derive(Debug, Clone, Error)]
pub enum ExtractorError {
    /// Source frames are too small to survive downscaling.
    #[error("source frames must be at least 3x3 pixels, got {width}x{height}")]
    SourceTooSmall {
        /// Offered source width.
        width: usize,
        /// Offered source height.
        height: usize,
    },
    /// The frame rate is zero or negative.
    #[error("frame rate must be positive, got {0}")]
    InvalidFrameRate(f64),
}

/// Streaming per-pixel motion extractor.
///
/// Produces, for each input frame, a mask of the same downscaled
/// geometry whose byte 0 marks moving pixels (255) against settled
/// background (0). Objects that stop moving fade into the background
/// over the configured settle time; settled regions that start moving
/// are re-detected.
pub struct MotionExtractor {
    src_width: usize,
    src_height: usize,
    fps: f64,
    threshold: u8,
    stable_cap: u32,
    erosion_level: u8,
    downscaler: Downscaler,
    shrunk: Vec<u8>,
    model: BackgroundModel,
    morph: MorphFilter,
    mask: Frame,
    counter: Option<ThroughputCounter>,
}

impl MotionExtractor {
    /// Creates an extractor for frames of `src_width x src_height`
    /// pixels at `fps` frames per second.
    ///
    /// Every buffer the extractor will ever need is allocated here and
    /// reused for each frame. With `benchmark` set, a wall-clock
    /// throughput counter is maintained; see
    /// [`detector_fps`](Self::detector_fps).
    pub fn new(
        src_width: usize,
        src_height: usize,
        fps: f64,
        benchmark: bool,
    ) -> Result<Self, ExtractorError> {
        if src_width < DOWNSCALE_RATIO || src_height < DOWNSCALE_RATIO {
            return Err(ExtractorError::SourceTooSmall {
                width: src_width,
                height: src_height,
            });
        }
        if fps <= 0.0 {
            return Err(ExtractorError::InvalidFrameRate(fps));
        }

        let width = src_width / DOWNSCALE_RATIO;
        let height = src_height / DOWNSCALE_RATIO;
        let area = width * height;
        let defaults = DetectorSettings::default();

        info!(src_width, src_height, width, height, fps, "motion extractor ready");

        Ok(Self {
            src_width,
            src_height,
            fps,
            threshold: defaults.sensitivity,
            // The default settle time is exactly one second of frames.
            stable_cap: fps.ceil() as u32,
            erosion_level: defaults.erosion_level,
            downscaler: Downscaler::new(src_width, width, height),
            shrunk: vec![0; area * BYTES_PER_PIXEL],
            model: BackgroundModel::new(area),
            morph: MorphFilter::new(width, height),
            mask: Frame::zeroed(width, height, BYTES_PER_PIXEL),
            counter: benchmark.then(ThroughputCounter::new),
        })
    }

    /// Analyzes one frame and returns the motion mask.
    ///
    /// The mask is borrowed from the extractor and valid until the next
    /// call. Byte 0 of each mask pixel is the motion channel (255
    /// moving, 0 background); bytes 1 and 2 belong to the caller and
    /// are carried through untouched. The frame must match the
    /// dimensions the extractor was built for.
    pub fn generate_motion_mask(
        &mut self,
        frame: &impl PixelBuffer,
    ) -> Result<&Frame, FrameError> {
        if frame.width() != self.src_width
            || frame.height() != self.src_height
            || frame.depth() != BYTES_PER_PIXEL
        {
            return Err(FrameError::DimensionMismatch {
                width: self.src_width,
                height: self.src_height,
                depth: BYTES_PER_PIXEL,
                actual_width: frame.width(),
                actual_height: frame.height(),
                actual_depth: frame.depth(),
            });
        }

        if let Some(counter) = &mut self.counter {
            counter.tick();
        }

        self.downscaler.shrink(frame.data(), &mut self.shrunk);

        let primed = self.model.is_primed();
        self.model.update(
            &self.shrunk,
            self.threshold,
            self.stable_cap,
            self.mask.data_mut(),
        );

        // The first frame never reports motion, so there is nothing to
        // filter.
        if primed {
            self.morph.apply(self.mask.data_mut(), self.erosion_level);
        }

        Ok(&self.mask)
    }

    /// Discards all stability state; the next frame re-primes the model.
    pub fn reset(&mut self) {
        debug!("resetting motion state");
        self.model.reset();
    }

    /// Sets the per-channel difference threshold and resets.
    ///
    /// Valid range 1 to 127; an out-of-range value is rejected with no
    /// state change.
    pub fn set_sensitivity(&mut self, sensitivity: u8) -> Result<(), ConfigError> {
        check_sensitivity(sensitivity)?;
        self.threshold = sensitivity;
        self.reset();
        Ok(())
    }

    /// The per-channel difference threshold.
    #[inline]
    pub fn sensitivity(&self) -> u8 {
        self.threshold
    }

    /// Sets the settle time in seconds and resets.
    ///
    /// Valid range 1 to 60 seconds; an out-of-range value is rejected
    /// with no state change. Internally the time is converted to a
    /// whole-frame stability cap, rounding up.
    pub fn set_settle_time(&mut self, seconds: f64) -> Result<(), ConfigError> {
        check_settle_time(seconds)?;
        self.stable_cap = (seconds * self.fps).ceil() as u32;
        self.reset();
        Ok(())
    }

    /// The settle time in seconds, as derived from the frame cap.
    #[inline]
    pub fn settle_time(&self) -> f64 {
        f64::from(self.stable_cap) / self.fps
    }

    /// Sets the erosion level and resets.
    ///
    /// Valid range 0 to 8; zero disables the morphological filter. An
    /// out-of-range value is rejected with no state change.
    pub fn set_erosion(&mut self, level: u8) -> Result<(), ConfigError> {
        check_erosion(level)?;
        self.erosion_level = level;
        self.reset();
        Ok(())
    }

    /// The erosion level.
    #[inline]
    pub fn erosion(&self) -> u8 {
        self.erosion_level
    }

    /// The current tunables as a persistable record.
    pub fn settings(&self) -> DetectorSettings {
        DetectorSettings {
            sensitivity: self.threshold,
            settle_time: self.settle_time(),
            erosion_level: self.erosion_level,
        }
    }

    /// Applies a full settings record.
    ///
    /// The record is validated before anything is touched; a rejected
    /// record leaves the extractor unchanged. A successful load applies
    /// all three fields and resets once.
    pub fn apply_settings(&mut self, settings: &DetectorSettings) -> Result<(), ConfigError> {
        settings.validate()?;
        self.threshold = settings.sensitivity;
        self.stable_cap = (settings.settle_time * self.fps).ceil() as u32;
        self.erosion_level = settings.erosion_level;
        info!(
            sensitivity = settings.sensitivity,
            settle_time = settings.settle_time,
            erosion = settings.erosion_level,
            "detector settings applied"
        );
        self.reset();
        Ok(())
    }

    /// Masks generated during the last full wall-clock second.
    ///
    /// Always zero when the extractor was built without benchmarking.
    #[inline]
    pub fn detector_fps(&self) -> u32 {
        self.counter.as_ref().map_or(0, ThroughputCounter::rate)
    }

    /// Width of the masks this extractor produces.
    #[inline]
    pub fn mask_width(&self) -> usize {
        self.mask.width()
    }

    /// Height of the masks this extractor produces.
    #[inline]
    pub fn mask_height(&self) -> usize {
        self.mask.height()
    }
}

impl std::fmt::Debug for MotionExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotionExtractor")
            .field("src_width", &self.src_width)
            .field("src_height", &self.src_height)
            .field("fps", &self.fps)
            .field("threshold", &self.threshold)
            .field("stable_cap", &self.stable_cap)
            .field("erosion_level", &self.erosion_level)
            .finish()
    }
}
