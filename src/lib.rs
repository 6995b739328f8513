//! Streaming motion extraction from RGB video.
//!
//! Given equally sized RGB frames in presentation order, the extractor
//! produces for each frame a binary mask marking regions judged to
//! contain moving foreground. A self-adapting per-pixel background
//! model lets objects that stop moving settle into the background over
//! a configurable time, while settled regions that start moving are
//! re-detected.
//!
//! # Architecture
//!
//! ```text
//! input frame -> downscale -> per-pixel update -> reference promotion
//!             -> mask -> morphology -> output mask
//! ```
//!
//! # Design principles
//!
//! - **One extractor per stream**: all state is owned by a single
//!   instance; nothing is shared or locked.
//! - **Allocate once**: every per-pixel buffer is sized at
//!   construction and reused for the life of the extractor.
//! - **Infallible inner loops**: validation happens at the surface;
//!   the per-pixel passes cannot fail.
//!
//! # Example
//!
//! ```no_run
//! use motion_mask::{MotionExtractor, PixelBuffer, SyntheticSource, VideoSource};
//!
//! let mut source = SyntheticSource::new(96, 72, 30.0);
//! let mut extractor = MotionExtractor::new(96, 72, 30.0, false).unwrap();
//!
//! while let Some(timed) = source.next_frame().unwrap() {
//!     let mask = extractor.generate_motion_mask(&timed.frame).unwrap();
//!     let moving = mask.data().iter().step_by(3).filter(|&&b| b > 0).count();
//!     println!("pts {}: {} moving pixels", timed.pts, moving);
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod config;
pub mod extractor;
pub mod frame;

// Re-export commonly used types at crate root
pub use config::{ConfigError, DetectorSettings};
pub use extractor::{ExtractorError, MotionExtractor, BYTES_PER_PIXEL, DOWNSCALE_RATIO};
pub use frame::{
    Frame, FrameError, FrameView, PixelBuffer, SourceError, SyntheticSource, TimedFrame,
    VideoSource,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
