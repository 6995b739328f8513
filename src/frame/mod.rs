//! Frame containers and the video-source seam.
//!
//! The extractor works on plain byte buffers; this module supplies the
//! owned and borrowed frame types it exchanges with its host plus the
//! trait a frame supplier implements.

mod buffer;
mod source;

pub use buffer::{Frame, FrameError, FrameView, PixelBuffer};
pub use source::{SourceError, SyntheticSource, TimedFrame, VideoSource};
