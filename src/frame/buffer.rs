//! Pixel buffer types for video frames.
//!
//! A frame is a contiguous, row-major byte buffer with a width, height,
//! and byte depth and no row padding. Two variants exist: [`Frame`] owns
//! its pixels, [`FrameView`] borrows pixels that belong to an outside
//! decoder or test fixture.

use thiserror::Error;

/// Errors arising from frame construction and copying.
#[derive(Debug, Clone, Error)]
pub enum FrameError {
    /// Two frames disagree on width, height, or depth.
    #[error(
        "frame is {actual_width}x{actual_height}x{actual_depth}, \
         expected {width}x{height}x{depth}"
    )]
    DimensionMismatch {
        /// Expected width in pixels.
        width: usize,
        /// Expected height in pixels.
        height: usize,
        /// Expected bytes per pixel.
        depth: usize,
        /// Offered width in pixels.
        actual_width: usize,
        /// Offered height in pixels.
        actual_height: usize,
        /// Offered bytes per pixel.
        actual_depth: usize,
    },
    /// A pixel buffer does not hold `width * height * depth` bytes.
    #[error("pixel buffer holds {actual} bytes, dimensions require {expected}")]
    BufferLength {
        /// Bytes the dimensions call for.
        expected: usize,
        /// Bytes actually supplied.
        actual: usize,
    },
}

/// Read access shared by owned frames and borrowed views.
pub trait PixelBuffer {
    /// Frame width in pixels.
    fn width(&self) -> usize;

    /// Frame height in pixels.
    fn height(&self) -> usize;

    /// Bytes per pixel.
    fn depth(&self) -> usize;

    /// The raw pixel bytes, row-major with no padding.
    fn data(&self) -> &[u8];

    /// Total buffer size in bytes.
    fn total_size(&self) -> usize {
        self.width() * self.height() * self.depth()
    }

    /// The bytes of the pixel at `(x, y)`.
    ///
    /// Coordinates are not range-checked against the frame; an
    /// out-of-frame coordinate panics or addresses the wrong pixel.
    #[inline]
    fn pixel(&self, x: usize, y: usize) -> &[u8] {
        let depth = self.depth();
        let start = (y * self.width() + x) * depth;
        &self.data()[start..start + depth]
    }
}

/// A video frame that owns its pixel storage.
#[derive(Clone)]
pub struct Frame {
    pixels: Vec<u8>,
    width: usize,
    height: usize,
    depth: usize,
}

impl Frame {
    /// Creates a zero-filled frame.
    pub fn zeroed(width: usize, height: usize, depth: usize) -> Self {
        Self::filled(width, height, depth, 0)
    }

    /// Creates a frame with every byte set to `value`.
    pub fn filled(width: usize, height: usize, depth: usize, value: u8) -> Self {
        Self {
            pixels: vec![value; width * height * depth],
            width,
            height,
            depth,
        }
    }

    /// Creates a frame by copying existing pixel data.
    ///
    /// The slice length must match the given dimensions exactly.
    pub fn from_pixels(
        pixels: &[u8],
        width: usize,
        height: usize,
        depth: usize,
    ) -> Result<Self, FrameError> {
        let expected = width * height * depth;
        if pixels.len() != expected {
            return Err(FrameError::BufferLength {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            pixels: pixels.to_vec(),
            width,
            height,
            depth,
        })
    }

    /// Overwrites every byte of the frame with `value`.
    pub fn wipe(&mut self, value: u8) {
        self.pixels.fill(value);
    }

    /// Mutable access to the raw pixel bytes.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Mutable access to the pixel at `(x, y)`.
    ///
    /// Coordinates are not range-checked; see [`PixelBuffer::pixel`].
    #[inline]
    pub fn pixel_mut(&mut self, x: usize, y: usize) -> &mut [u8] {
        let start = (y * self.width + x) * self.depth;
        &mut self.pixels[start..start + self.depth]
    }

    /// Copies another buffer's pixels into this frame.
    ///
    /// Both frames must agree on width, height, and depth.
    pub fn copy_from(&mut self, other: &impl PixelBuffer) -> Result<(), FrameError> {
        if other.width() != self.width
            || other.height() != self.height
            || other.depth() != self.depth
        {
            return Err(FrameError::DimensionMismatch {
                width: self.width,
                height: self.height,
                depth: self.depth,
                actual_width: other.width(),
                actual_height: other.height(),
                actual_depth: other.depth(),
            });
        }
        self.pixels.copy_from_slice(other.data());
        Ok(())
    }
}

impl PixelBuffer for Frame {
    #[inline]
    fn width(&self) -> usize {
        self.width
    }

    #[inline]
    fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    fn data(&self) -> &[u8] {
        &self.pixels
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("depth", &self.depth)
            .field("pixel_bytes", &self.pixels.len())
            .finish()
    }
}

/// A frame over pixels owned elsewhere.
///
/// Useful for wrapping a decoder's buffer without a copy. The view is
/// read-only; call [`FrameView::to_frame`] to get an owned copy.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pixels: &'a [u8],
    width: usize,
    height: usize,
    depth: usize,
}

impl<'a> FrameView<'a> {
    /// Creates a view over external pixel data.
    ///
    /// The slice length must match the given dimensions exactly.
    pub fn new(
        pixels: &'a [u8],
        width: usize,
        height: usize,
        depth: usize,
    ) -> Result<Self, FrameError> {
        let expected = width * height * depth;
        if pixels.len() != expected {
            return Err(FrameError::BufferLength {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            pixels,
            width,
            height,
            depth,
        })
    }

    /// Copies the viewed pixels into an owned [`Frame`].
    pub fn to_frame(&self) -> Frame {
        Frame {
            pixels: self.pixels.to_vec(),
            width: self.width,
            height: self.height,
            depth: self.depth,
        }
    }
}

impl PixelBuffer for FrameView<'_> {
    #[inline]
    fn width(&self) -> usize {
        self.width
    }

    #[inline]
    fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    fn data(&self) -> &[u8] {
        self.pixels
    }
}
