//! Native frame → packed RGBA8888 conversion.
//!
//! The pixel-format conversion itself is delegated to FFmpeg's scaler; this
//! module is responsible for the geometry on top of it: applying the centered
//! crop window and stripping the scaler's row stride padding while copying
//! into the caller's reusable output buffer.

use ac_ffmpeg::codec::video::VideoFrame;
use ac_ffmpeg::codec::video::frame::{PixelFormat, get_pixel_format};
use ac_ffmpeg::codec::video::scaler::{Algorithm, VideoFrameScaler};

use crate::config::CropMode;
use crate::error::VideoError;

const BYTES_PER_PIXEL: usize = 4;

/// Output window into the decoded frame.
///
/// Offsets are chosen so the window is centered; the window never exceeds
/// the native dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropGeometry {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl CropGeometry {
    /// Full-frame window, no cropping.
    pub fn full(width: usize, height: usize) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    /// Centered window of `out_width` x `out_height`, clamped to the frame.
    pub fn centered(width: usize, height: usize, out_width: usize, out_height: usize) -> Self {
        let out_width = out_width.min(width);
        let out_height = out_height.min(height);
        Self {
            x: (width - out_width) / 2,
            y: (height - out_height) / 2,
            width: out_width,
            height: out_height,
        }
    }

    /// Resolve a [`CropMode`] against the native frame dimensions.
    pub fn from_mode(mode: CropMode, width: usize, height: usize) -> Self {
        match mode {
            CropMode::Full => Self::full(width, height),
            CropMode::CenterSquare => {
                let side = width.min(height);
                Self::centered(width, height, side, side)
            }
            CropMode::Center {
                width: out_w,
                height: out_h,
            } => Self::centered(width, height, out_w, out_h),
        }
    }

    pub fn is_full_frame(&self) -> bool {
        self.x == 0 && self.y == 0
    }

    /// Output buffer size in bytes.
    pub fn output_len(&self) -> usize {
        self.width * self.height * BYTES_PER_PIXEL
    }
}

/// Converts decoded frames to packed RGBA8888 at the configured crop window.
pub struct RgbaConverter {
    scaler: VideoFrameScaler,
    crop: CropGeometry,
}

// Safety: the scaler context is owned exclusively by this converter and the
// converter is only ever used by one thread at a time.
unsafe impl Send for RgbaConverter {}

impl RgbaConverter {
    /// Build a converter for a stream of `width` x `height` frames in
    /// `source_format`.
    pub fn new(
        source_format: PixelFormat,
        width: usize,
        height: usize,
        crop: CropGeometry,
    ) -> Result<Self, VideoError> {
        let scaler = VideoFrameScaler::builder()
            .source_pixel_format(source_format)
            .source_width(width)
            .source_height(height)
            .target_pixel_format(get_pixel_format("rgba"))
            .target_width(width)
            .target_height(height)
            .algorithm(Algorithm::FastBilinear)
            .build()
            .map_err(|err| VideoError::Convert(err.to_string()))?;

        Ok(Self { scaler, crop })
    }

    pub fn crop(&self) -> CropGeometry {
        self.crop
    }

    /// Convert `frame` and write the cropped RGBA output into `dst`.
    ///
    /// `dst` is resized to exactly `crop.width * crop.height * 4` bytes and
    /// its allocation is reused across calls.
    pub fn convert_into(&mut self, frame: &VideoFrame, dst: &mut Vec<u8>) -> Result<(), VideoError> {
        let rgba = self
            .scaler
            .scale(frame)
            .map_err(|err| VideoError::Convert(err.to_string()))?;

        let planes = rgba.planes();
        let plane = &planes[0];
        copy_window(dst, plane.data(), plane.line_size(), self.crop)?;

        Ok(())
    }
}

/// Copy the crop window out of a padded RGBA plane into a packed buffer.
///
/// Fast path: full-frame window with no stride padding is a single bulk
/// copy. Otherwise rows are copied one by one, applying the window offsets
/// and skipping the source stride padding. A source plane too small to
/// cover the window is an error, not a partial copy.
fn copy_window(
    dst: &mut Vec<u8>,
    src: &[u8],
    stride: usize,
    crop: CropGeometry,
) -> Result<(), VideoError> {
    let row_len = crop.width * BYTES_PER_PIXEL;
    dst.resize(crop.height * row_len, 0);

    if crop.height == 0 {
        return Ok(());
    }

    if crop.is_full_frame() && stride == row_len && src.len() >= dst.len() {
        dst.copy_from_slice(&src[..crop.height * row_len]);
        return Ok(());
    }

    let last_row_end = (crop.y + crop.height - 1) * stride + crop.x * BYTES_PER_PIXEL + row_len;
    if src.len() < last_row_end {
        return Err(VideoError::Convert(format!(
            "source plane of {} bytes cannot cover a {}x{} window at ({}, {})",
            src.len(),
            crop.width,
            crop.height,
            crop.x,
            crop.y
        )));
    }

    for row in 0..crop.height {
        let src_start = (row + crop.y) * stride + crop.x * BYTES_PER_PIXEL;
        let dst_start = row * row_len;
        dst[dst_start..dst_start + row_len].copy_from_slice(&src[src_start..src_start + row_len]);
    }
    Ok(())
}
