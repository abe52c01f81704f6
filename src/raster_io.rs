//! Block and windowed band reads.
//!
//! Two read entry points on [`Band`]: `read_block` reads the whole raster
//! (a block is defined as the entire raster for this source) and
//! `read_window` reads an arbitrary sub-window into a caller-described
//! buffer. A windowed read takes one of three paths, cheapest first:
//! straight fetch into the caller buffer, fetch plus one word-conversion
//! pass, or fetch plus nearest-neighbor resampling when the buffer and
//! window dimensions differ.

use crate::dataset::Band;
use crate::error::{Error, Result};
use crate::pixel::{copy_words, PixelType};

/// A rectangular pixel-space sub-region of the raster. Offsets are
/// zero-based from the top-left corner; sizes are element counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Leftmost pixel of the region
    pub x_off: usize,
    /// Topmost line of the region
    pub y_off: usize,
    /// Width of the region in pixels
    pub x_size: usize,
    /// Height of the region in lines
    pub y_size: usize,
}

impl Window {
    /// A window at `(x_off, y_off)` spanning `x_size` by `y_size` pixels.
    pub fn new(x_off: usize, y_off: usize, x_size: usize, y_size: usize) -> Window {
        Window {
            x_off,
            y_off,
            x_size,
            y_size,
        }
    }
}

/// A caller-owned destination buffer for a windowed read, organized left to
/// right, top to bottom.
#[derive(Debug)]
pub struct WindowBuffer<'a> {
    /// Buffer width in pixels
    pub width: usize,
    /// Buffer height in lines
    pub height: usize,
    /// Pixel type of the buffer words
    pub pixel_type: PixelType,
    /// Byte offset between adjacent pixels of one line
    pub pixel_space: usize,
    /// Byte offset between the starts of adjacent lines
    pub line_space: usize,
    /// The destination bytes
    pub data: &'a mut [u8],
}

impl<'a> WindowBuffer<'a> {
    /// A tightly-packed buffer with the natural strides for its pixel type.
    pub fn packed(
        width: usize,
        height: usize,
        pixel_type: PixelType,
        data: &'a mut [u8],
    ) -> WindowBuffer<'a> {
        let pixel_space = pixel_type.size_bytes();
        WindowBuffer {
            width,
            height,
            pixel_type,
            pixel_space,
            line_space: pixel_space * width,
            data,
        }
    }
}

/// Half-pixel-offset nearest-neighbor rule: the source pixel whose center
/// falls nearest the destination pixel's center.
pub(crate) fn nearest_source_index(dst: usize, src_size: usize, buf_size: usize) -> usize {
    ((dst as f64 + 0.5) * (src_size as f64 / buf_size as f64)) as usize
}

impl<'a> Band<'a> {
    /// Read the whole raster for this band. A block is the entire raster,
    /// so both block offsets must be zero; `out` must hold exactly
    /// `width * height` pixels of the band's type.
    pub fn read_block(&self, x_block: usize, y_block: usize, out: &mut [u8]) -> Result<()> {
        if x_block != 0 || y_block != 0 {
            return Err(Error::Internal {
                message: "Got a non-zero block offset!".to_string(),
            });
        }

        let (width, height) = self.block_size();
        let expected = width * height * self.pixel_type().size_bytes();
        if out.len() != expected {
            return Err(Error::Range {
                message: format!(
                    "The block buffer holds {} bytes; this band's block needs {}.",
                    out.len(),
                    expected
                ),
            });
        }

        self.dataset()
            .fetch_raster(Window::new(0, 0, width, height), self.number(), out)
    }

    /// Read a sub-window of this band into `buf`, converting pixel type and
    /// resampling as needed.
    pub fn read_window(&self, window: Window, buf: &mut WindowBuffer<'_>) -> Result<()> {
        let dataset = self.dataset();
        let band_type = self.pixel_type();
        let band_data_size = band_type.size_bytes();
        let buf_data_size = buf.pixel_type.size_bytes();

        // The protocol never delivers pixel- or line-interleaved rasters,
        // so only the natural tightly-packed strides are supported.
        if buf.pixel_space != buf_data_size || buf.line_space != buf.pixel_space * buf.width {
            return Err(Error::UnsupportedType {
                message: format!(
                    "Pixel spacing {} and line spacing {} are invalid for this data source; \
                     only the natural packed strides for a {} buffer of width {} are supported.",
                    buf.pixel_space,
                    buf.line_space,
                    buf.pixel_type.name(),
                    buf.width
                ),
            });
        }

        if window.x_size == 0 || window.y_size == 0 || buf.width == 0 || buf.height == 0 {
            return Err(Error::Range {
                message: format!(
                    "A zero-sized window or buffer was requested for '{}'.",
                    dataset.variable()
                ),
            });
        }

        if buf.data.len() != buf.width * buf.height * buf_data_size {
            return Err(Error::Range {
                message: format!(
                    "The window buffer holds {} bytes; {}x{} {} pixels need {}.",
                    buf.data.len(),
                    buf.width,
                    buf.height,
                    buf.pixel_type.name(),
                    buf.width * buf.height * buf_data_size
                ),
            });
        }

        if window.x_off + window.x_size > dataset.width()
            || window.y_off + window.y_size > dataset.height()
        {
            return Err(Error::Range {
                message: "The values given for either the X or Y size and/or offset exceed the raster size."
                    .to_string(),
            });
        }

        // Same type, same dimensions: read straight into the caller buffer.
        if band_type == buf.pixel_type && window.x_size == buf.width && window.y_size == buf.height
        {
            return dataset.fetch_raster(window, self.number(), buf.data);
        }

        // Same dimensions, different type: one fetch, one conversion pass.
        let source_bytes = window.x_size * window.y_size * band_data_size;
        if window.x_size == buf.width && window.y_size == buf.height {
            let mut scratch = vec![0u8; source_bytes];
            dataset.fetch_raster(window, self.number(), &mut scratch)?;
            return copy_words(
                &scratch,
                band_type,
                buf.data,
                buf.pixel_type,
                buf.width * buf.height,
            );
        }

        // Different dimensions: fetch the full source window, then sample
        // the nearest source pixel for every destination pixel.
        let mut scratch = vec![0u8; source_bytes];
        dataset.fetch_raster(window, self.number(), &mut scratch)?;

        for buf_y in 0..buf.height {
            let src_y = nearest_source_index(buf_y, window.y_size, buf.height);
            let mut buf_offset = buf_y * buf.line_space;

            for buf_x in 0..buf.width {
                let src_x = nearest_source_index(buf_x, window.x_size, buf.width);
                let src_offset = (src_x + src_y * window.x_size) * band_data_size;

                if band_type == buf.pixel_type {
                    buf.data[buf_offset..buf_offset + band_data_size]
                        .copy_from_slice(&scratch[src_offset..src_offset + band_data_size]);
                } else {
                    copy_words(
                        &scratch[src_offset..src_offset + band_data_size],
                        band_type,
                        &mut buf.data[buf_offset..buf_offset + buf_data_size],
                        buf.pixel_type,
                        1,
                    )?;
                }

                buf_offset += buf.pixel_space;
            }
        }

        Ok(())
    }
}
