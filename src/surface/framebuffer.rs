//! In-memory 1-bit frame buffer
//!
//! Pixels are packed MSB first, `ceil(width / 8)` bytes per row, and a set bit
//! means white. This is the layout the 2.13" panel controller expects, so the
//! device can push [`FrameBuffer::buffer`] to the display unchanged.

use core::convert::Infallible;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;

use super::PixelSurface;

/// Single page frame buffer. Everything drawn is visible right after
/// [`PixelSurface::commit_page`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    bytes_per_row: usize,
    buffer: Vec<u8>,
}

impl FrameBuffer {
    /// Create a white frame buffer
    pub fn new(width: u32, height: u32) -> Self {
        let bytes_per_row = width.div_ceil(8) as usize;
        Self {
            width,
            height,
            bytes_per_row,
            buffer: vec![0xFF; bytes_per_row * height as usize],
        }
    }

    /// Raw packed pixels, bit set = white
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Color at `(x, y)`, `None` outside the buffer
    pub fn pixel(&self, x: u32, y: u32) -> Option<BinaryColor> {
        let (index, mask) = self.locate(x, y)?;
        if self.buffer[index] & mask != 0 {
            Some(BinaryColor::Off)
        } else {
            Some(BinaryColor::On)
        }
    }

    /// Number of black pixels
    pub fn ink(&self) -> usize {
        (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| (x, y)))
            .filter(|&(x, y)| self.pixel(x, y) == Some(BinaryColor::On))
            .count()
    }

    fn locate(&self, x: u32, y: u32) -> Option<(usize, u8)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = y as usize * self.bytes_per_row + (x / 8) as usize;
        Some((index, 0x80 >> (x % 8)))
    }

    fn set(&mut self, x: u32, y: u32, color: BinaryColor) {
        if let Some((index, mask)) = self.locate(x, y) {
            match color {
                BinaryColor::On => self.buffer[index] &= !mask,
                BinaryColor::Off => self.buffer[index] |= mask,
            }
        }
    }

    /// Render the buffer as text, `#` for black and `.` for white
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity(((self.width + 1) * self.height) as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                out.push(match self.pixel(x, y) {
                    Some(BinaryColor::On) => '#',
                    _ => '.',
                });
            }
            out.push('\n');
        }
        out
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            // Out of range points are clipped silently
            if let (Ok(x), Ok(y)) = (u32::try_from(point.x), u32::try_from(point.y)) {
                self.set(x, y, color);
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        let fill = match color {
            BinaryColor::On => 0x00,
            BinaryColor::Off => 0xFF,
        };
        self.buffer.fill(fill);
        Ok(())
    }
}

impl PixelSurface for FrameBuffer {
    fn commit_page(&mut self) -> bool {
        false
    }
}
