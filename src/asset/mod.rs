//! Face images from the SD card
//!
//! Only the minimal uncompressed BMP container is understood: a 14 byte file
//! header, a 40 byte info header and 1-bit or 24-bit rows padded to 4 bytes.
//! Images are decoded straight from the store on every call and converted to
//! black and white on the way in; nothing is kept between renders.

use std::io::{self, Read, Seek, SeekFrom};

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use thiserror::Error;

pub mod store;

pub use store::{AssetStore, DirStore, MemStore, ReadSeek};

const FILE_HEADER_LEN: usize = 14;
const INFO_HEADER_LEN: usize = 40;
const SIGNATURE: &[u8; 2] = b"BM";

/// Average channel value above which a 24-bit pixel is white
const LUMA_THRESHOLD: u16 = 128;

/// Refuse anything bigger than this many pixels
const MAX_PIXELS: u64 = 1 << 20;

/// Why a stored image could not be used
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Malformed {
    #[error("invalid BMP signature")]
    BadSignature,
    #[error("BMP must have exactly one plane, found {0}")]
    Planes(u16),
    #[error("unsupported bit depth {0}")]
    BitDepth(u16),
    #[error("BMP must be uncompressed (compression {0})")]
    Compressed(u32),
    #[error("invalid dimensions {width}x{height}")]
    Dimensions { width: i32, height: i32 },
    #[error("file ends before the pixel data does")]
    Truncated,
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset not found")]
    NotFound,
    #[error("malformed asset: {0}")]
    Malformed(#[from] Malformed),
    #[error("failed to read asset: {0}")]
    Io(io::Error),
}

impl From<io::Error> for AssetError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => AssetError::Malformed(Malformed::Truncated),
            _ => AssetError::Io(err),
        }
    }
}

/// Decoded black and white image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetImage {
    width: u32,
    height: u32,
    bit_depth: u16,
    top_down: bool,
    pixels: Vec<BinaryColor>,
}

impl AssetImage {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bit depth of the source file, 1 or 24
    pub fn bit_depth(&self) -> u16 {
        self.bit_depth
    }

    /// `true` when the file stored its rows top to bottom
    pub fn is_top_down(&self) -> bool {
        self.top_down
    }

    /// Color at `(x, y)` counted from the top left corner
    pub fn pixel(&self, x: u32, y: u32) -> Option<BinaryColor> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }
}

/// Blits the image with its top left corner at the origin
impl Drawable for AssetImage {
    type Color = BinaryColor;
    type Output = ();

    fn draw<D>(&self, target: &mut D) -> Result<Self::Output, D::Error>
    where
        D: DrawTarget<Color = Self::Color>,
    {
        let width = self.width as usize;
        let pixels = self.pixels.iter().enumerate().map(|(i, &color)| {
            let point = Point::new((i % width) as i32, (i / width) as i32);
            Pixel(point, color)
        });
        target.draw_iter(pixels)
    }
}

/// Look up `name` in `store` and decode it
pub fn try_load(store: &dyn AssetStore, name: &str) -> Result<AssetImage, AssetError> {
    let mut reader = store.open(name).ok_or(AssetError::NotFound)?;
    decode(&mut reader)
}

fn u16_at(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn u32_at(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

fn i32_at(bytes: &[u8], offset: usize) -> i32 {
    u32_at(bytes, offset) as i32
}

/// Decode a BMP from a random access reader
pub fn decode<R: Read + Seek + ?Sized>(reader: &mut R) -> Result<AssetImage, AssetError> {
    let mut file_header = [0u8; FILE_HEADER_LEN];
    reader.read_exact(&mut file_header)?;
    if &file_header[0..2] != SIGNATURE {
        return Err(Malformed::BadSignature.into());
    }
    let data_offset = u64::from(u32_at(&file_header, 10));

    let mut info = [0u8; INFO_HEADER_LEN];
    reader.read_exact(&mut info)?;
    let width = i32_at(&info, 4);
    let raw_height = i32_at(&info, 8);
    let planes = u16_at(&info, 12);
    let bit_depth = u16_at(&info, 14);
    let compression = u32_at(&info, 16);

    if planes != 1 {
        return Err(Malformed::Planes(planes).into());
    }
    if bit_depth != 1 && bit_depth != 24 {
        return Err(Malformed::BitDepth(bit_depth).into());
    }
    if compression != 0 {
        return Err(Malformed::Compressed(compression).into());
    }

    // Negative height means the rows are stored top-down
    let top_down = raw_height < 0;
    let height = raw_height.unsigned_abs();
    let pixel_count = u64::from(width.unsigned_abs()) * u64::from(height);
    if width <= 0 || height == 0 || pixel_count > MAX_PIXELS {
        return Err(Malformed::Dimensions {
            width,
            height: raw_height,
        }
        .into());
    }
    let width = width as u32;

    let row_bytes = (width as usize * bit_depth as usize).div_ceil(8);
    let stride = row_bytes.next_multiple_of(4) as u64;

    let mut row = vec![0u8; row_bytes];
    let mut pixels = Vec::with_capacity(pixel_count as usize);
    for y in 0..height {
        let row_index = if top_down { y } else { height - 1 - y };
        reader.seek(SeekFrom::Start(data_offset + u64::from(row_index) * stride))?;
        reader.read_exact(&mut row)?;

        match bit_depth {
            1 => pixels.extend((0..width as usize).map(|x| {
                if row[x / 8] & (0x80 >> (x % 8)) != 0 {
                    BinaryColor::Off
                } else {
                    BinaryColor::On
                }
            })),
            _ => pixels.extend(row.chunks_exact(3).map(|bgr| {
                let sum: u16 = bgr.iter().map(|&c| u16::from(c)).sum();
                if sum / 3 > LUMA_THRESHOLD {
                    BinaryColor::Off
                } else {
                    BinaryColor::On
                }
            })),
        }
    }

    Ok(AssetImage {
        width,
        height,
        bit_depth,
        top_down,
        pixels,
    })
}
