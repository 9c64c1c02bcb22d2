// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Windows BMP decoding for the headless library
//!
//! Supports uncompressed 1/4/8-bit paletted and 24/32-bit true color images
//! with a `BITMAPINFOHEADER` (or a later, larger header).
//!
//! ```text
//! 0x00  "BM"
//! 0x0A  u32 pixel data offset
//! 0x0E  u32 info header size (>= 40)
//! 0x12  i32 width
//! 0x16  i32 height (negative = top-down)
//! 0x1C  u16 bits per pixel
//! 0x1E  u32 compression (0 = BI_RGB, 3 = BI_BITFIELDS)
//! 0x2E  u32 palette size (0 = 1 << bpp)
//! ```

use crate::core::geometry::Color;
use std::path::Path;
use thiserror::Error;

const FILE_HEADER_SIZE: usize = 14;
const INFO_HEADER_SIZE: usize = 40;
const BI_RGB: u32 = 0;
const BI_BITFIELDS: u32 = 3;

/// BMP decoding errors
#[derive(Debug, Error)]
pub enum BmpError {
    #[error("Couldn't open {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("File is not a Windows BMP file")]
    NotBmp,

    #[error("Unsupported BMP: {0}")]
    Unsupported(String),

    #[error("Truncated BMP data")]
    Truncated,
}

/// Decoded image, rows top to bottom
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    pub width: i32,
    pub height: i32,
    pub pixels: Vec<Color>,
}

/// Read and decode a BMP file
pub fn load(path: &Path) -> Result<Bitmap, BmpError> {
    let data = std::fs::read(path).map_err(|source| BmpError::Io {
        path: path.display().to_string(),
        source,
    })?;
    decode(&data)
}

#[inline]
fn read_u16(data: &[u8], offset: usize) -> Result<u16, BmpError> {
    data.get(offset..offset + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or(BmpError::Truncated)
}

#[inline]
fn read_u32(data: &[u8], offset: usize) -> Result<u32, BmpError> {
    data.get(offset..offset + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(BmpError::Truncated)
}

/// Decode BMP bytes
pub fn decode(data: &[u8]) -> Result<Bitmap, BmpError> {
    if data.len() < FILE_HEADER_SIZE || &data[0..2] != b"BM" {
        return Err(BmpError::NotBmp);
    }

    let pixel_offset = read_u32(data, 0x0A)? as usize;
    let header_size = read_u32(data, 0x0E)? as usize;
    if header_size < INFO_HEADER_SIZE {
        return Err(BmpError::Unsupported(format!(
            "info header size {}",
            header_size
        )));
    }

    let width = read_u32(data, 0x12)? as i32;
    let raw_height = read_u32(data, 0x16)? as i32;
    let bpp = read_u16(data, 0x1C)?;
    let compression = read_u32(data, 0x1E)?;
    let palette_len = read_u32(data, 0x2E)? as usize;

    if width <= 0 || raw_height == 0 || raw_height == i32::MIN {
        return Err(BmpError::Unsupported(format!(
            "dimensions {}x{}",
            width, raw_height
        )));
    }
    match (compression, bpp) {
        (BI_RGB, 1 | 4 | 8 | 24 | 32) | (BI_BITFIELDS, 32) => {}
        _ => {
            return Err(BmpError::Unsupported(format!(
                "compression {} at {} bpp",
                compression, bpp
            )))
        }
    }

    let top_down = raw_height < 0;
    let height = raw_height.unsigned_abs() as i32;

    // Every row must be present before anything is allocated
    let stride = (width as usize)
        .checked_mul(bpp as usize)
        .and_then(|bits| bits.checked_add(31))
        .map(|bits| bits / 32 * 4)
        .ok_or(BmpError::Truncated)?;
    let end = stride
        .checked_mul(height as usize)
        .and_then(|size| size.checked_add(pixel_offset))
        .ok_or(BmpError::Truncated)?;
    if end > data.len() {
        return Err(BmpError::Truncated);
    }

    // Palette entries are BGRX quads right after the info header
    let palette = if bpp <= 8 {
        let max = 1usize << bpp;
        let count = match palette_len {
            0 => max,
            n if n <= max => n,
            n => return Err(BmpError::Unsupported(format!("palette size {}", n))),
        };
        let start = FILE_HEADER_SIZE + header_size;
        let mut palette = Vec::with_capacity(count);
        for i in 0..count {
            let quad = data
                .get(start + i * 4..start + i * 4 + 4)
                .ok_or(BmpError::Truncated)?;
            palette.push(Color::rgb(quad[2], quad[1], quad[0]));
        }
        palette
    } else {
        Vec::new()
    };

    let mut pixels = vec![Color::default(); width as usize * height as usize];

    for row in 0..height as usize {
        let src_row = if top_down { row } else { height as usize - 1 - row };
        let start = pixel_offset + src_row * stride;
        let line = data.get(start..start + stride).ok_or(BmpError::Truncated)?;

        for x in 0..width as usize {
            let color = match bpp {
                32 => Color::rgba(line[x * 4 + 2], line[x * 4 + 1], line[x * 4], line[x * 4 + 3]),
                24 => Color::rgb(line[x * 3 + 2], line[x * 3 + 1], line[x * 3]),
                _ => {
                    let bit = x * bpp as usize;
                    let byte = line[bit / 8];
                    let shift = 8 - bpp as usize - (bit % 8);
                    let index = (byte >> shift) & ((1u16 << bpp) - 1) as u8;
                    palette
                        .get(index as usize)
                        .copied()
                        .ok_or_else(|| BmpError::Unsupported(format!("palette index {}", index)))?
                }
            };
            pixels[row * width as usize + x] = color;
        }
    }

    Ok(Bitmap {
        width,
        height,
        pixels,
    })
}

/// Encode a 32-bit bottom-up BMP
#[cfg(test)]
pub(crate) fn encode(width: i32, height: i32, pixels: &[Color]) -> Vec<u8> {
    let image_size = (width * height * 4) as u32;
    let offset = (FILE_HEADER_SIZE + INFO_HEADER_SIZE) as u32;
    let mut out = Vec::with_capacity(offset as usize + image_size as usize);

    out.extend_from_slice(b"BM");
    out.extend_from_slice(&(offset + image_size).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&offset.to_le_bytes());

    out.extend_from_slice(&(INFO_HEADER_SIZE as u32).to_le_bytes());
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&32u16.to_le_bytes());
    out.extend_from_slice(&BI_RGB.to_le_bytes());
    out.extend_from_slice(&image_size.to_le_bytes());
    out.extend_from_slice(&[0u8; 16]);

    for row in (0..height).rev() {
        for x in 0..width {
            let c = pixels[(row * width + x) as usize];
            out.extend_from_slice(&[c.b, c.g, c.r, c.a]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_32bit_roundtrip_orientation() {
        let pixels = vec![Color::RED, Color::GREEN, Color::BLUE, Color::WHITE];
        let data = encode(2, 2, &pixels);
        let bitmap = decode(&data).unwrap();
        assert_eq!(bitmap.width, 2);
        assert_eq!(bitmap.height, 2);
        assert_eq!(bitmap.pixels, pixels);
    }

    #[test]
    fn test_decode_8bit_paletted() {
        // 3x1 image, palette of two colors, indices 1 0 1
        let mut data = Vec::new();
        let offset = (FILE_HEADER_SIZE + INFO_HEADER_SIZE + 8) as u32;
        data.extend_from_slice(b"BM");
        data.extend_from_slice(&(offset + 4).to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&offset.to_le_bytes());
        data.extend_from_slice(&40u32.to_le_bytes());
        data.extend_from_slice(&3i32.to_le_bytes());
        data.extend_from_slice(&1i32.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&8u16.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&4u32.to_le_bytes());
        data.extend_from_slice(&[0u8; 8]);
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        // palette: black, blue (BGRX)
        data.extend_from_slice(&[0, 0, 0, 0, 0xFF, 0, 0, 0]);
        data.extend_from_slice(&[1, 0, 1, 0]);

        let bitmap = decode(&data).unwrap();
        assert_eq!(bitmap.pixels, vec![Color::BLUE, Color::BLACK, Color::BLUE]);
    }

    #[test]
    fn test_reject_non_bmp() {
        assert!(matches!(decode(b"PNG............"), Err(BmpError::NotBmp)));
    }

    /// A bare 54-byte file declaring the given geometry and no pixel data
    fn header_only(width: i32, height: i32, bpp: u16, palette_len: u32) -> Vec<u8> {
        let offset = (FILE_HEADER_SIZE + INFO_HEADER_SIZE) as u32;
        let mut data = Vec::new();
        data.extend_from_slice(b"BM");
        data.extend_from_slice(&offset.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&offset.to_le_bytes());
        data.extend_from_slice(&40u32.to_le_bytes());
        data.extend_from_slice(&width.to_le_bytes());
        data.extend_from_slice(&height.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&bpp.to_le_bytes());
        data.extend_from_slice(&BI_RGB.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&[0u8; 8]);
        data.extend_from_slice(&palette_len.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data
    }

    #[test]
    fn test_reject_huge_dimensions_without_data() {
        let data = header_only(i32::MAX, i32::MAX, 32, 0);
        assert_eq!(data.len(), 54);
        assert!(matches!(decode(&data), Err(BmpError::Truncated)));
    }

    #[test]
    fn test_reject_min_height() {
        let data = header_only(1, i32::MIN, 32, 0);
        assert!(matches!(decode(&data), Err(BmpError::Unsupported(_))));
    }

    #[test]
    fn test_reject_oversized_palette() {
        let mut data = header_only(1, 1, 8, u32::MAX);
        data.extend_from_slice(&[0u8; 4]);
        assert!(matches!(decode(&data), Err(BmpError::Unsupported(_))));
    }

    #[test]
    fn test_reject_truncated() {
        let data = encode(4, 4, &[Color::RED; 16]);
        assert!(matches!(decode(&data[..data.len() - 10]), Err(BmpError::Truncated)));
    }
}
