// Copyright 2025 Dustin McAfee
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

//! Pixels, colour modes and the RGB565 colour reduction.
//!
//! Every pixel is reduced to a [`QuantizedValue`] before run detection:
//!
//! ```text
//! RGB mode:   [RGB565 hi][RGB565 lo]          (2 bytes)
//! RGBA mode:  [alpha][RGB565 hi][RGB565 lo]   (3 bytes)
//! ```
//!
//! RGB565 keeps the top 5 bits of red, the top 6 bits of green and the top
//! 5 bits of blue, packed big-endian. Alpha is never reduced.

use crate::error::RleError;

/// A single 8-bit-per-channel pixel. Sources without alpha use `a = 255`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Pixel {
    /// Pixel from all four channels.
    #[inline]
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque pixel.
    #[inline]
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }
}

/// Grid-wide colour precision, chosen once per image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorMode {
    /// Every pixel is opaque; values are plain RGB565.
    Rgb,
    /// At least one pixel has alpha != 255; values are alpha + RGB565.
    Rgba,
}

impl ColorMode {
    /// Picks [`ColorMode::Rgba`] if any pixel is not fully opaque.
    #[must_use]
    pub fn detect(pixels: &[Pixel]) -> Self {
        if pixels.iter().any(|p| p.a != 255) {
            Self::Rgba
        } else {
            Self::Rgb
        }
    }

    /// Size of one [`QuantizedValue`] in this mode.
    #[inline]
    #[must_use]
    pub const fn bytes_per_value(self) -> usize {
        match self {
            Self::Rgb => 2,
            Self::Rgba => 3,
        }
    }

    /// Upper-case label, as shown next to an inspected image.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rgb => "RGB",
            Self::Rgba => "RGBA",
        }
    }

    /// Mode for a bytes-per-value count, `None` unless it is 2 or 3.
    #[must_use]
    pub const fn from_bytes_per_value(bpv: u8) -> Option<Self> {
        match bpv {
            2 => Some(Self::Rgb),
            3 => Some(Self::Rgba),
            _ => None,
        }
    }
}

impl std::fmt::Display for ColorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Reduces an RGB888 colour to packed RGB565.
#[inline]
#[must_use]
pub const fn rgb888_to_rgb565(r: u8, g: u8, b: u8) -> u16 {
    (((r as u16) & 0xF8) << 8) | (((g as u16) & 0xFC) << 3) | ((b as u16) >> 3)
}

/// Expands RGB565 back to RGB888, replicating the high bits into the low
/// bits so that full intensity maps to 255.
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation)] // each channel is masked to at most 8 bits
pub const fn rgb565_to_rgb888(value: u16) -> (u8, u8, u8) {
    let r5 = (value >> 11) & 0x1F;
    let g6 = (value >> 5) & 0x3F;
    let b5 = value & 0x1F;
    (
        ((r5 << 3) | (r5 >> 2)) as u8,
        ((g6 << 2) | (g6 >> 4)) as u8,
        ((b5 << 3) | (b5 >> 2)) as u8,
    )
}

/// The reduced per-pixel byte encoding used for comparison and storage.
///
/// Holds either 2 (RGB) or 3 (RGBA) significant bytes. Unused trailing bytes
/// are always zero, so derived equality is byte-for-byte equality.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuantizedValue {
    bytes: [u8; 3],
    len: u8,
}

impl QuantizedValue {
    /// Quantizes one pixel for the given mode.
    #[inline]
    #[must_use]
    pub const fn from_pixel(pixel: Pixel, mode: ColorMode) -> Self {
        let [hi, lo] = rgb888_to_rgb565(pixel.r, pixel.g, pixel.b).to_be_bytes();
        match mode {
            ColorMode::Rgb => Self { bytes: [hi, lo, 0], len: 2 },
            ColorMode::Rgba => Self { bytes: [pixel.a, hi, lo], len: 3 },
        }
    }

    /// Rebuilds a value from exactly 2 or 3 wire bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match *bytes {
            [hi, lo] => Some(Self { bytes: [hi, lo, 0], len: 2 }),
            [a, hi, lo] => Some(Self { bytes: [a, hi, lo], len: 3 }),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// The mode this value was produced in.
    #[inline]
    #[must_use]
    pub const fn mode(&self) -> ColorMode {
        if self.len == 3 {
            ColorMode::Rgba
        } else {
            ColorMode::Rgb
        }
    }

    /// The packed RGB565 part of the value.
    #[inline]
    #[must_use]
    pub const fn rgb565(&self) -> u16 {
        match self.len {
            3 => u16::from_be_bytes([self.bytes[1], self.bytes[2]]),
            _ => u16::from_be_bytes([self.bytes[0], self.bytes[1]]),
        }
    }

    /// Alpha byte, `255` for RGB values.
    #[inline]
    #[must_use]
    pub const fn alpha(&self) -> u8 {
        if self.len == 3 {
            self.bytes[0]
        } else {
            255
        }
    }

    /// Display colour for this value. Lossy: the dropped low bits are
    /// filled by bit replication.
    #[must_use]
    pub const fn to_pixel(&self) -> Pixel {
        let (r, g, b) = rgb565_to_rgb888(self.rgb565());
        Pixel::new(r, g, b, self.alpha())
    }
}

impl std::fmt::Debug for QuantizedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "QuantizedValue({:02x?})", self.as_bytes())
    }
}

/// Quantizes a row of pixels, one value per pixel in column order.
#[must_use]
pub fn quantize_row(pixels: &[Pixel], mode: ColorMode) -> Vec<QuantizedValue> {
    pixels
        .iter()
        .map(|&p| QuantizedValue::from_pixel(p, mode))
        .collect()
}

/// A fully materialized, row-major pixel grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: usize,
    height: usize,
    pixels: Vec<Pixel>,
}

impl PixelGrid {
    /// Builds a grid from a row-major RGBA buffer (4 bytes per pixel).
    ///
    /// # Errors
    ///
    /// Returns [`RleError::ShapeMismatch`] if `rgba.len() != width * height * 4`,
    /// including when that product does not fit in `usize`.
    pub fn new(width: usize, height: usize, rgba: &[u8]) -> Result<Self, RleError> {
        let expected = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(4));
        if expected != Some(rgba.len()) {
            return Err(RleError::ShapeMismatch {
                row: 0,
                expected: expected.unwrap_or(usize::MAX),
                actual: rgba.len(),
            });
        }
        let pixels = rgba
            .chunks_exact(4)
            .map(|c| Pixel::new(c[0], c[1], c[2], c[3]))
            .collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Builds a grid from individual rows. The first row fixes the width.
    ///
    /// # Errors
    ///
    /// Returns [`RleError::ShapeMismatch`] for the first row whose length
    /// differs from the first row's.
    pub fn from_rows<R: AsRef<[Pixel]>>(rows: &[R]) -> Result<Self, RleError> {
        let width = rows.first().map_or(0, |r| r.as_ref().len());
        let mut pixels = Vec::with_capacity(width.saturating_mul(rows.len()));
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != width {
                return Err(RleError::ShapeMismatch {
                    row: y,
                    expected: width,
                    actual: row.len(),
                });
            }
            pixels.extend_from_slice(row);
        }
        Ok(Self {
            width,
            height: rows.len(),
            pixels,
        })
    }

    /// Builds a grid from wide, unchecked channel values (RGBA order).
    ///
    /// Out-of-range channels are rejected, never clamped.
    ///
    /// # Errors
    ///
    /// Returns [`RleError::ShapeMismatch`] on a length mismatch and
    /// [`RleError::InvalidChannelValue`] for the first value outside `0..=255`.
    pub fn from_wide_channels(
        width: usize,
        height: usize,
        channels: &[i32],
    ) -> Result<Self, RleError> {
        let bytes = channels
            .iter()
            .enumerate()
            .map(|(index, &value)| {
                u8::try_from(value).map_err(|_| RleError::InvalidChannelValue { index, value })
            })
            .collect::<Result<Vec<u8>, _>>()?;
        Self::new(width, height, &bytes)
    }

    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[inline]
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Pixels of row `y`, or `None` past the last row.
    #[must_use]
    pub fn row(&self, y: usize) -> Option<&[Pixel]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.width;
        self.pixels.get(start..start + self.width)
    }

    /// Iterates rows top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Pixel]> + '_ {
        (0..self.height).filter_map(move |y| self.row(y))
    }

    #[inline]
    #[must_use]
    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    /// Colour mode for the whole grid.
    #[must_use]
    pub fn color_mode(&self) -> ColorMode {
        ColorMode::detect(&self.pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb565_extremes() {
        assert_eq!(rgb888_to_rgb565(255, 255, 255), 0xFFFF);
        assert_eq!(rgb888_to_rgb565(0, 0, 0), 0x0000);
    }

    #[test]
    fn test_rgb565_aligned_red_is_lossless() {
        let v = rgb888_to_rgb565(248, 0, 0);
        assert_eq!(v, 0xF800);
        assert_eq!(rgb565_to_rgb888(v).0 & 0xF8, 248);
    }

    #[test]
    fn test_rgb565_truncates_low_bits() {
        // 10 = 0b00001010 -> 1, 20 = 0b00010100 -> 5, 30 = 0b00011110 -> 3
        assert_eq!(rgb888_to_rgb565(10, 20, 30), (1 << 11) | (5 << 5) | 3);
        assert_eq!(rgb888_to_rgb565(7, 3, 7), 0);
    }

    #[test]
    fn test_quantized_value_layout() {
        let p = Pixel::new(255, 0, 0, 128);
        assert_eq!(QuantizedValue::from_pixel(p, ColorMode::Rgb).as_bytes(), &[0xF8, 0x00]);
        assert_eq!(
            QuantizedValue::from_pixel(p, ColorMode::Rgba).as_bytes(),
            &[128, 0xF8, 0x00]
        );
    }

    #[test]
    fn test_quantized_value_from_bytes() {
        let v = QuantizedValue::from_bytes(&[1, 2, 3]).unwrap();
        assert_eq!(v.mode(), ColorMode::Rgba);
        assert_eq!(v.alpha(), 1);
        assert_eq!(v.rgb565(), 0x0203);
        assert!(QuantizedValue::from_bytes(&[1]).is_none());
        assert!(QuantizedValue::from_bytes(&[1, 2, 3, 4]).is_none());
    }

    #[test]
    fn test_to_pixel_expands_full_intensity() {
        let v = QuantizedValue::from_pixel(Pixel::rgb(255, 255, 255), ColorMode::Rgb);
        assert_eq!(v.to_pixel(), Pixel::rgb(255, 255, 255));
        let v = QuantizedValue::from_pixel(Pixel::new(0, 0, 0, 7), ColorMode::Rgba);
        assert_eq!(v.to_pixel(), Pixel::new(0, 0, 0, 7));
    }

    #[test]
    fn test_mode_detection() {
        let opaque = [Pixel::rgb(1, 2, 3); 4];
        assert_eq!(ColorMode::detect(&opaque), ColorMode::Rgb);
        assert_eq!(ColorMode::Rgb.bytes_per_value(), 2);

        let mut mixed = opaque;
        mixed[2].a = 254;
        assert_eq!(ColorMode::detect(&mixed), ColorMode::Rgba);
        assert_eq!(ColorMode::Rgba.bytes_per_value(), 3);
    }

    #[test]
    fn test_grid_shape_checks() {
        assert!(PixelGrid::new(2, 2, &[0u8; 16]).is_ok());
        assert_eq!(
            PixelGrid::new(2, 2, &[0u8; 15]),
            Err(RleError::ShapeMismatch {
                row: 0,
                expected: 16,
                actual: 15
            })
        );

        let rows = vec![vec![Pixel::default(); 3], vec![Pixel::default(); 2]];
        assert_eq!(
            PixelGrid::from_rows(&rows),
            Err(RleError::ShapeMismatch {
                row: 1,
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn test_grid_dimensions_overflow() {
        assert_eq!(
            PixelGrid::new(usize::MAX / 2, 3, &[]),
            Err(RleError::ShapeMismatch {
                row: 0,
                expected: usize::MAX,
                actual: 0
            })
        );
        // width * height * 4 wraps to 0 without a checked multiply
        assert!(matches!(
            PixelGrid::new(1 << 62, 1, &[]),
            Err(RleError::ShapeMismatch { .. })
        ));
        assert!(PixelGrid::new(usize::MAX, 0, &[]).is_err());
    }

    #[test]
    fn test_mode_from_bytes_per_value() {
        assert_eq!(ColorMode::from_bytes_per_value(2), Some(ColorMode::Rgb));
        assert_eq!(ColorMode::from_bytes_per_value(3), Some(ColorMode::Rgba));
        assert_eq!(ColorMode::from_bytes_per_value(4), None);
    }

    #[test]
    fn test_wide_channels_are_rejected_not_clamped() {
        let mut channels = vec![255i32; 8];
        assert!(PixelGrid::from_wide_channels(2, 1, &channels).is_ok());
        channels[5] = 256;
        assert_eq!(
            PixelGrid::from_wide_channels(2, 1, &channels),
            Err(RleError::InvalidChannelValue {
                index: 5,
                value: 256
            })
        );
        channels[5] = -1;
        assert!(matches!(
            PixelGrid::from_wide_channels(2, 1, &channels),
            Err(RleError::InvalidChannelValue { value: -1, .. })
        ));
    }

    #[test]
    fn test_grid_rows() {
        let rgba: Vec<u8> = (0..24).collect();
        let grid = PixelGrid::new(3, 2, &rgba).unwrap();
        assert_eq!(grid.rows().count(), 2);
        assert_eq!(grid.row(1).unwrap()[0], Pixel::new(12, 13, 14, 15));
        assert!(grid.row(2).is_none());
        assert_eq!(grid.color_mode(), ColorMode::Rgba);
    }
}
