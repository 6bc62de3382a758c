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

//! Line-oriented run-length encoding for RGB565 / alpha+RGB565 pixel rows.
//!
//! Each image row is reduced to 16-bit colour (plus an 8-bit alpha byte
//! when any pixel is translucent) and split into alternating *Same* and
//! *Diff* runs. Every run is kept as a [`Segment`] carrying its kind,
//! length, prefix byte, payload and starting column, so that it can be
//! located, rendered or re-serialised without re-encoding the row.
//!
//! # Encoding Process
//!
//! 1. The colour mode is chosen once for the whole image
//!    ([`ColorMode::detect`]).
//! 2. Each row is quantized ([`quantize_row`]).
//! 3. Each row is segmented ([`segment_row`]); runs longer than
//!    [`MAX_RUN_LENGTH`] are split.
//!
//! Rows are independent. With the `parallel` feature they are encoded on
//! the rayon thread pool.
//!
//! # Example
//!
//! ```
//! use line_rle::{encode_image, Pixel, PixelGrid, SegmentKind};
//!
//! let row = vec![Pixel::rgb(255, 0, 0); 200];
//! let grid = PixelGrid::from_rows(&[row]).unwrap();
//! let image = encode_image(&grid);
//!
//! let lengths: Vec<u8> = image.row(0).unwrap().segments().iter().map(|s| s.length()).collect();
//! assert_eq!(lengths, [127, 73]);
//! assert_eq!(image.segment_at(150, 0).unwrap().kind(), SegmentKind::Same);
//! ```

use bytes::{BufMut, Bytes, BytesMut};

pub mod codec;
pub mod error;
pub mod image;
pub mod pixel;
pub mod segment;

pub use codec::{decode_row, encode_row, segment_row};
pub use error::RleError;
pub use image::{encode_image, ByteSpan, EncodedImage, Row, SegmentIndex};
pub use pixel::{
    quantize_row, rgb565_to_rgb888, rgb888_to_rgb565, ColorMode, Pixel, PixelGrid,
    QuantizedValue,
};
pub use segment::{Segment, SegmentKind};

/// Longest run a single segment can describe (the low 7 bits of the prefix).
pub const MAX_RUN_LENGTH: u8 = 0x7F;

/// Prefix bit marking a Same run.
pub const SAME_RUN_FLAG: u8 = 0x80;

/// Trait implemented by pixel-buffer encoders.
pub trait Encoding {
    /// Encodes a row-major RGBA buffer of `width` x `height` pixels.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer does not match the dimensions.
    fn encode(&self, data: &[u8], width: u16, height: u16) -> Result<BytesMut, RleError>;
}

/// Serialises an RGBA buffer with the line run-length format.
///
/// Output is the colour mode byte (`2` for RGB, `3` for RGBA, i.e. the bytes
/// per value) followed by [`EncodedImage::to_bytes`]. [`LineRleEncoding::decode`]
/// reads it back.
pub struct LineRleEncoding;

impl LineRleEncoding {
    /// Parses the output of [`Encoding::encode`] for a `width` x `height`
    /// image. Byte offsets in errors count from the first row, after the
    /// mode byte.
    ///
    /// # Errors
    ///
    /// Returns [`RleError::Truncated`] for empty input,
    /// [`RleError::InvalidModeByte`] if the first byte is not `2` or `3`,
    /// and otherwise any error of [`EncodedImage::from_bytes`].
    pub fn decode(&self, data: Bytes, width: u16, height: u16) -> Result<EncodedImage, RleError> {
        let Some(&bpv) = data.first() else {
            return Err(RleError::Truncated { offset: 0 });
        };
        let mode = ColorMode::from_bytes_per_value(bpv)
            .ok_or(RleError::InvalidModeByte { value: bpv })?;
        EncodedImage::from_bytes(data.slice(1..), width as usize, height as usize, mode)
    }
}

impl Encoding for LineRleEncoding {
    #[allow(clippy::cast_possible_truncation)] // bytes per value is 2 or 3
    fn encode(&self, data: &[u8], width: u16, height: u16) -> Result<BytesMut, RleError> {
        let grid = PixelGrid::new(width as usize, height as usize, data)?;
        let image = encode_image(&grid);
        let mut buf = BytesMut::with_capacity(1 + image.encoded_len());
        buf.put_u8(image.bytes_per_value() as u8);
        buf.put(image.to_bytes());
        Ok(buf)
    }
}
