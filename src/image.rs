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

//! Whole-image encoding and the position-addressable segment index.
//!
//! An [`EncodedImage`] is one [`Row`] per image row, in row order. The row
//! number is the row's identity. Serialised, an image is its rows back to
//! back, each row its segments back to back, with no header: the reader
//! must already know width, height and colour mode.

use bytes::{Buf, Bytes, BytesMut};

use crate::codec::{decode_row, segment_row};
use crate::error::RleError;
use crate::pixel::{quantize_row, ColorMode, PixelGrid, QuantizedValue};
use crate::segment::{Segment, SegmentKind};

/// The segment list of one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    width: usize,
    segments: Vec<Segment>,
}

impl Row {
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Row width in pixels.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// The segment covering pixel column `x`.
    #[must_use]
    pub fn segment_at(&self, x: usize) -> Option<&Segment> {
        let idx = self.segments.partition_point(|s| s.end_index() <= x);
        self.segments.get(idx).filter(|s| s.covers(x))
    }

    /// Bytes this row occupies on the wire.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        self.segments.iter().map(Segment::encoded_len).sum()
    }

    /// The row's quantized values, reconstructed from its segments.
    #[must_use]
    pub fn values(&self) -> Vec<QuantizedValue> {
        decode_row(&self.segments)
    }

    fn write_to(&self, buf: &mut BytesMut) {
        for segment in &self.segments {
            segment.write_to(buf);
        }
    }
}

/// Location of one segment inside the serialised stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteSpan {
    pub row: usize,
    /// Index of the segment within its row.
    pub segment: usize,
    /// Offset of the prefix byte.
    pub offset: usize,
    /// Prefix plus payload.
    pub len: usize,
}

/// The encoding result for a whole image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    mode: ColorMode,
    width: usize,
    rows: Vec<Row>,
}

impl EncodedImage {
    #[inline]
    #[must_use]
    pub const fn mode(&self) -> ColorMode {
        self.mode
    }

    #[inline]
    #[must_use]
    pub const fn bytes_per_value(&self) -> usize {
        self.mode.bytes_per_value()
    }

    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    #[inline]
    #[must_use]
    pub fn row(&self, y: usize) -> Option<&Row> {
        self.rows.get(y)
    }

    /// The segment covering pixel `(x, y)`, or `None` outside the image.
    #[must_use]
    pub fn segment_at(&self, x: usize, y: usize) -> Option<&Segment> {
        self.rows.get(y)?.segment_at(x)
    }

    /// Total serialised size in bytes.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        self.rows.iter().map(Row::encoded_len).sum()
    }

    /// Size of the quantized values with no run-length encoding.
    #[must_use]
    pub fn raw_len(&self) -> usize {
        self.width
            .saturating_mul(self.height())
            .saturating_mul(self.bytes_per_value())
    }

    /// Serialises every row, top to bottom.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        for row in &self.rows {
            row.write_to(&mut buf);
        }
        buf.freeze()
    }

    /// Where each segment lands in [`EncodedImage::to_bytes`], in stream order.
    #[must_use]
    pub fn byte_spans(&self) -> Vec<ByteSpan> {
        let mut spans = Vec::new();
        let mut offset = 0;
        for (y, row) in self.rows.iter().enumerate() {
            for (i, segment) in row.segments.iter().enumerate() {
                let len = segment.encoded_len();
                spans.push(ByteSpan {
                    row: y,
                    segment: i,
                    offset,
                    len,
                });
                offset += len;
            }
        }
        spans
    }

    /// Parses a serialised image.
    ///
    /// # Errors
    ///
    /// Returns [`RleError::Truncated`] if the data ends inside a segment,
    /// [`RleError::ZeroLengthRun`] for a `0x00`/`0x80` prefix,
    /// [`RleError::RowOverrun`] if a segment crosses the end of its row,
    /// [`RleError::TrailingBytes`] if data remains after the last row and
    /// [`RleError::ZeroWidth`] if `width` is zero while `height` is not.
    pub fn from_bytes(
        mut data: Bytes,
        width: usize,
        height: usize,
        mode: ColorMode,
    ) -> Result<Self, RleError> {
        if width == 0 && height > 0 {
            return Err(RleError::ZeroWidth { height });
        }
        let total = data.len();
        let bpv = mode.bytes_per_value();
        // every row consumes at least one byte, so `total` bounds the row count
        let mut rows = Vec::with_capacity(height.min(total));

        for y in 0..height {
            let mut segments = Vec::new();
            let mut covered = 0;
            while covered < width {
                let offset = total - data.remaining();
                if !data.has_remaining() {
                    return Err(RleError::Truncated { offset });
                }
                let (kind, length) = SegmentKind::from_prefix(data.get_u8());
                if length == 0 {
                    return Err(RleError::ZeroLengthRun { offset });
                }
                if covered + length as usize > width {
                    return Err(RleError::RowOverrun {
                        row: y,
                        width,
                        covered: covered + length as usize,
                    });
                }
                let payload_len = match kind {
                    SegmentKind::Same => bpv,
                    SegmentKind::Diff => length as usize * bpv,
                };
                if data.remaining() < payload_len {
                    return Err(RleError::Truncated { offset });
                }
                let payload = data.copy_to_bytes(payload_len);
                segments.push(Segment::from_parts(kind, length, covered, payload));
                covered += length as usize;
            }
            rows.push(Row { width, segments });
        }

        if data.has_remaining() {
            return Err(RleError::TrailingBytes {
                count: data.remaining(),
            });
        }

        Ok(Self { mode, width, rows })
    }

    /// Reconstructs a row-major RGBA buffer. Colours come back at RGB565
    /// precision; alpha is exact.
    #[must_use]
    pub fn decode_pixels(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            self.width
                .saturating_mul(self.height())
                .saturating_mul(4),
        );
        for row in &self.rows {
            for value in row.values() {
                let p = value.to_pixel();
                out.extend_from_slice(&[p.r, p.g, p.b, p.a]);
            }
        }
        out
    }
}

fn encode_grid_row(grid: &PixelGrid, y: usize, mode: ColorMode) -> Row {
    let pixels = grid.row(y).unwrap_or_default();
    Row {
        width: grid.width(),
        segments: segment_row(&quantize_row(pixels, mode)),
    }
}

/// Encodes every row of `grid`. The colour mode is decided once up front.
#[must_use]
pub fn encode_image(grid: &PixelGrid) -> EncodedImage {
    let mode = grid.color_mode();

    #[cfg(feature = "parallel")]
    let rows: Vec<Row> = {
        use rayon::prelude::*;
        (0..grid.height())
            .into_par_iter()
            .map(|y| encode_grid_row(grid, y, mode))
            .collect()
    };

    #[cfg(not(feature = "parallel"))]
    let rows: Vec<Row> = (0..grid.height())
        .map(|y| encode_grid_row(grid, y, mode))
        .collect();

    let image = EncodedImage {
        mode,
        width: grid.width(),
        rows,
    };

    #[cfg(feature = "debug-logging")]
    log::info!(
        "line-rle: {}x{} {} image, {} segments, {} -> {} bytes",
        image.width(),
        image.height(),
        image.mode(),
        image.rows().iter().map(|r| r.segments().len()).sum::<usize>(),
        image.raw_len(),
        image.encoded_len()
    );

    image
}

/// Holds the segments of the most recently loaded image.
///
/// Loading replaces the previous image entirely; nothing is updated
/// incrementally.
#[derive(Debug, Clone, Default)]
pub struct SegmentIndex {
    image: Option<EncodedImage>,
}

impl SegmentIndex {
    /// An empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes `grid`, dropping whatever was loaded before.
    pub fn load(&mut self, grid: &PixelGrid) -> &EncodedImage {
        #[cfg(feature = "debug-logging")]
        log::debug!(
            "line-rle: loading {}x{} grid, replacing {:?}",
            grid.width(),
            grid.height(),
            self.image.as_ref().map(|old| (old.width(), old.height()))
        );
        self.image.insert(encode_image(grid))
    }

    /// Drops the loaded image, if any.
    pub fn clear(&mut self) {
        self.image = None;
    }

    /// The loaded image.
    #[must_use]
    pub fn image(&self) -> Option<&EncodedImage> {
        self.image.as_ref()
    }

    /// Colour mode of the loaded image.
    #[must_use]
    pub fn mode(&self) -> Option<ColorMode> {
        self.image.as_ref().map(EncodedImage::mode)
    }

    /// Row `y` of the loaded image.
    #[must_use]
    pub fn row(&self, y: usize) -> Option<&Row> {
        self.image.as_ref()?.row(y)
    }

    /// The segment covering pixel `(x, y)`, or `None` when nothing is
    /// loaded or the position is outside the image.
    #[must_use]
    pub fn segment_at(&self, x: usize, y: usize) -> Option<&Segment> {
        self.image.as_ref()?.segment_at(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::Pixel;

    fn grid(rows: &[Vec<Pixel>]) -> PixelGrid {
        PixelGrid::from_rows(rows).unwrap()
    }

    fn sample() -> PixelGrid {
        let red = Pixel::rgb(255, 0, 0);
        let blue = Pixel::rgb(0, 0, 255);
        grid(&[
            vec![red, red, red, blue, red],
            vec![blue, red, blue, red, blue],
        ])
    }

    #[test]
    fn test_one_by_one() {
        let image = encode_image(&grid(&[vec![Pixel::rgb(10, 20, 30)]]));
        assert_eq!(image.mode(), ColorMode::Rgb);
        assert_eq!(image.bytes_per_value(), 2);
        let row = image.row(0).unwrap();
        assert_eq!(row.segments().len(), 1);
        assert_eq!(&image.to_bytes()[..], &[0x81, 0x08, 0xA3]);
    }

    #[test]
    fn test_mode_is_image_wide() {
        let mut rows = vec![vec![Pixel::rgb(1, 1, 1); 4]; 3];
        rows[2][3].a = 0;
        let image = encode_image(&grid(&rows));
        assert_eq!(image.mode(), ColorMode::Rgba);
        // Row 0 is fully opaque but still uses 3-byte values.
        assert_eq!(image.row(0).unwrap().segments()[0].payload().len(), 3);
    }

    #[test]
    fn test_segment_at() {
        let image = encode_image(&sample());
        let seg = image.segment_at(1, 0).unwrap();
        assert_eq!(seg.kind(), SegmentKind::Same);
        assert_eq!(seg.start_index(), 0);
        assert_eq!(image.segment_at(3, 0).unwrap().kind(), SegmentKind::Diff);
        assert_eq!(image.segment_at(4, 1).unwrap().length(), 5);
        assert!(image.segment_at(5, 0).is_none());
        assert!(image.segment_at(0, 2).is_none());
    }

    #[test]
    fn test_wire_round_trip() {
        let image = encode_image(&sample());
        let bytes = image.to_bytes();
        assert_eq!(bytes.len(), image.encoded_len());
        let parsed = EncodedImage::from_bytes(bytes, 5, 2, ColorMode::Rgb).unwrap();
        assert_eq!(parsed, image);
    }

    #[test]
    fn test_byte_spans() {
        let image = encode_image(&sample());
        let spans = image.byte_spans();
        // Row 0: SAME(3) then DIFF(2); row 1: DIFF(5).
        assert_eq!(
            spans,
            vec![
                ByteSpan {
                    row: 0,
                    segment: 0,
                    offset: 0,
                    len: 3
                },
                ByteSpan {
                    row: 0,
                    segment: 1,
                    offset: 3,
                    len: 5
                },
                ByteSpan {
                    row: 1,
                    segment: 0,
                    offset: 8,
                    len: 11
                },
            ]
        );
        let bytes = image.to_bytes();
        assert_eq!(bytes[8], 0x05);
    }

    #[test]
    fn test_from_bytes_errors() {
        let mode = ColorMode::Rgb;
        assert_eq!(
            EncodedImage::from_bytes(Bytes::from_static(&[0x82, 0xFF]), 2, 1, mode),
            Err(RleError::Truncated { offset: 0 })
        );
        assert_eq!(
            EncodedImage::from_bytes(Bytes::from_static(&[0x81, 0, 0]), 2, 1, mode),
            Err(RleError::Truncated { offset: 3 })
        );
        assert_eq!(
            EncodedImage::from_bytes(Bytes::from_static(&[0x80, 0, 0]), 2, 1, mode),
            Err(RleError::ZeroLengthRun { offset: 0 })
        );
        assert_eq!(
            EncodedImage::from_bytes(Bytes::from_static(&[0x83, 0, 0]), 2, 1, mode),
            Err(RleError::RowOverrun {
                row: 0,
                width: 2,
                covered: 3
            })
        );
        assert_eq!(
            EncodedImage::from_bytes(Bytes::from_static(&[0x82, 0, 0, 0x01]), 2, 1, mode),
            Err(RleError::TrailingBytes { count: 1 })
        );
    }

    #[test]
    fn test_from_bytes_huge_height() {
        // Row storage grows with the data, not with the declared height.
        assert_eq!(
            EncodedImage::from_bytes(
                Bytes::from_static(&[0x81, 0, 0]),
                1,
                usize::MAX,
                ColorMode::Rgb
            ),
            Err(RleError::Truncated { offset: 3 })
        );
        assert_eq!(
            EncodedImage::from_bytes(Bytes::new(), 0, usize::MAX, ColorMode::Rgb),
            Err(RleError::ZeroWidth { height: usize::MAX })
        );
        let empty = EncodedImage::from_bytes(Bytes::new(), 0, 0, ColorMode::Rgb).unwrap();
        assert_eq!(empty.height(), 0);
    }

    #[test]
    fn test_raw_len_saturates() {
        let image = EncodedImage {
            mode: ColorMode::Rgba,
            width: usize::MAX,
            rows: vec![Row {
                width: usize::MAX,
                segments: Vec::new(),
            }],
        };
        assert_eq!(image.raw_len(), usize::MAX);
    }

    #[test]
    fn test_decode_pixels() {
        let image = encode_image(&sample());
        let rgba = image.decode_pixels();
        assert_eq!(rgba.len(), 5 * 2 * 4);
        assert_eq!(&rgba[..4], &[255, 0, 0, 255]);
        assert_eq!(&rgba[12..16], &[0, 0, 255, 255]);
    }

    #[test]
    fn test_compression_summary() {
        let image = encode_image(&grid(&vec![vec![Pixel::rgb(9, 9, 9); 64]; 64]));
        assert_eq!(image.raw_len(), 64 * 64 * 2);
        assert_eq!(image.encoded_len(), 64 * 3);
    }

    #[test]
    fn test_index_load_replaces_previous() {
        let mut index = SegmentIndex::new();
        assert!(index.mode().is_none());
        assert!(index.segment_at(0, 0).is_none());

        index.load(&sample());
        assert_eq!(index.mode(), Some(ColorMode::Rgb));
        assert_eq!(index.row(1).unwrap().segments().len(), 1);

        let translucent = grid(&[vec![Pixel::new(0, 0, 0, 10)]]);
        let image = index.load(&translucent);
        assert_eq!(image.height(), 1);
        assert_eq!(index.mode(), Some(ColorMode::Rgba));
        assert!(index.row(1).is_none());

        index.clear();
        assert!(index.image().is_none());
    }

    #[test]
    fn test_zero_width_rows() {
        let image = encode_image(&PixelGrid::new(0, 3, &[]).unwrap());
        assert_eq!(image.height(), 3);
        assert!(image.rows().iter().all(|r| r.segments().is_empty()));
        assert!(image.to_bytes().is_empty());
    }
}
