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

//! Run records, the atomic unit of an encoded row.
//!
//! # Wire Format
//!
//! ```text
//! Same run:  [0x80 | len][value]                 (1 + bpv bytes)
//! Diff run:  [len][value 0][value 1]...[value n] (1 + len * bpv bytes)
//! ```
//!
//! `len` is 1..=127. The top bit of the prefix byte is the run kind.

use bytes::{BufMut, Bytes, BytesMut};

use crate::pixel::QuantizedValue;
use crate::{MAX_RUN_LENGTH, SAME_RUN_FLAG};

/// Kind of run a segment describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    /// `length` copies of one value.
    Same,
    /// `length` values stored literally.
    Diff,
}

impl SegmentKind {
    /// Splits a prefix byte into kind and run length. The length may be 0
    /// for malformed input; callers decide how to treat it.
    #[inline]
    #[must_use]
    pub const fn from_prefix(prefix: u8) -> (Self, u8) {
        let kind = if prefix & SAME_RUN_FLAG != 0 {
            Self::Same
        } else {
            Self::Diff
        };
        (kind, prefix & MAX_RUN_LENGTH)
    }

    /// Upper-case label, as shown in segment tooltips.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Same => "SAME",
            Self::Diff => "DIFF",
        }
    }
}

/// One emitted run record.
///
/// Segments come out of the row scanner or the stream parser only, so the
/// length always fits the prefix byte:
///
/// ```compile_fail
/// use line_rle::{ColorMode, Pixel, QuantizedValue, Segment};
///
/// let value = QuantizedValue::from_pixel(Pixel::rgb(0, 0, 0), ColorMode::Rgb);
/// let _ = Segment::same(0, 200, value);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    kind: SegmentKind,
    length: u8,
    start_index: usize,
    payload: Bytes,
}

impl Segment {
    /// A run of `length` copies of `value` starting at column `start_index`.
    /// `length` must be in `1..=MAX_RUN_LENGTH`; only the row scanner
    /// builds segments.
    #[must_use]
    pub(crate) fn same(start_index: usize, length: u8, value: QuantizedValue) -> Self {
        debug_assert!((1..=MAX_RUN_LENGTH).contains(&length));
        Self {
            kind: SegmentKind::Same,
            length,
            start_index,
            payload: Bytes::copy_from_slice(value.as_bytes()),
        }
    }

    /// A literal run of `values` starting at column `start_index`.
    /// Holds between 1 and `MAX_RUN_LENGTH` values.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // checked against MAX_RUN_LENGTH
    pub(crate) fn diff(start_index: usize, values: &[QuantizedValue]) -> Self {
        debug_assert!(!values.is_empty() && values.len() <= MAX_RUN_LENGTH as usize);
        let bpv = values.first().map_or(0, |v| v.as_bytes().len());
        let mut payload = BytesMut::with_capacity(values.len() * bpv);
        for value in values {
            payload.put_slice(value.as_bytes());
        }
        Self {
            kind: SegmentKind::Diff,
            length: values.len() as u8,
            start_index,
            payload: payload.freeze(),
        }
    }

    /// Builds a segment from a parsed prefix and payload. The caller has
    /// already validated the payload size.
    pub(crate) fn from_parts(
        kind: SegmentKind,
        length: u8,
        start_index: usize,
        payload: Bytes,
    ) -> Self {
        Self {
            kind,
            length,
            start_index,
            payload,
        }
    }

    #[inline]
    #[must_use]
    pub const fn kind(&self) -> SegmentKind {
        self.kind
    }

    /// Number of pixels covered (1..=127).
    #[inline]
    #[must_use]
    pub const fn length(&self) -> u8 {
        self.length
    }

    /// First pixel column covered, 0-based within the row.
    #[inline]
    #[must_use]
    pub const fn start_index(&self) -> usize {
        self.start_index
    }

    /// One past the last pixel column covered.
    #[inline]
    #[must_use]
    pub const fn end_index(&self) -> usize {
        self.start_index + self.length as usize
    }

    #[inline]
    #[must_use]
    pub const fn covers(&self, x: usize) -> bool {
        x >= self.start_index && x < self.end_index()
    }

    /// Kind in the top bit, length in the low 7 bits.
    #[inline]
    #[must_use]
    pub const fn prefix_byte(&self) -> u8 {
        match self.kind {
            SegmentKind::Same => SAME_RUN_FLAG | self.length,
            SegmentKind::Diff => self.length,
        }
    }

    /// Raw quantized-value bytes: one value for Same, `length` values for Diff.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Size of one quantized value in this segment's payload.
    #[must_use]
    pub fn bytes_per_value(&self) -> usize {
        match self.kind {
            SegmentKind::Same => self.payload.len(),
            SegmentKind::Diff => self.payload.len() / self.length.max(1) as usize,
        }
    }

    /// Bytes this segment occupies on the wire, prefix included.
    #[inline]
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        1 + self.payload.len()
    }

    /// Appends `[prefix][payload]` to `buf`.
    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.put_u8(self.prefix_byte());
        buf.put_slice(&self.payload);
    }

    /// The values stored in the payload, in column order. A Same segment
    /// yields its single value once.
    pub fn stored_values(&self) -> impl Iterator<Item = QuantizedValue> + '_ {
        let bpv = self.bytes_per_value().max(1);
        self.payload
            .chunks_exact(bpv)
            .filter_map(QuantizedValue::from_bytes)
    }

    /// Appends the `length` values this segment covers to `out`.
    pub fn expand_into(&self, out: &mut Vec<QuantizedValue>) {
        match self.kind {
            SegmentKind::Same => {
                if let Some(value) = self.stored_values().next() {
                    out.extend(std::iter::repeat_n(value, self.length as usize));
                }
            }
            SegmentKind::Diff => out.extend(self.stored_values()),
        }
    }
}

/// Inspection summary, one field per line.
impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Type: {}", self.kind.name())?;
        writeln!(f, "Start: {}", self.start_index)?;
        writeln!(f, "Length: {}", self.length)?;
        writeln!(f, "Prefix: 0x{:02x}", self.prefix_byte())?;
        write!(f, "Bytes:")?;
        for byte in &self.payload {
            write!(f, " {byte:02x}")?;
        }
        Ok(())
    }
}
