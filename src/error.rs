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

//! Error type shared by the encoder and the wire parser.

use thiserror::Error;

/// Errors reported while building pixel grids or parsing encoded rows.
///
/// All of these are input validation failures. Encoding a well-formed grid
/// cannot fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RleError {
    /// A row (or the whole buffer) does not match the declared dimensions.
    #[error("shape mismatch at row {row}: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Row index, or `0` when the whole buffer was checked.
        row: usize,
        /// Expected pixel (or byte) count.
        expected: usize,
        /// Actual pixel (or byte) count.
        actual: usize,
    },

    /// A channel value outside `0..=255` was supplied.
    #[error("channel value {value} at index {index} is outside 0..=255")]
    InvalidChannelValue {
        /// Offset of the channel in the input slice.
        index: usize,
        /// The rejected value.
        value: i32,
    },

    /// The encoded stream ended inside a segment.
    #[error("encoded data truncated at byte offset {offset}")]
    Truncated {
        /// Offset of the segment prefix that could not be completed.
        offset: usize,
    },

    /// A prefix byte declared a run of length zero (`0x00` or `0x80`).
    #[error("zero-length run at byte offset {offset}")]
    ZeroLengthRun {
        /// Offset of the offending prefix byte.
        offset: usize,
    },

    /// A segment extends past the end of its row.
    #[error("row {row} overrun: segment covers {covered} pixels of a {width} pixel row")]
    RowOverrun {
        /// Row being parsed.
        row: usize,
        /// Declared row width.
        width: usize,
        /// Pixels covered once the offending segment is included.
        covered: usize,
    },

    /// Rows of width zero were requested from a stream. Such rows have no
    /// segments, so the stream cannot confirm how many there are.
    #[error("cannot parse {height} rows of width zero")]
    ZeroWidth {
        /// Declared row count.
        height: usize,
    },

    /// The leading colour mode byte is neither `2` nor `3`.
    #[error("invalid colour mode byte {value:#04x}")]
    InvalidModeByte {
        /// The rejected byte.
        value: u8,
    },

    /// Bytes remain after the last declared row.
    #[error("{count} trailing bytes after the last row")]
    TrailingBytes {
        /// Number of unread bytes.
        count: usize,
    },
}
