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

//! Row codec: run detection and segmentation of one row.
//!
//! # Scan States
//!
//! ```text
//!   state    next value      next state   flushed
//!   Start    repeat          InSame       -
//!   Start    change          InDiff       -
//!   InSame   repeat          InSame       -
//!   InSame   change          InDiff       Same run
//!   InDiff   repeat          InSame       Diff run minus its last value
//!   InDiff   change          InDiff       -
//!   (end)                                 pending run
//! ```
//!
//! `Start` holds the first value of the row. A row that never leaves it
//! (width 1) becomes one Same run of length 1.
//!
//! Every flush goes through `RowScan::emit`, which splits runs longer than
//! [`MAX_RUN_LENGTH`] into consecutive segments.

use crate::error::RleError;
use crate::pixel::{quantize_row, ColorMode, Pixel, QuantizedValue};
use crate::segment::{Segment, SegmentKind};
use crate::MAX_RUN_LENGTH;

/// Per-row scanner state. Positions are pixel columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScanState {
    /// Only the first value has been seen.
    Start,
    /// `len` copies of the value at `start`.
    InSame { start: usize, len: usize },
    /// `len` values from `start`, no two neighbours equal.
    InDiff { start: usize, len: usize },
}

/// A completed run, ready to be chunked into segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Run {
    pub kind: SegmentKind,
    pub start: usize,
    pub len: usize,
}

impl ScanState {
    /// Consumes the value at `index`. `repeat` is whether it equals the
    /// value at `index - 1`. Returns the next state and any run that closed.
    pub(crate) fn advance(self, index: usize, repeat: bool) -> (Self, Option<Run>) {
        match (self, repeat) {
            (Self::Start, true) => (Self::InSame { start: 0, len: 2 }, None),
            (Self::Start, false) => (Self::InDiff { start: 0, len: 2 }, None),
            (Self::InSame { start, len }, true) => (Self::InSame { start, len: len + 1 }, None),
            (Self::InSame { start, len }, false) => (
                Self::InDiff {
                    start: index,
                    len: 1,
                },
                Some(Run {
                    kind: SegmentKind::Same,
                    start,
                    len,
                }),
            ),
            (Self::InDiff { start, len }, true) => {
                // The previous value now opens the Same run.
                let closed = (len > 1).then_some(Run {
                    kind: SegmentKind::Diff,
                    start,
                    len: len - 1,
                });
                (
                    Self::InSame {
                        start: index - 1,
                        len: 2,
                    },
                    closed,
                )
            }
            (Self::InDiff { start, len }, false) => (Self::InDiff { start, len: len + 1 }, None),
        }
    }

    /// The run left pending at row end.
    pub(crate) const fn finish(self) -> Run {
        match self {
            Self::Start => Run {
                kind: SegmentKind::Same,
                start: 0,
                len: 1,
            },
            Self::InSame { start, len } => Run {
                kind: SegmentKind::Same,
                start,
                len,
            },
            Self::InDiff { start, len } => Run {
                kind: SegmentKind::Diff,
                start,
                len,
            },
        }
    }
}

/// Scan context for a single row. Nothing survives between rows.
struct RowScan<'a> {
    values: &'a [QuantizedValue],
    segments: Vec<Segment>,
}

impl<'a> RowScan<'a> {
    fn new(values: &'a [QuantizedValue]) -> Self {
        Self {
            values,
            segments: Vec::new(),
        }
    }

    /// Appends `run` as one or more segments of at most `MAX_RUN_LENGTH`.
    #[allow(clippy::cast_possible_truncation)] // chunk <= MAX_RUN_LENGTH
    fn emit(&mut self, run: Run) {
        let max = MAX_RUN_LENGTH as usize;
        let mut offset = 0;
        while offset < run.len {
            let chunk = (run.len - offset).min(max);
            let start = run.start + offset;
            let segment = match run.kind {
                SegmentKind::Same => Segment::same(start, chunk as u8, self.values[run.start]),
                SegmentKind::Diff => Segment::diff(start, &self.values[start..start + chunk]),
            };
            self.segments.push(segment);
            offset += chunk;
        }
    }

    fn run(mut self) -> Vec<Segment> {
        if self.values.is_empty() {
            return self.segments;
        }
        let mut state = ScanState::Start;
        for index in 1..self.values.len() {
            let repeat = self.values[index] == self.values[index - 1];
            let (next, closed) = state.advance(index, repeat);
            if let Some(run) = closed {
                self.emit(run);
            }
            state = next;
        }
        self.emit(state.finish());
        self.segments
    }
}

/// Splits a row of quantized values into Same and Diff segments.
///
/// An empty row produces no segments.
#[must_use]
pub fn segment_row(values: &[QuantizedValue]) -> Vec<Segment> {
    let segments = RowScan::new(values).run();

    debug_assert_eq!(
        segments.iter().map(|s| s.length() as usize).sum::<usize>(),
        values.len()
    );

    segments
}

/// Quantizes and segments one row, checking it against the image width.
///
/// # Errors
///
/// Returns [`RleError::ShapeMismatch`] if `pixels.len() != width`.
pub fn encode_row(
    row: usize,
    pixels: &[Pixel],
    mode: ColorMode,
    width: usize,
) -> Result<Vec<Segment>, RleError> {
    if pixels.len() != width {
        return Err(RleError::ShapeMismatch {
            row,
            expected: width,
            actual: pixels.len(),
        });
    }
    Ok(segment_row(&quantize_row(pixels, mode)))
}

/// Expands segments back into the row's quantized values.
#[must_use]
pub fn decode_row(segments: &[Segment]) -> Vec<QuantizedValue> {
    let width = segments.iter().map(|s| s.length() as usize).sum();
    let mut out = Vec::with_capacity(width);
    for segment in segments {
        segment.expand_into(&mut out);
    }
    out
}
