use crate::token::{split_lead_byte, Run};
use snafu::{ensure, Snafu};

pub mod blob;

#[derive(Debug, Snafu)]
#[snafu(module)]
pub enum DecodeError {
    #[snafu(display("row offset {offset} points past the end of the {len}-byte stream"))]
    OffsetOutOfBounds { offset: usize, len: usize },
    #[snafu(display("stream ended after {produced} of {width} pixels"))]
    UnexpectedEof { produced: usize, width: usize },
    #[snafu(display(
        "run of {run} pixels after {produced} pixels overshoots the row width of {width}"
    ))]
    Overrun {
        produced: usize,
        run: usize,
        width: usize,
    },
    #[snafu(display(
        "index {index} at column {position} is not covered by a palette of {palette_len} entries"
    ))]
    IndexOutOfPalette {
        index: u8,
        position: usize,
        palette_len: usize,
    },
    #[snafu(display("escaped run with a length of zero at byte {position}"))]
    EmptyRun { position: usize },
    #[snafu(display("output can't hold a row of {width} pixels"))]
    OutputTooSmall { width: usize },
    #[snafu(display("row {row} is out of bounds for an image of {height} rows"))]
    RowOutOfBounds { row: usize, height: usize },
}

/// Iterates over the runs of a single row.
///
/// Stops once the runs add up to the row width. Any error ends the iteration.
#[derive(Debug, Clone)]
pub struct RowTokens<'a> {
    data: &'a [u8],
    start: usize,
    pos: usize,
    produced: usize,
    width: usize,
    failed: bool,
}

impl<'a> RowTokens<'a> {
    pub fn new(data: &'a [u8], offset: usize, width: u16) -> Result<Self, DecodeError> {
        ensure!(
            offset <= data.len(),
            decode_error::OffsetOutOfBoundsSnafu {
                offset,
                len: data.len()
            }
        );

        Ok(Self {
            data,
            start: offset,
            pos: offset,
            produced: 0,
            width: usize::from(width),
            failed: false,
        })
    }

    /// Number of stream bytes read so far.
    #[inline]
    pub fn consumed(&self) -> usize {
        self.pos - self.start
    }

    /// Number of pixels described by the runs read so far.
    #[inline]
    pub fn produced(&self) -> usize {
        self.produced
    }

    fn next_byte(&mut self) -> Result<u8, DecodeError> {
        let byte = *self.data.get(self.pos).ok_or(DecodeError::UnexpectedEof {
            produced: self.produced,
            width: self.width,
        })?;
        self.pos += 1;
        Ok(byte)
    }

    fn next_run(&mut self) -> Result<Run, DecodeError> {
        let (len, value) = split_lead_byte(self.next_byte()?);
        let len = match len {
            Some(len) => len,
            None => {
                let len = self.next_byte()?;
                ensure!(
                    len > 0,
                    decode_error::EmptyRunSnafu {
                        position: self.pos - 1
                    }
                );
                len
            }
        };

        let run = usize::from(len);
        ensure!(
            self.produced + run <= self.width,
            decode_error::OverrunSnafu {
                produced: self.produced,
                run,
                width: self.width
            }
        );
        self.produced += run;

        Ok(Run::new_unchecked(value, len))
    }
}

impl Iterator for RowTokens<'_> {
    type Item = Result<Run, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.produced == self.width {
            return None;
        }

        let run = self.next_run();
        self.failed = run.is_err();
        Some(run)
    }
}

/// Decodes the row starting at `offset` into `output`.
///
/// Returns the number of stream bytes the row occupies. The output receives exactly `width`
/// pixels on success; on error it may have received a prefix of the row.
pub fn decode_row(
    data: &[u8],
    offset: usize,
    width: u16,
    mut output: impl RowOutput,
) -> Result<usize, DecodeError> {
    let width_px = usize::from(width);
    ensure!(
        output.max_len().map_or(true, |max_len| max_len >= width_px),
        decode_error::OutputTooSmallSnafu { width: width_px }
    );

    let palette_len = output.palette_len();
    let mut position = 0;
    let mut tokens = RowTokens::new(data, offset, width)?;
    for run in &mut tokens {
        let run = run?;
        if let Some(palette_len) = palette_len {
            ensure!(
                usize::from(run.value()) < palette_len,
                decode_error::IndexOutOfPaletteSnafu {
                    index: run.value(),
                    position,
                    palette_len
                }
            );
        }
        output.write_run(run.value(), run.len());
        position += run.len();
    }

    Ok(tokens.consumed())
}

/// Decodes row `y` of an image in the padded layout.
pub fn decode_padded_row(
    data: &[u8],
    stride: usize,
    y: usize,
    width: u16,
    output: impl RowOutput,
) -> Result<usize, DecodeError> {
    decode_row(data, y * stride, width, output)
}

/// Receives the runs of a decoded row.
pub trait RowOutput {
    fn write_run(&mut self, value: u8, count: usize);

    /// Returns the maximum number of pixels that can be written.
    ///
    /// `None` if the output is unbounded.
    fn max_len(&self) -> Option<usize>;

    /// Number of palette indices the output can map. Runs of larger indices are rejected
    /// before they reach [`RowOutput::write_run`].
    ///
    /// `None` if the output stores the indices themselves.
    #[inline]
    fn palette_len(&self) -> Option<usize> {
        None
    }
}

impl<T: RowOutput + ?Sized> RowOutput for &mut T {
    #[inline]
    fn write_run(&mut self, value: u8, count: usize) {
        (**self).write_run(value, count)
    }

    #[inline]
    fn max_len(&self) -> Option<usize> {
        (**self).max_len()
    }

    #[inline]
    fn palette_len(&self) -> Option<usize> {
        (**self).palette_len()
    }
}

#[cfg(feature = "alloc")]
impl RowOutput for alloc::vec::Vec<u8> {
    #[inline]
    fn write_run(&mut self, value: u8, count: usize) {
        self.extend(core::iter::repeat(value).take(count));
    }

    #[inline]
    fn max_len(&self) -> Option<usize> {
        None
    }
}

/// Writes palette indices into a fixed buffer.
pub struct SliceRowOutput<'a> {
    output: &'a mut [u8],
    output_idx: usize,
}

impl<'a> SliceRowOutput<'a> {
    #[inline]
    pub fn new(output: &'a mut [u8]) -> Self {
        Self {
            output,
            output_idx: 0,
        }
    }

    #[inline]
    pub fn current_output_position(&self) -> usize {
        self.output_idx
    }
}

impl RowOutput for SliceRowOutput<'_> {
    #[inline]
    fn write_run(&mut self, value: u8, count: usize) {
        self.output[self.output_idx..][..count].fill(value);
        self.output_idx += count;
    }

    #[inline]
    fn max_len(&self) -> Option<usize> {
        Some(self.output.len() - self.output_idx)
    }
}

/// Maps palette indices through a lookup table while writing, e.g. to display colors.
///
/// The table has one entry per palette index. A row referencing an index past its end fails to
/// decode with [`DecodeError::IndexOutOfPalette`].
pub struct LutRowOutput<'a, T> {
    lut: &'a [T],
    output: &'a mut [T],
    output_idx: usize,
}

impl<'a, T: Copy> LutRowOutput<'a, T> {
    #[inline]
    pub fn new(lut: &'a [T], output: &'a mut [T]) -> Self {
        Self {
            lut,
            output,
            output_idx: 0,
        }
    }
}

impl<T: Copy> RowOutput for LutRowOutput<'_, T> {
    #[inline]
    fn write_run(&mut self, value: u8, count: usize) {
        let color = self.lut[usize::from(value)];
        self.output[self.output_idx..][..count].fill(color);
        self.output_idx += count;
    }

    #[inline]
    fn max_len(&self) -> Option<usize> {
        Some(self.output.len() - self.output_idx)
    }

    #[inline]
    fn palette_len(&self) -> Option<usize> {
        Some(self.lut.len())
    }
}
