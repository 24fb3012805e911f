use crate::{
    consts::{BLOB_MAGIC, MAX_INDEX, MAX_STREAM_LEN},
    decode::{decode_row, DecodeError, LutRowOutput, RowOutput},
    palette::Palette,
    quantize::{quantize, IndexGrid, QuantizeError},
    token::Run,
    Dimensions,
};
use alloc::vec::Vec;
use itertools::Itertools;
use log::debug;
use snafu::{ensure, Snafu};

pub mod index;
pub use index::RowIndexBuilder;

#[cfg(feature = "std")]
mod std_api;
#[cfg(feature = "std")]
pub use std_api::*;

#[derive(Debug, Snafu)]
#[snafu(module)]
pub enum EncodeError {
    #[snafu(display("index {index} at column {position} exceeds the largest index {}", MAX_INDEX))]
    IndexOutOfRange { index: u8, position: usize },
    #[snafu(display("index {index} is not covered by a palette of {palette_len} entries"))]
    IndexOutOfPalette { index: u8, palette_len: usize },
    #[snafu(display(
        "encoded stream is {len} bytes long at row {row}, which 16-bit row offsets can't address"
    ))]
    OffsetOverflow { row: usize, len: usize },
}

#[derive(Debug, Snafu)]
pub enum BuildError {
    #[snafu(context(false), display("failed to quantize image: {source}"))]
    Quantize { source: QuantizeError },
    #[snafu(context(false), display("failed to encode image: {source}"))]
    Encode { source: EncodeError },
}

/// Appends the tokens of one row of palette indices to `w`.
///
/// Returns the number of bytes appended.
pub fn encode_row(row: &[u8], w: &mut Vec<u8>) -> Result<usize, EncodeError> {
    let start = w.len();
    let mut position = 0;

    for (count, value) in row.iter().copied().dedup_with_count() {
        ensure!(
            value <= MAX_INDEX,
            encode_error::IndexOutOfRangeSnafu {
                index: value,
                position
            }
        );

        for token in Run::tokens(value, count) {
            w.extend_from_slice(token.as_bytes());
        }
        position += count;
    }

    Ok(w.len() - start)
}

fn check_palette(palette: &Palette, grid: &IndexGrid) -> Result<(), EncodeError> {
    let index = grid.max_index();
    ensure!(
        usize::from(index) < palette.len(),
        encode_error::IndexOutOfPaletteSnafu {
            index,
            palette_len: palette.len()
        }
    );
    Ok(())
}

/// An image encoded with a row offset table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub dims: Dimensions,
    pub palette: Palette,
    /// Start of every row in `data`.
    pub row_offsets: Vec<u16>,
    pub data: Vec<u8>,
}

impl EncodedImage {
    /// Quantizes raw samples and encodes the result.
    pub fn from_samples(width: u16, height: u16, samples: &[u8]) -> Result<Self, BuildError> {
        let (palette, grid) = quantize(width, height, samples)?;
        Ok(Self::encode(palette, &grid)?)
    }

    pub fn encode(palette: Palette, grid: &IndexGrid) -> Result<Self, EncodeError> {
        check_palette(&palette, grid)?;

        let dims = grid.dimensions();
        let mut builder = RowIndexBuilder::with_capacity(
            usize::from(dims.height),
            usize::from(dims.height) * 8,
        );
        for row in grid.rows() {
            builder.push_row(row)?;
        }
        let (row_offsets, data) = builder.finish()?;

        debug!(
            "Encoded {}x{} image into {} bytes ({} palette entries)",
            dims.width,
            dims.height,
            data.len(),
            palette.len()
        );

        Ok(Self {
            dims,
            palette,
            row_offsets,
            data,
        })
    }

    /// Returns the encoded bytes of row `y`.
    pub fn row(&self, y: usize) -> Option<&[u8]> {
        let start = usize::from(*self.row_offsets.get(y)?);
        let end = self
            .row_offsets
            .get(y + 1)
            .map_or(self.data.len(), |&offset| usize::from(offset));
        self.data.get(start..end)
    }

    /// Decodes row `y` into `output`, returning the number of stream bytes consumed.
    pub fn decode_row(&self, y: usize, output: impl RowOutput) -> Result<usize, DecodeError> {
        let Some(&offset) = self.row_offsets.get(y) else {
            return Err(DecodeError::RowOutOfBounds {
                row: y,
                height: self.row_offsets.len(),
            });
        };
        decode_row(&self.data, usize::from(offset), self.dims.width, output)
    }

    /// Decodes every row into palette indices, row-major.
    pub fn decode_to_vec(&self) -> Result<Vec<u8>, DecodeError> {
        let mut w = Vec::with_capacity(self.dims.pixel_count());
        for y in 0..self.row_offsets.len() {
            self.decode_row(y, &mut w)?;
        }
        Ok(w)
    }

    /// Decodes every row and maps the indices back to their sample values.
    pub fn decode_to_samples(&self) -> Result<Vec<u8>, DecodeError> {
        let mut samples = alloc::vec![0; self.dims.pixel_count()];
        let width = usize::from(self.dims.width);

        for (y, row) in samples.chunks_exact_mut(width).enumerate() {
            self.decode_row(y, LutRowOutput::new(self.palette.as_slice(), row))?;
        }
        Ok(samples)
    }

    /// Length of the stream as stored in the container.
    pub(crate) fn blob_data_len(&self) -> Result<u16, EncodeError> {
        ensure!(
            self.data.len() <= MAX_STREAM_LEN,
            encode_error::OffsetOverflowSnafu {
                row: self.row_offsets.len(),
                len: self.data.len()
            }
        );
        Ok(self.data.len() as u16)
    }

    /// Serializes the image into the binary container format.
    pub fn to_blob(&self) -> Result<Vec<u8>, EncodeError> {
        let data_len = self.blob_data_len()?;

        let mut w = Vec::with_capacity(
            4 + 2 + 2 + 1 + self.palette.len() + self.row_offsets.len() * 2 + 2 + self.data.len(),
        );

        w.extend_from_slice(&BLOB_MAGIC);
        w.extend_from_slice(&self.dims.width.to_le_bytes());
        w.extend_from_slice(&self.dims.height.to_le_bytes());
        w.push(self.palette.len() as u8);
        w.extend_from_slice(self.palette.as_slice());
        for offset in &self.row_offsets {
            w.extend_from_slice(&offset.to_le_bytes());
        }
        w.extend_from_slice(&data_len.to_le_bytes());
        w.extend_from_slice(&self.data);

        Ok(w)
    }
}

/// An image in the legacy layout: every row padded with zero bytes to the same stride, so row `y`
/// starts at `y * stride` and no offset table is needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaddedImage {
    pub dims: Dimensions,
    pub palette: Palette,
    pub stride: usize,
    pub data: Vec<u8>,
}

impl PaddedImage {
    pub fn from_samples(width: u16, height: u16, samples: &[u8]) -> Result<Self, BuildError> {
        let (palette, grid) = quantize(width, height, samples)?;
        Ok(Self::encode(palette, &grid)?)
    }

    pub fn encode(palette: Palette, grid: &IndexGrid) -> Result<Self, EncodeError> {
        check_palette(&palette, grid)?;

        let rows = grid
            .rows()
            .map(|row| {
                let mut w = Vec::new();
                encode_row(row, &mut w).map(|_| w)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let stride = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut data = Vec::with_capacity(stride * rows.len());
        for row in &rows {
            data.extend_from_slice(row);
            data.resize(data.len() + stride - row.len(), 0);
        }

        let dims = grid.dimensions();
        debug!(
            "Encoded {}x{} image into {} padded bytes (stride {stride})",
            dims.width,
            dims.height,
            data.len()
        );

        Ok(Self {
            dims,
            palette,
            stride,
            data,
        })
    }

    pub fn decode_row(&self, y: usize, output: impl RowOutput) -> Result<usize, DecodeError> {
        let height = usize::from(self.dims.height);
        if y >= height {
            return Err(DecodeError::RowOutOfBounds { row: y, height });
        }
        decode_row(&self.data, y * self.stride, self.dims.width, output)
    }
}
