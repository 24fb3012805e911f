use super::{encode_error, encode_row, EncodeError};
use crate::consts::MAX_STREAM_LEN;
use alloc::vec::Vec;
use log::trace;
use snafu::ensure;

/// Builds the encoded stream row by row, recording where each row starts.
#[derive(Debug, Clone, Default)]
pub struct RowIndexBuilder {
    offsets: Vec<u16>,
    data: Vec<u8>,
}

impl RowIndexBuilder {
    pub const fn new() -> Self {
        Self {
            offsets: Vec::new(),
            data: Vec::new(),
        }
    }

    pub fn with_capacity(rows: usize, bytes: usize) -> Self {
        Self {
            offsets: Vec::with_capacity(rows),
            data: Vec::with_capacity(bytes),
        }
    }

    /// Records the offset of the next row and appends its tokens.
    ///
    /// Returns the number of bytes the row occupies.
    pub fn push_row(&mut self, row: &[u8]) -> Result<usize, EncodeError> {
        let y = self.offsets.len();
        let offset = self.data.len();
        ensure!(
            offset <= MAX_STREAM_LEN,
            encode_error::OffsetOverflowSnafu { row: y, len: offset }
        );

        let written = encode_row(row, &mut self.data)?;
        self.offsets.push(offset as u16);
        trace!("Row {y}: {written} bytes at offset {offset}");

        Ok(written)
    }

    /// Number of rows pushed so far.
    #[inline]
    pub fn rows(&self) -> usize {
        self.offsets.len()
    }

    /// Current length of the encoded stream.
    #[inline]
    pub fn stream_len(&self) -> usize {
        self.data.len()
    }

    /// Checks the final stream length and returns the offset table and the stream.
    pub fn finish(self) -> Result<(Vec<u16>, Vec<u8>), EncodeError> {
        ensure!(
            self.data.len() <= MAX_STREAM_LEN,
            encode_error::OffsetOverflowSnafu {
                row: self.offsets.len(),
                len: self.data.len()
            }
        );

        Ok((self.offsets, self.data))
    }
}
