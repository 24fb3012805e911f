use super::{decode_row, DecodeError, RowOutput};
use crate::{
    consts::BLOB_MAGIC,
    palette::{Palette, PaletteError},
    Dimensions,
};
use byteorder::{ByteOrder, LittleEndian};
use snafu::{ensure, ResultExt, Snafu};

#[derive(Debug, Snafu)]
#[snafu(module)]
pub enum BlobError {
    #[snafu(display("blob ended while reading the {what}"))]
    UnexpectedEof { what: &'static str },
    #[snafu(display("blob does not start with the expected magic bytes"))]
    InvalidMagic,
    #[snafu(display("blob declares an empty {width}x{height} image"))]
    InvalidDimensions { width: u16, height: u16 },
    #[snafu(display("blob declares an empty palette"))]
    EmptyPalette,
    #[snafu(display("blob contains an invalid palette"))]
    InvalidPalette { source: PaletteError },
    #[snafu(display("row offset {row} is {offset}, expected at least {min} and at most {max}"))]
    InvalidOffsets {
        row: usize,
        offset: usize,
        min: usize,
        max: usize,
    },
    #[snafu(display("blob has {len} unexpected trailing bytes"))]
    TrailingData { len: usize },
}

/// A zero-copy view of an encoded image stored in the binary container format.
#[derive(Debug, Clone, Copy)]
pub struct EncodedImageRef<'a> {
    pub dims: Dimensions,
    pub palette: Palette,
    offsets: &'a [u8],
    data: &'a [u8],
}

fn take<'a>(input: &mut &'a [u8], len: usize, what: &'static str) -> Result<&'a [u8], BlobError> {
    ensure!(input.len() >= len, blob_error::UnexpectedEofSnafu { what });
    let (head, tail) = input.split_at(len);
    *input = tail;
    Ok(head)
}

impl<'a> EncodedImageRef<'a> {
    /// Validates the container and borrows its tables.
    pub fn parse(blob: &'a [u8]) -> Result<Self, BlobError> {
        let mut input = blob;

        let magic = take(&mut input, 4, "magic")?;
        ensure!(magic == BLOB_MAGIC, blob_error::InvalidMagicSnafu);

        let header = take(&mut input, 5, "header")?;
        let width = LittleEndian::read_u16(&header[0..2]);
        let height = LittleEndian::read_u16(&header[2..4]);
        let palette_len = usize::from(header[4]);
        let dims = Dimensions::new(width, height);
        ensure!(
            !dims.is_empty(),
            blob_error::InvalidDimensionsSnafu { width, height }
        );

        ensure!(palette_len > 0, blob_error::EmptyPaletteSnafu);

        let palette = take(&mut input, palette_len, "palette")?;
        let palette = Palette::from_sorted(palette).context(blob_error::InvalidPaletteSnafu)?;

        let offsets = take(&mut input, usize::from(height) * 2, "row offsets")?;
        let data_len = LittleEndian::read_u16(take(&mut input, 2, "data length")?);
        let data = take(&mut input, usize::from(data_len), "data")?;
        ensure!(
            input.is_empty(),
            blob_error::TrailingDataSnafu { len: input.len() }
        );

        let image = Self {
            dims,
            palette,
            offsets,
            data,
        };
        image.check_offsets()?;

        Ok(image)
    }

    fn check_offsets(&self) -> Result<(), BlobError> {
        let mut min = 0;
        for row in 0..usize::from(self.dims.height) {
            let offset = self.raw_offset(row);
            // the first row starts the stream
            let max = if row == 0 { 0 } else { self.data.len() };
            ensure!(
                offset >= min && offset <= max,
                blob_error::InvalidOffsetsSnafu {
                    row,
                    offset,
                    min,
                    max
                }
            );
            min = offset;
        }
        Ok(())
    }

    #[inline]
    fn raw_offset(&self, row: usize) -> usize {
        usize::from(LittleEndian::read_u16(&self.offsets[row * 2..]))
    }

    /// Returns the stream offset of row `y`.
    pub fn row_offset(&self, y: usize) -> Option<u16> {
        (y < usize::from(self.dims.height)).then(|| self.raw_offset(y) as u16)
    }

    /// The encoded stream of all rows.
    #[inline]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Decodes row `y` into `output`, returning the number of stream bytes consumed.
    pub fn decode_row(&self, y: usize, output: impl RowOutput) -> Result<usize, DecodeError> {
        let Some(offset) = self.row_offset(y) else {
            return Err(DecodeError::RowOutOfBounds {
                row: y,
                height: usize::from(self.dims.height),
            });
        };
        decode_row(self.data, usize::from(offset), self.dims.width, output)
    }
}
