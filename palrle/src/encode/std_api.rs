use crate::{
    consts::BLOB_MAGIC,
    encode::{EncodeError, EncodedImage},
};
use byteorder::{LittleEndian, WriteBytesExt};
use snafu::{ResultExt, Snafu};
use std::io::Write;

#[derive(Debug, Snafu)]
pub enum WriteBlobError {
    #[snafu(display("failed to write blob"))]
    WriteIo { source: std::io::Error },
    #[snafu(context(false), display("failed to encode blob: {source}"))]
    Encode { source: EncodeError },
}

impl EncodedImage {
    /// Writes the image in the binary container format.
    pub fn write_blob<W: Write>(&self, mut w: W) -> Result<(), WriteBlobError> {
        macro_rules! w {
            ($e:expr) => {
                $e.context(WriteIoSnafu)
            };
        }

        let data_len = self.blob_data_len()?;

        w!(w.write_all(&BLOB_MAGIC))?;
        w!(w.write_u16::<LittleEndian>(self.dims.width))?;
        w!(w.write_u16::<LittleEndian>(self.dims.height))?;
        w!(w.write_u8(self.palette.len() as u8))?;
        w!(w.write_all(self.palette.as_slice()))?;
        for &offset in &self.row_offsets {
            w!(w.write_u16::<LittleEndian>(offset))?;
        }
        w!(w.write_u16::<LittleEndian>(data_len))?;
        w!(w.write_all(&self.data))?;

        Ok(())
    }
}
