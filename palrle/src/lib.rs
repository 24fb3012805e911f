//! Reference implementation for the PALRLE texture format.
//!
//! PALRLE stores a grayscale image as a small palette of at most 16 sample values plus a
//! run-length encoded stream of palette indices. It is meant to be generated at build time and
//! embedded into firmware, where a decoder without any allocation has to expand single rows on
//! demand.
//!
//! # Palette
//!
//! The palette holds the distinct sample values of the image, sorted ascending. The position of a
//! value in the palette is the index stored in the stream, so indices always fit into 4 bits. An
//! image with more than 16 distinct values cannot be encoded.
//!
//! # Rows
//!
//! Every row is encoded on its own, as a sequence of run tokens (see [consts]). There is no
//! end-of-row marker: a decoder replays tokens until it has produced exactly `width` pixels.
//!
//! Rows are concatenated into one stream. A table of 16-bit offsets, one per row, points at the
//! first token of each row, so any row can be decoded without touching the rows before it. This
//! bounds the whole stream to 65535 bytes.
//!
//! A legacy layout without the offset table is available as well, where every row is padded with
//! zero bytes to the length of the longest row and located by `y * stride`.
//!
//! # Container
//!
//! For tooling, an encoded image can be stored in a small little-endian container:
//!
//! ```plain
//! "prle" | width: u16 | height: u16 | palette_len: u8 | palette
//!        | offsets: [u16; height] | data_len: u16 | data
//! ```
#![cfg_attr(not(any(test, feature = "std")), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;
#[cfg(feature = "alloc")]
pub mod encode;
#[cfg(feature = "alloc")]
pub mod quantize;

pub mod decode;
pub mod palette;
pub mod token;

pub use decode::blob::EncodedImageRef;
#[cfg(feature = "alloc")]
pub use encode::{EncodedImage, PaddedImage};
pub use palette::Palette;
#[cfg(feature = "alloc")]
pub use quantize::IndexGrid;
pub use token::{Run, Token};

/// Width and height of an image, in pixels. Both are non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u16,
    pub height: u16,
}

impl Dimensions {
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    #[inline]
    pub const fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

pub mod consts {
    /// A run of 1 to 15 pixels.
    ///
    /// ```plain
    /// .- SHORT RUN -------------.
    /// |         Byte[0]         |
    /// |  7  6  5  4  3  2  1  0 |
    /// |-------------+-----------|
    /// |  length - 1 |   index   |
    /// `-------------------------`
    /// ```
    ///
    /// - 4-bit run length, stored with a bias of -1: 0..14
    /// - 4-bit palette index: 0..15
    /// - An encoder must use this form for every run of 15 pixels or less.
    pub const MAX_SHORT_RUN: usize = 15;

    /// A run of 1 to 255 pixels.
    ///
    /// ```plain
    /// .- ESCAPED RUN -------------------------------------.
    /// |         Byte[0]         |         Byte[1]         |
    /// |  7  6  5  4  3  2  1  0 |  7  6  5  4  3  2  1  0 |
    /// |-------------+-----------+-------------------------|
    /// |  1  1  1  1 |   index   |         length          |
    /// `---------------------------------------------------`
    /// ```
    ///
    /// - 4-bit tag b1111
    /// - 4-bit palette index: 0..15
    /// - 8-bit raw run length
    /// - An encoder only uses this form for runs longer than 15 pixels. Runs longer than 255
    ///   pixels are split into several escaped runs of the same index, even where the last piece
    ///   would fit a short run.
    pub const ESCAPE_TAG: u8 = 0b1111_0000;

    /// Longest run a single token can describe.
    pub const MAX_RUN: usize = 255;

    /// Maximum number of palette entries, and thereby the number of distinct indices.
    pub const MAX_PALETTE_LEN: usize = 16;

    /// Largest valid palette index.
    pub const MAX_INDEX: u8 = (MAX_PALETTE_LEN - 1) as u8;

    /// Largest stream length addressable by the 16-bit row offset table.
    pub const MAX_STREAM_LEN: usize = u16::MAX as usize;

    /// Magic bytes of the binary container.
    pub const BLOB_MAGIC: [u8; 4] = *b"prle";
}
