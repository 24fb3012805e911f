use crate::consts::MAX_PALETTE_LEN;
use snafu::{ensure, Snafu};

#[derive(Debug, Snafu)]
#[snafu(module)]
pub enum PaletteError {
    #[snafu(display("palette has {len} entries, at most {} are supported", MAX_PALETTE_LEN))]
    TooManyEntries { len: usize },
    #[snafu(display("palette entry {position} is not greater than the entry before it"))]
    NotAscending { position: usize },
}

/// The distinct sample values of an image, sorted ascending.
///
/// The position of a value is the index stored in the encoded stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Palette {
    entries: [u8; MAX_PALETTE_LEN],
    len: u8,
}

impl Palette {
    pub const fn new() -> Self {
        Self {
            entries: [0; MAX_PALETTE_LEN],
            len: 0,
        }
    }

    /// Builds a palette from values that are already strictly ascending.
    pub fn from_sorted(values: &[u8]) -> Result<Self, PaletteError> {
        ensure!(
            values.len() <= MAX_PALETTE_LEN,
            palette_error::TooManyEntriesSnafu { len: values.len() }
        );

        if let Some(position) = values
            .windows(2)
            .position(|pair| pair[0] >= pair[1])
            .map(|i| i + 1)
        {
            return palette_error::NotAscendingSnafu { position }.fail();
        }

        let mut entries = [0; MAX_PALETTE_LEN];
        entries[..values.len()].copy_from_slice(values);

        Ok(Self {
            entries,
            len: values.len() as u8,
        })
    }

    /// `entries[..len]` must be strictly ascending and `len` at most [`MAX_PALETTE_LEN`].
    pub(crate) const fn from_raw(entries: [u8; MAX_PALETTE_LEN], len: u8) -> Self {
        Self { entries, len }
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.entries[..usize::from(self.len)]
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the sample value stored at `index`.
    #[inline]
    pub fn get(&self, index: u8) -> Option<u8> {
        self.as_slice().get(usize::from(index)).copied()
    }

    /// Returns the palette index of `sample`, if it is part of the palette.
    pub fn index_of(&self, sample: u8) -> Option<u8> {
        self.as_slice()
            .binary_search(&sample)
            .ok()
            .map(|index| index as u8)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new()
    }
}
