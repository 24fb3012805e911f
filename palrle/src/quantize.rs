use crate::{
    consts::{MAX_INDEX, MAX_PALETTE_LEN},
    palette::Palette,
    Dimensions,
};
use alloc::vec::Vec;
use core::slice::ChunksExact;
use log::debug;
use snafu::{ensure, Snafu};

#[derive(Debug, Snafu)]
#[snafu(module)]
pub enum QuantizeError {
    #[snafu(display(
        "image dimensions don't match the number of samples: {width} * {height} == {} samples, but {sample_count} samples were given",
        width * height
    ))]
    InvalidDimensions {
        width: usize,
        height: usize,
        sample_count: usize,
    },
    #[snafu(display(
        "image has {distinct} distinct sample values, at most {} are supported",
        MAX_PALETTE_LEN
    ))]
    PaletteOverflow { distinct: usize },
}

#[derive(Debug, Snafu)]
#[snafu(module)]
pub enum GridError {
    #[snafu(display(
        "grid dimensions don't match the number of indices: {width} * {height} == {} indices, but {index_count} indices were given",
        width * height
    ))]
    InvalidGridDimensions {
        width: usize,
        height: usize,
        index_count: usize,
    },
    #[snafu(display("index {index} at position {position} exceeds the largest index {}", MAX_INDEX))]
    IndexOutOfRange { index: u8, position: usize },
}

/// Palette indices of an image, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexGrid {
    dims: Dimensions,
    indices: Vec<u8>,
}

impl IndexGrid {
    /// Wraps already quantized indices. Every index must be at most [`MAX_INDEX`].
    pub fn new(width: u16, height: u16, indices: Vec<u8>) -> Result<Self, GridError> {
        let dims = Dimensions::new(width, height);
        ensure!(
            !dims.is_empty() && dims.pixel_count() == indices.len(),
            grid_error::InvalidGridDimensionsSnafu {
                width,
                height,
                index_count: indices.len()
            }
        );

        if let Some(position) = indices.iter().position(|&index| index > MAX_INDEX) {
            return grid_error::IndexOutOfRangeSnafu {
                index: indices[position],
                position,
            }
            .fail();
        }

        Ok(Self { dims, indices })
    }

    #[inline]
    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    #[inline]
    pub fn width(&self) -> u16 {
        self.dims.width
    }

    #[inline]
    pub fn height(&self) -> u16 {
        self.dims.height
    }

    /// Returns row `y`, or `None` if it is out of bounds.
    pub fn row(&self, y: usize) -> Option<&[u8]> {
        let width = usize::from(self.dims.width);
        self.indices.get(y * width..(y + 1) * width)
    }

    pub fn rows(&self) -> ChunksExact<'_, u8> {
        self.indices.chunks_exact(usize::from(self.dims.width))
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.indices
    }

    /// Largest index used anywhere in the grid.
    pub fn max_index(&self) -> u8 {
        self.indices.iter().copied().max().unwrap_or(0)
    }
}

/// Reduces raw samples to a palette of their distinct values and a grid of palette indices.
///
/// The palette is sorted ascending, so the result only depends on the set of sample values and
/// encoding the same image twice yields identical output.
pub fn quantize(
    width: u16,
    height: u16,
    samples: &[u8],
) -> Result<(Palette, IndexGrid), QuantizeError> {
    let dims = Dimensions::new(width, height);
    ensure!(
        !dims.is_empty() && dims.pixel_count() == samples.len(),
        quantize_error::InvalidDimensionsSnafu {
            width,
            height,
            sample_count: samples.len()
        }
    );

    let mut seen = [false; 256];
    for &sample in samples {
        seen[usize::from(sample)] = true;
    }

    let distinct = seen.iter().filter(|&&s| s).count();
    ensure!(
        distinct <= MAX_PALETTE_LEN,
        quantize_error::PaletteOverflowSnafu { distinct }
    );

    // `seen` is walked in sample order, so the palette comes out sorted
    let mut values = [0u8; MAX_PALETTE_LEN];
    let mut lut = [0u8; 256];
    let mut len = 0;
    for sample in 0..seen.len() {
        if seen[sample] {
            values[len] = sample as u8;
            lut[sample] = len as u8;
            len += 1;
        }
    }

    let palette = Palette::from_raw(values, len as u8);
    debug!("Quantized {width}x{height} image to {len} palette entries");

    let indices = samples.iter().map(|&s| lut[usize::from(s)]).collect();

    Ok((palette, IndexGrid { dims, indices }))
}
