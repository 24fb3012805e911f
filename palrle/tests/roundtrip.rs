use nanorand::{Rng, WyRand};
use palrle::{
    decode::SliceRowOutput, encode::encode_row, quantize::quantize, EncodedImage, EncodedImageRef,
    IndexGrid, PaddedImage,
};

/// Index grids with a mix of short runs, escaped runs and runs longer than 255 pixels.
fn test_grids() -> Vec<IndexGrid> {
    let mut rng = WyRand::new_seed(0x2545_f491);
    let mut grids = Vec::new();

    for &(width, height, max_run) in &[
        (1, 1, 1),
        (1, 17, 1),
        (7, 3, 4),
        (64, 32, 20),
        (300, 5, 300),
        (511, 4, 600),
        (1000, 2, 1000),
    ] {
        let mut indices = Vec::with_capacity(width * height);
        while indices.len() < width * height {
            let value = rng.generate_range(0..16u8);
            let run = rng.generate_range(1..=max_run);
            indices.extend(std::iter::repeat(value).take(run));
        }
        indices.truncate(width * height);

        grids.push(IndexGrid::new(width as u16, height as u16, indices).unwrap());
    }

    grids
}

fn full_palette() -> palrle::Palette {
    palrle::Palette::from_sorted(&(0..16u8).map(|i| i * 16).collect::<Vec<u8>>()).unwrap()
}

#[test]
fn roundtrip() {
    for grid in test_grids() {
        let image = EncodedImage::encode(full_palette(), &grid).unwrap();
        let decoded = image.decode_to_vec().unwrap();
        assert_eq!(grid.as_slice(), decoded, "decoding failed");

        let width = usize::from(grid.width());
        for (y, row) in grid.rows().enumerate() {
            let mut out = vec![0xAA; width];
            let consumed = image.decode_row(y, SliceRowOutput::new(&mut out)).unwrap();
            assert_eq!(row, out, "row {y} decoding failed");
            assert_eq!(consumed, image.row(y).unwrap().len());
        }
    }
}

#[test]
fn row_offsets_track_row_lengths() {
    for grid in test_grids() {
        let image = EncodedImage::encode(full_palette(), &grid).unwrap();
        assert_eq!(image.row_offsets.len(), usize::from(grid.height()));
        assert_eq!(image.row_offsets[0], 0);

        let mut expected = 0;
        for (y, row) in grid.rows().enumerate() {
            assert_eq!(usize::from(image.row_offsets[y]), expected);
            let mut w = Vec::new();
            expected += encode_row(row, &mut w).unwrap();
        }
        assert_eq!(image.data.len(), expected);
    }
}

#[test]
fn blob_roundtrip() {
    for grid in test_grids() {
        let image = EncodedImage::encode(full_palette(), &grid).unwrap();

        let blob = image.to_blob().unwrap();
        let mut written = Vec::new();
        image.write_blob(&mut written).unwrap();
        assert_eq!(blob, written, "blob mismatch");

        let view = EncodedImageRef::parse(&blob).unwrap();
        assert_eq!(view.dims, image.dims);
        assert_eq!(view.palette, image.palette);
        assert_eq!(view.data(), &image.data[..]);

        for (y, row) in grid.rows().enumerate() {
            assert_eq!(view.row_offset(y), Some(image.row_offsets[y]));
            let mut out = Vec::new();
            view.decode_row(y, &mut out).unwrap();
            assert_eq!(row, out, "blob row {y} decoding failed");
        }
    }
}

#[test]
fn padded_roundtrip() {
    for grid in test_grids() {
        let image = PaddedImage::encode(full_palette(), &grid).unwrap();
        assert_eq!(image.data.len(), image.stride * usize::from(grid.height()));

        for (y, row) in grid.rows().enumerate() {
            let mut out = Vec::new();
            image.decode_row(y, &mut out).unwrap();
            assert_eq!(row, out, "padded row {y} decoding failed");
        }
    }
}

#[test]
fn samples_roundtrip_and_determinism() {
    let mut rng = WyRand::new_seed(7);
    let levels = [0u8, 17, 34, 60, 99, 128, 129, 200, 230, 250, 255];
    let (width, height) = (97u16, 41u16);
    let samples = (0..usize::from(width) * usize::from(height))
        .map(|i| levels[(i / 13 + rng.generate_range(0..2usize)) % levels.len()])
        .collect::<Vec<_>>();

    let first = EncodedImage::from_samples(width, height, &samples).unwrap();
    let second = EncodedImage::from_samples(width, height, &samples).unwrap();
    assert_eq!(first, second, "encoding is not deterministic");
    assert_eq!(first.to_blob().unwrap(), second.to_blob().unwrap());

    let (palette, grid) = quantize(width, height, &samples).unwrap();
    let (palette2, grid2) = quantize(width, height, &samples).unwrap();
    assert_eq!(palette, palette2);
    assert_eq!(grid, grid2);
    assert_eq!(palette.as_slice(), &levels[..]);

    assert_eq!(first.decode_to_samples().unwrap(), samples);
}
