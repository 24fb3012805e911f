use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use nanorand::{Rng, WyRand};
use palrle::{
    decode::{LutRowOutput, SliceRowOutput},
    encode::encode_row,
    quantize::quantize,
    EncodedImage,
};

/// Cloud-like test textures: soft horizontal bands with a little noise on the edges.
fn textures() -> Vec<(&'static str, u16, u16, Vec<u8>)> {
    let mut rng = WyRand::new_seed(0x9E37_79B9);

    let mut textures = Vec::new();
    for &(name, width, height, band) in &[
        ("flat", 320u16, 64u16, 320usize),
        ("bands", 320, 64, 24),
        ("noisy", 320, 64, 3),
    ] {
        let samples = (0..usize::from(width) * usize::from(height))
            .map(|i| {
                let x = i % usize::from(width);
                let level = (x / band + rng.generate_range(0..2usize)) % 16;
                (level * 17) as u8
            })
            .collect();
        textures.push((name, width, height, samples));
    }
    textures
}

fn encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    for (name, width, height, samples) in textures() {
        group.throughput(criterion::Throughput::Elements(samples.len() as u64));
        group.bench_with_input(BenchmarkId::new("image", name), &samples, |b, samples| {
            b.iter(|| EncodedImage::from_samples(width, height, samples).unwrap())
        });

        let (_, grid) = quantize(width, height, &samples).unwrap();
        group.bench_with_input(BenchmarkId::new("rows", name), &grid, |b, grid| {
            let mut w = Vec::with_capacity(grid.as_slice().len());
            b.iter(|| {
                w.clear();
                for row in grid.rows() {
                    encode_row(row, &mut w).unwrap();
                }
            })
        });
    }

    group.finish();
}

fn decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for (name, width, height, samples) in textures() {
        let image = EncodedImage::from_samples(width, height, &samples).unwrap();
        let rows = usize::from(height);

        group.throughput(criterion::Throughput::Elements(samples.len() as u64));
        group.bench_with_input(BenchmarkId::new("indices", name), &image, |b, image| {
            let mut row = vec![0; usize::from(width)];
            b.iter(|| {
                for y in 0..rows {
                    image.decode_row(y, SliceRowOutput::new(&mut row)).unwrap();
                }
            })
        });
        group.bench_with_input(BenchmarkId::new("rgb565 lut", name), &image, |b, image| {
            let mut lut = [0u16; 16];
            for (i, &value) in image.palette.as_slice().iter().enumerate() {
                let v = u16::from(value);
                lut[i] = ((v >> 3) << 11) | ((v >> 2) << 5) | (v >> 3);
            }
            let mut row = vec![0; usize::from(width)];
            b.iter(|| {
                for y in 0..rows {
                    image
                        .decode_row(y, LutRowOutput::new(&lut[..image.palette.len()], &mut row))
                        .unwrap();
                }
            })
        });
    }

    group.finish();
}

criterion_group!(benches, encode, decode);
criterion_main!(benches);
