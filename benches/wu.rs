#[path = "../util/mod.rs"]
mod util;

use criterion::{
    Bencher, BenchmarkId, Criterion, SamplingMode, criterion_group, criterion_main,
    measurement::WallTime,
};
use palette::Srgba;
use palettize::{
    ImageBuf, PaletteSize,
    wu::{Precision, WuQuantizer},
};
use std::time::Duration;
use util::benchmark_images;

// Wu running time scales with image size and is barely affected by palette size.
const K: PaletteSize = PaletteSize::MAX;

type Wu = WuQuantizer<Srgba<u8>>;

fn bench(
    c: &mut Criterion,
    group: &str,
    images: &[(String, ImageBuf<Srgba<u8>>)],
    mut f: impl FnMut(&mut Bencher<'_, WallTime>, &ImageBuf<Srgba<u8>>),
) {
    let mut group = c.benchmark_group(group);
    group
        .sample_size(30)
        .noise_threshold(0.05)
        .sampling_mode(SamplingMode::Flat)
        .warm_up_time(Duration::from_millis(500));

    for (name, image) in images {
        group.bench_with_input(BenchmarkId::from_parameter(name), image, &mut f);
    }
}

fn wu_palette_single(c: &mut Criterion) {
    bench(c, "wu_palette_single", benchmark_images(), |b, image| {
        b.iter(|| {
            Wu::run_image(image.as_ref(), Precision::DEFAULT)
                .unwrap()
                .palette(K)
        })
    })
}

fn wu_remap_single(c: &mut Criterion) {
    bench(c, "wu_remap_single", benchmark_images(), |b, image| {
        b.iter(|| {
            let color_map = Wu::run_image(image.as_ref(), Precision::DEFAULT)
                .unwrap()
                .color_map(K)
                .unwrap();

            image.map_to_indexed(color_map)
        })
    })
}

fn wu_palette_par(c: &mut Criterion) {
    bench(c, "wu_palette_par", benchmark_images(), |b, image| {
        b.iter(|| {
            Wu::run_image_par(image.as_ref(), Precision::DEFAULT)
                .unwrap()
                .palette(K)
        })
    })
}

fn wu_remap_par(c: &mut Criterion) {
    bench(c, "wu_remap_par", benchmark_images(), |b, image| {
        b.iter(|| {
            let color_map = Wu::run_image_par(image.as_ref(), Precision::DEFAULT)
                .unwrap()
                .color_map(K)
                .unwrap();

            image.map_to_indexed_par(color_map)
        })
    })
}

fn wu_palette_high_precision(c: &mut Criterion) {
    let precision = Precision::new(6, 4).unwrap();
    bench(c, "wu_palette_high_precision", benchmark_images(), |b, image| {
        b.iter(|| {
            Wu::run_image_par(image.as_ref(), precision)
                .unwrap()
                .palette(K)
        })
    })
}

criterion_group!(
    benches,
    wu_palette_single,
    wu_remap_single,
    wu_palette_par,
    wu_remap_par,
    wu_palette_high_precision,
);
criterion_main!(benches);
