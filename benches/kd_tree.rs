#[path = "../util/mod.rs"]
mod util;

use criterion::{
    Bencher, BenchmarkId, Criterion, SamplingMode, criterion_group, criterion_main,
    measurement::WallTime,
};
use palette::Srgba;
use palettize::{
    ImageBuf, KdTreeColorMap, PaletteSize,
    wu::{Precision, WuQuantizer},
};
use std::time::Duration;
use util::benchmark_images;

fn bench(
    c: &mut Criterion,
    group: &str,
    images: &[(String, ImageBuf<Srgba<u8>>)],
    mut f: impl FnMut(&mut Bencher<'_, WallTime>, &(PaletteSize, &ImageBuf<Srgba<u8>>)),
) {
    let mut group = c.benchmark_group(group);
    group
        .sample_size(30)
        .noise_threshold(0.05)
        .sampling_mode(SamplingMode::Flat)
        .warm_up_time(Duration::from_millis(500));

    for k in [PaletteSize::MAX, PaletteSize::from_u8(64), PaletteSize::from_u8(16)] {
        for (name, image) in images {
            group.bench_with_input(BenchmarkId::new(k.to_string(), name), &(k, image), &mut f);
        }
    }
}

fn color_map(image: &ImageBuf<Srgba<u8>>, k: PaletteSize) -> KdTreeColorMap<Srgba<u8>> {
    let palette = WuQuantizer::<Srgba<u8>>::run_image_par(image.as_ref(), Precision::DEFAULT)
        .unwrap()
        .palette(k);

    KdTreeColorMap::new(palette).unwrap()
}

fn kd_tree_build(c: &mut Criterion) {
    bench(c, "kd_tree_build", benchmark_images(), |b, &(k, image)| {
        let palette = color_map(image, k).into_palette();
        b.iter(|| KdTreeColorMap::new(palette.clone()).unwrap())
    })
}

fn kd_tree_remap_single(c: &mut Criterion) {
    bench(c, "kd_tree_remap_single", benchmark_images(), |b, &(k, image)| {
        let color_map = color_map(image, k);
        b.iter(|| image.map_to_indexed(&color_map))
    })
}

fn kd_tree_remap_par(c: &mut Criterion) {
    bench(c, "kd_tree_remap_par", benchmark_images(), |b, &(k, image)| {
        let color_map = color_map(image, k);
        b.iter(|| image.map_to_indexed_par(&color_map))
    })
}

criterion_group!(benches, kd_tree_build, kd_tree_remap_single, kd_tree_remap_par);
criterion_main!(benches);
