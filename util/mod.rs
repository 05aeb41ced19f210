#![allow(dead_code)]

use palette::Srgba;
use palettize::ImageBuf;
use rand::{Rng as _, SeedableRng as _};
use rand_xoshiro::Xoroshiro128PlusPlus;
use std::sync::OnceLock;

/// Generate a `width * height` image of smooth gradients with a little per-pixel noise, so that
/// neighboring pixels are similar but not identical, like a photograph.
pub fn synthetic_image(width: u32, height: u32, seed: u64) -> ImageBuf<Srgba<u8>> {
    let mut rng = Xoroshiro128PlusPlus::seed_from_u64(seed);
    let mut pixels = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        for x in 0..width {
            let noise = rng.random::<[u8; 4]>().map(|n| n % 16);
            let r = (x * 239 / width.max(1)) as u8;
            let g = (y * 239 / height.max(1)) as u8;
            let b = ((x + y) * 119 / (width + height).max(1)) as u8;
            let a = if (x / 64 + y / 64) % 4 == 0 { 128 } else { 239 };
            pixels.push(Srgba::new(
                r + noise[0],
                g + noise[1],
                b + noise[2],
                a + noise[3],
            ));
        }
    }
    ImageBuf::new(width, height, pixels).unwrap()
}

static BENCHMARK_IMAGES: OnceLock<Vec<(String, ImageBuf<Srgba<u8>>)>> = OnceLock::new();

pub fn benchmark_images() -> &'static [(String, ImageBuf<Srgba<u8>>)] {
    BENCHMARK_IMAGES.get_or_init(|| {
        [(3840, 2160), (1920, 1080), (1280, 720), (640, 480)]
            .into_iter()
            .enumerate()
            .map(|(seed, (width, height))| {
                (format!("{width}x{height}"), synthetic_image(width, height, seed as u64))
            })
            .collect()
    })
}
