use super::{Axis, Cube, Histogram, Moment, Precision, WuColorMap};
use crate::{ImageRef, Palette, PaletteSize, QuantizeError, Region, RgbaPixel};
use alloc::{boxed::Box, vec::Vec};
use core::marker::PhantomData;

/// Wu's color quantizer over a histogram of RGBA colors.
///
/// Slices, [`ImageRef`]s, and [`Region`]s are supported as inputs via:
/// - [`run_slice`](Self::run_slice)
/// - [`run_image`](Self::run_image)
/// - [`run_region`](Self::run_region)
///
/// Parallel versions are also available if the `threads` feature is enabled.
///
/// To produce the final output, use one of the following:
/// - [`palette`](Self::palette)
/// - [`palette_and_counts`](Self::palette_and_counts)
/// - [`color_map`](Self::color_map)
///
/// These functions take a reference to `self`, and so can be called multiple times on the same
/// [`WuQuantizer`] with different [`PaletteSize`]s.
///
/// # Examples
///
/// ```
/// # fn main() -> Result<(), palettize::QuantizeError> {
/// use palettize::{PaletteSize, wu::{Precision, WuQuantizer}};
/// use palette::Srgba;
///
/// let input = vec![Srgba::new(0u8, 0, 0, 255), Srgba::new(255, 255, 255, 255)];
/// let quantizer = WuQuantizer::<Srgba<u8>>::run_slice(&input, Precision::DEFAULT)?;
/// let palette = quantizer.palette(PaletteSize::MAX);
/// assert_eq!(palette.len(), 2);
///
/// let color_map = quantizer.color_map(PaletteSize::MAX)?;
/// assert_eq!(palette[color_map.classify(input[1])], input[1]);
/// # Ok(())
/// # }
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct WuQuantizer<Color> {
    /// The output color type.
    color: PhantomData<Color>,
    /// The cumulative histogram.
    hist: Histogram,
}

impl<Color: RgbaPixel> WuQuantizer<Color> {
    /// Create a [`WuQuantizer`] from a histogram of raw (not yet cumulative) counts.
    fn from_raw_histogram(mut hist: Histogram) -> Self {
        hist.calc_cumulative_moments();
        Self { color: PhantomData, hist }
    }

    /// Run Wu's quantization method on a slice of pixels.
    ///
    /// # Errors
    ///
    /// Returns [`QuantizeError::AllocationFailed`] if the histogram could not be allocated.
    pub fn run_slice<P: RgbaPixel>(pixels: &[P], precision: Precision) -> Result<Self, QuantizeError> {
        let mut hist = Histogram::new(precision)?;
        hist.add_pixels(pixels);
        Ok(Self::from_raw_histogram(hist))
    }

    /// Run Wu's quantization method on an [`ImageRef`].
    ///
    /// # Errors
    ///
    /// Returns [`QuantizeError::AllocationFailed`] if the histogram could not be allocated.
    pub fn run_image<P: RgbaPixel>(
        image: ImageRef<'_, P>,
        precision: Precision,
    ) -> Result<Self, QuantizeError> {
        Self::run_slice(image.as_slice(), precision)
    }

    /// Run Wu's quantization method on a rectangular [`Region`] of an image.
    ///
    /// # Errors
    ///
    /// Returns [`QuantizeError::AllocationFailed`] if the histogram could not be allocated.
    pub fn run_region<P: RgbaPixel>(
        region: Region<'_, P>,
        precision: Precision,
    ) -> Result<Self, QuantizeError> {
        let mut hist = Histogram::new(precision)?;
        for row in region.rows() {
            hist.add_pixels(row);
        }
        Ok(Self::from_raw_histogram(hist))
    }

    /// Returns the cumulative histogram.
    #[inline]
    pub fn histogram(&self) -> &Histogram {
        &self.hist
    }

    /// Find the best position to cut `cube` along `axis`.
    ///
    /// Returns the cut position, or `None` if every position leaves one side empty, along with
    /// the score of the cut.
    fn maximize(&self, cube: &Cube, axis: Axis, whole: &Moment) -> (Option<u8>, f64) {
        let i = axis.index();
        let bottom = self.hist.bottom(cube, axis);

        let mut max = 0.0;
        let mut cut = None;

        for position in (cube.min()[i] + 1)..cube.max()[i] {
            let half = bottom + self.hist.top(cube, axis, position);
            if half.weight == 0 {
                continue;
            }

            let rest = *whole - half;
            if rest.weight == 0 {
                continue;
            }

            #[allow(clippy::cast_precision_loss)]
            let score = half.sum_of_squares() / half.weight as f64
                + rest.sum_of_squares() / rest.weight as f64;

            if score > max {
                max = score;
                cut = Some(position);
            }
        }

        (cut, max)
    }

    /// Cut `set1` along the axis and position that best separates its colors.
    ///
    /// On success, `set1` keeps the lower part and `set2` is overwritten with the upper part.
    /// Returns `false` if `set1` cannot be cut.
    ///
    /// # Panics
    ///
    /// Panics if `set1` contains no pixels.
    fn cut(&self, set1: &mut Cube, set2: &mut Cube) -> bool {
        let whole = self.hist.volume(set1);
        assert!(whole.weight > 0, "attempted to cut an empty box");

        let mut best = (Axis::Red, None, f64::NEG_INFINITY);
        for axis in Axis::ALL {
            let (cut, score) = self.maximize(set1, axis, &whole);
            if score > best.2 {
                best = (axis, cut, score);
            }
        }

        let (axis, cut, _) = best;
        let Some(position) = cut else {
            return false;
        };

        *set2 = set1.split(axis, position);
        log::trace!("cut axis {} at bin {position}", axis.index());
        true
    }

    /// Returns the variance of the pixels in `cube`, or zero if the box spans a single bin.
    fn variance(&self, cube: &Cube) -> f64 {
        if cube.volume() > 1 {
            self.hist.volume(cube).variance()
        } else {
            0.0
        }
    }

    /// Split the histogram into at most `max_colors` disjoint boxes.
    ///
    /// Returns no boxes if the histogram is empty or `max_colors` is zero.
    pub(crate) fn cubes(&self, max_colors: PaletteSize) -> Vec<Cube> {
        let max_colors = max_colors.as_usize();
        let whole = Cube::whole(self.hist.precision());
        if max_colors == 0 || self.hist.volume(&whole).weight == 0 {
            return Vec::new();
        }

        let mut cubes = Vec::with_capacity(max_colors);
        let mut variances = Vec::with_capacity(max_colors);
        cubes.push(whole);
        variances.push(0.0);

        let mut next = 0;
        while cubes.len() < max_colors {
            let mut lower = cubes[next];
            let mut upper = lower;
            if self.cut(&mut lower, &mut upper) {
                cubes[next] = lower;
                variances[next] = self.variance(&lower);
                cubes.push(upper);
                variances.push(self.variance(&upper));
            } else {
                variances[next] = 0.0;
            }

            let mut max = variances[0];
            next = 0;
            for (i, &variance) in variances.iter().enumerate().skip(1) {
                if variance > max {
                    max = variance;
                    next = i;
                }
            }

            if max <= 0.0 {
                break;
            }
        }

        log::debug!("split the histogram into {} boxes", cubes.len());

        cubes
    }

    /// Returns the mean color and pixel count of `cube`.
    fn color_and_count(&self, cube: &Cube) -> (Color, u32) {
        let moment = self.hist.volume(cube);
        debug_assert!(moment.weight > 0);
        let color = moment.mean().map_or(Color::from_rgba8([0; 4]), Color::from_vector);
        (color, moment.count())
    }

    /// Compute the color palette.
    ///
    /// The palette has at most `max_colors` colors, and at least one color if the input was not
    /// empty and `max_colors` is not zero.
    #[must_use]
    pub fn palette(&self, max_colors: PaletteSize) -> Palette<Color> {
        let cubes = self.cubes(max_colors);
        Palette::new_unchecked(cubes.iter().map(|cube| self.color_and_count(cube).0).collect())
    }

    /// Compute the color palette and the number of pixels assigned to each palette color.
    ///
    /// A count saturates at `u32::MAX` if a box holds more pixels than that.
    #[must_use]
    pub fn palette_and_counts(&self, max_colors: PaletteSize) -> (Palette<Color>, Vec<u32>) {
        let cubes = self.cubes(max_colors);
        let (palette, counts) = cubes.iter().map(|cube| self.color_and_count(cube)).unzip();
        (Palette::new_unchecked(palette), counts)
    }

    /// Compute the color map which assigns each histogram bin to a palette color.
    ///
    /// # Errors
    ///
    /// Returns [`QuantizeError::EmptyPalette`] if the palette would be empty, i.e., the input was
    /// empty or `max_colors` is zero. Returns [`QuantizeError::AllocationFailed`] if the tag table
    /// could not be allocated.
    pub fn color_map(&self, max_colors: PaletteSize) -> Result<WuColorMap<Color>, QuantizeError> {
        let cubes = self.cubes(max_colors);
        if cubes.is_empty() {
            return Err(QuantizeError::EmptyPalette);
        }

        let precision = self.hist.precision();
        let len = precision.num_bins();
        let mut tags: Box<[u8]> = bytemuck::allocation::try_zeroed_slice_box(len)
            .map_err(|()| QuantizeError::AllocationFailed { bytes: len })?;

        for (k, cube) in cubes.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)] // at most 256 cubes
            let k = k as u8;
            let (min, max) = (cube.min(), cube.max());
            for r in min[0] + 1..=max[0] {
                for g in min[1] + 1..=max[1] {
                    for b in min[2] + 1..=max[2] {
                        for a in min[3] + 1..=max[3] {
                            tags[precision.index([r, g, b, a])] = k;
                        }
                    }
                }
            }
        }

        let (palette, counts) = cubes.iter().map(|cube| self.color_and_count(cube)).unzip();
        Ok(WuColorMap::new(Palette::new_unchecked(palette), counts, precision, tags))
    }
}

#[cfg(feature = "threads")]
mod parallel {
    use super::WuQuantizer;
    use crate::{ImageRef, QuantizeError, RgbaPixel, wu::{Histogram, Precision}};
    use rayon::prelude::*;

    impl<Color: RgbaPixel> WuQuantizer<Color> {
        /// Return the per thread chunk size based on the length.
        fn chunk_size(len: usize, precision: Precision) -> usize {
            let chunk_size = len
                .div_ceil(rayon::current_num_threads())
                .max(precision.num_bins() * 4);
            let num_chunks = len.div_ceil(chunk_size).max(1);
            len.div_ceil(num_chunks).max(1)
        }

        /// Run Wu's quantization method on a slice of pixels in parallel.
        ///
        /// Each rayon task accumulates a private histogram which are then merged. The result is
        /// identical to [`run_slice`](WuQuantizer::run_slice).
        ///
        /// # Errors
        ///
        /// Returns [`QuantizeError::AllocationFailed`] if a histogram could not be allocated.
        pub fn run_slice_par<P: RgbaPixel>(
            pixels: &[P],
            precision: Precision,
        ) -> Result<Self, QuantizeError> {
            let chunk_size = Self::chunk_size(pixels.len(), precision);
            let hist = pixels
                .par_chunks(chunk_size)
                .map(|chunk| {
                    let mut hist = Histogram::new(precision)?;
                    hist.add_pixels(chunk);
                    Ok::<_, QuantizeError>(hist)
                })
                .try_reduce_with(|a, b| Ok(Histogram::merge_partial(a, b)))
                .unwrap_or_else(|| Histogram::new(precision))?;

            Ok(Self::from_raw_histogram(hist))
        }

        /// Run Wu's quantization method on an [`ImageRef`] in parallel.
        ///
        /// # Errors
        ///
        /// Returns [`QuantizeError::AllocationFailed`] if a histogram could not be allocated.
        pub fn run_image_par<P: RgbaPixel>(
            image: ImageRef<'_, P>,
            precision: Precision,
        ) -> Result<Self, QuantizeError> {
            Self::run_slice_par(image.as_slice(), precision)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IndexedColorMap as _, KdTreeColorMap, tests::*};
    use alloc::vec;
    use palette::Srgba;

    fn quantizer(pixels: &[Srgba<u8>]) -> WuQuantizer<Srgba<u8>> {
        WuQuantizer::run_slice(pixels, Precision::DEFAULT).unwrap()
    }

    #[test]
    fn palette_size_is_bounded() {
        let pixels = test_data_1024();
        let quantizer = quantizer(&pixels);
        for k in [1u16, 2, 3, 16, 100, 255, 256] {
            let len = quantizer.palette(k.try_into().unwrap()).len();
            assert!(1 <= len && len <= usize::from(k), "k = {k}, len = {len}");
        }
    }

    #[test]
    fn distinct_colors_fill_the_palette() {
        let pixels = test_data_1024();
        let palette = quantizer(&pixels).palette(PaletteSize::MAX);
        assert_eq!(palette.len(), 256);
    }

    #[test]
    fn cubes_partition_the_histogram() {
        let pixels = test_data_1024();
        let quantizer = quantizer(&pixels);
        let precision = quantizer.histogram().precision();
        let cubes = quantizer.cubes(64u8.into());

        let whole = Cube::whole(precision);
        let total = cubes.iter().map(Cube::volume).sum::<u32>();
        assert_eq!(total, whole.volume());

        let mut covered = vec![0u8; precision.num_bins()];
        for cube in &cubes {
            let (min, max) = (cube.min(), cube.max());
            for r in min[0] + 1..=max[0] {
                for g in min[1] + 1..=max[1] {
                    for b in min[2] + 1..=max[2] {
                        for a in min[3] + 1..=max[3] {
                            covered[precision.index([r, g, b, a])] += 1;
                        }
                    }
                }
            }
        }
        let (wmin, wmax) = (whole.min(), whole.max());
        for r in wmin[0] + 1..=wmax[0] {
            for g in wmin[1] + 1..=wmax[1] {
                for b in wmin[2] + 1..=wmax[2] {
                    for a in wmin[3] + 1..=wmax[3] {
                        assert_eq!(covered[precision.index([r, g, b, a])], 1);
                    }
                }
            }
        }
    }

    #[test]
    fn equal_scores_cut_red_first() {
        // red and green separate the two pixels equally well
        let pixels = [Srgba::new(0, 0, 100, 255), Srgba::new(255, 255, 100, 255)];
        let cubes = quantizer(&pixels).cubes(2u8.into());
        assert_eq!(cubes.len(), 2);
        assert_eq!(cubes[0].max()[0], 1);
        assert_eq!(cubes[0].max()[1], 32);
        assert_eq!(cubes[1].min()[0], 1);
        assert_eq!(cubes[1].min()[1], 0);
    }

    #[test]
    fn equal_variance_splits_lowest_index() {
        let pixels = [
            Srgba::new(0, 0, 0, 255),
            Srgba::new(0, 0, 64, 255),
            Srgba::new(255, 0, 0, 255),
            Srgba::new(255, 0, 64, 255),
        ];
        let quantizer = quantizer(&pixels);

        let cubes = quantizer.cubes(2u8.into());
        assert_eq!(cubes[0], Cube::new([0; 4], [1, 32, 32, 32]));
        assert_eq!(cubes[1], Cube::new([1, 0, 0, 0], [32; 4]));
        let variances = cubes.iter().map(|cube| quantizer.variance(cube)).collect::<Vec<_>>();
        assert_eq!(variances, [2048.0, 2048.0]);

        // both boxes tie, so the first one is split again
        let cubes = quantizer.cubes(3u8.into());
        assert_eq!(cubes[0], Cube::new([0; 4], [1, 32, 1, 32]));
        assert_eq!(cubes[1], Cube::new([1, 0, 0, 0], [32; 4]));
        assert_eq!(cubes[2], Cube::new([0, 0, 1, 0], [1, 32, 32, 32]));
    }

    #[test]
    fn counts_sum_to_pixel_count() {
        let pixels = test_data_1024();
        let quantizer = quantizer(&pixels);
        let (palette, counts) = quantizer.palette_and_counts(32u8.into());
        assert_eq!(palette.len(), counts.len());
        assert_eq!(counts.iter().sum::<u32>(), 1024);
        assert!(counts.iter().all(|&n| n > 0));

        let color_map = quantizer.color_map(32u8.into()).unwrap();
        assert_eq!(color_map.counts(), counts);
    }

    #[test]
    fn classify_agrees_with_nearest_at_palette_colors() {
        let pixels = test_data_1024();
        let color_map = quantizer(&pixels).color_map(PaletteSize::MAX).unwrap();
        let nearest = KdTreeColorMap::new(color_map.palette().clone()).unwrap();
        for (i, &color) in color_map.palette().iter().enumerate() {
            assert_eq!(usize::from(color_map.classify(color)), i);
            assert_eq!(nearest.get_index(color).1, color);
        }
    }

    #[test]
    fn deterministic() {
        let pixels = test_data_1024();
        let a = quantizer(&pixels).color_map(100u8.into()).unwrap();
        let b = quantizer(&pixels).color_map(100u8.into()).unwrap();
        assert_eq!(a.palette(), b.palette());
        assert_eq!(a.map_to_indices(&pixels), b.map_to_indices(&pixels));
    }

    #[test]
    fn black_white_red_red() {
        let black = Srgba::new(0, 0, 0, 255);
        let white = Srgba::new(255, 255, 255, 255);
        let red = Srgba::new(255, 0, 0, 255);
        let pixels = [black, white, red, red];

        let color_map = quantizer(&pixels).color_map(2u8.into()).unwrap();
        assert_eq!(color_map.palette().len(), 2);
        assert_eq!(color_map.classify(pixels[2]), color_map.classify(pixels[3]));
        assert_ne!(color_map.classify(white), color_map.classify(red));
    }

    #[test]
    fn single_color() {
        let color = Srgba::new(12, 200, 99, 128);
        let pixels = vec![color; 100];
        let (palette, counts) = quantizer(&pixels).palette_and_counts(5u8.into());
        assert_eq!(palette.as_slice(), [color]);
        assert_eq!(counts, [100]);
    }

    #[test]
    fn one_color_is_the_mean() {
        let pixels = [Srgba::new(10, 20, 30, 255), Srgba::new(30, 40, 50, 255)];
        let palette = quantizer(&pixels).palette(1u8.into());
        assert_eq!(palette.as_slice(), [Srgba::new(20, 30, 40, 255)]);

        let palette = quantizer(&test_data_256()).palette(1u8.into());
        assert_eq!(palette.len(), 1);
    }

    #[test]
    fn weighted_mean_output_as_f32() {
        let pixels = [[0u8, 0, 0, 255], [0, 0, 0, 255], [0, 0, 0, 255], [255, 255, 255, 255]];
        let quantizer = WuQuantizer::<Srgba<f32>>::run_slice(&pixels, Precision::DEFAULT).unwrap();
        let palette = quantizer.palette(1u8.into());
        let (r, g, b, a) = palette[0u8].into_components();
        assert!([r, g, b].iter().all(|&c| (0.2499..=0.2501).contains(&c)));
        assert!((0.9999..=1.0).contains(&a));
    }

    #[test]
    fn empty_input() {
        let quantizer = quantizer(&[]);
        assert!(quantizer.palette(PaletteSize::MAX).is_empty());
        assert_eq!(quantizer.color_map(PaletteSize::MAX).unwrap_err(), QuantizeError::EmptyPalette);
    }

    #[test]
    fn zero_colors() {
        let quantizer = quantizer(&test_data_256());
        assert!(quantizer.palette(PaletteSize::ZERO).is_empty());
        let (palette, counts) = quantizer.palette_and_counts(PaletteSize::ZERO);
        assert!(palette.is_empty() && counts.is_empty());
    }

    #[test]
    fn region_matches_copied_pixels() {
        let pixels = test_data(32 * 16, 5);
        let image = ImageRef::new(32, 16, pixels.as_slice()).unwrap();
        let region = image.region(4, 3, 20, 10).unwrap();
        let copied = region.pixels().copied().collect::<Vec<_>>();

        let a = WuQuantizer::<Srgba<u8>>::run_region(region, Precision::DEFAULT).unwrap();
        let b = quantizer(&copied);
        assert_eq!(a.palette(16u8.into()), b.palette(16u8.into()));
    }

    #[test]
    fn coarse_precision() {
        let pixels = test_data_1024();
        let precision = Precision::new(2, 1).unwrap();
        let quantizer = WuQuantizer::<Srgba<u8>>::run_slice(&pixels, precision).unwrap();
        // 4 * 4 * 4 * 2 bins can hold at most 128 boxes
        let palette = quantizer.palette(PaletteSize::MAX);
        assert!(palette.len() <= 128);
        let color_map = quantizer.color_map(PaletteSize::MAX).unwrap();
        assert!(color_map.map_to_indices(&pixels).iter().all(|&i| usize::from(i) < palette.len()));
    }

    #[cfg(feature = "threads")]
    #[test]
    fn parallel_matches_serial() {
        let pixels = test_data(20_000, 9);
        let serial = quantizer(&pixels);
        let parallel = WuQuantizer::<Srgba<u8>>::run_slice_par(&pixels, Precision::DEFAULT).unwrap();
        assert_eq!(serial.palette(64u8.into()), parallel.palette(64u8.into()));
    }
}
