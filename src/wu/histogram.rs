// Referenced code: https://www.ece.mcmaster.ca/~xwu/cq.c
// and relevant paper (free access):
// Xiaolin Wu, Color quantization by dynamic programming and principal analysis,
// ACM Transactions on Graphics, vol. 11, no. 4, 348–372, 1992.
// https://doi.org/10.1145/146443.146475

use super::Moment;
use crate::{QuantizeError, RgbaPixel};
use alloc::{boxed::Box, vec};
use num_traits::Zero;

/// The number of histogram bits used for each color channel.
///
/// The red, green, and blue channels are reduced to `index_bits` bits and the alpha channel to
/// `index_alpha_bits` bits before being counted. Higher precision gives more accurate palettes at
/// the cost of memory: the histogram has `(2^index_bits + 1)^3 * (2^index_alpha_bits + 1)` bins
/// of 48 bytes each.
///
/// # Examples
///
/// ```
/// # use palettize::{QuantizeError, wu::Precision};
/// # fn main() -> Result<(), QuantizeError> {
/// let precision = Precision::new(6, 3)?;
/// assert_eq!(precision.index_bits(), 6);
/// assert_eq!(Precision::DEFAULT, Precision::new(5, 5)?);
/// assert!(Precision::new(8, 5).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Precision {
    /// The number of bits for the red, green, and blue channels.
    index_bits: u8,
    /// The number of bits for the alpha channel.
    index_alpha_bits: u8,
}

impl Precision {
    /// The smallest supported number of bits per channel.
    pub const MIN_BITS: u8 = 1;

    /// The largest supported number of bits per channel.
    pub const MAX_BITS: u8 = 7;

    /// The default precision of 5 bits for each channel.
    pub const DEFAULT: Self = Self { index_bits: 5, index_alpha_bits: 5 };

    /// Create a new [`Precision`].
    ///
    /// Memory grows with the fourth power of the bin side, see
    /// [`histogram_bytes`](Precision::histogram_bytes). The default 5/5 precision needs about
    /// 57 MB, 6/6 about 857 MB, and the maximum 7/7 about 13.3 GB plus a 277 MB tag table for
    /// [`WuQuantizer::color_map`](super::WuQuantizer::color_map). Allocation failure is reported
    /// as [`QuantizeError::AllocationFailed`] rather than aborting.
    ///
    /// # Errors
    ///
    /// Returns [`QuantizeError::PrecisionOutOfRange`] if either number of bits is not in the
    /// range `1..=7`.
    #[inline]
    pub const fn new(index_bits: u8, index_alpha_bits: u8) -> Result<Self, QuantizeError> {
        const fn valid(bits: u8) -> bool {
            Precision::MIN_BITS <= bits && bits <= Precision::MAX_BITS
        }

        if valid(index_bits) && valid(index_alpha_bits) {
            Ok(Self { index_bits, index_alpha_bits })
        } else {
            Err(QuantizeError::PrecisionOutOfRange { index_bits, index_alpha_bits })
        }
    }

    /// Returns the number of bits for the red, green, and blue channels.
    #[inline]
    pub const fn index_bits(&self) -> u8 {
        self.index_bits
    }

    /// Returns the number of bits for the alpha channel.
    #[inline]
    pub const fn index_alpha_bits(&self) -> u8 {
        self.index_alpha_bits
    }

    /// The number of bins along the red, green, and blue axes including the zero guard bin.
    #[inline]
    pub(crate) const fn side(&self) -> u8 {
        (1 << self.index_bits) + 1
    }

    /// The number of bins along the alpha axis including the zero guard bin.
    #[inline]
    pub(crate) const fn alpha_side(&self) -> u8 {
        (1 << self.index_alpha_bits) + 1
    }

    /// Returns the total number of histogram bins.
    #[inline]
    pub const fn num_bins(&self) -> usize {
        let side = self.side() as usize;
        side * side * side * self.alpha_side() as usize
    }

    /// Returns the number of bytes allocated for a [`Histogram`] of this precision.
    ///
    /// This is `num_bins() * 48`. A tag table of `num_bins()` bytes is allocated on top of it when
    /// building a [`WuColorMap`](super::WuColorMap).
    #[inline]
    pub const fn histogram_bytes(&self) -> usize {
        self.num_bins() * size_of::<Moment>()
    }

    /// Returns the 1-based histogram bin of an RGBA color.
    #[inline]
    pub(crate) fn bin(&self, rgba: [u8; 4]) -> [u8; 4] {
        let shift = u8::BITS - u32::from(self.index_bits);
        let alpha_shift = u8::BITS - u32::from(self.index_alpha_bits);
        let [r, g, b, a] = rgba;
        [
            (r >> shift) + 1,
            (g >> shift) + 1,
            (b >> shift) + 1,
            (a >> alpha_shift) + 1,
        ]
    }

    /// Returns the flat histogram index of a bin.
    #[inline]
    pub(crate) fn index(&self, bin: [u8; 4]) -> usize {
        let side = usize::from(self.side());
        let alpha_side = usize::from(self.alpha_side());
        let [r, g, b, a] = bin.map(usize::from);
        ((r * side + g) * side + b) * alpha_side + a
    }
}

impl Default for Precision {
    #[inline]
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// One of the four histogram axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// The red channel.
    Red,
    /// The green channel.
    Green,
    /// The blue channel.
    Blue,
    /// The alpha channel.
    Alpha,
}

impl Axis {
    /// All axes in cut priority order.
    pub const ALL: [Self; 4] = [Self::Red, Self::Green, Self::Blue, Self::Alpha];

    /// Returns the position of this axis in a `[r, g, b, a]` array.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// A box of histogram bins.
///
/// Along each axis the box covers the bins in `min + 1..=max`, so `min` is exclusive and `max` is
/// inclusive. The number of bins covered is cached.
///
/// Boxes are only created by the quantizer from its own histogram, so they always fit its
/// [`Precision`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cube {
    /// The exclusive lower bins.
    min: [u8; 4],
    /// The inclusive upper bins.
    max: [u8; 4],
    /// The number of bins in the box.
    volume: u32,
}

impl Cube {
    /// Create a new [`Cube`] covering the bins in `min + 1..=max` along each axis.
    ///
    /// # Panics
    ///
    /// Panics if `min` is greater than `max` for any axis.
    #[must_use]
    #[inline]
    pub(crate) fn new(min: [u8; 4], max: [u8; 4]) -> Self {
        assert!((0..4).all(|i| min[i] <= max[i]), "cube bounds are inverted");
        let volume = (0..4).map(|i| u32::from(max[i] - min[i])).product();
        Self { min, max, volume }
    }

    /// Returns the box covering every bin of a histogram with the given precision.
    #[must_use]
    #[inline]
    pub(crate) fn whole(precision: Precision) -> Self {
        let side = precision.side() - 1;
        Self::new([0; 4], [side, side, side, precision.alpha_side() - 1])
    }

    /// Returns the exclusive lower bins.
    #[inline]
    pub fn min(&self) -> [u8; 4] {
        self.min
    }

    /// Returns the inclusive upper bins.
    #[inline]
    pub fn max(&self) -> [u8; 4] {
        self.max
    }

    /// Returns the number of histogram bins in the box.
    #[inline]
    pub fn volume(&self) -> u32 {
        self.volume
    }

    /// Returns whether every bin of the box lies inside a histogram of the given precision.
    #[inline]
    pub(crate) fn fits(&self, precision: Precision) -> bool {
        let side = precision.side() - 1;
        let [r, g, b, a] = self.max;
        r <= side && g <= side && b <= side && a < precision.alpha_side()
    }

    /// Split the box at `position` along `axis`, keeping `(min, position]` and returning
    /// `(position, max]`.
    #[inline]
    pub(crate) fn split(&mut self, axis: Axis, position: u8) -> Self {
        let mut upper_min = self.min;
        upper_min[axis.index()] = position;
        let mut lower_max = self.max;
        lower_max[axis.index()] = position;
        let upper = Self::new(upper_min, self.max);
        *self = Self::new(self.min, lower_max);
        upper
    }
}

/// A 4D histogram of color [`Moment`]s over the red, green, blue, and alpha channels.
///
/// Bins are 1-indexed along each axis: index `0` is a guard bin that always holds the zero moment.
/// After [`calc_cumulative_moments`](Histogram::calc_cumulative_moments), each bin holds the sum
/// of every bin at or below it on all four axes, which allows the moment of any [`Cube`] to be
/// computed from 16 bins.
#[derive(Debug, Clone)]
pub struct Histogram {
    /// The precision of the histogram bins.
    precision: Precision,
    /// The bins in `[r][g][b][a]` order.
    moments: Box<[Moment]>,
}

/// This macro generates code for a fixed number of recursive calls to a volume function.
macro_rules! ndvolume {
    ($self: ident, $min: ident, $max: ident, $index: ident; $n: literal $(, $ns: literal)* $(,)?) => {{
        $index[$n] = $max[$n];
        let upper = ndvolume!($self, $min, $max, $index; $($ns,)*);
        $index[$n] = $min[$n];
        let lower = ndvolume!($self, $min, $max, $index; $($ns,)*);
        upper - lower
    }};
    ($self: ident, $min: ident, $max: ident, $index: ident;) => {
        $self.moments[$self.precision.index($index)]
    };
}

impl Histogram {
    /// Allocate a zeroed [`Histogram`].
    ///
    /// # Errors
    ///
    /// Returns [`QuantizeError::AllocationFailed`] if the histogram could not be allocated.
    pub fn new(precision: Precision) -> Result<Self, QuantizeError> {
        let len = precision.num_bins();
        let bytes = precision.histogram_bytes();
        let moments = bytemuck::allocation::try_zeroed_slice_box(len)
            .map_err(|()| QuantizeError::AllocationFailed { bytes })?;

        #[allow(clippy::cast_precision_loss)]
        let megabytes = bytes as f64 / (1024.0 * 1024.0);
        log::debug!("allocated {megabytes:.2} MB for a histogram of {len} bins");

        Ok(Self { precision, moments })
    }

    /// Returns the precision of the histogram bins.
    #[inline]
    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Returns the bins of the histogram as a flat slice in `[r][g][b][a]` order.
    #[inline]
    pub fn as_slice(&self) -> &[Moment] {
        &self.moments
    }

    /// Add a single color to the histogram.
    #[inline]
    pub fn accumulate(&mut self, rgba: [u8; 4]) {
        let index = self.precision.index(self.precision.bin(rgba));
        self.moments[index] += Moment::from_rgba8(rgba);
    }

    /// Add each pixel to the histogram.
    #[inline]
    pub(crate) fn add_pixels<P: RgbaPixel>(&mut self, pixels: &[P]) {
        for &pixel in pixels {
            self.accumulate(pixel.to_rgba8());
        }
    }

    /// Transform the bins so that each holds the sum of every bin in
    /// `[1..=r] x [1..=g] x [1..=b] x [1..=a]`.
    ///
    /// This must be called once after all colors have been added and before any volume lookups.
    pub fn calc_cumulative_moments(&mut self) {
        let side = self.precision.side();
        let alpha_side = self.precision.alpha_side();
        let aside = usize::from(alpha_side);

        let mut volume = vec![Moment::zero(); usize::from(side) * aside];
        let mut area = vec![Moment::zero(); aside];

        for r in 1..side {
            volume.fill(Moment::zero());

            for g in 1..side {
                area.fill(Moment::zero());

                for b in 1..side {
                    let mut line = Moment::zero();

                    for a in 1..alpha_side {
                        let index = self.precision.index([r, g, b, a]);
                        line += self.moments[index];
                        area[usize::from(a)] += line;

                        let inv = usize::from(b) * aside + usize::from(a);
                        volume[inv] += area[usize::from(a)];

                        let prev = self.precision.index([r - 1, g, b, a]);
                        self.moments[index] = self.moments[prev] + volume[inv];
                    }
                }
            }
        }
    }

    /// Returns the moment of all bins inside `cube`.
    #[inline]
    pub(crate) fn volume(&self, cube: &Cube) -> Moment {
        debug_assert!(cube.fits(self.precision));
        let Cube { min, max, .. } = *cube;
        let mut index = [0u8; 4];
        ndvolume!(self, min, max, index; 0, 1, 2, 3)
    }

    /// Returns the signed sum over the corners of `cube` with `axis` fixed to `bin`.
    #[inline]
    fn volume_at(&self, cube: &Cube, axis: Axis, bin: u8) -> Moment {
        let Cube { min, max, .. } = *cube;
        let mut index = [0u8; 4];
        index[axis.index()] = bin;
        match axis {
            Axis::Red => ndvolume!(self, min, max, index; 1, 2, 3),
            Axis::Green => ndvolume!(self, min, max, index; 0, 2, 3),
            Axis::Blue => ndvolume!(self, min, max, index; 0, 1, 3),
            Axis::Alpha => ndvolume!(self, min, max, index; 0, 1, 2),
        }
    }

    /// Returns the part of the moment of a sub-box of `cube` along `axis` that does not depend on
    /// the cut position.
    ///
    /// `bottom(cube, axis) + top(cube, axis, position)` is the moment of the bins in
    /// `(min, position]` along `axis`.
    #[inline]
    pub(crate) fn bottom(&self, cube: &Cube, axis: Axis) -> Moment {
        -self.volume_at(cube, axis, cube.min[axis.index()])
    }

    /// Returns the part of the moment of a sub-box of `cube` along `axis` that depends only on the
    /// cut `position`. See [`bottom`](Histogram::bottom).
    #[inline]
    pub(crate) fn top(&self, cube: &Cube, axis: Axis, position: u8) -> Moment {
        self.volume_at(cube, axis, position)
    }
}

#[cfg(feature = "threads")]
impl Histogram {
    /// Merge two partial [`Histogram`]s of the same precision by summing their bins.
    #[allow(clippy::needless_pass_by_value)]
    pub(crate) fn merge_partial(mut a: Self, b: Self) -> Self {
        debug_assert_eq!(a.precision, b.precision);
        for (a, &b) in a.moments.iter_mut().zip(b.moments.iter()) {
            *a += b;
        }
        a
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::*;
    use alloc::vec::Vec;
    use rand::{Rng as _, SeedableRng as _};
    use rand_xoshiro::Xoroshiro128PlusPlus;

    fn small_precision() -> Precision {
        Precision::new(3, 2).unwrap()
    }

    fn raw_and_cumulative(precision: Precision) -> (Vec<Moment>, Histogram) {
        let mut hist = Histogram::new(precision).unwrap();
        hist.add_pixels(&test_data(2000, 42));
        let raw = hist.as_slice().to_vec();
        hist.calc_cumulative_moments();
        (raw, hist)
    }

    fn brute_force_volume(raw: &[Moment], precision: Precision, cube: &Cube) -> Moment {
        let (min, max) = (cube.min(), cube.max());
        let mut sum = Moment::zero();
        for r in min[0] + 1..=max[0] {
            for g in min[1] + 1..=max[1] {
                for b in min[2] + 1..=max[2] {
                    for a in min[3] + 1..=max[3] {
                        sum += raw[precision.index([r, g, b, a])];
                    }
                }
            }
        }
        sum
    }

    fn assert_moment_eq(actual: Moment, expected: Moment) {
        assert_eq!(
            (actual.r, actual.g, actual.b, actual.a, actual.weight),
            (expected.r, expected.g, expected.b, expected.a, expected.weight),
        );
        let tolerance = 1e-9 * expected.moment2.max(1.0);
        let diff = actual.moment2 - expected.moment2;
        assert!(-tolerance <= diff && diff <= tolerance);
    }

    fn random_cube(rng: &mut Xoroshiro128PlusPlus, precision: Precision) -> Cube {
        let sides = [precision.side(), precision.side(), precision.side(), precision.alpha_side()];
        let mut min = [0; 4];
        let mut max = [0; 4];
        for i in 0..4 {
            let x = rng.random_range(0..sides[i]);
            let y = rng.random_range(0..sides[i]);
            min[i] = x.min(y);
            max[i] = x.max(y);
        }
        Cube::new(min, max)
    }

    #[test]
    fn precision_bounds() {
        assert!(Precision::new(1, 7).is_ok());
        assert_eq!(
            Precision::new(0, 5),
            Err(QuantizeError::PrecisionOutOfRange { index_bits: 0, index_alpha_bits: 5 }),
        );
        assert!(Precision::new(5, 8).is_err());
        assert_eq!(Precision::DEFAULT.num_bins(), 33 * 33 * 33 * 33);
    }

    #[test]
    fn histogram_memory() {
        assert_eq!(Precision::DEFAULT.histogram_bytes(), 33 * 33 * 33 * 33 * 48);
        let max = Precision::new(Precision::MAX_BITS, Precision::MAX_BITS).unwrap();
        assert_eq!(max.num_bins(), 129 * 129 * 129 * 129);
        assert_eq!(max.histogram_bytes(), 129 * 129 * 129 * 129 * 48);

        let hist = Histogram::new(small_precision()).unwrap();
        assert_eq!(hist.as_slice().len() * size_of::<Moment>(), small_precision().histogram_bytes());
    }

    #[test]
    fn cubes_fit_their_precision() {
        let small = Precision::new(2, 2).unwrap();
        assert!(Cube::whole(small).fits(small));
        assert!(Cube::whole(Precision::DEFAULT).fits(Precision::DEFAULT));
        assert!(!Cube::whole(Precision::DEFAULT).fits(small));
        assert!(!Cube::new([0; 4], [4, 4, 4, 5]).fits(small));
    }

    #[test]
    fn bins_and_indices() {
        let precision = Precision::DEFAULT;
        assert_eq!(precision.bin([0, 7, 8, 255]), [1, 1, 2, 32]);
        assert_eq!(precision.index([0, 0, 0, 0]), 0);
        assert_eq!(precision.index([32, 32, 32, 32]), precision.num_bins() - 1);
        assert_eq!(precision.index([0, 0, 1, 0]), 33);
        assert_eq!(precision.index([1, 0, 0, 0]), 33 * 33 * 33);
    }

    #[test]
    fn volume_matches_brute_force() {
        let precision = small_precision();
        let (raw, hist) = raw_and_cumulative(precision);
        let mut rng = Xoroshiro128PlusPlus::seed_from_u64(7);
        for _ in 0..500 {
            let cube = random_cube(&mut rng, precision);
            assert_moment_eq(hist.volume(&cube), brute_force_volume(&raw, precision, &cube));
        }

        let whole = hist.volume(&Cube::whole(precision));
        assert_eq!(whole.weight, 2000);
    }

    #[test]
    fn bottom_plus_top_is_lower_sub_box() {
        let precision = small_precision();
        let (raw, hist) = raw_and_cumulative(precision);
        let mut rng = Xoroshiro128PlusPlus::seed_from_u64(11);
        for _ in 0..200 {
            let cube = random_cube(&mut rng, precision);
            for axis in Axis::ALL {
                let i = axis.index();
                for position in cube.min()[i]..=cube.max()[i] {
                    let mut max = cube.max();
                    max[i] = position;
                    let sub = Cube::new(cube.min(), max);
                    assert_moment_eq(
                        hist.bottom(&cube, axis) + hist.top(&cube, axis, position),
                        brute_force_volume(&raw, precision, &sub),
                    );
                }
            }
        }
    }

    #[test]
    fn guard_bins_stay_zero() {
        let (_, hist) = raw_and_cumulative(small_precision());
        let precision = hist.precision();
        for r in 0..precision.side() {
            for a in 0..precision.alpha_side() {
                assert!(hist.as_slice()[precision.index([r, 0, 0, a])].is_zero());
                assert!(hist.as_slice()[precision.index([r, a, 0, 0])].is_zero());
                assert!(hist.as_slice()[precision.index([r, 0, a, 0])].is_zero());
            }
        }
    }

    #[test]
    fn split_cube() {
        let mut cube = Cube::new([0, 0, 0, 0], [8, 8, 8, 4]);
        assert_eq!(cube.volume(), 8 * 8 * 8 * 4);
        let upper = cube.split(Axis::Green, 3);
        assert_eq!(cube, Cube::new([0, 0, 0, 0], [8, 3, 8, 4]));
        assert_eq!(upper, Cube::new([0, 3, 0, 0], [8, 8, 8, 4]));
        assert_eq!(cube.volume() + upper.volume(), 8 * 8 * 8 * 4);
    }
}
