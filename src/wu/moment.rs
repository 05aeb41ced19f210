use bytemuck::Zeroable;
use core::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use num_traits::Zero;

/// Statistics for a region of color space: the channel sums, the number of pixels, and the sum of
/// the squared channel values.
///
/// Moments are additive, so the moment of a box of histogram bins is the sum of the moments of its
/// bins. Channel values are the raw `0..=255` components of each pixel.
#[derive(Debug, Clone, Copy, PartialEq, Default, Zeroable)]
pub struct Moment {
    /// The sum of the red components.
    pub r: i64,
    /// The sum of the green components.
    pub g: i64,
    /// The sum of the blue components.
    pub b: i64,
    /// The sum of the alpha components.
    pub a: i64,
    /// The number of pixels.
    pub weight: i64,
    /// The sum of the squared components of every pixel.
    pub moment2: f64,
}

impl Moment {
    /// Returns the moment of a single pixel.
    #[inline]
    pub fn from_rgba8(rgba: [u8; 4]) -> Self {
        let [r, g, b, a] = rgba.map(i64::from);
        let moment2 = rgba
            .map(f64::from)
            .into_iter()
            .map(|c| c * c)
            .sum();
        Self { r, g, b, a, weight: 1, moment2 }
    }

    /// Returns the squared length of the channel sums, `r² + g² + b² + a²`.
    #[allow(clippy::cast_precision_loss)]
    #[inline]
    pub fn sum_of_squares(&self) -> f64 {
        let [r, g, b, a] = [self.r, self.g, self.b, self.a].map(|c| c as f64);
        r * r + g * g + b * b + a * a
    }

    /// Returns the total squared deviation of the pixels from their mean.
    ///
    /// This is zero for a moment with no pixels.
    #[allow(clippy::cast_precision_loss)]
    #[inline]
    pub fn variance(&self) -> f64 {
        if self.weight == 0 {
            0.0
        } else {
            self.moment2 - self.sum_of_squares() / self.weight as f64
        }
    }

    /// Returns the number of pixels as a `u32`, saturating at `u32::MAX`.
    #[must_use]
    #[inline]
    pub fn count(&self) -> u32 {
        u32::try_from(self.weight).unwrap_or(u32::MAX)
    }

    /// Returns the mean color normalized to the range `0.0..=1.0`, or `None` for a moment with no
    /// pixels.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    #[inline]
    pub fn mean(&self) -> Option<[f32; 4]> {
        (self.weight > 0).then(|| {
            let weight = self.weight as f64 * 255.0;
            [self.r, self.g, self.b, self.a].map(|c| (c as f64 / weight) as f32)
        })
    }
}

impl Add for Moment {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self {
            r: self.r + rhs.r,
            g: self.g + rhs.g,
            b: self.b + rhs.b,
            a: self.a + rhs.a,
            weight: self.weight + rhs.weight,
            moment2: self.moment2 + rhs.moment2,
        }
    }
}

impl Sub for Moment {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            r: self.r - rhs.r,
            g: self.g - rhs.g,
            b: self.b - rhs.b,
            a: self.a - rhs.a,
            weight: self.weight - rhs.weight,
            moment2: self.moment2 - rhs.moment2,
        }
    }
}

impl Neg for Moment {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self::Output {
        Self {
            r: -self.r,
            g: -self.g,
            b: -self.b,
            a: -self.a,
            weight: -self.weight,
            moment2: -self.moment2,
        }
    }
}

impl AddAssign for Moment {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Moment {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Zero for Moment {
    #[inline]
    fn zero() -> Self {
        Self::zeroed()
    }

    #[inline]
    fn is_zero(&self) -> bool {
        self.weight == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RgbaPixel as _;

    #[test]
    fn pixel_moment() {
        let moment = Moment::from_rgba8([1, 2, 3, 4]);
        assert_eq!((moment.r, moment.g, moment.b, moment.a, moment.weight), (1, 2, 3, 4, 1));
        assert_eq!(moment.moment2, 30.0);
        assert_eq!(moment.variance(), 0.0);
    }

    #[test]
    fn variance_of_two_pixels() {
        let moment = Moment::from_rgba8([0, 0, 0, 0]) + Moment::from_rgba8([10, 0, 0, 0]);
        // mean red is 5, each pixel deviates by 5
        assert_eq!(moment.variance(), 50.0);
        assert_eq!(moment.mean().map(<[u8; 4]>::from_vector), Some([5, 0, 0, 0]));
    }

    #[test]
    fn arithmetic() {
        let a = Moment::from_rgba8([10, 20, 30, 40]);
        let b = Moment::from_rgba8([1, 2, 3, 4]);
        assert_eq!(a + b - b, a);
        assert_eq!(-a + a, Moment::zero());
        let mut c = a;
        c += b;
        c -= a;
        assert_eq!(c, b);
        assert!(Moment::zero().is_zero());
        assert_eq!(Moment::zero().mean(), None);
    }

    #[test]
    fn count_saturates() {
        assert_eq!(Moment::from_rgba8([1, 2, 3, 4]).count(), 1);
        let weight = i64::from(u32::MAX);
        assert_eq!(Moment { weight, ..Moment::zero() }.count(), u32::MAX);
        assert_eq!(Moment { weight: weight + 10, ..Moment::zero() }.count(), u32::MAX);
    }
}
