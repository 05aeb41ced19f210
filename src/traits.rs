use palette::Srgba;

/// Pixel types that can be converted to and from 8-bit RGBA.
///
/// The quantizers in `palettize` are generic over this capability only. They make no assumptions
/// about the memory layout of a pixel beyond "4 channels with a fixed numeric range".
///
/// [`to_rgba8`](RgbaPixel::to_rgba8) is used to place pixels into histogram bins, while
/// [`to_vector`](RgbaPixel::to_vector) and [`from_vector`](RgbaPixel::from_vector) carry
/// normalized colors in the range `0.0..=1.0` for averaging and distance calculations.
pub trait RgbaPixel: Copy + PartialEq + Send + Sync + 'static {
    /// Returns the red, green, blue, and alpha channels as `u8`s.
    fn to_rgba8(self) -> [u8; 4];

    /// Create a pixel from red, green, blue, and alpha `u8` channels.
    fn from_rgba8(rgba: [u8; 4]) -> Self;

    /// Returns the channels normalized to the range `0.0..=1.0`.
    #[inline]
    fn to_vector(self) -> [f32; 4] {
        self.to_rgba8().map(|c| f32::from(c) / 255.0)
    }

    /// Create a pixel from channels normalized to the range `0.0..=1.0`.
    ///
    /// Out of range values are clamped.
    #[inline]
    fn from_vector(vector: [f32; 4]) -> Self {
        Self::from_rgba8(vector.map(unorm_to_u8))
    }
}

/// Convert a normalized channel to a `u8`, rounding to the nearest value.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[inline]
pub(crate) fn unorm_to_u8(value: f32) -> u8 {
    // `as` saturates and maps NaN to zero
    (value.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

impl RgbaPixel for [u8; 4] {
    #[inline]
    fn to_rgba8(self) -> [u8; 4] {
        self
    }

    #[inline]
    fn from_rgba8(rgba: [u8; 4]) -> Self {
        rgba
    }
}

impl RgbaPixel for Srgba<u8> {
    #[inline]
    fn to_rgba8(self) -> [u8; 4] {
        let (r, g, b, a) = self.into_components();
        [r, g, b, a]
    }

    #[inline]
    fn from_rgba8([r, g, b, a]: [u8; 4]) -> Self {
        Srgba::new(r, g, b, a)
    }
}

impl RgbaPixel for Srgba<f32> {
    #[inline]
    fn to_rgba8(self) -> [u8; 4] {
        self.to_vector().map(unorm_to_u8)
    }

    #[inline]
    fn from_rgba8(rgba: [u8; 4]) -> Self {
        let [r, g, b, a] = rgba.map(|c| f32::from(c) / 255.0);
        Srgba::new(r, g, b, a)
    }

    #[inline]
    fn to_vector(self) -> [f32; 4] {
        let (r, g, b, a) = self.into_components();
        [r, g, b, a]
    }

    #[inline]
    fn from_vector(vector: [f32; 4]) -> Self {
        let [r, g, b, a] = vector.map(|c| c.clamp(0.0, 1.0));
        Srgba::new(r, g, b, a)
    }
}

#[cfg(feature = "image")]
impl RgbaPixel for image::Rgba<u8> {
    #[inline]
    fn to_rgba8(self) -> [u8; 4] {
        self.0
    }

    #[inline]
    fn from_rgba8(rgba: [u8; 4]) -> Self {
        image::Rgba(rgba)
    }
}
