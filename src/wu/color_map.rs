use super::Precision;
use crate::{IndexedColorMap, KdTreeColorMap, Palette, QuantizeError, RgbaPixel};
use alloc::{boxed::Box, vec::Vec};

/// An [`IndexedColorMap`] that maps colors to their histogram bin and the palette index of the box
/// containing that bin.
///
/// Lookups are O(1) but are not guaranteed to return the nearest palette color, since a color near
/// the edge of a box may be closer to the mean of a neighboring box. Use
/// [`into_nearest`](WuColorMap::into_nearest) to get an exact nearest color lookup over the same
/// palette.
///
/// Can only be created from [`WuQuantizer::color_map`](super::WuQuantizer::color_map).
#[derive(Debug, Clone)]
pub struct WuColorMap<Color> {
    /// The color palette.
    palette: Palette<Color>,
    /// The number of pixels in each palette color's box.
    counts: Vec<u32>,
    /// The precision of the histogram the tags were built from.
    precision: Precision,
    /// The palette index of each histogram bin.
    tags: Box<[u8]>,
}

impl<Color> WuColorMap<Color> {
    /// Create a new [`WuColorMap`] from its parts.
    pub(crate) fn new(
        palette: Palette<Color>,
        counts: Vec<u32>,
        precision: Precision,
        tags: Box<[u8]>,
    ) -> Self {
        debug_assert!(!palette.is_empty());
        debug_assert_eq!(palette.len(), counts.len());
        debug_assert_eq!(tags.len(), precision.num_bins());
        Self { palette, counts, precision, tags }
    }

    /// Consume a [`WuColorMap`] and return the underlying [`Palette`].
    #[must_use]
    #[inline]
    pub fn into_palette(self) -> Palette<Color> {
        self.palette
    }

    /// Returns the [`Palette`] of colors of a [`WuColorMap`].
    #[inline]
    pub fn palette(&self) -> &Palette<Color> {
        &self.palette
    }

    /// Returns the number of input pixels that fell into each palette color's box.
    ///
    /// Each count saturates at `u32::MAX`.
    #[inline]
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Returns the palette index of the box that `pixel` falls into.
    #[inline]
    pub fn classify<P: RgbaPixel>(&self, pixel: P) -> u8 {
        let Self { precision, tags, .. } = self;
        tags[precision.index(precision.bin(pixel.to_rgba8()))]
    }
}

impl<Color: RgbaPixel> WuColorMap<Color> {
    /// Returns the index of the first fully transparent palette color, if any.
    ///
    /// See [`Palette::transparent_index`].
    #[must_use]
    #[inline]
    pub fn transparent_index(&self) -> Option<u8> {
        self.palette.transparent_index()
    }

    /// Convert a [`WuColorMap`] to a [`KdTreeColorMap`] over the same palette, which maps each color
    /// to its exact nearest palette color instead of its histogram box.
    ///
    /// # Errors
    ///
    /// Returns [`QuantizeError::EmptyPalette`] if the palette is empty, which cannot happen for a
    /// [`WuColorMap`] created by a [`WuQuantizer`](super::WuQuantizer).
    #[inline]
    pub fn into_nearest(self) -> Result<KdTreeColorMap<Color>, QuantizeError> {
        KdTreeColorMap::new(self.palette)
    }
}

impl<Input: RgbaPixel, Color: RgbaPixel> IndexedColorMap<Input> for WuColorMap<Color> {
    type Output = Color;

    #[inline]
    fn into_palette(self) -> Palette<Self::Output> {
        self.into_palette()
    }

    #[inline]
    fn palette(&self) -> &Palette<Self::Output> {
        self.palette()
    }

    #[inline]
    fn palette_index(&self, color: &Input) -> u8 {
        self.classify(*color)
    }
}
