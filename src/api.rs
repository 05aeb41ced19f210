use crate::{
    ImageRef, IndexedColorMap, IndexedImage, Palette, PaletteSize, QuantizeError, RgbaPixel,
    wu::{Precision, WuQuantizer},
};
use alloc::vec::Vec;

/// How pixels are mapped to the palette produced by Wu's quantizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorMapping {
    /// Map each pixel to the palette color of the histogram box it falls into.
    ///
    /// This is a constant time lookup per pixel, but a pixel near the edge of a box may not get its
    /// nearest palette color. See [`WuColorMap`](crate::wu::WuColorMap).
    #[default]
    Bucket,
    /// Map each pixel to its exact nearest palette color.
    ///
    /// See [`KdTreeColorMap`](crate::KdTreeColorMap).
    Nearest,
}

/// A builder struct to specify the options for [`quantize`].
///
/// # Examples
///
/// ```
/// # fn main() -> Result<(), palettize::QuantizeError> {
/// use palettize::{ColorMapping, QuantizeOptions};
///
/// let options = QuantizeOptions::new(64)?
///     .precision_bits(6, 4)?
///     .mapping(ColorMapping::Nearest);
///
/// assert_eq!(options.get_max_colors(), 64u16);
/// assert_eq!(options.get_precision().index_alpha_bits(), 4);
/// # Ok(())
/// # }
/// ```
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct QuantizeOptions {
    /// The maximum number of palette colors.
    max_colors: PaletteSize,
    /// The histogram precision.
    precision: Precision,
    /// How pixels are mapped to palette colors.
    mapping: ColorMapping,
}

impl QuantizeOptions {
    /// Create a new [`QuantizeOptions`] with at most `max_colors` palette colors and default
    /// precision and mapping.
    ///
    /// # Errors
    ///
    /// Returns [`QuantizeError::PaletteSizeOutOfRange`] if `max_colors` is greater than
    /// [`MAX_COLORS`](crate::MAX_COLORS).
    #[inline]
    pub fn new(max_colors: u16) -> Result<Self, QuantizeError> {
        let max_colors = PaletteSize::try_from(max_colors)?;
        Ok(Self { max_colors, precision: Precision::DEFAULT, mapping: ColorMapping::Bucket })
    }

    /// Sets the maximum number of palette colors.
    ///
    /// The default is [`PaletteSize::MAX`].
    #[inline]
    pub const fn max_colors(mut self, max_colors: PaletteSize) -> Self {
        self.max_colors = max_colors;
        self
    }

    /// Sets the histogram precision.
    ///
    /// The default is [`Precision::DEFAULT`].
    #[inline]
    pub const fn precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    /// Sets the histogram precision from the number of bits kept for the color and alpha
    /// channels.
    ///
    /// # Errors
    ///
    /// Returns [`QuantizeError::PrecisionOutOfRange`] if either number of bits is outside
    /// `Precision::MIN_BITS..=Precision::MAX_BITS`.
    #[inline]
    pub const fn precision_bits(
        self,
        index_bits: u8,
        index_alpha_bits: u8,
    ) -> Result<Self, QuantizeError> {
        match Precision::new(index_bits, index_alpha_bits) {
            Ok(precision) => Ok(self.precision(precision)),
            Err(err) => Err(err),
        }
    }

    /// Sets how pixels are mapped to palette colors.
    ///
    /// The default is [`ColorMapping::Bucket`].
    #[inline]
    pub const fn mapping(mut self, mapping: ColorMapping) -> Self {
        self.mapping = mapping;
        self
    }

    /// Gets the maximum number of palette colors.
    #[must_use]
    #[inline]
    pub const fn get_max_colors(&self) -> PaletteSize {
        self.max_colors
    }

    /// Gets the histogram precision.
    #[must_use]
    #[inline]
    pub const fn get_precision(&self) -> Precision {
        self.precision
    }

    /// Gets how pixels are mapped to palette colors.
    #[must_use]
    #[inline]
    pub const fn get_mapping(&self) -> ColorMapping {
        self.mapping
    }
}

/// Quantize an image to at most [`QuantizeOptions::get_max_colors`] colors and map its pixels to
/// the palette.
///
/// The palette colors have the same type as the input pixels. If the `threads` feature is enabled,
/// the histogram and the pixel mapping are computed in parallel. The output is the same either
/// way.
///
/// An empty image results in an empty [`IndexedImage`] with an empty palette.
///
/// # Errors
///
/// Returns [`QuantizeError::EmptyPalette`] if the image is not empty but the maximum number of
/// colors is zero. Returns [`QuantizeError::AllocationFailed`] if the histogram could not be
/// allocated.
///
/// # Examples
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use palettize::{ColorMapping, ImageBuf, QuantizeOptions, quantize};
///
/// let image = ImageBuf::from_pixel(4, 4, [10u8, 20, 30, 255]).unwrap();
/// let options = QuantizeOptions::new(16)?.mapping(ColorMapping::Nearest);
/// let indexed = quantize(image.as_ref(), &options)?;
///
/// assert_eq!(indexed.palette().as_slice(), [[10, 20, 30, 255]]);
/// assert_eq!(indexed.to_image(), image);
/// # Ok(())
/// # }
/// ```
pub fn quantize<P: RgbaPixel>(
    image: ImageRef<'_, P>,
    options: &QuantizeOptions,
) -> Result<IndexedImage<P>, QuantizeError> {
    let (width, height) = image.dimensions();
    if image.is_empty() {
        return Ok(IndexedImage::new_unchecked(width, height, Palette::default(), Vec::new()));
    }

    #[cfg(feature = "threads")]
    let quantizer = WuQuantizer::<P>::run_image_par(image, options.precision)?;
    #[cfg(not(feature = "threads"))]
    let quantizer = WuQuantizer::<P>::run_image(image, options.precision)?;

    let color_map = quantizer.color_map(options.max_colors)?;
    log::debug!(
        "quantized {} pixels to {} colors",
        image.num_pixels(),
        color_map.palette().len()
    );

    Ok(match options.mapping {
        ColorMapping::Bucket => map_pixels(image, color_map),
        ColorMapping::Nearest => map_pixels(image, color_map.into_nearest()?),
    })
}

/// Map the pixels of `image` through `color_map`, in parallel if the `threads` feature is enabled.
#[inline]
fn map_pixels<P, ColorMap>(image: ImageRef<'_, P>, color_map: ColorMap) -> IndexedImage<P>
where
    P: RgbaPixel,
    ColorMap: IndexedColorMap<P, Output = P> + Sync,
{
    #[cfg(feature = "threads")]
    {
        image.map_to_indexed_par(color_map)
    }
    #[cfg(not(feature = "threads"))]
    {
        image.map_to_indexed(color_map)
    }
}
