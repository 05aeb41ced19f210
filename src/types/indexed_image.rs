use crate::{CreateImageError, ImageBuf, Palette, RgbaPixel};
use alloc::{vec, vec::Vec};
#[cfg(feature = "threads")]
use rayon::prelude::*;

/// An image represented as a palette of colors and a series of indices into that palette.
///
/// This is the output consumed by indexed-color encoders. The indices buffer is in row-major order
/// where each index corresponds to one pixel and references one of the palette colors. The length
/// of the indices [`Vec`] is guaranteed to match `width * height`.
///
/// # Examples
///
/// ```
/// # use palettize::{IndexedImage, Palette};
/// # use palette::Srgba;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let (width, height) = (16, 16);
/// let palette = Palette::new(vec![Srgba::new(0u8, 0, 0, 255)])?;
/// let indices = vec![0; (width * height) as usize];
/// let image = IndexedImage::new(width, height, palette, indices)?;
/// assert_eq!(image.counts(), [256]);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IndexedImage<Color> {
    /// The width of the image.
    width: u32,
    /// The height of the image.
    height: u32,
    /// The palette colors of the image.
    palette: Palette<Color>,
    /// The indices into `palette` for each pixel of the image.
    indices: Vec<u8>,
}

impl<Color> IndexedImage<Color> {
    /// Create a new [`IndexedImage`] without validating invariants.
    pub(crate) fn new_unchecked(
        width: u32,
        height: u32,
        palette: Palette<Color>,
        indices: Vec<u8>,
    ) -> Self {
        debug_assert_eq!(
            width.checked_mul(height).map(|len| len as usize),
            Some(indices.len()),
        );
        debug_assert!(indices.iter().all(|&i| usize::from(i) < palette.len()));
        Self { width, height, palette, indices }
    }

    /// Create a new [`IndexedImage`] from a `palette` of colors and `indices` into the `palette`.
    ///
    /// # Errors
    ///
    /// Returns an error if the length of `indices` and `width * height` do not match
    /// or if `width * height` overflows a `u32`.
    ///
    /// Note that this function does not validate that all indices in `indices`
    /// are less than `palette.len()`. An out of range index makes [`counts`](IndexedImage::counts)
    /// and [`to_image`](IndexedImage::to_image) panic.
    pub fn new(
        width: u32,
        height: u32,
        palette: Palette<Color>,
        indices: Vec<u8>,
    ) -> Result<Self, CreateImageError> {
        if width.checked_mul(height).map(|len| len as usize) == Some(indices.len()) {
            Ok(Self { width, height, palette, indices })
        } else {
            Err(CreateImageError { width, height, length: indices.len() })
        }
    }

    /// Returns the width and height of the [`IndexedImage`].
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns the width of the [`IndexedImage`].
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the [`IndexedImage`].
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns whether the [`IndexedImage`] has zero pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns the number of pixels in the [`IndexedImage`] specified by `width * height`.
    #[allow(clippy::cast_possible_truncation)]
    #[inline]
    pub fn num_pixels(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Returns a reference to the palette of the [`IndexedImage`].
    #[inline]
    pub fn palette(&self) -> &Palette<Color> {
        &self.palette
    }

    /// Returns a slice of the palette indices of the [`IndexedImage`].
    #[inline]
    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    /// Consume an [`IndexedImage`] and return the underlying palette and indices.
    #[must_use]
    #[inline]
    pub fn into_parts(self) -> (Palette<Color>, Vec<u8>) {
        let Self { palette, indices, .. } = self;
        (palette, indices)
    }

    /// Returns the number of pixels that reference each palette color.
    ///
    /// # Panics
    ///
    /// Panics if an index is not less than `palette().len()`.
    #[must_use]
    pub fn counts(&self) -> Vec<u32> {
        let mut counts = vec![0; self.palette.len()];
        for &i in &self.indices {
            counts[usize::from(i)] += 1;
        }
        counts
    }

    /// Convert an [`IndexedImage`] to an [`ImageBuf`] by looking up each index in the palette.
    ///
    /// # Panics
    ///
    /// Panics if an index is not less than `palette().len()`.
    #[must_use]
    pub fn to_image(&self) -> ImageBuf<Color>
    where
        Color: Clone,
    {
        let Self { width, height, .. } = *self;
        let palette = self.palette.as_slice();
        let pixels = self
            .indices
            .iter()
            .map(|&i| palette[usize::from(i)].clone())
            .collect();
        ImageBuf::new_unchecked(width, height, pixels)
    }

    #[cfg(feature = "threads")]
    /// Convert an [`IndexedImage`] to an [`ImageBuf`] in parallel.
    ///
    /// # Panics
    ///
    /// Panics if an index is not less than `palette().len()`.
    #[must_use]
    pub fn to_image_par(&self) -> ImageBuf<Color>
    where
        Color: Clone + Send + Sync,
    {
        let Self { width, height, .. } = *self;
        let palette = self.palette.as_slice();
        let pixels = self
            .indices
            .par_iter()
            .map(|&i| palette[usize::from(i)].clone())
            .collect();
        ImageBuf::new_unchecked(width, height, pixels)
    }
}

impl<Color: RgbaPixel> IndexedImage<Color> {
    /// Returns the index of the first fully transparent palette color, if any.
    ///
    /// See [`Palette::transparent_index`].
    #[must_use]
    #[inline]
    pub fn transparent_index(&self) -> Option<u8> {
        self.palette.transparent_index()
    }
}

impl<Color> Default for IndexedImage<Color> {
    #[inline]
    fn default() -> Self {
        Self::new_unchecked(0, 0, Palette::default(), Vec::new())
    }
}
