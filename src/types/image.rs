use crate::{IndexedColorMap, IndexedImage, MAX_PIXELS, RgbaPixel};
use alloc::{borrow::ToOwned, vec, vec::Vec};
use core::{
    error::Error,
    fmt::{self, Debug},
    hash::{Hash, Hasher},
    marker::PhantomData,
};
#[cfg(feature = "threads")]
use rayon::prelude::*;

/// The number of pixels each rayon task maps at once.
#[cfg(feature = "threads")]
const PAR_CHUNK_LEN: usize = 4096;

/// The error returned when an [`Image`] or [`IndexedImage`] failed to be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateImageError {
    /// The provided image width.
    pub(crate) width: u32,
    /// The provided image height.
    pub(crate) height: u32,
    /// The length of the pixel or index buffer.
    pub(crate) length: usize,
}

impl fmt::Display for CreateImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { width, height, length } = *self;
        if width.checked_mul(height).is_some() {
            write!(
                f,
                "image dimensions of ({width}, {height}) do not match the buffer length of {length}"
            )
        } else {
            write!(
                f,
                "image dimensions of ({width}, {height}) are above the maximum number of pixels of {MAX_PIXELS}",
            )
        }
    }
}

impl Error for CreateImageError {}

/// The error returned when an [`Image`] failed to be created. Includes the pixel buffer used to try
/// and create the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateImageBufError<T> {
    /// The underlying error/reason.
    pub error: CreateImageError,
    /// The provided container holding the pixels of the image.
    pub buffer: T,
}

impl<T> fmt::Display for CreateImageBufError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl<T: Debug> Error for CreateImageBufError<T> {}

/// The base image type parameterized by the type of the container.
///
/// Typically you want to use one of the aliases with a defined container:
/// - [`ImageBuf`]: an owned image backed by a [`Vec`].
/// - [`ImageRef`]: a borrowed image backed by an immutable slice reference.
#[derive(Debug, Clone, Copy)]
pub struct Image<Color, Container> {
    /// The color type of the pixels.
    color: PhantomData<Color>,
    /// The width of the image.
    width: u32,
    /// The height of the image.
    height: u32,
    /// The pixels of the image in row-major order.
    pixels: Container,
}

/// An owned image buffer backed by a [`Vec`].
///
/// The length of the pixel [`Vec`] is guaranteed to match `width * height` and be less than or
/// equal to [`MAX_PIXELS`].
///
/// # Examples
///
/// ```
/// # use palettize::{ImageBuf, CreateImageBufError};
/// # use palette::Srgba;
/// # fn main() -> Result<(), CreateImageBufError<Vec<Srgba<u8>>>> {
/// let (width, height) = (64, 32);
/// let pixels = vec![Srgba::new(0, 0, 0, 255); (width * height) as usize];
/// let image = ImageBuf::new(width, height, pixels)?;
/// assert_eq!(image.num_pixels(), 64 * 32);
/// # Ok(())
/// # }
/// ```
pub type ImageBuf<Color> = Image<Color, Vec<Color>>;

/// A borrowed image backed by a reference to a slice.
///
/// The length of the pixel slice is guaranteed to match `width * height` and be less than or
/// equal to [`MAX_PIXELS`].
///
/// ```
/// # use palettize::ImageRef;
/// # use palette::Srgba;
/// let pixels = vec![Srgba::new(0u8, 0, 0, 255); 16 * 16];
/// let image = ImageRef::new(16, 16, pixels.as_slice()).unwrap();
/// assert_eq!(image.dimensions(), (16, 16));
/// ```
pub type ImageRef<'a, Color> = Image<Color, &'a [Color]>;

impl<Color, Container> Image<Color, Container> {
    /// Returns the width and height of the [`Image`].
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns the width of the [`Image`].
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the [`Image`].
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns whether the [`Image`] has zero pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns the underlying pixel container.
    #[must_use]
    #[inline]
    pub fn into_inner(self) -> Container {
        self.pixels
    }
}

impl<Color, Container: AsRef<[Color]>> Image<Color, Container> {
    /// Create a new [`Image`] without validating invariants.
    #[inline]
    pub(crate) fn new_unchecked(width: u32, height: u32, pixels: Container) -> Self {
        debug_assert_eq!(
            width.checked_mul(height).map(|len| len as usize),
            Some(pixels.as_ref().len())
        );
        Self { color: PhantomData, width, height, pixels }
    }

    /// Create a new [`Image`] from a width, a height, and a `Container` of pixels.
    ///
    /// # Errors
    ///
    /// The provided `pixels` is returned as an `Err` if any of the following are true:
    /// - The length of `pixels` and `width * height` do not match.
    /// - `width * height` overflows a `u32`.
    #[inline]
    pub fn new(
        width: u32,
        height: u32,
        pixels: Container,
    ) -> Result<Self, CreateImageBufError<Container>> {
        let length = pixels.as_ref().len();
        if width.checked_mul(height).map(|len| len as usize) == Some(length) {
            Ok(Self::new_unchecked(width, height, pixels))
        } else {
            let error = CreateImageError { width, height, length };
            Err(CreateImageBufError { error, buffer: pixels })
        }
    }

    /// Returns the number of pixels in the [`Image`] specified by `width * height`.
    #[allow(clippy::cast_possible_truncation)]
    #[inline]
    pub fn num_pixels(&self) -> u32 {
        self.pixels.as_ref().len() as u32
    }

    /// Returns a reference to the underlying pixels as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[Color] {
        self.pixels.as_ref()
    }

    /// Convert an [`Image`] to an [`ImageRef`].
    #[inline]
    pub fn as_ref(&self) -> ImageRef<'_, Color> {
        let (width, height) = self.dimensions();
        Image::new_unchecked(width, height, self.as_slice())
    }

    /// Convert an [`Image`] to an owned [`ImageBuf`].
    #[must_use]
    #[inline]
    pub fn to_owned(&self) -> ImageBuf<Color>
    where
        Color: Clone,
    {
        let (width, height) = self.dimensions();
        Image::new_unchecked(width, height, self.as_slice().to_owned())
    }

    /// Returns a rectangular view into the [`Image`] whose top-left pixel is at `(x, y)`.
    ///
    /// Returns `None` if the rectangle does not lie fully inside the image.
    ///
    /// # Examples
    ///
    /// ```
    /// # use palettize::ImageRef;
    /// let pixels: Vec<[u8; 4]> = (0..16).map(|i| [i, 0, 0, 255]).collect();
    /// let image = ImageRef::new(4, 4, pixels.as_slice()).unwrap();
    /// let region = image.region(1, 2, 2, 2).unwrap();
    /// let red: Vec<u8> = region.pixels().map(|p| p[0]).collect();
    /// assert_eq!(red, [9, 10, 13, 14]);
    /// assert!(image.region(3, 3, 2, 1).is_none());
    /// ```
    #[must_use]
    #[inline]
    pub fn region(&self, x: u32, y: u32, width: u32, height: u32) -> Option<Region<'_, Color>> {
        let fits =
            |start: u32, len: u32, max: u32| start.checked_add(len).is_some_and(|end| end <= max);
        if fits(x, width, self.width) && fits(y, height, self.height) {
            Some(Region {
                pixels: self.as_slice(),
                stride: self.width,
                x,
                y,
                width,
                height,
            })
        } else {
            None
        }
    }

    /// Map the pixel buffer of an [`Image`] using the provided [`IndexedColorMap`].
    ///
    /// # Panics
    ///
    /// Panics if `color_map` is not a valid implementor of [`IndexedColorMap`]. That is, it returns
    /// a [`Vec`] with a different length than the input slice.
    #[must_use]
    #[inline]
    pub fn map_to_image<ColorMap: IndexedColorMap<Color>>(
        &self,
        color_map: ColorMap,
    ) -> ImageBuf<ColorMap::Output>
    where
        Color: RgbaPixel,
    {
        let pixels = color_map.map_to_colors(self.as_slice());
        assert_eq!(pixels.len(), self.num_pixels() as usize);
        let (width, height) = self.dimensions();
        Image::new_unchecked(width, height, pixels)
    }

    /// Convert an [`Image`] to an [`IndexedImage`] using the provided [`IndexedColorMap`].
    ///
    /// # Panics
    ///
    /// Panics if `color_map` is not a valid implementor of [`IndexedColorMap`]. That is, it returns
    /// a [`Vec`] with a different length than the input slice.
    #[must_use]
    #[inline]
    pub fn map_to_indexed<ColorMap: IndexedColorMap<Color>>(
        &self,
        color_map: ColorMap,
    ) -> IndexedImage<ColorMap::Output>
    where
        Color: RgbaPixel,
    {
        let indices = color_map.map_to_indices(self.as_slice());
        assert_eq!(indices.len(), self.num_pixels() as usize);
        let (width, height) = self.dimensions();
        IndexedImage::new_unchecked(width, height, color_map.into_palette(), indices)
    }

    #[cfg(feature = "threads")]
    /// Convert an [`Image`] to an [`IndexedImage`] in parallel using the provided [`IndexedColorMap`].
    ///
    /// The result is identical to [`map_to_indexed`](Self::map_to_indexed).
    ///
    /// # Panics
    ///
    /// Panics if `color_map` is not a valid implementor of [`IndexedColorMap`]. That is, it returns
    /// a [`Vec`] with a different length than the input slice.
    #[must_use]
    pub fn map_to_indexed_par<ColorMap>(&self, color_map: ColorMap) -> IndexedImage<ColorMap::Output>
    where
        Color: RgbaPixel,
        ColorMap: IndexedColorMap<Color> + Sync,
    {
        let indices: Vec<u8> = self
            .as_slice()
            .par_chunks(PAR_CHUNK_LEN)
            .flat_map_iter(|chunk| color_map.map_to_indices(chunk))
            .collect();
        assert_eq!(indices.len(), self.num_pixels() as usize);
        let (width, height) = self.dimensions();
        IndexedImage::new_unchecked(width, height, color_map.into_palette(), indices)
    }
}

impl<Color: Clone> ImageBuf<Color> {
    /// Create a new [`ImageBuf`] by cloning a specific color.
    ///
    /// Returns `None` if `width * height` overflows a `u32`.
    #[must_use]
    #[inline]
    pub fn from_pixel(width: u32, height: u32, pixel: Color) -> Option<Self> {
        let len = width.checked_mul(height)?;
        let pixels = vec![pixel; len as usize];
        Some(Self::new_unchecked(width, height, pixels))
    }
}

impl<Color> Default for ImageBuf<Color> {
    #[inline]
    fn default() -> Self {
        Self::new_unchecked(0, 0, Vec::new())
    }
}

impl<Color> Default for ImageRef<'_, Color> {
    #[inline]
    fn default() -> Self {
        Self::new_unchecked(0, 0, &[])
    }
}

impl<ColorA, ColorB, ContainerA, ContainerB> PartialEq<Image<ColorB, ContainerB>>
    for Image<ColorA, ContainerA>
where
    ColorA: PartialEq<ColorB>,
    ContainerA: AsRef<[ColorA]>,
    ContainerB: AsRef<[ColorB]>,
{
    fn eq(&self, other: &Image<ColorB, ContainerB>) -> bool {
        self.dimensions() == other.dimensions() && self.as_slice() == other.as_slice()
    }
}

impl<Color, Container> Eq for Image<Color, Container>
where
    Color: Eq,
    Container: AsRef<[Color]>,
{
}

impl<Color, Container> Hash for Image<Color, Container>
where
    Color: Hash,
    Container: AsRef<[Color]>,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.width.hash(state);
        self.height.hash(state);
        self.pixels.as_ref().hash(state);
    }
}

/// A rectangular view into the pixels of an [`Image`].
///
/// Created by [`Image::region`]. The rows of a [`Region`] are not contiguous in memory unless the
/// region spans the full width of the image.
#[derive(Debug, Clone, Copy)]
pub struct Region<'a, Color> {
    /// The pixels of the whole image.
    pixels: &'a [Color],
    /// The width of the whole image.
    stride: u32,
    /// The column of the top-left pixel.
    x: u32,
    /// The row of the top-left pixel.
    y: u32,
    /// The width of the region.
    width: u32,
    /// The height of the region.
    height: u32,
}

impl<'a, Color> Region<'a, Color> {
    /// Returns the width and height of the [`Region`].
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns the position of the top-left pixel of the [`Region`] inside its [`Image`].
    #[inline]
    pub fn offset(&self) -> (u32, u32) {
        (self.x, self.y)
    }

    /// Returns the number of pixels in the [`Region`].
    #[inline]
    pub fn num_pixels(&self) -> u32 {
        self.width * self.height
    }

    /// Returns whether the [`Region`] has zero pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns an iterator over the rows of the [`Region`] from top to bottom.
    #[inline]
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &'a [Color]> + 'a {
        let Self { pixels, stride, x, y, width, height } = *self;
        let (stride, x, width) = (stride as usize, x as usize, width as usize);
        (y as usize..(y + height) as usize).map(move |row| {
            let start = row * stride + x;
            &pixels[start..start + width]
        })
    }

    /// Returns an iterator over the pixels of the [`Region`] in row-major order.
    #[inline]
    pub fn pixels(&self) -> impl Iterator<Item = &'a Color> + 'a {
        self.rows().flatten()
    }
}

#[cfg(feature = "image")]
mod image_integration {
    use super::{CreateImageBufError, CreateImageError, Image, ImageBuf, ImageRef};
    use alloc::vec::Vec;
    use core::ops::Deref;
    use image::{ImageBuffer, Pixel, Rgba};
    use palette::{
        ArrayExt, Srgba,
        cast::{ArrayCast, ComponentsAs as _, ComponentsInto as _, IntoComponents as _},
    };

    impl<Component> From<ImageBuf<Srgba<Component>>> for ImageBuffer<Rgba<Component>, Vec<Component>>
    where
        Srgba<Component>: ArrayCast,
        <Srgba<Component> as ArrayCast>::Array: ArrayExt<Item = Component>,
        Rgba<Component>: Pixel<Subpixel = Component>,
    {
        #[allow(clippy::expect_used)]
        fn from(image: ImageBuf<Srgba<Component>>) -> Self {
            let Image { width, height, pixels, .. } = image;
            ImageBuffer::from_raw(width, height, pixels.into_components())
                .expect("buffer length matches the dimensions")
        }
    }

    impl<Component> TryFrom<ImageBuffer<Rgba<Component>, Vec<Component>>> for ImageBuf<Srgba<Component>>
    where
        Srgba<Component>: ArrayCast,
        <Srgba<Component> as ArrayCast>::Array: ArrayExt<Item = Component>,
        Rgba<Component>: Pixel<Subpixel = Component>,
    {
        type Error = CreateImageBufError<ImageBuffer<Rgba<Component>, Vec<Component>>>;

        fn try_from(
            image: ImageBuffer<Rgba<Component>, Vec<Component>>,
        ) -> Result<Self, Self::Error> {
            let (width, height) = image.dimensions();
            match width.checked_mul(height) {
                Some(len) if image.as_raw().len() >= len as usize * 4 => {
                    let mut buf = image.into_raw();
                    buf.truncate(len as usize * 4);
                    buf.shrink_to_fit();
                    Ok(Self::new_unchecked(width, height, buf.components_into()))
                }
                _ => {
                    let error = CreateImageError { width, height, length: image.as_raw().len() / 4 };
                    Err(CreateImageBufError { error, buffer: image })
                }
            }
        }
    }

    impl<'a, Component, Container> TryFrom<&'a ImageBuffer<Rgba<Component>, Container>>
        for ImageRef<'a, Srgba<Component>>
    where
        Srgba<Component>: ArrayCast<Array = [Component; 4]>,
        Rgba<Component>: Pixel<Subpixel = Component>,
        Container: Deref<Target = [Component]>,
    {
        type Error = CreateImageError;

        fn try_from(
            image: &'a ImageBuffer<Rgba<Component>, Container>,
        ) -> Result<Self, Self::Error> {
            let (width, height) = image.dimensions();
            let raw: &[Component] = image.as_raw();
            match width.checked_mul(height) {
                Some(len) if raw.len() >= len as usize * 4 => {
                    let pixels: &[Srgba<Component>] = raw[..len as usize * 4].components_as();
                    Ok(Self::new_unchecked(width, height, pixels))
                }
                _ => Err(CreateImageError { width, height, length: raw.len() / 4 }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::*;
    use alloc::vec::Vec;

    #[test]
    fn new_rejects_mismatched_length() {
        let pixels = test_data(10, 0);
        let err = ImageRef::new(3, 3, pixels.as_slice()).unwrap_err();
        assert_eq!(err.error, CreateImageError { width: 3, height: 3, length: 10 });
        assert!(ImageRef::new(u32::MAX, 2, pixels.as_slice()).is_err());
    }

    #[test]
    fn region_rows_are_strided() {
        let pixels = test_data(6 * 5, 3);
        let image = ImageRef::new(6, 5, pixels.as_slice()).unwrap();
        let region = image.region(2, 1, 3, 4).unwrap();
        assert_eq!(region.num_pixels(), 12);
        assert_eq!(region.rows().len(), 4);
        for (i, row) in region.rows().enumerate() {
            let start = (i + 1) * 6 + 2;
            assert_eq!(row, &pixels[start..start + 3]);
        }
    }

    #[test]
    fn region_bounds() {
        let pixels = test_data(4 * 4, 0);
        let image = ImageRef::new(4, 4, pixels.as_slice()).unwrap();
        assert!(image.region(0, 0, 4, 4).is_some());
        assert!(image.region(4, 4, 0, 0).is_some_and(|r| r.is_empty()));
        assert!(image.region(1, 0, 4, 1).is_none());
        assert!(image.region(0, u32::MAX, 1, 2).is_none());
        let full: Vec<_> = image.region(0, 0, 4, 4).unwrap().pixels().copied().collect();
        assert_eq!(full, pixels);
    }
}
