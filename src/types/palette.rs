use crate::{QuantizeError, RgbaPixel};
use alloc::vec::Vec;
use core::{
    fmt,
    ops::{Deref, Index},
};

/// The number of colors to request from a quantizer.
///
/// This is a simple new type wrapper around `u16` with the invariant that it must be
/// in the range `0..=256` specified by [`PaletteSize::ZERO`] and [`PaletteSize::MAX`].
/// Requesting zero colors is valid and yields an empty palette.
///
/// # Examples
///
/// ```
/// # use palettize::{PaletteSize, QuantizeError};
/// # fn main() -> Result<(), QuantizeError> {
/// let size: PaletteSize = 64u16.try_into()?;
/// assert_eq!(size, 64u16);
/// assert_eq!(PaletteSize::try_from(16usize)?, 16usize);
/// assert_eq!(PaletteSize::try_from_u16(256), Some(PaletteSize::MAX));
/// assert_eq!(PaletteSize::try_from_u16(1024), None);
/// assert_eq!(PaletteSize::from_u16_clamped(1024), PaletteSize::MAX);
/// assert_eq!(PaletteSize::from(0u8), PaletteSize::ZERO);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PaletteSize(u16);

impl PaletteSize {
    /// A request for no colors.
    pub const ZERO: Self = Self(0);

    /// The largest possible palette size, which is `256`.
    pub const MAX: Self = Self(crate::MAX_COLORS);

    /// Returns a [`PaletteSize`] as a `u16`.
    #[inline]
    pub const fn as_u16(&self) -> u16 {
        self.0
    }

    /// Returns a [`PaletteSize`] as a `usize`.
    #[inline]
    pub const fn as_usize(&self) -> usize {
        self.0 as usize
    }

    /// Create a [`PaletteSize`] from a `u16`, returning `None` if the provided `value`
    /// is greater than [`PaletteSize::MAX`].
    #[must_use]
    #[inline]
    pub const fn try_from_u16(value: u16) -> Option<Self> {
        if value <= Self::MAX.as_u16() {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Create a [`PaletteSize`] from a `usize`, returning `None` if the provided `value`
    /// is greater than [`PaletteSize::MAX`].
    #[must_use]
    #[inline]
    pub const fn try_from_usize(value: usize) -> Option<Self> {
        if value <= Self::MAX.as_usize() {
            #[allow(clippy::cast_possible_truncation)]
            Some(Self(value as u16))
        } else {
            None
        }
    }

    /// Create a [`PaletteSize`] from a `u16`, clamping the provided `value` to
    /// a maximum of [`PaletteSize::MAX`].
    #[must_use]
    #[inline]
    pub const fn from_u16_clamped(value: u16) -> Self {
        if let Some(size) = Self::try_from_u16(value) {
            size
        } else {
            Self::MAX
        }
    }

    /// Create a [`PaletteSize`] from a `usize`, clamping the provided `value` to
    /// a maximum of [`PaletteSize::MAX`].
    #[must_use]
    #[inline]
    pub const fn from_usize_clamped(value: usize) -> Self {
        if let Some(size) = Self::try_from_usize(value) {
            size
        } else {
            Self::MAX
        }
    }

    /// Create a [`PaletteSize`] from a `u8`. Every `u8` is a valid size.
    #[must_use]
    #[inline]
    pub const fn from_u8(value: u8) -> Self {
        Self(value as u16)
    }
}

impl Default for PaletteSize {
    #[inline]
    fn default() -> Self {
        Self::MAX
    }
}

impl From<PaletteSize> for u16 {
    #[inline]
    fn from(size: PaletteSize) -> Self {
        size.as_u16()
    }
}

impl From<PaletteSize> for usize {
    #[inline]
    fn from(size: PaletteSize) -> Self {
        size.as_usize()
    }
}

impl From<u8> for PaletteSize {
    #[inline]
    fn from(value: u8) -> Self {
        Self::from_u8(value)
    }
}

impl TryFrom<u16> for PaletteSize {
    type Error = QuantizeError;

    #[inline]
    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::try_from_u16(value)
            .ok_or(QuantizeError::PaletteSizeOutOfRange { requested: value.into() })
    }
}

impl TryFrom<usize> for PaletteSize {
    type Error = QuantizeError;

    #[inline]
    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::try_from_usize(value).ok_or(QuantizeError::PaletteSizeOutOfRange { requested: value })
    }
}

impl PartialEq<u16> for PaletteSize {
    #[inline]
    fn eq(&self, other: &u16) -> bool {
        self.as_u16() == *other
    }
}

impl PartialEq<PaletteSize> for u16 {
    #[inline]
    fn eq(&self, other: &PaletteSize) -> bool {
        *self == other.as_u16()
    }
}

impl PartialEq<usize> for PaletteSize {
    #[inline]
    fn eq(&self, other: &usize) -> bool {
        self.as_usize() == *other
    }
}

impl PartialEq<PaletteSize> for usize {
    #[inline]
    fn eq(&self, other: &PaletteSize) -> bool {
        *self == other.as_usize()
    }
}

impl fmt::Display for PaletteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self(size) = *self;
        write!(f, "{size}")
    }
}

/// An ordered list of at most 256 colors.
///
/// The position of a color is its palette index, so every index fits in a `u8`.
/// A [`Palette`] may be empty, for example when built from an empty image.
///
/// # Examples
///
/// ```
/// # use palettize::{Palette, QuantizeError};
/// # use palette::Srgba;
/// # fn main() -> Result<(), QuantizeError> {
/// let palette = Palette::new(vec![Srgba::new(0u8, 0, 0, 255), Srgba::new(255, 255, 255, 255)])?;
/// assert_eq!(palette.len(), 2);
/// assert_eq!(palette.size(), 2u16);
/// assert_eq!(palette[1u8], Srgba::new(255, 255, 255, 255));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Palette<T>(Vec<T>);

impl<T> Palette<T> {
    /// The maximum length of a [`Palette`], which is 256.
    pub const MAX_LEN: usize = PaletteSize::MAX.as_usize();

    /// Create a [`Palette`] without validating its length.
    #[inline]
    pub(crate) fn new_unchecked(colors: Vec<T>) -> Self {
        debug_assert!(colors.len() <= Self::MAX_LEN);
        Self(colors)
    }

    /// Create a new [`Palette`] from a [`Vec`] of colors.
    ///
    /// # Errors
    ///
    /// Returns [`QuantizeError::PaletteTooLarge`] if `colors` has more than 256 elements.
    #[inline]
    pub fn new(colors: Vec<T>) -> Result<Self, QuantizeError> {
        if colors.len() <= Self::MAX_LEN {
            Ok(Self(colors))
        } else {
            Err(QuantizeError::PaletteTooLarge { len: colors.len() })
        }
    }

    /// Returns the length of a [`Palette`] as a [`PaletteSize`].
    #[must_use]
    #[inline]
    pub fn size(&self) -> PaletteSize {
        PaletteSize::from_usize_clamped(self.0.len())
    }

    /// Returns the colors as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    /// Consume a [`Palette`] and return the inner [`Vec`] of colors.
    #[must_use]
    #[inline]
    pub fn into_vec(self) -> Vec<T> {
        self.0
    }

    /// Map each [`Palette`] color to a new color to create a new [`Palette`].
    #[must_use]
    #[inline]
    pub fn map_ref<U>(&self, mapping: impl FnMut(&T) -> U) -> Palette<U> {
        Palette::new_unchecked(self.0.iter().map(mapping).collect())
    }
}

impl<T: RgbaPixel> Palette<T> {
    /// Returns the index of the first color with zero alpha, if any.
    ///
    /// Indexed formats like GIF mark a single palette entry as transparent, so only the first
    /// such color is reported.
    #[must_use]
    pub fn transparent_index(&self) -> Option<u8> {
        let i = self.0.iter().position(|color| color.to_rgba8()[3] == 0)?;
        u8::try_from(i).ok()
    }
}

impl<T> Default for Palette<T> {
    #[inline]
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> Deref for Palette<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<T> AsRef<[T]> for Palette<T> {
    #[inline]
    fn as_ref(&self) -> &[T] {
        self
    }
}

impl<T> Index<u8> for Palette<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: u8) -> &Self::Output {
        &self.0[usize::from(index)]
    }
}

impl<T> TryFrom<Vec<T>> for Palette<T> {
    type Error = QuantizeError;

    #[inline]
    fn try_from(colors: Vec<T>) -> Result<Self, Self::Error> {
        Self::new(colors)
    }
}

impl<T> From<Palette<T>> for Vec<T> {
    #[inline]
    fn from(palette: Palette<T>) -> Self {
        palette.into_vec()
    }
}

impl<T> IntoIterator for Palette<T> {
    type Item = T;
    type IntoIter = alloc::vec::IntoIter<T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Palette<T> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn palette_size_range() {
        assert_eq!(PaletteSize::try_from(0u16), Ok(PaletteSize::ZERO));
        assert_eq!(PaletteSize::try_from(256usize), Ok(PaletteSize::MAX));
        assert_eq!(
            PaletteSize::try_from(257u16),
            Err(QuantizeError::PaletteSizeOutOfRange { requested: 257 }),
        );
        assert_eq!(PaletteSize::from_usize_clamped(usize::MAX), PaletteSize::MAX);
    }

    #[test]
    fn palette_length_limit() {
        assert!(Palette::new(vec![0u8; 256]).is_ok());
        assert_eq!(Palette::new(vec![0u8; 257]), Err(QuantizeError::PaletteTooLarge { len: 257 }));
        let empty = Palette::<u8>::new(Vec::new()).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.size(), PaletteSize::ZERO);
    }

    #[test]
    fn first_transparent_color_wins() {
        let palette = Palette::new(vec![
            [255u8, 0, 0, 255],
            [0, 0, 0, 0],
            [0, 255, 0, 128],
            [9, 9, 9, 0],
        ])
        .unwrap();
        assert_eq!(palette.transparent_index(), Some(1));

        let opaque = Palette::new(vec![[255u8, 0, 0, 255], [0, 255, 0, 1]]).unwrap();
        assert_eq!(opaque.transparent_index(), None);
        assert_eq!(Palette::<[u8; 4]>::default().transparent_index(), None);
    }
}
