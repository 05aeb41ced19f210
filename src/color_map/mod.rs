//! Map the colors of an image to palette indices.

use crate::{Palette, RgbaPixel};
use alloc::vec::Vec;

mod kd_tree;

pub use kd_tree::*;

/// A trait for mapping colors to a restricted set of palette colors.
///
/// Implementors of this trait consist of a palette and a lookup data structure to map
/// any input color to one of the palette colors. This is the contract consumed by indexed-image
/// encoding ([`Image::map_to_indexed`](crate::Image::map_to_indexed)) and by dithering stages.
///
/// The main function of interest is [`palette_index`](IndexedColorMap::palette_index) which takes
/// a color as input and returns an index into [`palette`](IndexedColorMap::palette). The slice
/// mapping functions have default implementations based off
/// [`palette_index`](IndexedColorMap::palette_index).
///
/// The color maps provided by this crate are:
/// - [`WuColorMap`](crate::wu::WuColorMap), which looks up the histogram box a color falls into.
/// - [`KdTreeColorMap`], which finds the exact nearest palette color.
pub trait IndexedColorMap<Input: RgbaPixel> {
    /// The output color type.
    type Output: Clone + Send + Sync;

    /// Consume this color map and return the underlying [`Palette`] of output colors.
    fn into_palette(self) -> Palette<Self::Output>;

    /// Returns a reference to the underlying [`Palette`] of output colors.
    fn palette(&self) -> &Palette<Self::Output>;

    /// Returns the index of the palette color for the given input `color`.
    fn palette_index(&self, color: &Input) -> u8;

    /// Returns the palette color for the given input `color`.
    #[inline]
    fn palette_color(&self, color: &Input) -> Self::Output {
        self.palette()[self.palette_index(color)].clone()
    }

    /// Map each `input` color to an index for one of the palette colors.
    ///
    /// Runs of identical colors are only looked up once.
    #[inline]
    fn map_to_indices(&self, input: &[Input]) -> Vec<u8> {
        let mut indices = Vec::with_capacity(input.len());
        let mut previous = None;
        for color in input {
            let index = match previous {
                Some((prev, index)) if prev == *color => index,
                _ => self.palette_index(color),
            };
            previous = Some((*color, index));
            indices.push(index);
        }
        indices
    }

    /// Map each `input` color to one of the palette colors.
    #[inline]
    fn map_to_colors(&self, input: &[Input]) -> Vec<Self::Output> {
        let palette = self.palette();
        self.map_to_indices(input)
            .into_iter()
            .map(|i| palette[i].clone())
            .collect()
    }
}

impl<Input, R> IndexedColorMap<Input> for &R
where
    Input: RgbaPixel,
    R: IndexedColorMap<Input>,
{
    type Output = R::Output;

    #[inline]
    fn into_palette(self) -> Palette<Self::Output> {
        self.palette().clone()
    }

    #[inline]
    fn palette(&self) -> &Palette<Self::Output> {
        (*self).palette()
    }

    #[inline]
    fn palette_index(&self, color: &Input) -> u8 {
        (*self).palette_index(color)
    }

    #[inline]
    fn palette_color(&self, color: &Input) -> Self::Output {
        (*self).palette_color(color)
    }

    #[inline]
    fn map_to_indices(&self, input: &[Input]) -> Vec<u8> {
        (*self).map_to_indices(input)
    }

    #[inline]
    fn map_to_colors(&self, input: &[Input]) -> Vec<Self::Output> {
        (*self).map_to_colors(input)
    }
}
