use crate::{IndexedColorMap, Palette, QuantizeError, RgbaPixel};
use alloc::{vec, vec::Vec};
use ordered_float::OrderedFloat;
use wide::f32x4;

/// A palette color stored in the tree along with its palette index.
#[derive(Debug, Clone, Copy, PartialEq)]
struct KdNode {
    /// The normalized RGBA color.
    color: [f32; 4],
    /// The index of the color in the palette.
    index: u8,
}

/// The squared euclidean distance between two normalized RGBA colors.
#[inline]
fn distance_squared(a: f32x4, b: [f32; 4]) -> f32 {
    let diff = a - f32x4::new(b);
    (diff * diff).reduce_add()
}

/// An [`IndexedColorMap`] that maps input colors to their exact nearest palette color according to
/// euclidean distance in normalized RGBA space.
///
/// The palette is stored as a balanced k-d tree in a flat heap layout: the node at slot `i` has its
/// children at slots `2i + 1` and `2i + 2`. Each level splits on the next of the red, green, blue,
/// and alpha axes in turn.
///
/// # Examples
///
/// ```
/// # use palettize::{KdTreeColorMap, Palette};
/// # fn main() -> Result<(), palettize::QuantizeError> {
/// let palette = Palette::new(vec![[0u8, 0, 0, 255], [255, 255, 255, 255], [255, 0, 0, 255]])?;
/// let color_map = KdTreeColorMap::new(palette)?;
/// assert_eq!(color_map.get_index([200u8, 30, 20, 255]), (2, [255, 0, 0, 255]));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct KdTreeColorMap<Color> {
    /// The palette of colors.
    palette: Palette<Color>,
    /// The tree nodes in heap order, `None` for unused slots.
    nodes: Vec<Option<KdNode>>,
}

impl<Color: RgbaPixel> KdTreeColorMap<Color> {
    /// Create a new [`KdTreeColorMap`] from a `palette` of colors.
    ///
    /// # Errors
    ///
    /// Returns [`QuantizeError::EmptyPalette`] if `palette` has no colors.
    pub fn new(palette: Palette<Color>) -> Result<Self, QuantizeError> {
        if palette.is_empty() {
            return Err(QuantizeError::EmptyPalette);
        }

        #[allow(clippy::cast_possible_truncation)]
        let mut points = palette
            .iter()
            .enumerate()
            .map(|(i, color)| KdNode { color: color.to_vector(), index: i as u8 })
            .collect::<Vec<_>>();

        let depth = palette.len().ilog2() + 1;
        let mut nodes = vec![None; (1 << depth) - 1];
        build(&mut nodes, &mut points, 0, 0);

        log::debug!("built k-d tree with {} slots for {} colors", nodes.len(), palette.len());

        Ok(Self { palette, nodes })
    }

    /// Returns the index of the nearest palette color to `pixel` along with the palette color
    /// itself.
    ///
    /// Ties between equidistant palette colors are resolved by tree order, not palette order.
    #[must_use]
    #[inline]
    pub fn get_index<P: RgbaPixel>(&self, pixel: P) -> (u8, Color) {
        let index = self.nearest(pixel.to_vector());
        (index, self.palette[index])
    }

    /// Returns the palette index nearest to the normalized `query` color.
    #[inline]
    fn nearest(&self, query: [f32; 4]) -> u8 {
        let mut best = (f32::INFINITY, 0);
        self.search(0, 0, f32x4::new(query), query, &mut best);
        best.1
    }

    /// Visit the subtree rooted at `slot`, updating `best` with any closer palette color.
    fn search(
        &self,
        slot: usize,
        depth: usize,
        query: f32x4,
        coords: [f32; 4],
        best: &mut (f32, u8),
    ) {
        let Some(Some(node)) = self.nodes.get(slot) else {
            return;
        };

        let distance = distance_squared(query, node.color);
        if distance < best.0 {
            *best = (distance, node.index);
        }

        let axis = depth % 4;
        let diff = coords[axis] - node.color[axis];
        let (near, far) = if diff < 0.0 {
            (2 * slot + 1, 2 * slot + 2)
        } else {
            (2 * slot + 2, 2 * slot + 1)
        };

        self.search(near, depth + 1, query, coords, best);
        if diff * diff < best.0 {
            self.search(far, depth + 1, query, coords, best);
        }
    }
}

impl<Color> KdTreeColorMap<Color> {
    /// Consume a [`KdTreeColorMap`] and return the underlying color palette.
    #[must_use]
    #[inline]
    pub fn into_palette(self) -> Palette<Color> {
        self.palette
    }

    /// Return a reference to the underlying color palette.
    #[inline]
    pub fn palette(&self) -> &Palette<Color> {
        &self.palette
    }
}

/// Place the median of `points` along the axis for `depth` at `slot` and recurse on both halves.
fn build(nodes: &mut [Option<KdNode>], points: &mut [KdNode], slot: usize, depth: usize) {
    if points.is_empty() {
        return;
    }

    let axis = depth % 4;
    points.sort_unstable_by_key(|node| {
        let c = node.color.map(OrderedFloat);
        (c[axis], c[(axis + 1) % 4], c[(axis + 2) % 4], c[(axis + 3) % 4], node.index)
    });

    let median = (points.len() - 1) / 2;
    nodes[slot] = Some(points[median]);

    let (lower, upper) = points.split_at_mut(median);
    build(nodes, lower, 2 * slot + 1, depth + 1);
    build(nodes, &mut upper[1..], 2 * slot + 2, depth + 1);
}

impl<Input, Color> IndexedColorMap<Input> for KdTreeColorMap<Color>
where
    Input: RgbaPixel,
    Color: RgbaPixel,
{
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
        self.nearest(color.to_vector())
    }
}
