//! Wu's color quantization method (Greedy Orthogonal Bipartitioning) over RGBA colors.
//!
//! Pixels are counted into a coarse four dimensional histogram (see [`Precision`]) whose bins
//! store the [`Moment`]s of the pixels that fell into them. After the histogram is made
//! cumulative, the statistics of any axis aligned box of bins can be read in constant time.
//! The quantizer then repeatedly takes the box with the greatest variance and cuts it along the
//! axis and bin that best separate its colors, until the requested number of boxes is reached or
//! no box can be split further. The mean color of each box becomes a palette color.
//!
//! This is much faster than iterative clustering while still giving good palettes. See
//! [`WuQuantizer`] for the entry point and [`WuColorMap`] for mapping pixels to the resulting
//! palette.

mod color_map;
mod histogram;
mod moment;
mod quantizer;

pub use color_map::*;
pub use histogram::*;
pub use moment::*;
pub use quantizer::*;
