//! Color quantization for indexed-color image encoding.
//!
//! `palettize` reduces an RGBA image to a palette of at most 256 colors using Wu's variance
//! minimizing quantizer (see the [`wu`] module) and maps pixels to palette indices through the
//! [`IndexedColorMap`] trait. Two color maps are provided:
//! - [`WuColorMap`](wu::WuColorMap): an O(1) lookup of the histogram box each pixel falls into.
//! - [`KdTreeColorMap`]: an exact nearest neighbor search over any palette.
//!
//! # Example
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use palettize::{ImageRef, QuantizeOptions, quantize};
//! use palette::Srgba;
//!
//! let pixels = vec![
//!     Srgba::new(0u8, 0, 0, 255),
//!     Srgba::new(255, 255, 255, 255),
//!     Srgba::new(255, 0, 0, 255),
//!     Srgba::new(255, 0, 0, 255),
//! ];
//! let image = ImageRef::new(2, 2, pixels.as_slice()).unwrap();
//! let indexed = quantize(image, &QuantizeOptions::new(2)?)?;
//! assert_eq!(indexed.palette().len(), 2);
//! assert_eq!(indexed.indices()[2], indexed.indices()[3]);
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - `std` (default): enables the standard library in dependencies.
//! - `threads` (default): parallel histogram accumulation and pixel mapping using `rayon`.
//! - `image`: conversions to and from [`image::RgbaImage`].

#![no_std]
#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::pedantic,
    clippy::cargo,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::expect_used,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice,
    missing_docs,
    rustdoc::all,
    clippy::float_cmp_const,
    clippy::lossy_float_literal
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::many_single_char_names,
    clippy::unreadable_literal,
    clippy::wildcard_imports
)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod api;
mod color_map;
mod deps;
mod traits;
mod types;

pub mod wu;

pub use api::*;
pub use color_map::*;
pub use deps::*;
pub use traits::*;
pub use types::*;

/// The maximum supported number of palette colors is 256.
pub const MAX_COLORS: u16 = u8::MAX as u16 + 1;

/// The maximum supported image size in number of pixels is `u32::MAX`.
pub const MAX_PIXELS: u32 = u32::MAX;
