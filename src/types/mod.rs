mod error;
mod image;
mod indexed_image;
mod palette;

pub use error::*;
pub use image::*;
pub use indexed_image::*;
pub use palette::*;
