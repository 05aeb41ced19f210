use core::{error::Error, fmt};

/// The error type for palette construction and quantization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantizeError {
    /// The requested number of palette colors was above the maximum of 256.
    PaletteSizeOutOfRange {
        /// The requested number of colors.
        requested: usize,
    },
    /// The histogram precision was outside the supported range of `1..=7` bits per channel.
    PrecisionOutOfRange {
        /// The requested number of bits for the red, green, and blue channels.
        index_bits: u8,
        /// The requested number of bits for the alpha channel.
        index_alpha_bits: u8,
    },
    /// Failed to allocate a zeroed buffer for the histogram or tag table.
    AllocationFailed {
        /// The size of the failed allocation in bytes.
        bytes: usize,
    },
    /// A palette was provided with more than 256 colors.
    PaletteTooLarge {
        /// The length of the provided palette.
        len: usize,
    },
    /// A color map was requested over a palette with no colors.
    EmptyPalette,
}

impl fmt::Display for QuantizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::PaletteSizeOutOfRange { requested } => write!(
                f,
                "requested {requested} palette colors which is above the maximum of 256",
            ),
            Self::PrecisionOutOfRange { index_bits, index_alpha_bits } => write!(
                f,
                "histogram precision of {index_bits} color bits and {index_alpha_bits} alpha bits \
                 is not in the supported range of 1..=7",
            ),
            Self::AllocationFailed { bytes } => {
                write!(f, "failed to allocate {bytes} bytes for the color histogram")
            }
            Self::PaletteTooLarge { len } => write!(
                f,
                "got a palette with {len} colors which is above the maximum of 256",
            ),
            Self::EmptyPalette => f.write_str("the palette has no colors"),
        }
    }
}

impl Error for QuantizeError {}
