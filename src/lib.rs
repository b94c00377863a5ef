//! # GIF decoder
//!
//! Decodes GIF87a and GIF89a streams into a sequence of composited RGBA
//! frames. Every frame covers the whole logical screen, with the disposal
//! method of the previous frame already applied.
//!
//! ```no_run
//! let decoded = gifstream::decode_file("tests/samples/sample_1.gif");
//! for frame in &decoded.frames {
//!     println!("{}x{} for {} ms", frame.width, frame.height, frame.delay_ms());
//! }
//! ```
//!
//! Decoding is lenient by default. Image data that ends early is zero
//! filled and images reaching past the logical screen are clipped, see
//! [`Leniency`].

#[macro_use]
extern crate enum_primitive;

use std::fs::File;
use std::io::Read;
use std::path::Path;

mod reader;
mod traits;
mod types;

pub use crate::traits::{HasParameters, Parameter};
pub use crate::types::{
    Block, DisposalMethod, Extension, Frame, GraphicControl, ImageDescriptor, LogicalScreen, Rect,
    N_CHANNELS, PLTE_CHANNELS,
};

pub use crate::reader::{
    Application, BlockKind, ColorTable, DecodeOptions, Decoded, Decoder, DecodingError, Leniency,
    MemoryLimit, Progress, Reader, Status,
};

/// Decodes every frame of a GIF stream.
pub fn decode<R: Read>(r: R) -> Decoded {
    Reader::new(r).read_to_end()
}

/// Decodes every frame of a GIF file.
///
/// A file that cannot be opened is reported with [`Status::OpenError`].
pub fn decode_file<P: AsRef<Path>>(path: P) -> Decoded {
    match File::open(path) {
        Ok(file) => decode(file),
        Err(err) => Decoded::failed(DecodingError::Open(err)),
    }
}
