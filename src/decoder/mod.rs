//! Container demuxing, decoding and pixel conversion.

pub mod convert;
pub mod session;

pub use convert::{CropGeometry, RgbaConverter};
pub use session::{DecoderSession, StreamDescriptor};
