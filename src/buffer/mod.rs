//! Buffer abstractions for 4D protocol encoding/decoding
//!
//! Requests are text header blocks assembled with [`WriteBuffer`]. Row data is
//! binary and little-endian; [`BinaryRead`] decodes it from anything that can
//! hand out exactly `n` bytes, whether that is a live transport or an
//! in-memory [`ReadBuffer`].

mod decode;
mod read;
mod write;

pub use decode::BinaryRead;
pub use read::ReadBuffer;
pub use write::WriteBuffer;
