//! Typed little-endian readers for 4D row data
//!
//! Every primitive is built on a single operation, [`BinaryRead::read_exactly`],
//! so the same decoding code runs against a socket and against a byte slice.

use bytes::Bytes;

use crate::constants::{DecodeMode, MAX_VALUE_SIZE};
use crate::error::{Error, Result};

/// Binary decoder for the 4D row stream
///
/// Implementors only provide `read_exactly`; it must either return exactly
/// `n` bytes or fail. A short result is never acceptable because every later
/// value would be decoded from the wrong offset.
pub trait BinaryRead {
    /// Read exactly `n` bytes
    fn read_exactly(&mut self, n: usize) -> Result<Bytes>;

    /// Discard exactly `n` bytes
    fn skip(&mut self, n: usize) -> Result<()> {
        self.read_exactly(n).map(|_| ())
    }

    /// Read one unsigned byte
    fn read_ubyte(&mut self) -> Result<u8> {
        let bytes = self.read_exactly(1)?;
        Ok(bytes[0])
    }

    /// Read a little-endian unsigned 16-bit integer
    fn read_u16_le(&mut self) -> Result<u16> {
        let bytes = self.read_exactly(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Read a little-endian signed 16-bit integer
    ///
    /// Values at or above 0x8000 wrap to negative (subtract 0x10000).
    fn read_i16_le(&mut self) -> Result<i16> {
        Ok(self.read_u16_le()? as i16)
    }

    /// Read a little-endian unsigned 32-bit integer
    fn read_u32_le(&mut self) -> Result<u32> {
        let bytes = self.read_exactly(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read a little-endian signed 32-bit integer
    fn read_i32_le(&mut self) -> Result<i32> {
        Ok(self.read_u32_le()? as i32)
    }

    /// Read an 8-byte little-endian integer
    ///
    /// Always consumes 8 bytes. In [`DecodeMode::Legacy`] only the low 32 bits
    /// are kept, which is what the historical client did.
    fn read_u64(&mut self, mode: DecodeMode) -> Result<u64> {
        let bytes = self.read_exactly(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&bytes);
        Ok(match mode {
            DecodeMode::Legacy => u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as u64,
            DecodeMode::Corrected => u64::from_le_bytes(raw),
        })
    }

    /// Read a signed 32-bit length prefix, ignoring its sign
    fn read_length(&mut self) -> Result<usize> {
        Ok(self.read_i32_le()?.unsigned_abs() as usize)
    }

    /// Read the body of a value whose length came from the stream
    ///
    /// Lengths above [`MAX_VALUE_SIZE`] fail with a decode error before
    /// anything is read.
    fn read_sized(&mut self, len: usize) -> Result<Bytes> {
        if len > MAX_VALUE_SIZE {
            return Err(Error::decode(format!(
                "value length {} exceeds the {} byte limit",
                len, MAX_VALUE_SIZE
            )));
        }
        self.read_exactly(len)
    }

    /// Read a Pascal string: a length in UTF-16 code units, then UTF-16LE data
    ///
    /// A zero length yields an empty string and consumes nothing further.
    fn read_pascal_string(&mut self) -> Result<String> {
        let units = self.read_length()?;
        if units == 0 {
            return Ok(String::new());
        }

        let bytes = self.read_sized(units.saturating_mul(2))?;
        let code_units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        String::from_utf16(&code_units)
            .map_err(|e| Error::decode(format!("invalid UTF-16 string: {}", e)))
    }

    /// Read a length-prefixed blob, returned untouched
    fn read_blob(&mut self) -> Result<Bytes> {
        let len = self.read_length()?;
        if len == 0 {
            return Ok(Bytes::new());
        }
        self.read_sized(len)
    }
}

impl<T: BinaryRead + ?Sized> BinaryRead for &mut T {
    fn read_exactly(&mut self, n: usize) -> Result<Bytes> {
        (**self).read_exactly(n)
    }
}
