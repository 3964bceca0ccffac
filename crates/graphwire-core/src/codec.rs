// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Bounds-checked primitives for the container envelope (LE `u32` lengths, raw bytes).

use thiserror::Error;

/// Errors produced while reading or writing envelope primitives.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Attempted to read beyond the end of the buffer.
    #[error("buffer too short")]
    OutOfBounds,
    /// UTF-8 decoding failed.
    #[error("invalid utf-8")]
    InvalidUtf8,
    /// Length prefix exceeded the caller's bound, or does not fit in a `u32`.
    #[error("length {len} exceeds bound {max}")]
    LengthTooLarge {
        /// Length found or requested.
        len: usize,
        /// Bound in force.
        max: usize,
    },
    /// A flag byte held something other than 0 or 1.
    #[error("invalid flag byte {0:#04x}")]
    InvalidFlag(u8),
}

/// Append-only little-endian writer.
#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Create a writer with a pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Write a single byte.
    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Write a boolean as a 0/1 flag byte.
    pub fn write_flag(&mut self, value: bool) {
        self.write_u8(u8::from(value));
    }

    /// Write a little-endian u32.
    pub fn write_u32_le(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a `usize` count as a little-endian u32.
    pub fn write_count(&mut self, count: usize) -> Result<(), CodecError> {
        let raw = u32::try_from(count).map_err(|_| CodecError::LengthTooLarge {
            len: count,
            max: u32::MAX as usize,
        })?;
        self.write_u32_le(raw);
        Ok(())
    }

    /// Write u32-length-prefixed bytes.
    pub fn write_len_prefixed_bytes(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        self.write_count(bytes.len())?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Write a length-prefixed UTF-8 string with a max bound.
    pub fn write_string(&mut self, value: &str, max_len: usize) -> Result<(), CodecError> {
        let bytes = value.as_bytes();
        if bytes.len() > max_len {
            return Err(CodecError::LengthTooLarge {
                len: bytes.len(),
                max: max_len,
            });
        }
        self.write_len_prefixed_bytes(bytes)
    }

    /// Consume the writer and return the buffer.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over a borrowed buffer; every read is bounds-checked.
#[derive(Debug)]
pub struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    /// Create a reader over the provided byte slice.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        let end = self
            .offset
            .checked_add(len)
            .ok_or(CodecError::OutOfBounds)?;
        let out = self
            .bytes
            .get(self.offset..end)
            .ok_or(CodecError::OutOfBounds)?;
        self.offset = end;
        Ok(out)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        let chunk = self.take(1)?;
        Ok(chunk[0])
    }

    /// Read a 0/1 flag byte.
    pub fn read_flag(&mut self) -> Result<bool, CodecError> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::InvalidFlag(other)),
        }
    }

    /// Read a little-endian u32.
    pub fn read_u32_le(&mut self) -> Result<u32, CodecError> {
        let chunk = self.take(4)?;
        let raw: [u8; 4] = chunk.try_into().map_err(|_| CodecError::OutOfBounds)?;
        Ok(u32::from_le_bytes(raw))
    }

    /// Read a u32 count and check it against `max`.
    pub fn read_count(&mut self, max: usize) -> Result<usize, CodecError> {
        let len = self.read_u32_le()? as usize;
        if len > max {
            return Err(CodecError::LengthTooLarge { len, max });
        }
        Ok(len)
    }

    /// Read a length-prefixed byte slice with a max bound.
    pub fn read_len_prefixed_bytes(&mut self, max_len: usize) -> Result<&'a [u8], CodecError> {
        let len = self.read_count(max_len)?;
        self.take(len)
    }

    /// Read a length-prefixed UTF-8 string with a max bound.
    pub fn read_string(&mut self, max_len: usize) -> Result<String, CodecError> {
        let bytes = self.read_len_prefixed_bytes(max_len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| CodecError::InvalidUtf8)
    }
}
