//! Growable little-endian byte writer.

use bytes::{BufMut, BytesMut};

/// Accumulates little-endian encoded values into a single buffer.
#[derive(Debug, Default, Clone)]
pub struct PayloadBuilder {
    buf: BytesMut,
}

impl PayloadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    pub fn write_byte(&mut self, n: u8) -> &mut Self {
        self.buf.put_u8(n);
        self
    }

    pub fn write_i16(&mut self, n: i16) -> &mut Self {
        self.buf.put_i16_le(n);
        self
    }

    pub fn write_i32(&mut self, n: i32) -> &mut Self {
        self.buf.put_i32_le(n);
        self
    }

    pub fn write_i64(&mut self, n: i64) -> &mut Self {
        self.buf.put_i64_le(n);
        self
    }

    pub fn write_u16(&mut self, n: u16) -> &mut Self {
        self.buf.put_u16_le(n);
        self
    }

    pub fn write_u32(&mut self, n: u32) -> &mut Self {
        self.buf.put_u32_le(n);
        self
    }

    pub fn write_u64(&mut self, n: u64) -> &mut Self {
        self.buf.put_u64_le(n);
        self
    }

    pub fn write_bytes(&mut self, data: &[u8]) -> &mut Self {
        self.buf.put_slice(data);
        self
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consume the builder and return the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf.to_vec()
    }
}
