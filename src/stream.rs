//! Byte sink and byte source used by every codec in this crate.
//!
//! Both wrap a plain `std::io` writer/reader, carry the byte order used for
//! multi-byte scalars and length prefixes, and count the bytes that went
//! through them. The wire default is little-endian.

use crate::error::CodecError;
use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

/// Byte order for scalars and length/count prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endianness {
    Big,
    #[default]
    Little,
}

/// Sequential byte output.
#[derive(Debug)]
pub struct Sink<W> {
    inner: W,
    order: Endianness,
    written: usize,
}

impl<W: Write> Sink<W> {
    pub fn new(inner: W) -> Self {
        Self::with_order(inner, Endianness::default())
    }

    pub fn with_order(inner: W, order: Endianness) -> Self {
        Sink { inner, order, written: 0 }
    }

    pub fn order(&self) -> Endianness {
        self.order
    }

    /// Bytes written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn write_u8(&mut self, v: u8) -> Result<(), CodecError> {
        self.inner.write_u8(v).map_err(CodecError::Io)?;
        self.written += 1;
        Ok(())
    }
    pub fn write_i8(&mut self, v: i8) -> Result<(), CodecError> {
        self.inner.write_i8(v).map_err(CodecError::Io)?;
        self.written += 1;
        Ok(())
    }
    pub fn write_u16(&mut self, v: u16) -> Result<(), CodecError> {
        match self.order {
            Endianness::Big => self.inner.write_u16::<BigEndian>(v),
            Endianness::Little => self.inner.write_u16::<LittleEndian>(v),
        }
        .map_err(CodecError::Io)?;
        self.written += 2;
        Ok(())
    }
    pub fn write_u32(&mut self, v: u32) -> Result<(), CodecError> {
        match self.order {
            Endianness::Big => self.inner.write_u32::<BigEndian>(v),
            Endianness::Little => self.inner.write_u32::<LittleEndian>(v),
        }
        .map_err(CodecError::Io)?;
        self.written += 4;
        Ok(())
    }
    pub fn write_u64(&mut self, v: u64) -> Result<(), CodecError> {
        match self.order {
            Endianness::Big => self.inner.write_u64::<BigEndian>(v),
            Endianness::Little => self.inner.write_u64::<LittleEndian>(v),
        }
        .map_err(CodecError::Io)?;
        self.written += 8;
        Ok(())
    }
    pub fn write_i16(&mut self, v: i16) -> Result<(), CodecError> {
        match self.order {
            Endianness::Big => self.inner.write_i16::<BigEndian>(v),
            Endianness::Little => self.inner.write_i16::<LittleEndian>(v),
        }
        .map_err(CodecError::Io)?;
        self.written += 2;
        Ok(())
    }
    pub fn write_i32(&mut self, v: i32) -> Result<(), CodecError> {
        match self.order {
            Endianness::Big => self.inner.write_i32::<BigEndian>(v),
            Endianness::Little => self.inner.write_i32::<LittleEndian>(v),
        }
        .map_err(CodecError::Io)?;
        self.written += 4;
        Ok(())
    }
    pub fn write_i64(&mut self, v: i64) -> Result<(), CodecError> {
        match self.order {
            Endianness::Big => self.inner.write_i64::<BigEndian>(v),
            Endianness::Little => self.inner.write_i64::<LittleEndian>(v),
        }
        .map_err(CodecError::Io)?;
        self.written += 8;
        Ok(())
    }
    pub fn write_f32(&mut self, v: f32) -> Result<(), CodecError> {
        match self.order {
            Endianness::Big => self.inner.write_f32::<BigEndian>(v),
            Endianness::Little => self.inner.write_f32::<LittleEndian>(v),
        }
        .map_err(CodecError::Io)?;
        self.written += 4;
        Ok(())
    }
    pub fn write_f64(&mut self, v: f64) -> Result<(), CodecError> {
        match self.order {
            Endianness::Big => self.inner.write_f64::<BigEndian>(v),
            Endianness::Little => self.inner.write_f64::<LittleEndian>(v),
        }
        .map_err(CodecError::Io)?;
        self.written += 8;
        Ok(())
    }

    /// Write a 32-bit length/count prefix.
    pub fn write_len(&mut self, len: usize) -> Result<(), CodecError> {
        let n = u32::try_from(len).map_err(|_| CodecError::LengthOverflow(len))?;
        self.write_u32(n)
    }

    /// Write raw bytes with no prefix.
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        self.inner.write_all(bytes).map_err(CodecError::Io)?;
        self.written += bytes.len();
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), CodecError> {
        self.inner.flush().map_err(CodecError::Io)
    }
}

/// Default limit on record/list/map nesting while decoding.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Sequential byte input.
///
/// Also tracks how deeply the current decode is nested inside records,
/// lists and maps, so self-referencing layouts cannot exhaust the stack.
#[derive(Debug)]
pub struct Source<R> {
    inner: R,
    order: Endianness,
    consumed: usize,
    depth: usize,
    max_depth: usize,
}

impl<'a> Source<&'a [u8]> {
    pub fn from_slice(bytes: &'a [u8], order: Endianness) -> Self {
        Source::with_order(bytes, order)
    }

    /// Bytes left in the underlying slice.
    pub fn remaining(&self) -> usize {
        self.inner.len()
    }
}

impl<R: Read> Source<R> {
    pub fn new(inner: R) -> Self {
        Self::with_order(inner, Endianness::default())
    }

    pub fn with_order(inner: R, order: Endianness) -> Self {
        Source {
            inner,
            order,
            consumed: 0,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Replace the nesting limit (default [`DEFAULT_MAX_DEPTH`]).
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn order(&self) -> Endianness {
        self.order
    }

    /// Bytes consumed so far.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Build a `Malformed` error located at the current offset.
    pub fn malformed(&self, reason: impl Into<String>) -> CodecError {
        CodecError::Malformed {
            offset: self.consumed,
            reason: reason.into(),
        }
    }

    /// Current record/list/map nesting level.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Run `f` one nesting level deeper.
    ///
    /// Fails with `Malformed` before calling `f` when the limit is reached.
    pub fn nested<T, F>(&mut self, f: F) -> Result<T, CodecError>
    where
        F: FnOnce(&mut Self) -> Result<T, CodecError>,
    {
        if self.depth >= self.max_depth {
            return Err(self.malformed(format!("nesting deeper than {} levels", self.max_depth)));
        }
        self.depth += 1;
        let out = f(self);
        self.depth -= 1;
        out
    }

    fn fail(&self, e: io::Error, what: &'static str) -> CodecError {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            CodecError::Truncated {
                offset: self.consumed,
                what,
            }
        } else {
            CodecError::Io(e)
        }
    }

    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        let v = self.inner.read_u8().map_err(|e| self.fail(e, "u8"))?;
        self.consumed += 1;
        Ok(v)
    }
    pub fn read_i8(&mut self) -> Result<i8, CodecError> {
        let v = self.inner.read_i8().map_err(|e| self.fail(e, "i8"))?;
        self.consumed += 1;
        Ok(v)
    }
    pub fn read_u16(&mut self) -> Result<u16, CodecError> {
        let v = match self.order {
            Endianness::Big => self.inner.read_u16::<BigEndian>(),
            Endianness::Little => self.inner.read_u16::<LittleEndian>(),
        }
        .map_err(|e| self.fail(e, "u16"))?;
        self.consumed += 2;
        Ok(v)
    }
    pub fn read_u32(&mut self) -> Result<u32, CodecError> {
        let v = match self.order {
            Endianness::Big => self.inner.read_u32::<BigEndian>(),
            Endianness::Little => self.inner.read_u32::<LittleEndian>(),
        }
        .map_err(|e| self.fail(e, "u32"))?;
        self.consumed += 4;
        Ok(v)
    }
    pub fn read_u64(&mut self) -> Result<u64, CodecError> {
        let v = match self.order {
            Endianness::Big => self.inner.read_u64::<BigEndian>(),
            Endianness::Little => self.inner.read_u64::<LittleEndian>(),
        }
        .map_err(|e| self.fail(e, "u64"))?;
        self.consumed += 8;
        Ok(v)
    }
    pub fn read_i16(&mut self) -> Result<i16, CodecError> {
        let v = match self.order {
            Endianness::Big => self.inner.read_i16::<BigEndian>(),
            Endianness::Little => self.inner.read_i16::<LittleEndian>(),
        }
        .map_err(|e| self.fail(e, "i16"))?;
        self.consumed += 2;
        Ok(v)
    }
    pub fn read_i32(&mut self) -> Result<i32, CodecError> {
        let v = match self.order {
            Endianness::Big => self.inner.read_i32::<BigEndian>(),
            Endianness::Little => self.inner.read_i32::<LittleEndian>(),
        }
        .map_err(|e| self.fail(e, "i32"))?;
        self.consumed += 4;
        Ok(v)
    }
    pub fn read_i64(&mut self) -> Result<i64, CodecError> {
        let v = match self.order {
            Endianness::Big => self.inner.read_i64::<BigEndian>(),
            Endianness::Little => self.inner.read_i64::<LittleEndian>(),
        }
        .map_err(|e| self.fail(e, "i64"))?;
        self.consumed += 8;
        Ok(v)
    }
    pub fn read_f32(&mut self) -> Result<f32, CodecError> {
        let v = match self.order {
            Endianness::Big => self.inner.read_f32::<BigEndian>(),
            Endianness::Little => self.inner.read_f32::<LittleEndian>(),
        }
        .map_err(|e| self.fail(e, "f32"))?;
        self.consumed += 4;
        Ok(v)
    }
    pub fn read_f64(&mut self) -> Result<f64, CodecError> {
        let v = match self.order {
            Endianness::Big => self.inner.read_f64::<BigEndian>(),
            Endianness::Little => self.inner.read_f64::<LittleEndian>(),
        }
        .map_err(|e| self.fail(e, "f64"))?;
        self.consumed += 8;
        Ok(v)
    }

    /// Read a 32-bit length/count prefix.
    pub fn read_len(&mut self) -> Result<usize, CodecError> {
        let n = match self.order {
            Endianness::Big => self.inner.read_u32::<BigEndian>(),
            Endianness::Little => self.inner.read_u32::<LittleEndian>(),
        }
        .map_err(|e| self.fail(e, "length prefix"))?;
        self.consumed += 4;
        Ok(n as usize)
    }

    /// Read exactly `n` raw bytes.
    ///
    /// `n` comes straight off the wire, so the buffer grows with the bytes
    /// actually read instead of being allocated up front.
    pub fn read_raw(&mut self, n: usize) -> Result<Vec<u8>, CodecError> {
        let mut buf = Vec::with_capacity(n.min(PREALLOC_LIMIT));
        let read = (&mut self.inner).take(n as u64).read_to_end(&mut buf);
        let got = read.map_err(|e| self.fail(e, "bytes"))?;
        if got < n {
            return Err(CodecError::Truncated {
                offset: self.consumed + got,
                what: "bytes",
            });
        }
        self.consumed += n;
        Ok(buf)
    }
}

/// Upper bound on speculative allocation driven by a wire count.
pub(crate) const PREALLOC_LIMIT: usize = 4096;
