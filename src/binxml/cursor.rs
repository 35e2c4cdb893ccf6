use crate::err::{DeserializationError, DeserializationResult};
use crate::utils::decode_utf16le_bytes;

/// A lightweight bounds-checked cursor over an immutable byte slice.
///
/// This is the slice/offset equivalent of `Cursor<&[u8]>`, intended for
/// hot-path parsing where the data is already in memory and we want explicit
/// bounds control without IO-style error plumbing.
///
/// `chunk_base` records the chunk-coordinate offset of `buf[0]`, so that a
/// name reference (a chunk-relative offset) can be compared against the
/// cursor's current position even when `buf` is a sub-slice of the chunk.
///
/// All reads are little-endian and advance the cursor on success.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
    chunk_base: usize,
}

impl<'a> ByteCursor<'a> {
    #[inline]
    pub(crate) fn new(buf: &'a [u8], chunk_base: usize) -> Self {
        Self {
            buf,
            pos: 0,
            chunk_base,
        }
    }

    /// Cursor over a full chunk buffer, positioned at `pos`.
    /// `pos == len` (EOF) is allowed, `pos > len` is rejected.
    #[inline]
    pub(crate) fn with_pos(
        buf: &'a [u8],
        pos: usize,
        what: &'static str,
    ) -> DeserializationResult<Self> {
        if pos > buf.len() {
            return Err(DeserializationError::UnexpectedEof {
                t: what,
                offset: pos as u64,
                need: pos - buf.len(),
                have: 0,
            });
        }
        Ok(Self {
            buf,
            pos,
            chunk_base: 0,
        })
    }

    /// Current position in chunk coordinates.
    #[inline]
    pub(crate) fn chunk_position(&self) -> u64 {
        (self.chunk_base + self.pos) as u64
    }

    #[inline]
    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Advance by `n`, saturating at the end of the buffer.
    /// An over-long skip leaves the cursor exhausted; subsequent reads fail.
    #[inline]
    pub(crate) fn skip(&mut self, n: usize) {
        self.pos = self.pos.saturating_add(n).min(self.buf.len());
    }

    /// Move the cursor to the end of the buffer.
    #[inline]
    pub(crate) fn exhaust(&mut self) {
        self.pos = self.buf.len();
    }

    #[inline]
    fn eof(&self, what: &'static str, need: usize) -> DeserializationError {
        DeserializationError::UnexpectedEof {
            t: what,
            offset: self.chunk_position(),
            need,
            have: self.remaining(),
        }
    }

    #[inline]
    pub(crate) fn take_bytes(
        &mut self,
        len: usize,
        what: &'static str,
    ) -> DeserializationResult<&'a [u8]> {
        let end = self.pos.checked_add(len).ok_or_else(|| self.eof(what, len))?;
        let out = self.buf.get(self.pos..end).ok_or_else(|| self.eof(what, len))?;
        self.pos = end;
        Ok(out)
    }

    /// Borrow the next `len` bytes without advancing.
    #[inline]
    pub(crate) fn peek_bytes(
        &self,
        len: usize,
        what: &'static str,
    ) -> DeserializationResult<&'a [u8]> {
        let end = self.pos.checked_add(len).ok_or_else(|| self.eof(what, len))?;
        self.buf.get(self.pos..end).ok_or_else(|| self.eof(what, len))
    }

    #[inline]
    pub(crate) fn array<const N: usize>(
        &mut self,
        what: &'static str,
    ) -> DeserializationResult<[u8; N]> {
        let bytes = self.take_bytes(N, what)?;
        let mut out = [0_u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    #[inline]
    pub(crate) fn u8(&mut self, what: &'static str) -> DeserializationResult<u8> {
        let b = *self.buf.get(self.pos).ok_or_else(|| self.eof(what, 1))?;
        self.pos += 1;
        Ok(b)
    }

    #[inline]
    pub(crate) fn u16(&mut self, what: &'static str) -> DeserializationResult<u16> {
        Ok(u16::from_le_bytes(self.array::<2>(what)?))
    }

    #[inline]
    pub(crate) fn u32(&mut self, what: &'static str) -> DeserializationResult<u32> {
        Ok(u32::from_le_bytes(self.array::<4>(what)?))
    }

    #[inline]
    pub(crate) fn u64(&mut self, what: &'static str) -> DeserializationResult<u64> {
        Ok(u64::from_le_bytes(self.array::<8>(what)?))
    }

    /// Read a `u16` count of UTF-16 code units, then that many code units,
    /// decoded to UTF-8. Optionally consumes a trailing NUL code unit.
    pub(crate) fn len_prefixed_utf16_string(
        &mut self,
        is_null_terminated: bool,
        what: &'static str,
    ) -> DeserializationResult<String> {
        let char_count = usize::from(self.u16(what)?);
        let bytes = self.take_bytes(char_count * 2, what)?;
        if is_null_terminated {
            let _ = self.u16(what)?;
        }
        Ok(decode_utf16le_bytes(bytes))
    }

    /// Read `byte_len / 2` UTF-16 code units and decode them to UTF-8.
    /// An odd trailing byte is consumed so later fields stay aligned.
    pub(crate) fn utf16_string_by_size(
        &mut self,
        byte_len: usize,
        what: &'static str,
    ) -> DeserializationResult<String> {
        let bytes = self.take_bytes(byte_len & !1, what)?;
        let s = decode_utf16le_bytes(bytes);
        if byte_len % 2 != 0 {
            self.skip(1);
        }
        Ok(s)
    }
}
