// Fixed-capacity, NUL-terminated line buffer.
// LogBuf<N> owns a [u8; N] that is a valid C string at all times.
// All writes go through bounded_write, which behaves like snprintf:
// it stores at most dst.len() - 1 bytes, always terminates, and
// reports how many bytes the full rendering would have needed.

use core::ffi::CStr;
use core::fmt;

use super::format::FormatRequest;

// default line capacity, terminator included
pub const LOG_BUF_SIZE: usize = 256;

// fmt::Write into a borrowed slice. Keeps the last byte for the NUL
// and counts everything it was asked to write, stored or not.
struct Bounded<'a> {
    buf: &'a mut [u8],
    pos: usize,
    wanted: usize,
}

impl fmt::Write for Bounded<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let bytes = s.as_bytes();
        let room = self.buf.len().saturating_sub(1) - self.pos;
        let n = bytes.len().min(room);
        self.buf[self.pos..self.pos + n].copy_from_slice(&bytes[..n]);
        self.pos += n;
        self.wanted = self.wanted.saturating_add(bytes.len());
        Ok(())
    }
}

/// Renders `req` into `dst`, snprintf style.
///
/// At most `dst.len() - 1` bytes of text are stored and a terminator is
/// written right after them. An empty `dst` is left untouched. The
/// return value is the length the complete rendering would have had,
/// which is larger than what was stored when the output was cut.
pub fn bounded_write<R: FormatRequest + ?Sized>(dst: &mut [u8], req: &R) -> usize {
    let mut w = Bounded {
        buf: dst,
        pos: 0,
        wanted: 0,
    };
    // a formatter error only shortens the text; the NUL still lands
    let _ = req.render(&mut w);

    let Bounded { buf, pos, wanted } = w;
    if let Some(end) = buf.get_mut(pos) {
        *end = 0;
    }
    wanted
}

/// One log line: `N` bytes on the stack, terminator included.
pub struct LogBuf<const N: usize> {
    buf: [u8; N],
}

impl<const N: usize> LogBuf<N> {
    pub const CAPACITY: usize = N;

    /// Longest text the buffer can hold.
    pub const MAX_LEN: usize = {
        assert!(N > 0, "LogBuf needs room for the terminator");
        N - 1
    };

    pub const fn new() -> Self {
        let _ = Self::MAX_LEN;
        Self { buf: [0u8; N] }
    }

    /// Renders `req` starting at `offset`, clamped to `MAX_LEN`.
    /// Returns the would-be length of this write, not the stored one.
    pub fn write_at<R: FormatRequest + ?Sized>(&mut self, offset: usize, req: &R) -> usize {
        let start = offset.min(Self::MAX_LEN);
        bounded_write(&mut self.buf[start..], req)
    }

    // the last byte is never handed to the writer, so a NUL always exists
    #[inline]
    pub fn len(&self) -> usize {
        self.buf
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(Self::MAX_LEN)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf[0] == 0
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len()]
    }

    #[inline]
    pub fn as_cstr(&self) -> &CStr {
        CStr::from_bytes_until_nul(&self.buf).unwrap_or(c"")
    }
}

impl<const N: usize> Default for LogBuf<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_stored_whole_and_terminated() {
        let mut dst = [0xAAu8; 8];
        let n = bounded_write(&mut dst, "abc");
        assert_eq!(n, 3);
        assert_eq!(&dst[..4], b"abc\0");
        assert_eq!(dst[4], 0xAA);
    }

    #[test]
    fn long_text_is_cut_and_reports_would_be_length() {
        let mut dst = [0xAAu8; 4];
        let n = bounded_write(&mut dst, &format_args!("{}-{}", "hello", 42));
        assert_eq!(n, 8);
        assert_eq!(&dst, b"hel\0");
    }

    #[test]
    fn empty_destination_is_untouched() {
        let mut dst: [u8; 0] = [];
        assert_eq!(bounded_write(&mut dst, "abc"), 3);
    }

    #[test]
    fn single_byte_destination_only_gets_terminator() {
        let mut dst = [0xAAu8; 1];
        assert_eq!(bounded_write(&mut dst, "abc"), 3);
        assert_eq!(dst, [0]);
    }

    #[test]
    fn fresh_buffer_is_empty_c_string() {
        let buf = LogBuf::<8>::new();
        assert!(buf.is_empty());
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.as_cstr(), c"");
    }

    #[test]
    fn write_at_past_capacity_clamps_offset() {
        let mut buf = LogBuf::<8>::new();
        buf.write_at(0, "0123456789");
        assert_eq!(buf.as_bytes(), b"0123456");

        // offset far beyond the end lands on the terminator slot
        let n = buf.write_at(usize::MAX, "xyz");
        assert_eq!(n, 3);
        assert_eq!(buf.len(), LogBuf::<8>::MAX_LEN);
        assert_eq!(buf.as_cstr().to_bytes(), b"0123456");
    }

    #[test]
    fn capacity_constants() {
        assert_eq!(LogBuf::<LOG_BUF_SIZE>::CAPACITY, 256);
        assert_eq!(LogBuf::<LOG_BUF_SIZE>::MAX_LEN, 255);
    }
}
