// Message body rendering.
// A FormatRequest is anything that can stream itself into fmt::Write:
// Rust format_args!, plain text, or a printf template (see printf.rs).
// format_at never trusts the incoming offset; it is clamped before the
// remaining room is computed.

use core::fmt;

use super::buf::LogBuf;

pub trait FormatRequest {
    fn render<W: fmt::Write>(&self, w: &mut W) -> fmt::Result;
}

impl FormatRequest for fmt::Arguments<'_> {
    #[inline]
    fn render<W: fmt::Write>(&self, w: &mut W) -> fmt::Result {
        w.write_fmt(*self)
    }
}

impl FormatRequest for str {
    #[inline]
    fn render<W: fmt::Write>(&self, w: &mut W) -> fmt::Result {
        w.write_str(self)
    }
}

impl<T: FormatRequest + ?Sized> FormatRequest for &T {
    #[inline]
    fn render<W: fmt::Write>(&self, w: &mut W) -> fmt::Result {
        (**self).render(w)
    }
}

/// Renders `req` into `buf` starting at `offset` and returns the new
/// end of text. Output past `N - 1` bytes is dropped.
pub fn format_at<R, const N: usize>(buf: &mut LogBuf<N>, offset: usize, req: &R) -> usize
where
    R: FormatRequest + ?Sized,
{
    let start = offset.min(LogBuf::<N>::MAX_LEN);
    let wanted = buf.write_at(start, req);
    start.saturating_add(wanted).min(LogBuf::<N>::MAX_LEN)
}
