// "(file:line) " annotation for debug lines.

use core::fmt;
use core::panic::Location;

use super::buf::LogBuf;

/// Where a debug line came from. Not validated; printed as given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation<'a> {
    pub file: &'a str,
    pub line: u32,
}

impl<'a> SourceLocation<'a> {
    pub const fn new(file: &'a str, line: u32) -> Self {
        Self { file, line }
    }
}

impl SourceLocation<'static> {
    #[track_caller]
    pub fn caller() -> Self {
        Location::caller().into()
    }
}

impl<'a> From<&'a Location<'a>> for SourceLocation<'a> {
    fn from(loc: &'a Location<'a>) -> Self {
        Self::new(loc.file(), loc.line())
    }
}

impl fmt::Display for SourceLocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Writes the prefix at offset 0 and returns where the body starts.
///
/// The result is clamped to `N - 1`: when the location does not fit,
/// the primitive reports the full would-be length and that value must
/// not become the next write offset.
pub fn write_prefix<const N: usize>(buf: &mut LogBuf<N>, loc: &SourceLocation<'_>) -> usize {
    let wanted = buf.write_at(0, &format_args!("({loc}) "));
    wanted.min(LogBuf::<N>::MAX_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_file_and_line() {
        let mut buf = LogBuf::<32>::new();
        let end = write_prefix(&mut buf, &SourceLocation::new("sfud.c", 812));
        assert_eq!(buf.as_bytes(), b"(sfud.c:812) ");
        assert_eq!(end, 13);
    }

    #[test]
    fn oversized_location_is_clamped() {
        let mut buf = LogBuf::<8>::new();
        let loc = SourceLocation::new("very/long/path/sfud_sfdp.c", 1);
        let end = write_prefix(&mut buf, &loc);
        assert_eq!(end, 7);
        assert_eq!(buf.as_bytes(), b"(very/l");
    }

    #[test]
    fn caller_captures_this_file() {
        let loc = SourceLocation::caller();
        assert!(loc.file.ends_with("prefix.rs"));
        assert!(loc.line > 0);
    }
}
