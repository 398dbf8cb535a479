// Output side of the diagnostic path.
//
// A Sink takes one finished, NUL-terminated line per call and emits it
// however the platform can. The core never looks at the outcome.
// Whether a sink tolerates concurrent callers is its own business:
// ConsoleSink serialises through a critical section, closures and
// LogSink inherit whatever their backend provides.

use core::cell::RefCell;
use core::ffi::CStr;
use core::fmt::Write;

use critical_section::Mutex;

use super::buf::LogBuf;

pub trait Sink {
    fn emit(&self, line: &CStr);
}

impl<F: Fn(&CStr)> Sink for F {
    #[inline]
    fn emit(&self, line: &CStr) {
        self(line)
    }
}

/// Hands the finished buffer to `sink`, once.
#[inline]
pub fn dispatch<S: Sink + ?Sized, const N: usize>(sink: &S, buf: &LogBuf<N>) {
    sink.emit(buf.as_cstr());
}

// Truncation can cut a multi-byte char; print what is still valid.
pub fn valid_utf8(bytes: &[u8]) -> &str {
    match core::str::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => core::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or(""),
    }
}

/// Writes `<tag><line>\r\n` to a text console (UART, USB-serial, ...).
pub struct ConsoleSink<W> {
    out: Mutex<RefCell<W>>,
    tag: &'static str,
}

impl<W: Write> ConsoleSink<W> {
    pub const DEFAULT_TAG: &'static str = "SFUD: ";

    pub const fn new(out: W) -> Self {
        Self::with_tag(out, Self::DEFAULT_TAG)
    }

    pub const fn with_tag(out: W, tag: &'static str) -> Self {
        Self {
            out: Mutex::new(RefCell::new(out)),
            tag,
        }
    }

    /// Runs `f` on the underlying writer inside a critical section.
    pub fn with_output<R>(&self, f: impl FnOnce(&mut W) -> R) -> R {
        critical_section::with(|cs| f(&mut self.out.borrow_ref_mut(cs)))
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().into_inner()
    }
}

impl<W: Write> Sink for ConsoleSink<W> {
    fn emit(&self, line: &CStr) {
        let text = valid_utf8(line.to_bytes());
        critical_section::with(|cs| {
            // a writer that logs from inside write_str lands here again;
            // drop the nested line instead of panicking on the borrow
            if let Ok(mut out) = self.out.borrow(cs).try_borrow_mut() {
                let _ = write!(out, "{}{}\r\n", self.tag, text);
            }
        });
    }
}

/// Forwards each line to the `log` facade under target "sfud".
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl Sink for LogSink {
    fn emit(&self, line: &CStr) {
        log::info!(target: "sfud", "{}", valid_utf8(line.to_bytes()));
    }
}
