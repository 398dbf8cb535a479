// Diagnostic output for the flash driver.
//
// debug: "(file:line) " + message; info: message only.
// Every call renders into its own LogBuf on the stack, then hands the
// finished C string to a Sink exactly once. Calls return nothing and
// never fail; text past N - 1 bytes is cut.
//
// Two ways to reach a sink:
//   PortLog<S, N>   owns its sink, for drivers that carry a handle
//   log_debug/info  use the sink installed with install_sink(),
//                   which is what the sfud_* macros expand to
//
// No sink installed means the line is dropped.

pub mod buf;
pub mod format;
pub mod prefix;
pub mod printf;
pub mod sink;

pub use buf::{LOG_BUF_SIZE, LogBuf, bounded_write};
pub use format::{FormatRequest, format_at};
pub use prefix::{SourceLocation, write_prefix};
pub use printf::{Arg, Printf};
pub use sink::{ConsoleSink, LogSink, Sink, dispatch};

use core::cell::Cell;

use critical_section::Mutex;

pub type SharedSink = &'static (dyn Sink + Sync);

static SINK: Mutex<Cell<Option<SharedSink>>> = Mutex::new(Cell::new(None));

fn emit_debug<S, R, const N: usize>(sink: &S, loc: SourceLocation<'_>, req: &R)
where
    S: Sink + ?Sized,
    R: FormatRequest + ?Sized,
{
    let mut buf = LogBuf::<N>::new();
    let offset = write_prefix(&mut buf, &loc);
    format_at(&mut buf, offset, req);
    dispatch(sink, &buf);
}

fn emit_info<S, R, const N: usize>(sink: &S, req: &R)
where
    S: Sink + ?Sized,
    R: FormatRequest + ?Sized,
{
    let mut buf = LogBuf::<N>::new();
    format_at(&mut buf, 0, req);
    dispatch(sink, &buf);
}

/// A sink plus a line capacity.
pub struct PortLog<S, const N: usize = LOG_BUF_SIZE> {
    sink: S,
}

impl<S: Sink> PortLog<S> {
    pub const fn new(sink: S) -> Self {
        Self { sink }
    }
}

impl<S: Sink, const N: usize> PortLog<S, N> {
    pub const fn with_capacity(sink: S) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn debug<R: FormatRequest + ?Sized>(&self, loc: SourceLocation<'_>, req: &R) {
        emit_debug::<S, R, N>(&self.sink, loc, req);
    }

    pub fn info<R: FormatRequest + ?Sized>(&self, req: &R) {
        emit_info::<S, R, N>(&self.sink, req);
    }
}

/// Installs the process-wide sink and returns the previous one.
pub fn install_sink(sink: SharedSink) -> Option<SharedSink> {
    critical_section::with(|cs| SINK.borrow(cs).replace(Some(sink)))
}

/// Removes the process-wide sink; later lines are dropped.
pub fn take_sink() -> Option<SharedSink> {
    critical_section::with(|cs| SINK.borrow(cs).take())
}

// copied out so the sink runs outside the critical section
fn installed_sink() -> Option<SharedSink> {
    critical_section::with(|cs| SINK.borrow(cs).get())
}

pub fn log_debug<R: FormatRequest + ?Sized>(loc: SourceLocation<'_>, req: &R) {
    if let Some(sink) = installed_sink() {
        emit_debug::<_, R, LOG_BUF_SIZE>(sink, loc, req);
    }
}

pub fn log_info<R: FormatRequest + ?Sized>(req: &R) {
    if let Some(sink) = installed_sink() {
        emit_info::<_, R, LOG_BUF_SIZE>(sink, req);
    }
}

/// Debug line through the installed sink, Rust format syntax.
#[macro_export]
macro_rules! sfud_debug {
    ($($arg:tt)+) => {
        $crate::diag::log_debug(
            $crate::diag::SourceLocation::new(file!(), line!()),
            &format_args!($($arg)+),
        )
    };
}

/// Info line through the installed sink, Rust format syntax.
#[macro_export]
macro_rules! sfud_info {
    ($($arg:tt)+) => {
        $crate::diag::log_info(&format_args!($($arg)+))
    };
}

/// Builds a [`Printf`](crate::diag::Printf); the argument count is
/// checked against the template at compile time.
///
/// The result borrows a temporary argument array, so use it within the
/// statement that creates it.
#[macro_export]
macro_rules! printf {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::diag::Printf::new(
            {
                const _: () = assert!(
                    $crate::diag::printf::expected_args($fmt) == $crate::__sfud_count!($($arg),*),
                    "printf: argument count does not match the template",
                );
                $fmt
            },
            &[$($crate::diag::Arg::from($arg)),*],
        )
    };
}

/// Debug line with a printf template.
#[macro_export]
macro_rules! sfud_debugf {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::diag::log_debug(
            $crate::diag::SourceLocation::new(file!(), line!()),
            &$crate::printf!($fmt $(, $arg)*),
        )
    };
}

/// Info line with a printf template.
#[macro_export]
macro_rules! sfud_infof {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::diag::log_info(&$crate::printf!($fmt $(, $arg)*))
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __sfud_count {
    () => { 0usize };
    ($head:expr $(, $tail:expr)*) => { 1usize + $crate::__sfud_count!($($tail),*) };
}
