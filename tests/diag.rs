// Process-wide sink path: install_sink + sfud_* macros.
// The sink is global state, so every test here runs serially.

use std::ffi::CStr;
use std::sync::Mutex;

use serial_test::serial;

use sfud_port::diag::{self, ConsoleSink, LogSink, Sink, SourceLocation};
use sfud_port::{printf, sfud_debug, sfud_debugf, sfud_info, sfud_infof};

struct Recorder {
    lines: Mutex<Vec<Vec<u8>>>,
}

impl Recorder {
    const fn new() -> Self {
        Self {
            lines: Mutex::new(Vec::new()),
        }
    }

    fn drain(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap()
            .drain(..)
            .map(|l| String::from_utf8(l).unwrap())
            .collect()
    }
}

impl Sink for Recorder {
    fn emit(&self, line: &CStr) {
        self.lines.lock().unwrap().push(line.to_bytes().to_vec());
    }
}

static RECORDER: Recorder = Recorder::new();

fn record() -> &'static Recorder {
    diag::install_sink(&RECORDER);
    RECORDER.drain();
    &RECORDER
}

#[test]
#[serial]
fn macros_reach_installed_sink() {
    let rec = record();

    let line = line!() + 1;
    sfud_debug!("val={}", 5);
    sfud_info!("boot complete");

    assert_eq!(
        rec.drain(),
        [format!("({}:{}) val=5", file!(), line), "boot complete".to_string()]
    );
}

#[test]
#[serial]
fn printf_macros() {
    let rec = record();

    let line = line!() + 1;
    sfud_debugf!("val=%d", 5);
    sfud_infof!("%s: %lu bytes at 0x%08lX", "erase", 4096u32, 0x1000u32);
    sfud_infof!("100%%");

    assert_eq!(
        rec.drain(),
        [
            format!("({}:{}) val=5", file!(), line),
            "erase: 4096 bytes at 0x00001000".to_string(),
            "100%".to_string(),
        ]
    );
}

#[test]
#[serial]
fn free_functions_with_explicit_location() {
    let rec = record();

    diag::log_debug(SourceLocation::new("a.c", 10), &printf!("val=%d", 5));
    diag::log_info("boot complete");

    assert_eq!(rec.drain(), ["(a.c:10) val=5", "boot complete"]);
}

#[test]
#[serial]
fn lines_are_capped_at_255_bytes() {
    let rec = record();

    let long = "x".repeat(1000);
    sfud_info!("{}", long);
    diag::log_debug(SourceLocation::new(&long, 1), "body");

    let lines = rec.drain();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "x".repeat(255));
    assert_eq!(lines[1], format!("({}", "x".repeat(254)));
}

#[test]
#[serial]
fn nothing_installed_drops_lines() {
    record();
    assert!(diag::take_sink().is_some());
    assert!(diag::take_sink().is_none());

    sfud_info!("dropped");
    sfud_debug!("dropped too");

    assert!(RECORDER.drain().is_empty());
}

#[test]
#[serial]
fn install_returns_previous_sink() {
    static OTHER: Recorder = Recorder::new();

    record();
    let previous = diag::install_sink(&OTHER);
    assert!(previous.is_some());

    sfud_info!("to other");
    assert!(RECORDER.drain().is_empty());
    assert_eq!(OTHER.drain(), ["to other"]);

    diag::take_sink();
}

#[test]
#[serial]
fn console_sink_as_global() {
    static CONSOLE: ConsoleSink<String> = ConsoleSink::new(String::new());

    diag::install_sink(&CONSOLE);
    sfud_infof!("JEDEC ID: %02X %02X %02X", 0xEFu8, 0x40u8, 0x18u8);
    diag::take_sink();

    CONSOLE.with_output(|out| {
        assert_eq!(out.as_str(), "SFUD: JEDEC ID: EF 40 18\r\n");
        out.clear();
    });
}

struct Capture;

static CAPTURED: Mutex<Vec<(String, String)>> = Mutex::new(Vec::new());

impl log::Log for Capture {
    fn enabled(&self, _: &log::Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &log::Record<'_>) {
        CAPTURED
            .lock()
            .unwrap()
            .push((record.target().to_string(), record.args().to_string()));
    }

    fn flush(&self) {}
}

static CAPTURE: Capture = Capture;

#[test]
#[serial]
fn log_sink_forwards_to_log_facade() {
    static SINK: LogSink = LogSink;

    let _ = log::set_logger(&CAPTURE);
    log::set_max_level(log::LevelFilter::Trace);
    CAPTURED.lock().unwrap().clear();

    diag::install_sink(&SINK);
    diag::log_debug(SourceLocation::new("sfud.c", 7), "init ok");
    diag::take_sink();

    let captured = CAPTURED.lock().unwrap().clone();
    assert_eq!(
        captured,
        [("sfud".to_string(), "(sfud.c:7) init ok".to_string())]
    );
}
