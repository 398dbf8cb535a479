// SPI transfer hook for the SFUD flash driver.
//
// Each driver request is a write phase (command, address, dummy bytes)
// followed by an optional read phase, inside one chip-select frame.
// SpiDevice owns CS, so one transaction per request keeps the frame
// intact on a shared bus.
//
// RetryConfig covers the driver's busy-wait polling: how many times to
// ask and how long to sleep between asks.

use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::spi::{Operation, SpiDevice};
use log::{error, warn};

// numeric result code the driver uses for "no error"
pub const SFUD_SUCCESS: i32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SfudError {
    NotFound,
    Write,
    Read,
    Timeout,
    AddrOutOfBound,
}

impl SfudError {
    /// The driver's numeric code for this error.
    pub const fn code(self) -> i32 {
        match self {
            SfudError::NotFound => 1,
            SfudError::Write => 2,
            SfudError::Read => 3,
            SfudError::Timeout => 4,
            SfudError::AddrOutOfBound => 5,
        }
    }
}

impl fmt::Display for SfudError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            SfudError::NotFound => "flash not found",
            SfudError::Write => "spi write failed",
            SfudError::Read => "spi read failed",
            SfudError::Timeout => "flash busy timeout",
            SfudError::AddrOutOfBound => "address out of bounds",
        };
        f.write_str(msg)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    pub times: u32,
    pub delay_us: u32,
}

impl RetryConfig {
    // 60k polls at 1ms: a chip erase on large parts takes tens of seconds
    pub const DEFAULT: Self = Self {
        times: 60 * 1000,
        delay_us: 1000,
    };

    pub const fn with_times(mut self, times: u32) -> Self {
        self.times = times;
        self
    }

    pub const fn with_delay_us(mut self, delay_us: u32) -> Self {
        self.delay_us = delay_us;
        self
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

pub struct SpiPort<SPI, D> {
    spi: SPI,
    delay: D,
    retry: RetryConfig,
}

impl<SPI, D> SpiPort<SPI, D>
where
    SPI: SpiDevice,
    D: DelayNs,
{
    pub fn new(spi: SPI, delay: D) -> Self {
        Self::with_retry(spi, delay, RetryConfig::DEFAULT)
    }

    pub fn with_retry(spi: SPI, delay: D, retry: RetryConfig) -> Self {
        Self { spi, delay, retry }
    }

    pub fn retry(&self) -> RetryConfig {
        self.retry
    }

    /// One CS-framed request: `write` goes out, then `read` is filled.
    ///
    /// Either half may be empty; both empty is a no-op. A failed frame
    /// reports `Read` when a read phase was requested, `Write` otherwise.
    pub fn write_read(&mut self, write: &[u8], read: &mut [u8]) -> Result<(), SfudError> {
        let failure = if read.is_empty() {
            SfudError::Write
        } else {
            SfudError::Read
        };

        let result = match (write.is_empty(), read.is_empty()) {
            (true, true) => return Ok(()),
            (false, true) => self.spi.write(write),
            (true, false) => self.spi.read(read),
            (false, false) => self
                .spi
                .transaction(&mut [Operation::Write(write), Operation::Read(read)]),
        };

        result.map_err(|e| {
            error!("SFUD ERR: {:?}", e);
            failure
        })
    }

    pub fn write(&mut self, data: &[u8]) -> Result<(), SfudError> {
        self.write_read(data, &mut [])
    }

    pub fn read(&mut self, buf: &mut [u8]) -> Result<(), SfudError> {
        self.write_read(&[], buf)
    }

    /// Sleeps for one retry interval.
    pub fn retry_delay(&mut self) {
        self.delay.delay_us(self.retry.delay_us);
    }

    /// Polls `ready` until it answers true, sleeping one retry interval
    /// between attempts. Asks at least once; `Timeout` once `times`
    /// attempts are used up. Errors from `ready` end the wait.
    pub fn wait_until<F>(&mut self, mut ready: F) -> Result<(), SfudError>
    where
        F: FnMut(&mut Self) -> Result<bool, SfudError>,
    {
        let attempts = self.retry.times.max(1);
        for attempt in 1..=attempts {
            if ready(self)? {
                return Ok(());
            }
            if attempt < attempts {
                self.retry_delay();
            }
        }
        warn!("SFUD: still busy after {} polls", attempts);
        Err(SfudError::Timeout)
    }

    pub fn release(self) -> (SPI, D) {
        (self.spi, self.delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::spi::{self, ErrorKind, ErrorType};

    #[derive(Debug)]
    struct BusFault;

    impl spi::Error for BusFault {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    // records every CS frame; answers reads from `reply`
    #[derive(Default)]
    struct FakeFlash {
        frames: Vec<Vec<u8>>,
        reply: Vec<u8>,
        fail: bool,
    }

    impl ErrorType for FakeFlash {
        type Error = BusFault;
    }

    impl SpiDevice for FakeFlash {
        fn transaction(&mut self, ops: &mut [Operation<'_, u8>]) -> Result<(), BusFault> {
            if self.fail {
                return Err(BusFault);
            }
            let mut frame = Vec::new();
            for op in ops.iter_mut() {
                match op {
                    Operation::Write(data) => frame.extend_from_slice(data),
                    Operation::Read(buf) => {
                        for (i, b) in buf.iter_mut().enumerate() {
                            *b = self.reply.get(i).copied().unwrap_or(0xFF);
                        }
                    }
                    _ => {}
                }
            }
            self.frames.push(frame);
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeDelay {
        ns: u64,
        calls: u32,
    }

    impl DelayNs for FakeDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.ns += ns as u64;
            self.calls += 1;
        }
    }

    fn port(flash: FakeFlash) -> SpiPort<FakeFlash, FakeDelay> {
        SpiPort::new(flash, FakeDelay::default())
    }

    #[test]
    fn write_then_read_is_one_frame() {
        let mut port = port(FakeFlash {
            reply: vec![0xEF, 0x40, 0x18],
            ..Default::default()
        });
        let mut id = [0u8; 3];
        port.write_read(&[0x9F], &mut id).unwrap();
        assert_eq!(id, [0xEF, 0x40, 0x18]);

        let (flash, _) = port.release();
        assert_eq!(flash.frames, vec![vec![0x9F]]);
    }

    #[test]
    fn empty_request_touches_nothing() {
        let mut port = port(FakeFlash::default());
        port.write_read(&[], &mut []).unwrap();
        let (flash, _) = port.release();
        assert!(flash.frames.is_empty());
    }

    #[test]
    fn write_only_and_read_only() {
        let mut port = port(FakeFlash {
            reply: vec![0x02],
            ..Default::default()
        });
        port.write(&[0x06]).unwrap();
        let mut status = [0u8; 1];
        port.read(&mut status).unwrap();
        assert_eq!(status, [0x02]);

        let (flash, _) = port.release();
        assert_eq!(flash.frames, vec![vec![0x06], vec![]]);
    }

    #[test]
    fn bus_failure_maps_to_phase() {
        let mut port = port(FakeFlash {
            fail: true,
            ..Default::default()
        });
        assert_eq!(port.write(&[0x06]), Err(SfudError::Write));
        assert_eq!(
            port.write_read(&[0x05], &mut [0u8; 1]),
            Err(SfudError::Read)
        );
        assert_eq!(port.read(&mut [0u8; 4]), Err(SfudError::Read));
    }

    #[test]
    fn error_codes() {
        assert_eq!(SFUD_SUCCESS, 0);
        assert_eq!(SfudError::NotFound.code(), 1);
        assert_eq!(SfudError::Write.code(), 2);
        assert_eq!(SfudError::Read.code(), 3);
        assert_eq!(SfudError::Timeout.code(), 4);
        assert_eq!(SfudError::AddrOutOfBound.code(), 5);
        assert_eq!(SfudError::Timeout.to_string(), "flash busy timeout");
    }

    #[test]
    fn retry_defaults_and_builders() {
        let cfg = RetryConfig::default();
        assert_eq!(cfg.times, 60_000);
        assert_eq!(cfg.delay_us, 1000);

        let cfg = cfg.with_times(3).with_delay_us(50);
        assert_eq!((cfg.times, cfg.delay_us), (3, 50));
    }

    #[test]
    fn wait_until_ready_on_third_poll() {
        let mut port = SpiPort::with_retry(
            FakeFlash::default(),
            FakeDelay::default(),
            RetryConfig::DEFAULT.with_times(10).with_delay_us(1000),
        );
        let mut polls = 0;
        let result = port.wait_until(|_| {
            polls += 1;
            Ok(polls == 3)
        });
        assert_eq!(result, Ok(()));
        assert_eq!(polls, 3);

        let (_, delay) = port.release();
        assert_eq!(delay.ns, 2 * 1_000_000);
    }

    #[test]
    fn wait_until_times_out() {
        let mut port = SpiPort::with_retry(
            FakeFlash::default(),
            FakeDelay::default(),
            RetryConfig::DEFAULT.with_times(4),
        );
        let mut polls = 0;
        let result = port.wait_until(|_| {
            polls += 1;
            Ok(false)
        });
        assert_eq!(result, Err(SfudError::Timeout));
        assert_eq!(polls, 4);
        assert_eq!(port.release().1.ns, 3 * 1_000_000);
    }

    #[test]
    fn wait_until_zero_times_still_polls_once() {
        let mut port = SpiPort::with_retry(
            FakeFlash::default(),
            FakeDelay::default(),
            RetryConfig::DEFAULT.with_times(0),
        );
        let mut polls = 0;
        assert_eq!(
            port.wait_until(|_| {
                polls += 1;
                Ok(false)
            }),
            Err(SfudError::Timeout)
        );
        assert_eq!(polls, 1);
    }

    #[test]
    fn wait_until_propagates_bus_errors() {
        let mut port = port(FakeFlash {
            fail: true,
            ..Default::default()
        });
        let result = port.wait_until(|p| {
            let mut status = [0u8; 1];
            p.write_read(&[0x05], &mut status)?;
            Ok(status[0] & 0x01 == 0)
        });
        assert_eq!(result, Err(SfudError::Read));
    }
}
