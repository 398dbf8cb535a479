// sfud-port bring-up on the ESP32-C3
//
// Boot sequence: logger -> diagnostic sink -> flash SPI -> JEDEC ID read
//
// Diagnostic lines from the flash driver go through a ConsoleSink on
// the esp-println console, tagged "SFUD: ". Board progress uses the
// log facade like the rest of the firmware.

#![no_std]
#![no_main]

use esp_backtrace as _;
use esp_hal::clock::CpuClock;
use esp_hal::delay::Delay;
use esp_println::Printer;
use log::{info, warn};

use sfud_port::board::FlashHw;
use sfud_port::diag::{self, ConsoleSink};
use sfud_port::drivers::{RetryConfig, SpiPort};
use sfud_port::{sfud_debug, sfud_infof};

esp_bootloader_esp_idf::esp_app_desc!();

const CMD_JEDEC_ID: u8 = 0x9F;
const CMD_READ_STATUS: u8 = 0x05;
const STATUS_BUSY: u8 = 0x01;

// power-on busy wait: 100 polls at 1ms
const POWER_ON_RETRY: RetryConfig = RetryConfig::DEFAULT.with_times(100);

static CONSOLE: ConsoleSink<Printer> = ConsoleSink::new(Printer);

#[esp_hal::main]
fn main() -> ! {
    esp_println::logger::init_logger_from_env();
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    info!("booting...");

    diag::install_sink(&CONSOLE);
    info!("diagnostic sink installed.");

    let flash = FlashHw::init(peripherals);
    let mut port = SpiPort::with_retry(flash.spi, Delay::new(), POWER_ON_RETRY);
    info!("flash spi initialized.");

    let ready = port.wait_until(|p| {
        let mut status = [0u8; 1];
        p.write_read(&[CMD_READ_STATUS], &mut status)?;
        Ok(status[0] & STATUS_BUSY == 0)
    });
    sfud_debug!("power-on busy wait: {:?}", ready);

    let mut id = [0u8; 3];
    match port.write_read(&[CMD_JEDEC_ID], &mut id) {
        Ok(()) => sfud_infof!(
            "JEDEC ID: manufacturer 0x%02X, type 0x%02X, capacity 0x%02X",
            id[0],
            id[1],
            id[2]
        ),
        Err(e) => warn!("JEDEC ID read failed: {} (code {})", e, e.code()),
    }

    let mut delay = Delay::new();
    loop {
        delay.delay_millis(1000);
    }
}
