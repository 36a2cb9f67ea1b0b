//! Blinks an LED
//!
//! The following wiring is assumed:
//! - LED => PB0

#![no_main]
#![no_std]

#[cfg(feature = "defmt")]
use defmt_rtt as _;
use panic_halt as _;

use stm32f0xx_blinky as blinky;

use crate::blinky::time::MilliSeconds;
use crate::blinky::{board, pac, ConfigBits, Timing};

use cortex_m_rt::entry;

/// Length of each ON and OFF phase
const BLINK_PERIOD: Timing = Timing::symmetric(MilliSeconds(500));

#[entry]
fn main() -> ! {
    if let (Some(p), Some(cp)) = (pac::Peripherals::take(), cortex_m::Peripherals::take()) {
        match board::initialize(p, cp, &ConfigBits::BLINKY, BLINK_PERIOD) {
            Ok(blinky) => blinky.run(),
            Err(_e) => {
                #[cfg(feature = "defmt")]
                defmt::error!("bring-up failed: {}", _e);
            }
        }
    }

    loop {
        continue;
    }
}
