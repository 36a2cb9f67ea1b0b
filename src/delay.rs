//! Blocking delays
//!
//! Two providers are available:
//!
//! - [`Delay`] counts SysTick ticks. The counter free-runs at the core clock,
//!   so time spent outside the wait loop does not lengthen the delay.
//! - [`BusyWait`] burns a calibrated number of core cycles. It needs no
//!   peripheral, only the clock rate.
//!
//! Please be aware of potential overflows.
//! For example, the maximum delay with 48MHz is around 89 seconds
//!
//! # Example
//!
//! ``` ignore
//! use stm32f0xx_blinky as blinky;
//!
//! use crate::blinky::pac;
//! use crate::blinky::prelude::*;
//! use crate::blinky::delay::Delay;
//! use crate::blinky::config::ConfigBits;
//!
//! let p = pac::Peripherals::take().unwrap();
//! let cp = cortex_m::Peripherals::take().unwrap();
//!
//! let clocks = p.RCC.constrain().freeze(&ConfigBits::BLINKY).unwrap();
//! let mut delay = Delay::new(cp.SYST, &clocks);
//! loop {
//!     delay.delay_ms(1_000_u16);
//! }
//! ```

use crate::time::Hertz;

/// Conversion from microseconds to core clock ticks
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Scale {
    Mult(u32),
    Div(u32),
}

impl Scale {
    pub fn from_clock(clock: Hertz) -> Scale {
        if clock.0 < 1_000_000 {
            Scale::Div(1_000_000 / clock.0)
        } else {
            Scale::Mult(clock.0 / 1_000_000)
        }
    }

    /// Core clock ticks in `us` microseconds
    pub fn ticks(self, us: u32) -> u32 {
        match self {
            Scale::Div(x) => us / x,
            Scale::Mult(x) => us * x,
        }
    }
}

#[cfg(feature = "device-selected")]
pub use self::device::{BusyWait, Delay};

#[cfg(feature = "device-selected")]
mod device {
    use cast::{u16, u32};
    use cortex_m::peripheral::syst::SystClkSource;
    use cortex_m::peripheral::SYST;
    use embedded_hal::blocking::delay::{DelayMs, DelayUs};

    use super::Scale;
    use crate::rcc::Clocks;
    use crate::time::{Hertz, MilliSeconds};

    const SYSTICK_RANGE: u32 = 0x0100_0000;

    /// System timer (SysTick) as a delay provider
    #[derive(Clone)]
    pub struct Delay {
        scale: Scale,
    }

    impl Delay {
        /// Configures the system timer (SysTick) as a delay provider
        /// As access to the count register is possible without a reference, we can
        /// just drop it
        pub fn new(mut syst: SYST, clocks: &Clocks) -> Delay {
            syst.set_clock_source(SystClkSource::Core);

            syst.set_reload(SYSTICK_RANGE - 1);
            syst.clear_current();
            syst.enable_counter();

            Delay {
                scale: Scale::from_clock(clocks.sysclk()),
            }
        }
    }

    impl DelayMs<u32> for Delay {
        // At 48 MHz, calling delay_us with ms * 1_000 directly overflows at 0x15D868 (just over the max u16 value)
        fn delay_ms(&mut self, mut ms: u32) {
            const MAX_MS: u32 = 0x0000_FFFF;
            while ms != 0 {
                let current_ms = if ms <= MAX_MS { ms } else { MAX_MS };
                self.delay_us(current_ms * 1_000);
                ms -= current_ms;
            }
        }
    }

    impl DelayMs<u16> for Delay {
        fn delay_ms(&mut self, ms: u16) {
            self.delay_us(u32(ms) * 1_000);
        }
    }

    impl DelayMs<u8> for Delay {
        fn delay_ms(&mut self, ms: u8) {
            self.delay_ms(u16(ms));
        }
    }

    impl DelayUs<u32> for Delay {
        fn delay_us(&mut self, us: u32) {
            // The SysTick Reload Value register supports values between 1 and 0x00FFFFFF.
            // Here less than maximum is used so we have some play if there's a long running interrupt.
            const MAX_RVR: u32 = 0x007F_FFFF;

            let mut total_rvr = self.scale.ticks(us);

            while total_rvr != 0 {
                let current_rvr = if total_rvr <= MAX_RVR {
                    total_rvr
                } else {
                    MAX_RVR
                };

                let start_count = SYST::get_current();
                total_rvr -= current_rvr;
                while (start_count.wrapping_sub(SYST::get_current()) % SYSTICK_RANGE)
                    < current_rvr
                {}
            }
        }
    }

    impl DelayUs<u16> for Delay {
        fn delay_us(&mut self, us: u16) {
            self.delay_us(u32(us))
        }
    }

    impl DelayUs<u8> for Delay {
        fn delay_us(&mut self, us: u8) {
            self.delay_us(u32(us))
        }
    }

    /// Cycle-counted delay calibrated to a core clock
    #[derive(Clone, Copy)]
    pub struct BusyWait {
        clock: Hertz,
    }

    impl BusyWait {
        pub fn new(clock: Hertz) -> Self {
            BusyWait { clock }
        }
    }

    impl DelayMs<u32> for BusyWait {
        fn delay_ms(&mut self, ms: u32) {
            let mut cycles = self.clock.cycles(MilliSeconds(ms));
            while cycles != 0 {
                let chunk = core::cmp::min(cycles, u64::from(u32::MAX));
                cortex_m::asm::delay(chunk as u32);
                cycles -= chunk;
            }
        }
    }

    impl DelayMs<u16> for BusyWait {
        fn delay_ms(&mut self, ms: u16) {
            self.delay_ms(u32(ms));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Scale;
    use crate::time::Hertz;

    #[test]
    fn scale_above_one_megahertz_multiplies() {
        let scale = Scale::from_clock(Hertz(8_000_000));
        assert_eq!(scale, Scale::Mult(8));
        assert_eq!(scale.ticks(500_000), 4_000_000);
    }

    #[test]
    fn scale_below_one_megahertz_divides() {
        let scale = Scale::from_clock(Hertz(500_000));
        assert_eq!(scale, Scale::Div(2));
        assert_eq!(scale.ticks(1_000), 500);
    }
}
