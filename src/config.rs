//! Build-time hardware configuration
//!
//! The configuration bits are fixed when the image is flashed and never change
//! at run time. They are declared once, as a `const`, and handed to the board
//! bring-up. Only the oscillator selection, the crystal frequency and the
//! watchdog enable have a run-time effect; the remaining flags live in the
//! option bytes on STM32F0 and are recorded here for completeness.
//!
//! # Example
//!
//! ```
//! use stm32f0xx_blinky::config::{ConfigBits, Oscillator};
//! use stm32f0xx_blinky::time::Hertz;
//!
//! const BITS: ConfigBits = ConfigBits::new()
//!     .oscillator(Oscillator::Hs)
//!     .crystal(Hertz(8_000_000))
//!     .watchdog(false);
//!
//! assert!(BITS.validate().is_ok());
//! assert_eq!(BITS.delay_unit(), 8_000);
//! ```

use crate::blink::Timing;
use crate::time::{Hertz, MilliSeconds};
use crate::watchdog::IwdgTimeout;

/// Frequency of the internal RC oscillator
pub const HSI: Hertz = Hertz(8_000_000);

const HSE_MIN: u32 = 4_000_000;
const HSE_MAX: u32 = 32_000_000;

/// Oscillator selection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Oscillator {
    /// Low-power crystal
    Lp,
    /// Crystal/resonator
    Xt,
    /// High-speed crystal/resonator
    Hs,
    /// Internal RC oscillator
    Rc,
}

impl Oscillator {
    /// Whether the selection drives the core from an external crystal
    pub const fn is_external(self) -> bool {
        !matches!(self, Oscillator::Rc)
    }
}

/// Rejected configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// The timing reference is 0 Hz
    ZeroClock,
    /// The crystal lies outside the range the external oscillator accepts
    CrystalOutOfRange(Hertz),
    /// The watchdog would reset the core before the longest phase ends
    WatchdogTooShort {
        period: MilliSeconds,
        phase: MilliSeconds,
    },
}

/// Immutable configuration record
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigBits {
    oscillator: Oscillator,
    watchdog: bool,
    power_up_timer: bool,
    brown_out_reset: bool,
    low_voltage_programming: bool,
    data_protection: bool,
    write_protection: bool,
    code_protection: bool,
    crystal: Hertz,
}

impl ConfigBits {
    /// Bits the blinky image is flashed with
    pub const BLINKY: ConfigBits = ConfigBits::new()
        .oscillator(Oscillator::Hs)
        .watchdog(false)
        .power_up_timer(true)
        .brown_out_reset(false)
        .low_voltage_programming(false)
        .data_protection(false)
        .write_protection(false)
        .code_protection(false)
        .crystal(Hertz(8_000_000));

    /// Internal oscillator, every feature and protection off
    pub const fn new() -> Self {
        ConfigBits {
            oscillator: Oscillator::Rc,
            watchdog: false,
            power_up_timer: false,
            brown_out_reset: false,
            low_voltage_programming: false,
            data_protection: false,
            write_protection: false,
            code_protection: false,
            crystal: HSI,
        }
    }

    pub const fn oscillator(mut self, oscillator: Oscillator) -> Self {
        self.oscillator = oscillator;
        self
    }

    pub const fn watchdog(mut self, on: bool) -> Self {
        self.watchdog = on;
        self
    }

    pub const fn power_up_timer(mut self, on: bool) -> Self {
        self.power_up_timer = on;
        self
    }

    pub const fn brown_out_reset(mut self, on: bool) -> Self {
        self.brown_out_reset = on;
        self
    }

    pub const fn low_voltage_programming(mut self, on: bool) -> Self {
        self.low_voltage_programming = on;
        self
    }

    pub const fn data_protection(mut self, on: bool) -> Self {
        self.data_protection = on;
        self
    }

    pub const fn write_protection(mut self, on: bool) -> Self {
        self.write_protection = on;
        self
    }

    pub const fn code_protection(mut self, on: bool) -> Self {
        self.code_protection = on;
        self
    }

    /// Frequency of the external crystal
    ///
    /// Ignored when the internal oscillator is selected.
    pub const fn crystal(mut self, freq: Hertz) -> Self {
        self.crystal = freq;
        self
    }

    pub const fn selected_oscillator(&self) -> Oscillator {
        self.oscillator
    }

    pub const fn watchdog_enabled(&self) -> bool {
        self.watchdog
    }

    pub const fn power_up_timer_enabled(&self) -> bool {
        self.power_up_timer
    }

    pub const fn brown_out_reset_enabled(&self) -> bool {
        self.brown_out_reset
    }

    pub const fn low_voltage_programming_enabled(&self) -> bool {
        self.low_voltage_programming
    }

    /// Whether any of the memory protection flags is set
    pub const fn protected(&self) -> bool {
        self.data_protection || self.write_protection || self.code_protection
    }

    /// Frequency the core runs at with this selection
    pub const fn clock(&self) -> Hertz {
        if self.oscillator.is_external() {
            self.crystal
        } else {
            HSI
        }
    }

    /// Core cycles per millisecond of delay
    pub const fn delay_unit(&self) -> u32 {
        self.clock().cycles_per_ms()
    }

    /// Checks that the record describes a clock the hardware can run from
    pub fn validate(&self) -> Result<(), ConfigError> {
        let clock = self.clock();
        if clock.0 == 0 {
            return Err(ConfigError::ZeroClock);
        }
        if self.oscillator.is_external() && !(HSE_MIN..=HSE_MAX).contains(&clock.0) {
            return Err(ConfigError::CrystalOutOfRange(clock));
        }
        Ok(())
    }

    /// Checks that the watchdog, when enabled, outlasts every phase of `timing`
    ///
    /// The IWDG timeout saturates at about 26 seconds, so phases that long
    /// cannot be supervised.
    pub fn validate_timing(&self, timing: &Timing) -> Result<(), ConfigError> {
        if !self.watchdog {
            return Ok(());
        }
        let period = IwdgTimeout::for_timing(timing).period();
        let phase = timing.longest();
        if period <= phase {
            return Err(ConfigError::WatchdogTooShort { period, phase });
        }
        Ok(())
    }
}

impl Default for ConfigBits {
    fn default() -> Self {
        ConfigBits::new()
    }
}
