use crate::config::{ConfigBits, ConfigError};
use crate::pac::RCC;
use crate::time::Hertz;

/// Extension trait that constrains the `RCC` peripheral
pub trait RccExt {
    /// Constrains the `RCC` peripheral so it plays nicely with the other abstractions
    fn constrain(self) -> Rcc;
}

impl RccExt for RCC {
    fn constrain(self) -> Rcc {
        Rcc { regs: self }
    }
}

/// Constrained RCC peripheral
pub struct Rcc {
    pub(crate) regs: RCC,
}

impl Rcc {
    /// Starts the oscillator selected by `bits` and runs the core from it
    ///
    /// There is no PLL stage: the core runs at the oscillator frequency.
    pub fn freeze(&mut self, bits: &ConfigBits) -> Result<Clocks, ConfigError> {
        bits.validate()?;
        let sysclk = bits.clock();

        // adjust flash wait states before speeding up
        unsafe {
            let flash = &*crate::pac::FLASH::ptr();
            flash.acr.write(|w| {
                w.latency().bits(if sysclk.0 <= 24_000_000 {
                    0b000
                } else {
                    0b001
                })
            })
        }

        if bits.selected_oscillator().is_external() {
            self.regs
                .cr
                .modify(|_, w| w.hseon().on().hsebyp().not_bypassed());

            // Wait for HSE ready
            while self.regs.cr.read().hserdy().bit_is_clear() {}

            self.regs.cfgr.modify(|_, w| w.sw().hse());
            while !self.regs.cfgr.read().sws().is_hse() {}
        } else {
            self.regs.cr.modify(|_, w| w.hsion().set_bit());

            // Wait for HSI ready
            while self.regs.cr.read().hsirdy().bit_is_clear() {}

            self.regs.cfgr.modify(|_, w| w.sw().hsi());
            while !self.regs.cfgr.read().sws().is_hsi() {}
        }

        debug!("rcc: sysclk {} Hz from {}", sysclk.0, bits.selected_oscillator());

        Ok(Clocks { sysclk })
    }
}

/// Frozen clock frequencies
///
/// The existence of this value indicates that the clock configuration can no longer be changed
#[derive(Clone, Copy)]
pub struct Clocks {
    sysclk: Hertz,
}

impl Clocks {
    /// Returns the system (core) frequency
    pub fn sysclk(&self) -> Hertz {
        self.sysclk
    }
}
