//! General Purpose Input / Output
//!
//! Only the LED line, PB0, is exposed. It comes out of reset as a floating
//! input and must be switched to a push pull output before it can be driven.

use core::convert::Infallible;
use core::marker::PhantomData;

use critical_section::CriticalSection;
use embedded_hal::digital::v2::{toggleable, OutputPin, StatefulOutputPin};

use crate::blink::IntoOutput;
use crate::pac::GPIOB;
use crate::rcc::Rcc;

/// Extension trait to split a GPIO peripheral in independent pins and registers
pub trait GpioExt {
    /// The parts to split the GPIO into
    type Parts;

    /// Splits the GPIO block into independent pins and registers
    fn split(self, rcc: &mut Rcc) -> Self::Parts;
}

/// Input mode (type state)
pub struct Input<MODE> {
    _mode: PhantomData<MODE>,
}

/// Floating input (type state)
pub struct Floating;

/// Output mode (type state)
pub struct Output<MODE> {
    _mode: PhantomData<MODE>,
}

/// Push pull output (type state)
pub struct PushPull;

/// GPIOB parts
pub struct Parts {
    /// LED line
    pub pb0: PB0<Input<Floating>>,
}

impl GpioExt for GPIOB {
    type Parts = Parts;

    fn split(self, rcc: &mut Rcc) -> Parts {
        rcc.regs.ahbenr.modify(|_, w| w.iopben().set_bit());

        Parts {
            pb0: PB0 { _mode: PhantomData },
        }
    }
}

const PIN: u8 = 0;

fn port() -> &'static <GPIOB as core::ops::Deref>::Target {
    // NOTE(unsafe) GPIOB is owned through `Parts`; callers only touch bit `PIN`
    unsafe { &*GPIOB::ptr() }
}

/// Pin 0 of port B
pub struct PB0<MODE> {
    _mode: PhantomData<MODE>,
}

impl<MODE> PB0<MODE> {
    /// Configures the pin to operate as an push pull output pin
    pub fn into_push_pull_output(self, _cs: &CriticalSection) -> PB0<Output<PushPull>> {
        let offset = 2 * PIN;
        let reg = port();
        unsafe {
            reg.pupdr
                .modify(|r, w| w.bits((r.bits() & !(0b11 << offset)) | (0b00 << offset)));
            reg.otyper.modify(|r, w| w.bits(r.bits() & !(0b1 << PIN)));
            reg.moder
                .modify(|r, w| w.bits((r.bits() & !(0b11 << offset)) | (0b01 << offset)));
        }
        PB0 { _mode: PhantomData }
    }
}

impl IntoOutput for PB0<Input<Floating>> {
    type Output = PB0<Output<PushPull>>;

    fn into_output(self) -> Self::Output {
        critical_section::with(|cs| self.into_push_pull_output(&cs))
    }
}

impl<MODE> StatefulOutputPin for PB0<Output<MODE>> {
    fn is_set_high(&self) -> Result<bool, Self::Error> {
        self.is_set_low().map(|v| !v)
    }

    fn is_set_low(&self) -> Result<bool, Self::Error> {
        // NOTE(unsafe) atomic read with no side effects
        Ok(port().odr.read().bits() & (1 << PIN) == 0)
    }
}

impl<MODE> OutputPin for PB0<Output<MODE>> {
    type Error = Infallible;

    fn set_high(&mut self) -> Result<(), Self::Error> {
        // NOTE(unsafe) atomic write to a stateless register
        unsafe { port().bsrr.write(|w| w.bits(1 << PIN)) };
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        // NOTE(unsafe) atomic write to a stateless register
        unsafe { port().bsrr.write(|w| w.bits(1 << (PIN + 16))) };
        Ok(())
    }
}

impl<MODE> toggleable::Default for PB0<Output<MODE>> {}

impl<MODE> embedded_hal_1::digital::ErrorType for PB0<MODE> {
    type Error = Infallible;
}

impl<MODE> embedded_hal_1::digital::OutputPin for PB0<Output<MODE>> {
    #[inline(always)]
    fn set_high(&mut self) -> Result<(), Self::Error> {
        OutputPin::set_high(self)
    }

    #[inline(always)]
    fn set_low(&mut self) -> Result<(), Self::Error> {
        OutputPin::set_low(self)
    }
}

impl<MODE> embedded_hal_1::digital::StatefulOutputPin for PB0<Output<MODE>> {
    #[inline(always)]
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        StatefulOutputPin::is_set_high(self)
    }

    #[inline(always)]
    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        StatefulOutputPin::is_set_low(self)
    }
}
