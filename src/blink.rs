//! Blink controller
//!
//! Owns one output line and drives it ON and OFF forever, blocking for a
//! fixed duration after every transition.
//!
//! The line is handed over before it is an output. [`BlinkController::initialize`]
//! switches it into output mode, so the first level write can only happen
//! after the direction has been set.
//!
//! # Example
//!
//! ``` ignore
//! use stm32f0xx_blinky as blinky;
//!
//! use crate::blinky::blink::{BlinkController, Timing};
//! use crate::blinky::pac;
//! use crate::blinky::prelude::*;
//! use crate::blinky::delay::Delay;
//! use crate::blinky::config::ConfigBits;
//!
//! let p = pac::Peripherals::take().unwrap();
//! let cp = cortex_m::Peripherals::take().unwrap();
//!
//! let mut rcc = p.RCC.constrain();
//! let clocks = rcc.freeze(&ConfigBits::BLINKY).unwrap();
//! let gpiob = p.GPIOB.split(&mut rcc);
//! let delay = Delay::new(cp.SYST, &clocks);
//!
//! let blinky = BlinkController::initialize(gpiob.pb0, delay, Timing::symmetric(500.ms()));
//! blinky.run();
//! ```

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::digital::v2::OutputPin;
use embedded_hal::watchdog::Watchdog;

use crate::time::MilliSeconds;

/// A line that can be put into output mode
pub trait IntoOutput {
    /// The line once it drives its level
    type Output: OutputPin;

    /// Configures the line as a digital output
    fn into_output(self) -> Self::Output;
}

/// Logical level the controller last drove
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Line HIGH
    On,
    /// Line LOW
    Off,
}

impl Phase {
    fn next(self) -> Phase {
        match self {
            Phase::On => Phase::Off,
            Phase::Off => Phase::On,
        }
    }
}

/// ON and OFF durations
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timing {
    on: MilliSeconds,
    off: MilliSeconds,
}

impl Timing {
    /// Separate durations for the two phases
    ///
    /// Panics if either duration is zero. In a `const` this is a build error.
    pub const fn new(on: MilliSeconds, off: MilliSeconds) -> Self {
        assert!(on.0 > 0 && off.0 > 0, "blink phases must last at least 1 ms");
        Timing { on, off }
    }

    /// The same duration for both phases
    pub const fn symmetric(period: MilliSeconds) -> Self {
        Timing::new(period, period)
    }

    pub const fn on(&self) -> MilliSeconds {
        self.on
    }

    pub const fn off(&self) -> MilliSeconds {
        self.off
    }

    /// Duration of `phase`
    pub const fn of(&self, phase: Phase) -> MilliSeconds {
        match phase {
            Phase::On => self.on,
            Phase::Off => self.off,
        }
    }

    /// The longer of the two phases
    pub fn longest(&self) -> MilliSeconds {
        core::cmp::max(self.on, self.off)
    }
}

/// Watchdog stand-in for controllers nobody supervises
#[derive(Clone, Copy, Debug, Default)]
pub struct Unwatched;

impl Watchdog for Unwatched {
    fn feed(&mut self) {}
}

/// Sole owner of the LED line
pub struct BlinkController<P, D, W = Unwatched> {
    led: P,
    delay: D,
    watchdog: W,
    timing: Timing,
    phase: Phase,
}

impl<P, D> BlinkController<P, D>
where
    P: OutputPin,
    D: DelayMs<u32>,
{
    /// Configures `line` as an output and takes ownership of it
    ///
    /// The line's level is left untouched until the first [`step`](Self::step).
    pub fn initialize<L>(line: L, delay: D, timing: Timing) -> Self
    where
        L: IntoOutput<Output = P>,
    {
        let led = line.into_output();
        debug!("blink: line in output mode, on {} ms off {} ms", timing.on.0, timing.off.0);

        BlinkController {
            led,
            delay,
            watchdog: Unwatched,
            timing,
            phase: Phase::Off,
        }
    }
}

impl<P, D, W> BlinkController<P, D, W>
where
    P: OutputPin,
    D: DelayMs<u32>,
    W: Watchdog,
{
    /// Feeds `watchdog` after every transition from now on
    pub fn with_watchdog<W2>(self, watchdog: W2) -> BlinkController<P, D, W2>
    where
        W2: Watchdog,
    {
        BlinkController {
            led: self.led,
            delay: self.delay,
            watchdog,
            timing: self.timing,
            phase: self.phase,
        }
    }

    /// Phase the line is currently in
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    /// Drives the next level, then blocks for the duration of the phase it
    /// entered
    pub fn step(&mut self) -> Result<Phase, P::Error> {
        let next = self.phase.next();
        match next {
            Phase::On => self.led.set_high()?,
            Phase::Off => self.led.set_low()?,
        }
        self.phase = next;
        self.watchdog.feed();
        trace!("blink: {}", next);

        self.delay.delay_ms(self.timing.of(next).0);
        Ok(next)
    }

    /// One full period, ON then OFF
    pub fn cycle(&mut self) -> Result<(), P::Error> {
        if self.phase == Phase::On {
            self.step()?;
        }
        self.step()?;
        self.step()?;
        Ok(())
    }

    /// Blinks until power is removed
    ///
    /// A write the line refuses still takes up its phase, so the cadence holds
    /// and the next transition tries the opposite level.
    pub fn run(mut self) -> ! {
        loop {
            if self.step().is_err() {
                let missed = self.phase.next();
                warn!("blink: line refused {}", missed);

                self.phase = missed;
                self.watchdog.feed();
                self.delay.delay_ms(self.timing.of(missed).0);
            }
        }
    }

    /// Gives back the line, the delay provider and the watchdog
    pub fn release(self) -> (P, D, W) {
        (self.led, self.delay, self.watchdog)
    }
}
