//! Board bring-up
//!
//! Applies the configuration bits, then hands PB0 to the blink controller.

use embedded_hal::watchdog::WatchdogEnable;

use crate::blink::{BlinkController, Timing};
use crate::config::{ConfigBits, ConfigError};
#[cfg(feature = "busy-wait")]
use crate::delay::BusyWait;
#[cfg(not(feature = "busy-wait"))]
use crate::delay::Delay;
use crate::gpio::{GpioExt, Output, PushPull, PB0};
use crate::pac;
use crate::rcc::RccExt;
use crate::watchdog::{IwdgTimeout, Supervisor, Watchdog};

/// The LED line once it is an output
pub type Led = PB0<Output<PushPull>>;

/// Delay provider the controller blocks on
#[cfg(not(feature = "busy-wait"))]
pub type BlinkDelay = Delay;
/// Delay provider the controller blocks on
#[cfg(feature = "busy-wait")]
pub type BlinkDelay = BusyWait;

/// Controller as wired on the board
pub type Blinky = BlinkController<Led, BlinkDelay, Supervisor>;

/// Brings up clocks, the LED line, SysTick and, if enabled, the watchdog
pub fn initialize(
    p: pac::Peripherals,
    cp: cortex_m::Peripherals,
    bits: &ConfigBits,
    timing: Timing,
) -> Result<Blinky, ConfigError> {
    info!("board: {}", bits);
    bits.validate_timing(&timing)?;

    let mut rcc = p.RCC.constrain();
    let clocks = rcc.freeze(bits)?;

    let gpiob = p.GPIOB.split(&mut rcc);
    #[cfg(not(feature = "busy-wait"))]
    let delay = Delay::new(cp.SYST, &clocks);
    #[cfg(feature = "busy-wait")]
    let delay = {
        drop(cp);
        BusyWait::new(clocks.sysclk())
    };

    let supervisor = if bits.watchdog_enabled() {
        // Freeze the IWDG while a debugger halts the core
        p.DBGMCU.apb1_fz.modify(|_, w| w.dbg_iwdg_stop().set_bit());

        let timeout = IwdgTimeout::for_timing(&timing);
        let mut iwdg = Watchdog::new(p.IWDG);
        iwdg.start(timeout);
        info!("board: watchdog started, timeout {} ms", timeout.period().0);
        Supervisor::Iwdg(iwdg)
    } else {
        Supervisor::Off
    };

    Ok(BlinkController::initialize(gpiob.pb0, delay, timing).with_watchdog(supervisor))
}
