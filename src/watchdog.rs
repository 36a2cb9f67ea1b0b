//! API for the IWDG
//!
//! The watchdog only runs when the configuration bits enable it. Once started
//! it cannot be stopped, and the blink controller has to `feed` it more often
//! than the timeout or the microcontroller is reset.
//!
//! **Attention**:
//!
//! The IWDG runs on a separate 40kHz low-accuracy clock (30kHz-60kHz). You may
//! want to some buffer in your interval.
//!
//! Per default the iwdg continues to run even when you stopped execution of code via a debugger.
//! You may want to disable the watchdog when the cpu is stopped
//!
//! ``` ignore
//! let dbgmcu = p.DBGMCU;
//! dbgmcu.apb1_fz.modify(|_, w| w.dbg_iwdg_stop().set_bit());
//! ```

use crate::blink::Timing;
use crate::time::MilliSeconds;

const LSI_HZ: u32 = 40_000;
const MAX_RELOAD: u32 = 0x0FFF;
const MAX_PSC: u8 = 6;

/// Timeout configuration for the IWDG
#[derive(PartialEq, PartialOrd, Clone, Copy, Debug)]
pub struct IwdgTimeout {
    psc: u8,
    reload: u16,
}

impl IwdgTimeout {
    /// Prescaler register value; the LSI is divided by `4 << psc`
    pub fn psc(&self) -> u8 {
        self.psc
    }

    pub fn reload(&self) -> u16 {
        self.reload
    }

    /// Time until reset after a feed
    pub fn period(&self) -> MilliSeconds {
        let divider = 4u32 << self.psc;
        MilliSeconds(u32::from(self.reload) * divider * 1_000 / LSI_HZ)
    }

    /// Timeout for a controller blinking with `timing`: twice its longest phase
    pub fn for_timing(timing: &Timing) -> Self {
        IwdgTimeout::from(MilliSeconds(timing.longest().0.saturating_mul(2)))
    }
}

impl From<MilliSeconds> for IwdgTimeout {
    /// Picks the finest prescaler that still reaches `timeout`
    ///
    /// Saturates at the longest representable timeout, about 26 seconds.
    fn from(timeout: MilliSeconds) -> Self {
        let mut psc = 0;
        loop {
            let divider = 4u64 << psc;
            let reload = (u64::from(timeout.0) * u64::from(LSI_HZ) / 1_000) / divider;
            if reload <= u64::from(MAX_RELOAD) {
                return IwdgTimeout {
                    psc,
                    reload: core::cmp::max(reload, 1) as u16,
                };
            }
            if psc == MAX_PSC {
                return IwdgTimeout {
                    psc,
                    reload: MAX_RELOAD as u16,
                };
            }
            psc += 1;
        }
    }
}

#[cfg(feature = "device-selected")]
pub use self::device::{Supervisor, Watchdog};

#[cfg(feature = "device-selected")]
mod device {
    use embedded_hal::watchdog;

    use super::IwdgTimeout;
    use crate::pac::IWDG;

    /// Watchdog instance
    pub struct Watchdog {
        iwdg: IWDG,
    }

    impl watchdog::Watchdog for Watchdog {
        /// Feed the watchdog, so that at least one `period` goes by before the next
        /// reset
        fn feed(&mut self) {
            self.iwdg.kr.write(|w| w.key().reset());
        }
    }

    impl Watchdog {
        pub fn new(iwdg: IWDG) -> Self {
            Self { iwdg }
        }
    }

    impl watchdog::WatchdogEnable for Watchdog {
        type Time = IwdgTimeout;
        fn start<T>(&mut self, period: T)
        where
            T: Into<IwdgTimeout>,
        {
            let time: IwdgTimeout = period.into();
            // Feed the watchdog in case it's already running
            // (Waiting for the registers to update takes sometime)
            self.iwdg.kr.write(|w| w.key().reset());
            // Enable the watchdog
            self.iwdg.kr.write(|w| w.key().start());
            self.iwdg.kr.write(|w| w.key().enable());
            // Wait until it's safe to write to the registers
            while self.iwdg.sr.read().pvu().bit() {}
            self.iwdg.pr.write(|w| w.pr().bits(time.psc));
            while self.iwdg.sr.read().rvu().bit() {}
            self.iwdg.rlr.write(|w| w.rl().bits(time.reload));
            // Wait until the registers are updated before issuing a reset with
            // (potentially false) values
            while self.iwdg.sr.read().bits() != 0 {}
            self.iwdg.kr.write(|w| w.key().reset());
        }
    }

    /// Watchdog as selected by the configuration bits
    pub enum Supervisor {
        /// Disabled, feeding does nothing
        Off,
        /// Running IWDG
        Iwdg(Watchdog),
    }

    impl watchdog::Watchdog for Supervisor {
        fn feed(&mut self) {
            if let Supervisor::Iwdg(iwdg) = self {
                watchdog::Watchdog::feed(iwdg);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_timeout_uses_smallest_prescaler() {
        let timeout = IwdgTimeout::from(MilliSeconds(100));
        assert_eq!(timeout.psc(), 0);
        assert_eq!(timeout.reload(), 1_000);
        assert_eq!(timeout.period(), MilliSeconds(100));
    }

    #[test]
    fn blink_timeout_fits() {
        // twice the 500 ms phase
        let timeout = IwdgTimeout::from(MilliSeconds(1_000));
        assert_eq!(timeout.psc(), 2);
        assert_eq!(timeout.reload(), 2_500);
        assert_eq!(timeout.period(), MilliSeconds(1_000));
    }

    #[test]
    fn long_timeout_scales_prescaler() {
        let timeout = IwdgTimeout::from(MilliSeconds(2_000));
        assert_eq!(timeout.psc(), 3);
        assert_eq!(timeout.reload(), 2_500);
        assert_eq!(timeout.period(), MilliSeconds(2_000));
    }

    #[test]
    fn saturates_at_longest_timeout() {
        let timeout = IwdgTimeout::from(MilliSeconds(60_000));
        assert_eq!(timeout.psc(), 6);
        assert_eq!(timeout.reload(), 0x0FFF);
    }

    #[test]
    fn timing_timeout_doubles_longest_phase() {
        let timing = Timing::new(MilliSeconds(200), MilliSeconds(500));
        assert_eq!(IwdgTimeout::for_timing(&timing).period(), MilliSeconds(1_000));

        let slow = Timing::symmetric(MilliSeconds(30_000));
        assert_eq!(IwdgTimeout::for_timing(&slow).period(), MilliSeconds(26_208));
    }

    #[test]
    fn zero_timeout_still_reloads() {
        assert_eq!(IwdgTimeout::from(MilliSeconds(0)).reload(), 1);
    }
}
