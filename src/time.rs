#[derive(PartialEq, Eq, PartialOrd, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Hertz(pub u32);

#[derive(PartialEq, Eq, PartialOrd, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KiloHertz(pub u32);

#[derive(PartialEq, Eq, PartialOrd, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MegaHertz(pub u32);

/// Milliseconds
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MilliSeconds(pub u32);

/// Extension trait that adds convenience methods to the `u32` type
pub trait U32Ext {
    /// Wrap in `Hertz`
    fn hz(self) -> Hertz;

    /// Wrap in `KiloHertz`
    fn khz(self) -> KiloHertz;

    /// Wrap in `MegaHertz`
    fn mhz(self) -> MegaHertz;

    /// Wrap in `MilliSeconds`
    fn ms(self) -> MilliSeconds;
}

impl U32Ext for u32 {
    fn hz(self) -> Hertz {
        Hertz(self)
    }

    fn khz(self) -> KiloHertz {
        KiloHertz(self)
    }

    fn mhz(self) -> MegaHertz {
        MegaHertz(self)
    }

    fn ms(self) -> MilliSeconds {
        MilliSeconds(self)
    }
}

impl From<KiloHertz> for Hertz {
    fn from(khz: KiloHertz) -> Self {
        Hertz(khz.0 * 1_000)
    }
}

impl From<MegaHertz> for Hertz {
    fn from(mhz: MegaHertz) -> Self {
        Hertz(mhz.0 * 1_000_000)
    }
}

impl From<MegaHertz> for KiloHertz {
    fn from(mhz: MegaHertz) -> Self {
        KiloHertz(mhz.0 * 1_000)
    }
}

impl Hertz {
    /// Core cycles that elapse in one millisecond at this frequency
    pub const fn cycles_per_ms(self) -> u32 {
        self.0 / 1_000
    }

    /// Core cycles that elapse in `ms` at this frequency
    ///
    /// Widened to `u64`: at 48 MHz a `u32` overflows after ~89 seconds.
    pub const fn cycles(self, ms: MilliSeconds) -> u64 {
        self.cycles_per_ms() as u64 * ms.0 as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions() {
        assert_eq!(Hertz::from(8.mhz()), Hertz(8_000_000));
        assert_eq!(Hertz::from(40.khz()), Hertz(40_000));
        assert_eq!(KiloHertz::from(48.mhz()), KiloHertz(48_000));
    }

    #[test]
    fn frequencies_compare_as_eq() {
        fn same<T: Eq>(a: T, b: T) -> bool {
            a == b
        }
        assert!(same(Hertz(8_000_000), 8.mhz().into()));
        assert!(same(KiloHertz(48_000), 48.mhz().into()));
        assert!(same(MegaHertz(8), 8.mhz()));
    }

    #[test]
    fn cycles_at_crystal_frequency() {
        let xtal = Hertz(8_000_000);
        assert_eq!(xtal.cycles_per_ms(), 8_000);
        assert_eq!(xtal.cycles(500.ms()), 4_000_000);
    }

    #[test]
    fn cycles_do_not_overflow_long_delays() {
        let sysclk = Hertz::from(48.mhz());
        assert_eq!(sysclk.cycles(MilliSeconds(100_000)), 4_800_000_000);
    }
}
