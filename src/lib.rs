#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

#[cfg(feature = "device-selected")]
pub use stm32f0;

#[cfg(any(feature = "stm32f042", feature = "stm32f072"))]
pub use stm32f0::stm32f0x2 as pac;

#[cfg(any(feature = "stm32f030", feature = "stm32f070"))]
pub use stm32f0::stm32f0x0 as pac;

pub mod blink;
pub mod config;
pub mod delay;
pub mod prelude;
pub mod time;
pub mod watchdog;

#[cfg(feature = "device-selected")]
pub mod board;
#[cfg(feature = "device-selected")]
pub mod gpio;
#[cfg(feature = "device-selected")]
pub mod rcc;

pub use crate::blink::{BlinkController, Phase, Timing};
pub use crate::config::ConfigBits;
