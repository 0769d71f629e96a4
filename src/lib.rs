#![cfg_attr(not(any(test, feature = "std")), no_std)]

// Must come first so the macros are visible to every other module.
mod fmt;

pub mod driver;
pub mod mutex;
pub mod mux;

#[cfg(test)]
mod testing;

pub use driver::{MAX_SELECT_LINES, MuxDriver, MuxError};
pub use mutex::PortMutex;
pub use mux::{ChannelPin, GpioMux};

use embedded_hal::digital::Error as HalError;

/// Direction a channel is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Never reported by this crate; kept so the type mirrors HAL direction enums.
    Input,
    Output,
}

/// A device exposing a set of numbered output channels, only one of which
/// is driven at a time.
///
/// This is what a registration layer holds on to; every method takes `&self`
/// and does its own locking.
pub trait ChannelController {
    type Error: HalError;

    /// Number of addressable channels, `0..channel_count()`.
    fn channel_count(&self) -> u16;

    fn direction(&self, channel: u8) -> Result<Direction, Self::Error>;

    fn set_direction_input(&self, channel: u8) -> Result<(), Self::Error>;

    fn set_direction_output(&self, channel: u8, value: bool) -> Result<(), Self::Error>;

    /// `true` iff `channel` is currently driven.
    fn get(&self, channel: u8) -> bool;

    /// Drive `channel` (`true`) or release whichever channel is driven (`false`).
    fn set(&self, channel: u8, value: bool) -> Result<(), Self::Error>;
}
