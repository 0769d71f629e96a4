//! Low-level driver that directly owns the master and select pins and tracks state.

use core::fmt;

use embedded_hal::digital::{Error as HalError, ErrorKind, OutputPin, PinState};

use crate::Direction;

/// Widest select bus a `u8` channel index can address.
pub const MAX_SELECT_LINES: usize = 8;

/// Possible errors from the multiplexer driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MuxError {
    /// The channels are output-only; input configuration can never succeed.
    Unsupported,
    /// Channel index outside `0..channel_count`.
    InvalidChannel,
    /// Select-line width or channel count cannot describe a device.
    InvalidConfig,
    /// Underlying pin error from the HAL pin.
    PinError,
}

impl HalError for MuxError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

impl fmt::Display for MuxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MuxError::Unsupported => f.write_str("channel is output-only"),
            MuxError::InvalidChannel => f.write_str("channel index out of range"),
            MuxError::InvalidConfig => f.write_str("invalid select-line or channel-count configuration"),
            MuxError::PinError => f.write_str("pin error"),
        }
    }
}

/// The low-level driver that manages the master enable pin and `N` select pins.
///
/// Select pins are ordered least-significant bit first. Only one channel is ever
/// electrically live: the one encoded on the select pins while the master is high.
pub struct MuxDriver<M, S, const N: usize>
where
    M: OutputPin,
    S: OutputPin,
{
    pub(crate) master: M,
    pub(crate) selects: [S; N],
    pub(crate) channel_count: u16,
    /// Channel currently latched on the select pins.
    pub(crate) encoded: Option<u8>,
    /// Level of the master pin.
    pub(crate) enabled: bool,
}

impl<M, S, const N: usize> MuxDriver<M, S, N>
where
    M: OutputPin,
    S: OutputPin,
{
    /// Create a new driver addressing `channel_count` channels and drive the master low.
    ///
    /// Fails with [`MuxError::InvalidConfig`] without touching any pin when `N` exceeds
    /// [`MAX_SELECT_LINES`] or `channel_count` is not in `1..=2^N`.
    pub fn new(mut master: M, selects: [S; N], channel_count: u16) -> Result<Self, MuxError> {
        if N > MAX_SELECT_LINES || channel_count == 0 || channel_count > (1u16 << N) {
            debug!("mux: rejected config, {} select lines for {} channels", N, channel_count);
            return Err(MuxError::InvalidConfig);
        }

        // On reset: master low => no channel live
        master.set_low().map_err(|_| MuxError::PinError)?;
        debug!("mux: {} channels over {} select lines", channel_count, N);

        Ok(Self {
            master,
            selects,
            channel_count,
            encoded: None,
            enabled: false,
        })
    }

    /// Create a driver that addresses every channel the select pins can encode.
    pub fn full_range(master: M, selects: [S; N]) -> Result<Self, MuxError> {
        if N > MAX_SELECT_LINES {
            return Err(MuxError::InvalidConfig);
        }
        Self::new(master, selects, 1u16 << N)
    }

    pub fn channel_count(&self) -> u16 {
        self.channel_count
    }

    /// Channel that is currently electrically live, if any.
    pub fn active(&self) -> Option<u8> {
        self.encoded.filter(|_| self.enabled)
    }

    /// Channel currently latched on the select pins, live or not.
    pub fn encoded(&self) -> Option<u8> {
        self.encoded
    }

    /// Every valid channel is an output.
    pub fn direction(&self, channel: u8) -> Result<Direction, MuxError> {
        self.check_channel(channel)?;
        Ok(Direction::Output)
    }

    /// There is no sensing path. Always fails, retrying cannot help.
    pub fn set_direction_input(&self, channel: u8) -> Result<(), MuxError> {
        self.check_channel(channel)?;
        debug!("mux: input requested on output-only channel {}", channel);
        Err(MuxError::Unsupported)
    }

    /// Nothing to configure: [`set`](Self::set) drives every line itself.
    pub fn set_direction_output(&self, channel: u8, _value: bool) -> Result<(), MuxError> {
        self.check_channel(channel)
    }

    /// `true` iff `channel` is the one currently live.
    pub fn get(&self, channel: u8) -> bool {
        self.active() == Some(channel)
    }

    /// Activate `channel` (`value == true`) or deactivate whatever is live (`value == false`).
    ///
    /// The master goes low before the select pins change and only goes high again
    /// once the new encoding is fully driven. Re-activating the channel that is
    /// already latched only pulses the master. Out-of-range channels are rejected
    /// before any pin is touched.
    pub fn set(&mut self, channel: u8, value: bool) -> Result<(), MuxError> {
        if let Err(e) = self.check_channel(channel) {
            debug!("mux: rejected channel {} of {}", channel, self.channel_count);
            return Err(e);
        }

        self.master.set_low().map_err(|_| MuxError::PinError)?;
        self.enabled = false;

        if !value {
            trace!("mux: deactivated");
            return Ok(());
        }

        if self.encoded != Some(channel) {
            // Unknown encoding until every select pin has been driven.
            self.encoded = None;
            self.set_select_bits(channel)?;
            self.encoded = Some(channel);
            trace!("mux: selected channel {}", channel);
        }

        self.master.set_high().map_err(|_| MuxError::PinError)?;
        self.enabled = true;
        Ok(())
    }

    /// Give back the master and select pins.
    pub fn release(self) -> (M, [S; N]) {
        (self.master, self.selects)
    }

    fn check_channel(&self, channel: u8) -> Result<(), MuxError> {
        if u16::from(channel) < self.channel_count {
            Ok(())
        } else {
            Err(MuxError::InvalidChannel)
        }
    }

    fn set_select_bits(&mut self, channel: u8) -> Result<(), MuxError> {
        for (bit, pin) in self.selects.iter_mut().enumerate() {
            let level = (channel >> bit) & 1 != 0;
            pin.set_state(PinState::from(level))
                .map_err(|_| MuxError::PinError)?;
        }
        Ok(())
    }
}
