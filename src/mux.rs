use core::marker::PhantomData;

use crate::driver::{MuxDriver, MuxError};
use crate::mutex::PortMutex;
use crate::{ChannelController, Direction};
use embedded_hal::digital::{ErrorType, OutputPin, StatefulOutputPin};

/// High-level wrapper: the multiplexer driver behind a PortMutex.
///
/// Every operation runs with the lock held for its whole duration, so a channel
/// switch is atomic with respect to every other caller sharing the device.
pub struct GpioMux<Mx, M, S, const N: usize>
where
    Mx: PortMutex<Port = MuxDriver<M, S, N>>,
    M: OutputPin,
    S: OutputPin,
{
    driver: Mx,
    channel_count: u16,
    _pins: PhantomData<fn() -> (M, S)>,
}

impl<Mx, M, S, const N: usize> GpioMux<Mx, M, S, N>
where
    Mx: PortMutex<Port = MuxDriver<M, S, N>>,
    M: OutputPin,
    S: OutputPin,
{
    /// Name the device registers under.
    pub const LABEL: &'static str = "GPIO multiplexer";

    /// Create a new multiplexer, wrapping the driver in a PortMutex (e.g. RefCell).
    pub fn new(master: M, selects: [S; N], channel_count: u16) -> Result<Self, MuxError> {
        Ok(Self::from_driver(MuxDriver::new(master, selects, channel_count)?))
    }

    /// Create a multiplexer addressing all `2^N` channels.
    pub fn full_range(master: M, selects: [S; N]) -> Result<Self, MuxError> {
        Ok(Self::from_driver(MuxDriver::full_range(master, selects)?))
    }

    pub fn from_driver(driver: MuxDriver<M, S, N>) -> Self {
        Self {
            channel_count: driver.channel_count(),
            driver: Mx::create(driver),
            _pins: PhantomData,
        }
    }

    /// Channel that is currently driven, if any.
    pub fn active(&self) -> Option<u8> {
        self.driver.lock(|drv| drv.active())
    }

    /// Channel latched on the select lines, live or not.
    pub fn encoded(&self) -> Option<u8> {
        self.driver.lock(|drv| drv.encoded())
    }

    /// Output proxy for one channel.
    pub fn channel(&self, channel: u8) -> Result<ChannelPin<'_, Self>, MuxError> {
        if u16::from(channel) < self.channel_count {
            Ok(ChannelPin::new(self, channel))
        } else {
            Err(MuxError::InvalidChannel)
        }
    }

    /// Output proxies for every channel, in index order.
    pub fn channels(&self) -> impl Iterator<Item = ChannelPin<'_, Self>> + '_ {
        (0..self.channel_count).map(move |ch| ChannelPin::new(self, ch as u8))
    }

    /// Consume the multiplexer and give back its pins.
    pub fn release(self) -> (M, [S; N]) {
        self.driver.into_inner().release()
    }
}

impl<Mx, M, S, const N: usize> ChannelController for GpioMux<Mx, M, S, N>
where
    Mx: PortMutex<Port = MuxDriver<M, S, N>>,
    M: OutputPin,
    S: OutputPin,
{
    type Error = MuxError;

    fn channel_count(&self) -> u16 {
        self.channel_count
    }

    fn direction(&self, channel: u8) -> Result<Direction, MuxError> {
        self.driver.lock(|drv| drv.direction(channel))
    }

    fn set_direction_input(&self, channel: u8) -> Result<(), MuxError> {
        self.driver.lock(|drv| drv.set_direction_input(channel))
    }

    fn set_direction_output(&self, channel: u8, value: bool) -> Result<(), MuxError> {
        self.driver
            .lock(|drv| drv.set_direction_output(channel, value))
    }

    fn get(&self, channel: u8) -> bool {
        self.driver.lock(|drv| drv.get(channel))
    }

    fn set(&self, channel: u8, value: bool) -> Result<(), MuxError> {
        self.driver.lock(|drv| drv.set(channel, value))
    }
}

/// A proxy implementing `embedded_hal::digital::OutputPin` for one channel.
///
/// `set_high` makes this channel the driven one; `set_low` releases whichever
/// channel is driven.
pub struct ChannelPin<'a, C>
where
    C: ChannelController + ?Sized,
{
    controller: &'a C,
    channel: u8,
}

impl<'a, C> ChannelPin<'a, C>
where
    C: ChannelController + ?Sized,
{
    pub(crate) fn new(controller: &'a C, channel: u8) -> Self {
        Self {
            controller,
            channel,
        }
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }
}

impl<C> ErrorType for ChannelPin<'_, C>
where
    C: ChannelController + ?Sized,
{
    type Error = C::Error;
}

impl<C> OutputPin for ChannelPin<'_, C>
where
    C: ChannelController + ?Sized,
{
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.controller.set(self.channel, false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.controller.set(self.channel, true)
    }
}

impl<C> StatefulOutputPin for ChannelPin<'_, C>
where
    C: ChannelController + ?Sized,
{
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.controller.get(self.channel))
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.controller.get(self.channel))
    }
}
