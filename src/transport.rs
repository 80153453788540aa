//! # Two-wire bus access
//!
//! The driver talks to the sensor through [`BusTransport`] rather than owning an
//! [`I2c`] directly.  It offers single byte commands, a raw read, the 7-bit target address, a flag
//! for whether a stop condition closes each write and the wait before the next read completes.
//!
//! [`I2cTransport`] implements it on top of any `embedded-hal` bus and delay.

use crate::OutOfRange;
use embedded_hal::{delay::DelayNs, i2c::I2c};

const QUEUE_LEN: usize = 4;
const DEFAULT_ADDRESS: u8 = 0x23;

pub trait BusTransport {
    type Error: embedded_hal::i2c::Error;

    fn address(&self) -> u8;

    /// # Errors
    ///
    /// [`OutOfRange`]: the transport cannot address `address`.
    fn set_address(&mut self, address: u8) -> Result<(), OutOfRange>;

    /// Sends a single command byte.
    ///
    /// # Errors
    ///
    /// Any bus failure.
    fn send(&mut self, byte: u8) -> Result<(), Self::Error>;

    /// Fills `buffer` from the device, first waiting out any pending receive delay.
    ///
    /// # Errors
    ///
    /// Any bus failure.
    fn receive(&mut self, buffer: &mut [u8]) -> Result<(), Self::Error>;

    /// `true` when every write is closed by a stop condition, `false` for repeated-start.
    fn bus_stop(&self) -> bool;

    fn set_bus_stop(&mut self, bus_stop: bool);

    /// Milliseconds the next receive must wait after a command has been sent.
    fn set_delay_receive(&mut self, milliseconds: u16);
}

/// [`BusTransport`] over an [`I2c`] bus and a [`DelayNs`].
///
/// Bytes sent while the stop flag is cleared are held back and go out, together with the first
/// byte sent after the flag is set again, as one write.  No other bus participant can interleave
/// with them.
pub struct I2cTransport<I2C, DELAY> {
    i2c: I2C,
    delay: DELAY,
    address: u8,
    bus_stop: bool,
    delay_receive: u16,
    armed: bool,
    queue: [u8; QUEUE_LEN],
    queued: usize,
}

impl<I2C: I2c, DELAY: DelayNs> I2cTransport<I2C, DELAY> {
    pub fn new(i2c: I2C, delay: DELAY) -> Self {
        Self {
            i2c,
            delay,
            address: DEFAULT_ADDRESS,
            bus_stop: true,
            delay_receive: 0,
            armed: false,
            queue: [0; QUEUE_LEN],
            queued: 0,
        }
    }

    /// Gives back the bus and delay.  Bytes still held back are discarded.
    pub fn release(self) -> (I2C, DELAY) {
        (self.i2c, self.delay)
    }

    fn flush(&mut self) -> Result<(), I2C::Error> {
        let len = core::mem::take(&mut self.queued);
        if len == 0 {
            return Ok(());
        }
        self.i2c.write(self.address, &self.queue[..len])
    }
}

impl<I2C: I2c, DELAY: DelayNs> BusTransport for I2cTransport<I2C, DELAY> {
    type Error = I2C::Error;

    fn address(&self) -> u8 {
        self.address
    }

    fn set_address(&mut self, address: u8) -> Result<(), OutOfRange> {
        if (0x08..=0x77).contains(&address) {
            self.address = address;
            Ok(())
        } else {
            Err(OutOfRange)
        }
    }

    fn send(&mut self, byte: u8) -> Result<(), Self::Error> {
        if self.queued == QUEUE_LEN {
            self.flush()?;
        }
        self.queue[self.queued] = byte;
        self.queued += 1;
        if self.bus_stop {
            self.flush()?;
        }
        self.armed = true;
        Ok(())
    }

    fn receive(&mut self, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.flush()?;
        if core::mem::take(&mut self.armed) {
            self.delay.delay_ms(u32::from(self.delay_receive));
        }
        self.i2c.read(self.address, buffer)
    }

    fn bus_stop(&self) -> bool {
        self.bus_stop
    }

    fn set_bus_stop(&mut self, bus_stop: bool) {
        self.bus_stop = bus_stop;
    }

    fn set_delay_receive(&mut self, milliseconds: u16) {
        self.delay_receive = milliseconds;
    }
}
