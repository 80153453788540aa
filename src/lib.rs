#![no_std]
#![doc = include_str!("../README.md")]

use embedded_hal::i2c::ErrorKind;

/// Failure kinds surfaced by the driver.  Bus failures are forwarded from the [`BusTransport`]
/// untouched; the other kinds originate in the driver itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// No acknowledgement, arbitration loss, timeout or any other bus level failure.
    TransportError(E),
    /// The transport refused the sensor address.
    AddressError,
    /// A measurement mode opcode was rejected instead of being sanitized.
    ModeError,
}

impl<E> From<E> for Error<E> {
    fn from(error: E) -> Self {
        Self::TransportError(error)
    }
}

impl<E: embedded_hal::i2c::Error> Error<E> {
    /// Reduces a bus specific error to its [`ErrorKind`] so that it can be stored and copied
    /// independently of the transport.
    pub fn kind(&self) -> Error<ErrorKind> {
        match *self {
            Self::TransportError(ref error) => Error::TransportError(error.kind()),
            Self::AddressError => Error::AddressError,
            Self::ModeError => Error::ModeError,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutOfRange;

pub trait Driver<T: BusTransport>: Sized {
    type Config: Default;

    fn new_inner(transport: T) -> Self;

    /// The entry point for a [`Driver`].  Expects a [`BusTransport`] (usually an
    /// [`I2cTransport`] wrapping [`embedded_hal::i2c::I2c`] and [`embedded_hal::delay::DelayNs`]
    /// from the target platform HAL).  This provides a handle that does not initialize the
    /// hardware.  Initialization is deferred to [`Driver::init`].
    fn new(transport: T) -> Self {
        Self::new_inner(transport)
    }

    fn init_inner(self, _config: Self::Config) -> Result<Self, Error<T::Error>> {
        Ok(self)
    }

    /// Initializes the hardware according to `config`.  This initialization is required prior to
    /// measuring.
    ///
    /// # Errors
    ///
    /// [`Error`]: the first failure encountered; already applied steps are not rolled back.
    fn init(self, config: Self::Config) -> Result<Self, Error<T::Error>> {
        self.init_inner(config)
    }
}

pub mod bh1750;
pub mod transport;

pub use bh1750::{Bh1750, Config};
pub use transport::{BusTransport, I2cTransport};

#[cfg(all(test, not(all(target_arch = "arm", target_os = "none"))))]
pub(crate) mod test_support;
