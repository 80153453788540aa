//! # Driver for the BH1750FVI Ambient Light Sensor
//!
//! The sensor is driven purely by single byte commands: power, reset, measurement time register
//! (MTreg) and measurement mode.  A measurement is a bare two byte read, most significant byte
//! first.  Calibration to lux depends on MTreg and on the mode, so the driver keeps both and
//! recomputes the sensitivity coefficient and conversion time whenever either changes.
//!
//! ## External Links
//!
//! - [Datasheet]
//!
//! [Datasheet]: https://www.mouser.com/datasheet/2/348/bh1750fvi-e-186247.pdf

pub mod measurement;
pub mod mode;
pub mod timing;

use crate::{BusTransport, Driver, Error};
use embedded_hal::i2c::ErrorKind;
use measurement::Illuminance;
use mode::{MeasurementMode, SensorAddress};
use timing::{Accuracy, Timing, TimingProfile, MTREG_MAX, MTREG_MIN, MTREG_TYP};

const CMD_POWER_DOWN: u8 = 0x00;
const CMD_POWER_ON: u8 = 0x01;
const CMD_RESET: u8 = 0x07;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Raw address request, sanitized by [`SensorAddress::sanitize`].
    pub address: u8,
    pub mode: MeasurementMode,
    pub timing: Timing,
}

impl Config {
    #[must_use]
    pub fn new(address: SensorAddress, mode: MeasurementMode) -> Self {
        Self {
            address: address.into(),
            mode,
            timing: Timing::Typical,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(SensorAddress::Default, MeasurementMode::ContinuousHigh)
    }
}

pub struct Bh1750<T> {
    transport: T,
    mode: MeasurementMode,
    mtreg: u8,
    timing: Timing,
    coefficient: f32,
    profile: TimingProfile,
    raw: u16,
    light: Illuminance,
    last_result: Result<(), Error<ErrorKind>>,
}

impl<T: BusTransport> Driver<T> for Bh1750<T> {
    type Config = Config;

    fn new_inner(transport: T) -> Self {
        Self {
            transport,
            mode: MeasurementMode::default(),
            mtreg: MTREG_TYP,
            timing: Timing::default(),
            coefficient: 1.0,
            profile: TimingProfile::default(),
            raw: 0,
            light: Illuminance::default(),
            last_result: Ok(()),
        }
    }

    fn init_inner(mut self, config: Config) -> Result<Self, Error<T::Error>> {
        self.timing = config.timing;
        self.set_address(config.address)?;
        self.power_on()?;
        self.set_mode(config.mode)?;
        Ok(self)
    }
}

impl<T: BusTransport> Bh1750<T> {
    /// Gives back the transport.
    pub fn release(self) -> T {
        self.transport
    }

    /// Selects the sensor to talk to.  `requested` may be either address or the ADDR pin level
    /// (`0`/`1`); anything else falls back to the default address `0x23`.
    ///
    /// # Errors
    ///
    /// [`Error::AddressError`]: the transport rejected the address.
    pub fn set_address(&mut self, requested: u8) -> Result<(), Error<T::Error>> {
        #[cfg(feature = "defmt")]
        if !SensorAddress::is_recognized(requested) {
            defmt::warn!("bh1750: unknown address {=u8:#x}, using default", requested);
        }
        let address = SensorAddress::sanitize(requested);
        let result = self
            .transport
            .set_address(address.into())
            .map_err(|_| Error::AddressError);
        self.record(result)
    }

    /// Records `mode`, resets MTreg to 69 for the low resolution modes (otherwise re-applies the
    /// current MTreg) and sends the mode to the sensor.
    ///
    /// The mode is recorded, and the coefficient and conversion time recomputed, before anything
    /// is sent; after a bus failure the driver may not match the sensor.
    ///
    /// # Errors
    ///
    /// [`Error::TransportError`]: the bus failed part way through.
    pub fn set_mode(&mut self, mode: MeasurementMode) -> Result<(), Error<T::Error>> {
        let result = self.set_mode_inner(mode);
        self.record(result)
    }

    /// As [`Bh1750::set_mode`], sanitizing unknown opcodes to
    /// [`MeasurementMode::ContinuousHigh`].
    ///
    /// # Errors
    ///
    /// [`Error::TransportError`]: the bus failed part way through.
    pub fn set_mode_raw(&mut self, requested: u8) -> Result<(), Error<T::Error>> {
        #[cfg(feature = "defmt")]
        if MeasurementMode::try_from(requested).is_err() {
            defmt::warn!("bh1750: unknown mode {=u8:#x}, using continuous high", requested);
        }
        self.set_mode(MeasurementMode::sanitize(requested))
    }

    /// As [`Bh1750::set_mode`], rejecting unknown opcodes.
    ///
    /// # Errors
    ///
    /// [`Error::ModeError`]: `requested` is not a measurement mode; nothing was changed.
    /// [`Error::TransportError`]: the bus failed part way through.
    pub fn set_mode_checked(&mut self, requested: u8) -> Result<(), Error<T::Error>> {
        match MeasurementMode::try_from(requested) {
            Ok(mode) => self.set_mode(mode),
            Err(_) => self.record(Err(Error::ModeError)),
        }
    }

    fn set_mode_inner(&mut self, mode: MeasurementMode) -> Result<(), Error<T::Error>> {
        #[cfg(feature = "defmt")]
        defmt::debug!("bh1750: mode {}", mode);
        self.mode = mode;
        if mode.is_low() {
            self.apply_resolution(MTREG_TYP)
        } else {
            self.apply_resolution(self.mtreg)
        }
    }

    /// Sets MTreg, the measurement time register.  Ignored in the low resolution modes, where it
    /// is always 69.  `0` stands for 69, other values are clamped to `31..=254`.  The register is
    /// only written when its value changes; the mode is re-sent either way.
    ///
    /// # Errors
    ///
    /// [`Error::TransportError`]: the bus failed part way through.  MTreg, coefficient and
    /// conversion time may already be updated in memory.
    pub fn set_resolution(&mut self, mtreg: u8) -> Result<(), Error<T::Error>> {
        let result = self.apply_resolution(mtreg);
        self.record(result)
    }

    /// Shortest conversion, least sensitive.
    ///
    /// # Errors
    ///
    /// See [`Bh1750::set_resolution`].
    pub fn set_resolution_min(&mut self) -> Result<(), Error<T::Error>> {
        self.set_resolution(MTREG_MIN)
    }

    /// # Errors
    ///
    /// See [`Bh1750::set_resolution`].
    pub fn set_resolution_typical(&mut self) -> Result<(), Error<T::Error>> {
        self.set_resolution(MTREG_TYP)
    }

    /// Longest conversion, most sensitive.
    ///
    /// # Errors
    ///
    /// See [`Bh1750::set_resolution`].
    pub fn set_resolution_max(&mut self) -> Result<(), Error<T::Error>> {
        self.set_resolution(MTREG_MAX)
    }

    /// Wait for the typical conversion time.  Takes effect with the next mode or resolution
    /// change.
    pub fn set_timing_typical(&mut self) {
        self.timing = Timing::Typical;
    }

    /// Wait for the maximal conversion time.  Takes effect with the next mode or resolution
    /// change.
    pub fn set_timing_max(&mut self) {
        self.timing = Timing::Max;
    }

    /// Puts the sensor in the state waiting for a measurement command.
    ///
    /// # Errors
    ///
    /// [`Error::TransportError`]
    pub fn power_on(&mut self) -> Result<(), Error<T::Error>> {
        let result = self.transport.send(CMD_POWER_ON).map_err(Error::TransportError);
        self.record(result)
    }

    /// Puts the sensor to sleep.
    ///
    /// # Errors
    ///
    /// [`Error::TransportError`]
    pub fn power_down(&mut self) -> Result<(), Error<T::Error>> {
        let result = self.transport.send(CMD_POWER_DOWN).map_err(Error::TransportError);
        self.record(result)
    }

    /// Clears the data register.  Reset is only accepted while powered on, so power on and
    /// reset go out together under repeated-start, followed by the current mode.
    ///
    /// # Errors
    ///
    /// [`Error::TransportError`]: the bus failed part way through.
    pub fn reset(&mut self) -> Result<(), Error<T::Error>> {
        let result = self.reset_inner();
        self.record(result)
    }

    fn reset_inner(&mut self) -> Result<(), Error<T::Error>> {
        self.repeated_start(|transport| {
            transport.send(CMD_POWER_ON)?;
            transport.send(CMD_RESET)
        })?;
        self.set_mode_inner(self.mode)
    }

    fn record<R>(&mut self, result: Result<R, Error<T::Error>>) -> Result<R, Error<T::Error>> {
        self.last_result = match result {
            Ok(_) => Ok(()),
            Err(ref error) => Err(error.kind()),
        };
        #[cfg(feature = "defmt")]
        if let Err(error) = self.last_result {
            defmt::warn!("bh1750: {}", error);
        }
        result
    }

    /// Outcome of the most recent operation.
    pub fn last_result(&self) -> Result<(), Error<ErrorKind>> {
        self.last_result
    }

    pub fn is_success(&self) -> bool {
        self.last_result.is_ok()
    }

    pub fn is_error(&self) -> bool {
        self.last_result.is_err()
    }

    pub fn address(&self) -> u8 {
        self.transport.address()
    }

    pub fn mode(&self) -> MeasurementMode {
        self.mode
    }

    pub fn mtreg(&self) -> u8 {
        self.mtreg
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    pub fn sense_coefficient(&self) -> f32 {
        self.coefficient
    }

    pub fn timing_profile(&self) -> TimingProfile {
        self.profile
    }

    /// Milliseconds waited before a read, according to [`Bh1750::timing`].
    pub fn measurement_time(&self) -> u16 {
        self.profile.active
    }

    pub fn measurement_time_typical(&self) -> u16 {
        self.profile.typical
    }

    pub fn measurement_time_max(&self) -> u16 {
        self.profile.max
    }

    /// Raw count of the most recent successful measurement.
    pub fn light_result(&self) -> u16 {
        self.raw
    }

    pub fn illuminance(&self) -> Illuminance {
        self.light
    }

    pub fn light_min(&self) -> f32 {
        self.light.minimal
    }

    pub fn light_typical(&self) -> f32 {
        self.light.typical
    }

    pub fn light_max(&self) -> f32 {
        self.light.maximal
    }

    /// Lux per count in the current configuration.
    pub fn sensitivity(&self, accuracy: Accuracy) -> f32 {
        accuracy.sensitivity(self.coefficient)
    }

    /// Counts per lux in the current configuration.
    pub fn resolution(&self, accuracy: Accuracy) -> f32 {
        accuracy.resolution(self.coefficient)
    }
}
