use super::timing::Accuracy;
use super::Bh1750;
use crate::{BusTransport, Error};

/// Illuminance in lux bracketed by the sensor's calibration spread.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Illuminance {
    /// At 0.96 counts per lux.
    pub minimal: f32,
    /// At 1.20 counts per lux.
    pub typical: f32,
    /// At 1.44 counts per lux.
    pub maximal: f32,
}

impl Illuminance {
    #[must_use]
    pub fn from_raw(raw: u16, coefficient: f32) -> Self {
        Self {
            minimal: lux(raw, coefficient, Accuracy::Min),
            typical: lux(raw, coefficient, Accuracy::Typical),
            maximal: lux(raw, coefficient, Accuracy::Max),
        }
    }

    #[must_use]
    pub const fn at(&self, accuracy: Accuracy) -> f32 {
        match accuracy {
            Accuracy::Min => self.minimal,
            Accuracy::Typical => self.typical,
            Accuracy::Max => self.maximal,
        }
    }
}

fn lux(raw: u16, coefficient: f32, accuracy: Accuracy) -> f32 {
    f32::from(raw) * 100.0 / (coefficient * f32::from(accuracy.counts_per_lux_x100()))
}

impl<T: BusTransport> Bh1750<T> {
    /// Measures ambient light.  One-time modes are re-armed first, since the sensor powers down
    /// after every conversion.  The read waits out the conversion time programmed for the current
    /// configuration.
    ///
    /// A failed measurement keeps the previous raw count and illuminance.
    ///
    /// # Errors
    ///
    /// [`Error::TransportError`]: the bus failed while re-arming or reading.
    pub fn measure_light(&mut self) -> Result<Illuminance, Error<T::Error>> {
        let result = self.measure_light_inner();
        self.record(result)
    }

    fn measure_light_inner(&mut self) -> Result<Illuminance, Error<T::Error>> {
        if self.mode.is_onetime() {
            self.transport.send(self.mode.into())?;
        }
        let mut data: [u8; 2] = [0; 2];
        self.transport.receive(&mut data)?;
        self.raw = u16::from_be_bytes(data);
        self.light = Illuminance::from_raw(self.raw, self.coefficient);
        Ok(self.light)
    }

    /// Typical illuminance, or `0.0` when the measurement failed.  Use
    /// [`Bh1750::measure_light`] to tell a failure apart from darkness.
    pub fn measure_light_typical(&mut self) -> f32 {
        self.measure_light_at(Accuracy::Typical)
    }

    /// Illuminance at minimal accuracy, or `0.0` when the measurement failed.
    pub fn measure_light_min(&mut self) -> f32 {
        self.measure_light_at(Accuracy::Min)
    }

    /// Illuminance at maximal accuracy, or `0.0` when the measurement failed.
    pub fn measure_light_max(&mut self) -> f32 {
        self.measure_light_at(Accuracy::Max)
    }

    fn measure_light_at(&mut self, accuracy: Accuracy) -> f32 {
        self.measure_light()
            .map_or(0.0, |illuminance| illuminance.at(accuracy))
    }
}

#[cfg(all(test, not(all(target_arch = "arm", target_os = "none"))))]
mod test {
    extern crate std;
    use std::vec;
    extern crate embedded_hal;
    extern crate embedded_hal_mock;

    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    use crate::bh1750::measurement::Illuminance;
    use crate::bh1750::mode::MeasurementMode;
    use crate::bh1750::Bh1750;
    use crate::test_support::RecordingDelay;
    use crate::{Driver, Error, I2cTransport};

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    pub fn zero_count() {
        for coefficient in [31.0 / 69.0, 1.0, 2.0, 254.0 / 69.0, 508.0 / 69.0] {
            assert_eq!(Illuminance::from_raw(0, coefficient), Illuminance::default());
        }
    }

    #[test]
    pub fn calibration_bounds() {
        let illuminance = Illuminance::from_raw(1200, 1.0);
        assert_eq!(illuminance.typical, 1000.0);
        assert_eq!(illuminance.minimal, 1250.0);
        assert!(close(illuminance.maximal, 833.33));
    }

    #[test]
    pub fn continuous_read() {
        let expectations = [
            I2cTransaction::write(0x23, vec![0x10]),
            I2cTransaction::read(0x23, vec![0x04, 0xB0]),
        ];
        let i2c = I2cMock::new(&expectations);
        let mut i2c_clone = i2c.clone();
        let delay = RecordingDelay::default();

        let mut bh1750 = Bh1750::new(I2cTransport::new(i2c, delay.clone()));
        bh1750.set_mode(MeasurementMode::ContinuousHigh).unwrap();
        let illuminance = bh1750.measure_light().unwrap();
        assert_eq!(bh1750.light_result(), 1200);
        assert_eq!(illuminance.typical, 1000.0);
        assert_eq!(bh1750.light_min(), 1250.0);
        assert!(close(bh1750.light_max(), 833.33));
        assert_eq!(delay.calls(), vec![120]);

        i2c_clone.done();
    }

    #[test]
    pub fn continuous_low_ignores_previous_resolution() {
        let expectations = [
            I2cTransaction::write(0x23, vec![0x47, 0x7E, 0x10]),
            I2cTransaction::write(0x23, vec![0x42, 0x65, 0x13]),
            I2cTransaction::read(0x23, vec![0x01, 0x00]),
        ];
        let i2c = I2cMock::new(&expectations);
        let mut i2c_clone = i2c.clone();
        let delay = RecordingDelay::default();

        let mut bh1750 = Bh1750::new(I2cTransport::new(i2c, delay.clone()));
        bh1750.set_resolution_max().unwrap();
        bh1750.set_mode(MeasurementMode::ContinuousLow).unwrap();
        assert_eq!(bh1750.mtreg(), 69);
        assert!(close(bh1750.measure_light_typical(), 213.33));
        assert_eq!(delay.calls(), vec![16]);

        i2c_clone.done();
    }

    #[test]
    pub fn onetime_rearms_every_measurement() {
        let expectations = [
            I2cTransaction::write(0x23, vec![0x20]),
            I2cTransaction::write(0x23, vec![0x20]),
            I2cTransaction::read(0x23, vec![0x00, 0x78]),
            I2cTransaction::write(0x23, vec![0x20]),
            I2cTransaction::read(0x23, vec![0x00, 0xF0]),
        ];
        let i2c = I2cMock::new(&expectations);
        let mut i2c_clone = i2c.clone();
        let delay = RecordingDelay::default();

        let mut bh1750 = Bh1750::new(I2cTransport::new(i2c, delay.clone()));
        bh1750.set_mode(MeasurementMode::OnetimeHigh).unwrap();
        assert_eq!(bh1750.measure_light_typical(), 100.0);
        assert_eq!(bh1750.measure_light_typical(), 200.0);
        assert_eq!(delay.calls(), vec![120, 120]);

        i2c_clone.done();
    }

    #[test]
    pub fn high2_halves_illuminance() {
        let expectations = [
            I2cTransaction::write(0x23, vec![0x11]),
            I2cTransaction::read(0x23, vec![0x04, 0xB0]),
        ];
        let i2c = I2cMock::new(&expectations);
        let mut i2c_clone = i2c.clone();
        let delay = RecordingDelay::default();

        let mut bh1750 = Bh1750::new(I2cTransport::new(i2c, delay.clone()));
        bh1750.set_mode(MeasurementMode::ContinuousHigh2).unwrap();
        assert_eq!(bh1750.measure_light_typical(), 500.0);
        assert_eq!(delay.calls(), vec![240]);

        i2c_clone.done();
    }

    #[test]
    pub fn failed_mode_change_still_converts_with_new_mode() {
        let expectations = [
            I2cTransaction::write(0x23, vec![0x21]).with_error(ErrorKind::Other),
            I2cTransaction::write(0x23, vec![0x21]),
            I2cTransaction::read(0x23, vec![0x04, 0xB0]),
        ];
        let i2c = I2cMock::new(&expectations);
        let mut i2c_clone = i2c.clone();
        let delay = RecordingDelay::default();

        let mut bh1750 = Bh1750::new(I2cTransport::new(i2c, delay.clone()));
        assert_eq!(
            bh1750.set_mode(MeasurementMode::OnetimeHigh2),
            Err(Error::TransportError(ErrorKind::Other))
        );
        assert_eq!(bh1750.measure_light_typical(), 500.0);
        assert_eq!(delay.calls(), vec![240]);

        i2c_clone.done();
    }

    #[test]
    pub fn failure_keeps_previous_reading() {
        let expectations = [
            I2cTransaction::write(0x23, vec![0x10]),
            I2cTransaction::read(0x23, vec![0x04, 0xB0]),
            I2cTransaction::read(0x23, vec![0x00, 0x00]).with_error(ErrorKind::Other),
        ];
        let i2c = I2cMock::new(&expectations);
        let mut i2c_clone = i2c.clone();

        let mut bh1750 = Bh1750::new(I2cTransport::new(i2c, RecordingDelay::default()));
        bh1750.set_mode(MeasurementMode::ContinuousHigh).unwrap();
        assert_eq!(bh1750.measure_light_typical(), 1000.0);
        assert!(bh1750.is_success());

        assert_eq!(bh1750.measure_light_typical(), 0.0);
        assert!(bh1750.is_error());
        assert_eq!(
            bh1750.last_result(),
            Err(Error::TransportError(ErrorKind::Other))
        );
        assert_eq!(bh1750.light_result(), 1200);
        assert_eq!(bh1750.light_typical(), 1000.0);

        i2c_clone.done();
    }

    #[test]
    pub fn onetime_wake_failure() {
        let expectations = [
            I2cTransaction::write(0x23, vec![0x23]),
            I2cTransaction::write(0x23, vec![0x23]).with_error(ErrorKind::Other),
        ];
        let i2c = I2cMock::new(&expectations);
        let mut i2c_clone = i2c.clone();

        let mut bh1750 = Bh1750::new(I2cTransport::new(i2c, RecordingDelay::default()));
        bh1750.set_mode(MeasurementMode::OnetimeLow).unwrap();
        assert_eq!(
            bh1750.measure_light(),
            Err(Error::TransportError(ErrorKind::Other))
        );
        assert_eq!(bh1750.illuminance(), Illuminance::default());

        i2c_clone.done();
    }
}
