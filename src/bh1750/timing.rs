//! Sensitivity and conversion time arithmetic.
//!
//! Everything here is derived from two inputs: the measurement time register (MTreg) and the
//! measurement mode.  The sensitivity coefficient is `MTreg / 69`, doubled in the `High2` modes,
//! and scales both the conversion time and the lux conversion.

use super::mode::MeasurementMode;
use super::Bh1750;
use crate::{BusTransport, Error};

pub const MTREG_MIN: u8 = 31;
pub const MTREG_TYP: u8 = 69;
pub const MTREG_MAX: u8 = 254;

const CMD_MTREG_HIGH: u8 = 0x40;
const CMD_MTREG_LOW: u8 = 0x60;

const SAFETY_PERCENT: u16 = 5;

/// Which conversion time bound the driver waits for before reading.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Timing {
    #[default]
    Typical,
    Max,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResolutionClass {
    Low,
    High,
}

impl ResolutionClass {
    #[must_use]
    pub const fn of(mode: MeasurementMode) -> Self {
        if mode.is_low() {
            Self::Low
        } else {
            Self::High
        }
    }

    /// Typical conversion time in milliseconds at MTreg 69.
    #[must_use]
    pub const fn base_typical(self) -> u16 {
        match self {
            Self::Low => 16,
            Self::High => 120,
        }
    }

    /// Maximal conversion time in milliseconds at MTreg 69.
    #[must_use]
    pub const fn base_max(self) -> u16 {
        match self {
            Self::Low => 24,
            Self::High => 180,
        }
    }
}

/// Calibration spread of the sensor, in counts per lux multiplied by 100.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Accuracy {
    Min,
    Typical,
    Max,
}

impl Accuracy {
    #[must_use]
    pub const fn counts_per_lux_x100(self) -> u8 {
        match self {
            Self::Min => 96,
            Self::Typical => 120,
            Self::Max => 144,
        }
    }

    /// Counts per lux.
    #[must_use]
    pub fn counts_per_lux(self) -> f32 {
        f32::from(self.counts_per_lux_x100()) / 100.0
    }

    /// Lux per count at the given sensitivity coefficient.
    ///
    /// Keyed by the calibration bound used for the lux conversion, so [`Accuracy::Min`] gives the
    /// largest lux per count and [`Accuracy::Max`] the smallest.  Drivers that name sensitivity
    /// bounds by their own size have the two swapped.
    #[must_use]
    pub fn sensitivity(self, coefficient: f32) -> f32 {
        100.0 / (coefficient * f32::from(self.counts_per_lux_x100()))
    }

    /// Counts per lux at the given sensitivity coefficient, the reciprocal of
    /// [`Accuracy::sensitivity`].  [`Accuracy::Min`] gives the smallest value.
    #[must_use]
    pub fn resolution(self, coefficient: f32) -> f32 {
        1.0 / self.sensitivity(coefficient)
    }
}

#[must_use]
pub fn sense_coefficient(mtreg: u8, mode: MeasurementMode) -> f32 {
    let coefficient = f32::from(mtreg) / f32::from(MTREG_TYP);
    if mode.is_high2() {
        coefficient * 2.0
    } else {
        coefficient
    }
}

/// Low resolution modes only work at MTreg 69.  Otherwise `0` stands for 69 and anything else is
/// clamped to `31..=254`.
#[must_use]
pub fn sanitize_mtreg(requested: u8, mode: MeasurementMode) -> u8 {
    if mode.is_low() || requested == 0 {
        MTREG_TYP
    } else {
        requested.clamp(MTREG_MIN, MTREG_MAX)
    }
}

#[must_use]
pub const fn mtreg_commands(mtreg: u8) -> [u8; 2] {
    [CMD_MTREG_HIGH | (mtreg >> 5), CMD_MTREG_LOW | (mtreg & 0b1_1111)]
}

/// Conversion times in milliseconds for the current configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimingProfile {
    pub typical: u16,
    /// Includes a 5% safety margin.
    pub max: u16,
    /// The bound selected by [`Timing`], never below the class's base typical time.
    pub active: u16,
}

impl TimingProfile {
    #[must_use]
    pub fn compute(coefficient: f32, class: ResolutionClass, timing: Timing) -> Self {
        let typical = milliseconds(coefficient * f32::from(class.base_typical()));
        let max = milliseconds(
            coefficient * f32::from(class.base_max()) * f32::from(100 + SAFETY_PERCENT) / 100.0,
        );
        let selected = match timing {
            Timing::Typical => typical,
            Timing::Max => max,
        };
        Self {
            typical,
            max,
            active: selected.max(class.base_typical()),
        }
    }
}

impl Default for TimingProfile {
    fn default() -> Self {
        Self::compute(1.0, ResolutionClass::High, Timing::Typical)
    }
}

fn milliseconds(value: f32) -> u16 {
    cast::u16(value).unwrap_or(u16::MAX)
}

impl<T: BusTransport> Bh1750<T> {
    /// Sanitizes `requested` for the current mode, writes MTreg if it changed and latches the
    /// configuration by re-sending the mode.  The register bytes and the mode byte go out under
    /// repeated-start.
    ///
    /// Coefficient, timing profile and receive delay follow the recorded mode and MTreg even when
    /// a write then fails.
    pub(super) fn apply_resolution(&mut self, requested: u8) -> Result<(), Error<T::Error>> {
        let mtreg = sanitize_mtreg(requested, self.mode);
        let changed = mtreg != self.mtreg;
        #[cfg(feature = "defmt")]
        if changed {
            defmt::debug!("bh1750: MTreg {} -> {}", self.mtreg, mtreg);
        }
        self.mtreg = mtreg;
        self.recompute_timing();
        if changed {
            let [high, low] = mtreg_commands(mtreg);
            self.repeated_start(|transport| {
                transport.send(high)?;
                transport.send(low)
            })?;
        }
        self.transport.send(self.mode.into())?;
        Ok(())
    }

    pub(super) fn recompute_timing(&mut self) {
        self.coefficient = sense_coefficient(self.mtreg, self.mode);
        self.profile =
            TimingProfile::compute(self.coefficient, ResolutionClass::of(self.mode), self.timing);
        self.transport.set_delay_receive(self.profile.active);
    }

    /// Runs `f` with the stop condition suppressed, then restores the caller's preference whether
    /// or not `f` succeeded.
    pub(super) fn repeated_start<F>(&mut self, f: F) -> Result<(), T::Error>
    where
        F: FnOnce(&mut T) -> Result<(), T::Error>,
    {
        let bus_stop = self.transport.bus_stop();
        self.transport.set_bus_stop(false);
        let result = f(&mut self.transport);
        self.transport.set_bus_stop(bus_stop);
        result
    }
}
