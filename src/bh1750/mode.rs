use num_enum::{IntoPrimitive, TryFromPrimitive};

const PIN_LOW: u8 = 0;
const PIN_HIGH: u8 = 1;

/// The two 7-bit addresses selectable through the sensor's ADDR pin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, IntoPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SensorAddress {
    /// ADDR at or below 0.3 Vcc, tied to ground or left floating.
    #[default]
    Default = 0x23,
    /// ADDR at or above 0.7 Vcc.
    Alternate = 0x5C,
}

impl SensorAddress {
    pub const FLOATING: Self = Self::Default;

    /// Accepts either address or the ADDR pin level (`0` low, `1` high).  Anything else falls back
    /// to [`SensorAddress::Default`].
    #[must_use]
    pub const fn sanitize(requested: u8) -> Self {
        match requested {
            0x5C | PIN_HIGH => Self::Alternate,
            _ => Self::Default,
        }
    }

    /// Whether `requested` names an address or pin level rather than falling back.
    #[must_use]
    pub const fn is_recognized(requested: u8) -> bool {
        matches!(requested, 0x23 | 0x5C | PIN_LOW | PIN_HIGH)
    }
}

impl From<u8> for SensorAddress {
    fn from(requested: u8) -> Self {
        Self::sanitize(requested)
    }
}

/// Measurement modes, each represented by the opcode that selects it.
///
/// | mode | resolution | typical conversion |
/// |------|------------|--------------------|
/// | `*High` | 1 lx | 120 ms |
/// | `*High2` | 0.5 lx | 120 ms |
/// | `*Low` | 4 lx | 16 ms |
///
/// `Onetime*` modes power down after a single conversion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum MeasurementMode {
    #[default]
    ContinuousHigh = 0x10,
    ContinuousHigh2 = 0x11,
    ContinuousLow = 0x13,
    OnetimeHigh = 0x20,
    OnetimeHigh2 = 0x21,
    OnetimeLow = 0x23,
}

impl MeasurementMode {
    /// Unknown opcodes become [`MeasurementMode::ContinuousHigh`].
    #[must_use]
    pub fn sanitize(requested: u8) -> Self {
        Self::try_from(requested).unwrap_or_default()
    }

    #[must_use]
    pub const fn is_low(self) -> bool {
        matches!(self, Self::ContinuousLow | Self::OnetimeLow)
    }

    #[must_use]
    pub const fn is_high2(self) -> bool {
        matches!(self, Self::ContinuousHigh2 | Self::OnetimeHigh2)
    }

    #[must_use]
    pub const fn is_onetime(self) -> bool {
        matches!(
            self,
            Self::OnetimeHigh | Self::OnetimeHigh2 | Self::OnetimeLow
        )
    }
}
