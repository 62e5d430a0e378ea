use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Bmp280DeviceAddress {
    // -- SDO tied to GND
    Primary,
    // -- SDO tied to VDDIO
    Secondary,
}

impl Default for Bmp280DeviceAddress {
    fn default() -> Self {
        Self::Primary
    }
}

impl Bmp280DeviceAddress {
    const ADDR_PRIMARY: u16 = 0x76;
    const ADDR_SECONDARY: u16 = 0x77;

    pub fn value(&self) -> u16 {
        match *self {
            Self::Primary => Self::ADDR_PRIMARY,
            Self::Secondary => Self::ADDR_SECONDARY,
        }
    }
}

impl fmt::Display for Bmp280DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::Primary => write!(f, "Primary/{:#04x}", self.value()),
            Self::Secondary => write!(f, "Secondary/{:#04x}", self.value()),
        }
    }
}

#[allow(dead_code)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Bmp280OverSampling {
    Skipped,
    X1,
    X2,
    X4,
    X8,
    X16,
}

impl Bmp280OverSampling {
    const OSR_SKIPPED: u8 = 0x00;
    const OSR_X1: u8 = 0x01;
    const OSR_X2: u8 = 0x02;
    const OSR_X4: u8 = 0x03;
    const OSR_X8: u8 = 0x04;
    const OSR_X16: u8 = 0x05;

    pub const fn value(&self) -> u8 {
        match *self {
            Self::Skipped => Self::OSR_SKIPPED,
            Self::X1 => Self::OSR_X1,
            Self::X2 => Self::OSR_X2,
            Self::X4 => Self::OSR_X4,
            Self::X8 => Self::OSR_X8,
            Self::X16 => Self::OSR_X16,
        }
    }
}

#[allow(dead_code)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Bmp280PowerMode {
    Sleep,
    Forced,
    Normal,
}

impl Bmp280PowerMode {
    const POWERMODE_SLEEP: u8 = 0x00;
    const POWERMODE_FORCED: u8 = 0x01;
    const POWERMODE_NORMAL: u8 = 0x03;

    pub const fn value(&self) -> u8 {
        match *self {
            Self::Sleep => Self::POWERMODE_SLEEP,
            Self::Forced => Self::POWERMODE_FORCED,
            Self::Normal => Self::POWERMODE_NORMAL,
        }
    }
}

impl fmt::Display for Bmp280PowerMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::Sleep => write!(f, "Sleep/{:#04x}", self.value()),
            Self::Forced => write!(f, "Forced/{:#04x}", self.value()),
            Self::Normal => write!(f, "Normal/{:#04x}", self.value()),
        }
    }
}

// -- ctrl_meas layout: osrs_t[7:5] osrs_p[4:2] mode[1:0]
const BMP280_CTRL_MEAS_TEMP_POS: u8 = 5;
const BMP280_CTRL_MEAS_PRESS_POS: u8 = 2;

pub const fn ctrl_meas_value(osr_t: Bmp280OverSampling, osr_p: Bmp280OverSampling,
    mode: Bmp280PowerMode) -> u8 {
    (osr_t.value() << BMP280_CTRL_MEAS_TEMP_POS) | (osr_p.value() << BMP280_CTRL_MEAS_PRESS_POS) | mode.value()
}

/// Lifecycle of one attached device context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bmp280LifecycleState {
    Unattached,
    Detecting,
    Ready,
    Faulted,
    Removed,
}

impl fmt::Display for Bmp280LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::Unattached => write!(f, "Unattached"),
            Self::Detecting => write!(f, "Detecting"),
            Self::Ready => write!(f, "Ready"),
            Self::Faulted => write!(f, "Faulted"),
            Self::Removed => write!(f, "Removed"),
        }
    }
}
