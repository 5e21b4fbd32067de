//! Controller trait definition
//!
//! The physical transport (SPI/serial driver) lives outside this crate;
//! the harness consumes it through this trait only. Implementations must
//! distinguish the transient "sensor not yet configured" condition
//! ([`crate::Error::SensorNotReady`]) from hard I/O faults
//! ([`crate::Error::Io`]) so the retry and safe-read policies can tell
//! them apart.

use crate::error::Result;
use std::fmt;

/// Sentinel power value that releases a motor into free-spin (idle) mode
pub const MOTOR_FLOAT: i8 = -128;

/// Sensor capability tag understood by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorMode {
    /// Digital touch/press state (0 or 1)
    Touch,
    /// Detected color index (see [`COLOR_NAMES`])
    ColorColor,
    /// Raw red/green/blue/ambient components
    ColorComponents,
    /// Reflected light intensity
    ColorReflected,
    /// Ambient light intensity
    ColorAmbient,
    /// Absolute rotation plus rotation rate
    GyroAbsDps,
    /// Infrared proximity estimate
    InfraredProximity,
    /// Infrared remote button state
    InfraredRemote,
    /// Ultrasonic distance in centimeters
    UltrasonicCm,
}

/// One raw sensor sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorValue {
    /// Single reading (touch state, distance, light level, ...)
    Scalar(i32),
    /// Multi-component reading (color components, gyro abs+dps, ...)
    Vector(Vec<i32>),
}

impl SensorValue {
    /// Digital interpretation of the sample (non-zero scalar = active)
    pub fn is_active(&self) -> bool {
        match self {
            SensorValue::Scalar(v) => *v != 0,
            SensorValue::Vector(v) => !v.is_empty(),
        }
    }
}

impl fmt::Display for SensorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorValue::Scalar(v) => write!(f, "{}", v),
            SensorValue::Vector(values) => {
                let mut first = true;
                for v in values {
                    if !first {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", v)?;
                    first = false;
                }
                Ok(())
            }
        }
    }
}

/// Live status of one motor port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MotorStatus {
    /// Fault flags (overloaded, low voltage, ...)
    pub flags: u8,
    /// Applied power in percent (-100..=100)
    pub power: i8,
    /// Encoder position in degrees
    pub position: i32,
    /// Current speed in degrees per second
    pub dps: i32,
}

impl fmt::Display for MotorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.flags, self.power, self.position, self.dps
        )
    }
}

/// Controller board driver trait
///
/// Ports are addressed by their one-hot id; motor commands take an OR-ed
/// mask so one call can drive several motors.
pub trait Controller: Send {
    /// Read the current sample of a sensor port
    ///
    /// Fails with [`crate::Error::SensorNotReady`] while the port is still
    /// auto-configuring for its mode.
    fn read_sensor(&mut self, port: u8) -> Result<SensorValue>;

    /// Configure a sensor port for a capability mode
    fn set_sensor_mode(&mut self, port: u8, mode: SensorMode) -> Result<()>;

    /// Read a motor port's encoder, in degrees
    fn read_encoder(&mut self, port: u8) -> Result<i32>;

    /// Shift a motor port's encoder reading by `offset` degrees
    fn offset_encoder(&mut self, port: u8, offset: i32) -> Result<()>;

    /// Read the live status of a motor port
    fn read_motor_status(&mut self, port: u8) -> Result<MotorStatus>;

    /// Set raw motor power in percent for every port in `mask`
    ///
    /// [`MOTOR_FLOAT`] releases the motors into free-spin.
    fn set_motor_power(&mut self, mask: u8, power: i8) -> Result<()>;

    /// Set a target speed in degrees per second for every port in `mask`
    fn set_motor_dps(&mut self, mask: u8, dps: i32) -> Result<()>;

    /// Set a target absolute position in degrees for every port in `mask`
    fn set_motor_position(&mut self, mask: u8, position: i32) -> Result<()>;

    /// Set power and speed limits for every port in `mask`
    fn set_motor_limits(&mut self, mask: u8, power_limit: u8, dps_limit: i32) -> Result<()>;

    /// Board manufacturer string
    fn manufacturer(&mut self) -> Result<String>;

    /// Board model name
    fn board_name(&mut self) -> Result<String>;

    /// Board serial number
    fn serial_id(&mut self) -> Result<String>;

    /// Hardware revision string
    fn hardware_version(&mut self) -> Result<String>;

    /// Firmware version string
    ///
    /// Fails with [`crate::Error::FirmwareMismatch`] when the board runs a
    /// firmware this library cannot talk to.
    fn firmware_version(&mut self) -> Result<String>;

    /// Battery rail voltage
    fn voltage_battery(&mut self) -> Result<f32>;

    /// 9v regulator voltage
    fn voltage_9v(&mut self) -> Result<f32>;

    /// 5v regulator voltage
    fn voltage_5v(&mut self) -> Result<f32>;

    /// 3.3v regulator voltage
    fn voltage_3v3(&mut self) -> Result<f32>;

    /// Set the board LED brightness (0-100); 255 returns it to firmware control
    fn set_led(&mut self, brightness: u8) -> Result<()>;

    /// Deconfigure all sensors, stop all motors and release the LED
    fn reset_all(&mut self) -> Result<()>;
}

/// Color names indexed by the `ColorColor` mode's scalar value
pub const COLOR_NAMES: [&str; 8] = [
    "none", "Black", "Blue", "Green", "Yellow", "Red", "White", "Brown",
];

/// Displayable-value transform applied to raw samples before printing
pub type ValueParser = fn(&SensorValue) -> String;

/// Render a color-index sample as its color name
///
/// Out-of-range indices and vector samples fall back to the raw rendering.
pub fn parse_color(value: &SensorValue) -> String {
    match value {
        SensorValue::Scalar(v) => usize::try_from(*v)
            .ok()
            .and_then(|i| COLOR_NAMES.get(i))
            .map(|name| (*name).to_string())
            .unwrap_or_else(|| value.to_string()),
        SensorValue::Vector(_) => value.to_string(),
    }
}

/// Look up a named value parser ("color" is the only one registered)
pub fn parser_by_name(name: &str) -> Option<ValueParser> {
    match name {
        "color" => Some(parse_color),
        _ => None,
    }
}

/// Apply an optional parser to a raw sample (identity if absent)
pub fn parse_value(value: &SensorValue, parser: Option<ValueParser>) -> String {
    match parser {
        Some(parse) => parse(value),
        None => value.to_string(),
    }
}
