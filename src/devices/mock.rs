//! Mock controller for hardware-free operation and unit testing
//!
//! Behavior is scripted up front (sensor values per mode, configuration
//! countdowns, queued I/O faults) and every command the harness issues is
//! recorded in a call log that tests can assert against.

use crate::controller::{Controller, MotorStatus, SensorMode, SensorValue};
use crate::error::{Error, Result};
use crate::harness::cancel::CancelToken;
use std::collections::{HashMap, VecDeque};
use std::io;

/// One recorded controller operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// `read_sensor(port)`
    ReadSensor(u8),
    /// `set_sensor_mode(port, mode)`
    SetMode(u8, SensorMode),
    /// `read_encoder(port)`
    ReadEncoder(u8),
    /// `read_motor_status(port)`
    ReadStatus(u8),
    /// `offset_encoder(port, offset)`
    OffsetEncoder(u8, i32),
    /// `set_motor_power(mask, power)`
    Power(u8, i8),
    /// `set_motor_dps(mask, dps)`
    Dps(u8, i32),
    /// `set_motor_position(mask, position)`
    Position(u8, i32),
    /// `set_motor_limits(mask, power_limit, dps_limit)`
    Limits(u8, u8, i32),
    /// `set_led(brightness)`
    Led(u8),
    /// `reset_all()`
    ResetAll,
}

/// Scriptable controller double
pub struct MockController {
    /// Queued sensor samples per (port, mode); the last sample repeats
    sensor_values: HashMap<(u8, SensorMode), VecDeque<SensorValue>>,
    /// Currently configured mode per sensor port
    current_mode: HashMap<u8, SensorMode>,
    /// Remaining `SensorNotReady` responses per sensor port
    not_ready: HashMap<u8, u32>,
    /// Raw encoder value per motor port
    encoders: HashMap<u8, i32>,
    /// Accumulated encoder offsets per motor port
    offsets: HashMap<u8, i32>,
    /// Remaining I/O faults per port (sensor and encoder reads)
    read_faults: HashMap<u8, u32>,
    /// Scripted firmware mismatch for `firmware_version()`
    firmware_fault: Option<(String, String)>,
    /// Cancel a token once this many operations have executed
    cancel_after: Option<(CancelToken, usize)>,
    /// Total operations executed so far
    ops: usize,
    /// Recorded operations
    calls: Vec<Call>,
}

impl MockController {
    /// Create a mock with everything ready and reading zero
    pub fn new() -> Self {
        MockController {
            sensor_values: HashMap::new(),
            current_mode: HashMap::new(),
            not_ready: HashMap::new(),
            encoders: HashMap::new(),
            offsets: HashMap::new(),
            read_faults: HashMap::new(),
            firmware_fault: None,
            cancel_after: None,
            ops: 0,
            calls: Vec::new(),
        }
    }

    /// Queue sensor samples for a (port, mode) pair; the last one repeats
    pub fn push_sensor_values(&mut self, port: u8, mode: SensorMode, values: Vec<SensorValue>) {
        self.sensor_values.insert((port, mode), values.into());
    }

    /// Make the next `count` reads of a sensor port fail as not-ready
    pub fn set_not_ready(&mut self, port: u8, count: u32) {
        self.not_ready.insert(port, count);
    }

    /// Set a motor port's raw encoder value
    pub fn set_encoder(&mut self, port: u8, value: i32) {
        self.encoders.insert(port, value);
    }

    /// Make the next `count` reads of a port fail with an I/O error
    pub fn fail_reads(&mut self, port: u8, count: u32) {
        self.read_faults.insert(port, count);
    }

    /// Script a firmware mismatch for `firmware_version()`
    pub fn set_firmware_fault(&mut self, expected: &str, actual: &str) {
        self.firmware_fault = Some((expected.to_string(), actual.to_string()));
    }

    /// Cancel `token` once `ops` controller operations have executed
    pub fn cancel_after(&mut self, token: CancelToken, ops: usize) {
        self.cancel_after = Some((token, ops));
    }

    /// Recorded operations, in execution order
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Number of `reset_all()` invocations so far
    pub fn reset_count(&self) -> usize {
        self.calls.iter().filter(|c| **c == Call::ResetAll).count()
    }

    fn record(&mut self, call: Call) {
        self.calls.push(call);
        self.ops += 1;
        if let Some((token, threshold)) = &self.cancel_after {
            if self.ops >= *threshold {
                token.cancel();
            }
        }
    }

    fn take_fault(&mut self, port: u8) -> Option<Error> {
        match self.read_faults.get_mut(&port) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Some(Error::Io(io::Error::new(
                    io::ErrorKind::Other,
                    format!("mock transport fault on port {:#04x}", port),
                )))
            }
            _ => None,
        }
    }
}

impl Default for MockController {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller for MockController {
    fn read_sensor(&mut self, port: u8) -> Result<SensorValue> {
        self.record(Call::ReadSensor(port));
        if let Some(remaining) = self.not_ready.get_mut(&port) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(Error::SensorNotReady);
            }
        }
        if let Some(err) = self.take_fault(port) {
            return Err(err);
        }
        let mode = self
            .current_mode
            .get(&port)
            .copied()
            .unwrap_or(SensorMode::Touch);
        let queue = self.sensor_values.get_mut(&(port, mode));
        let value = match queue {
            Some(values) if values.len() > 1 => values.pop_front(),
            Some(values) => values.front().cloned(),
            None => None,
        };
        Ok(value.unwrap_or(SensorValue::Scalar(0)))
    }

    fn set_sensor_mode(&mut self, port: u8, mode: SensorMode) -> Result<()> {
        self.record(Call::SetMode(port, mode));
        self.current_mode.insert(port, mode);
        Ok(())
    }

    fn read_encoder(&mut self, port: u8) -> Result<i32> {
        self.record(Call::ReadEncoder(port));
        if let Some(err) = self.take_fault(port) {
            return Err(err);
        }
        let raw = self.encoders.get(&port).copied().unwrap_or(0);
        let offset = self.offsets.get(&port).copied().unwrap_or(0);
        Ok(raw - offset)
    }

    fn offset_encoder(&mut self, port: u8, offset: i32) -> Result<()> {
        self.record(Call::OffsetEncoder(port, offset));
        *self.offsets.entry(port).or_insert(0) += offset;
        Ok(())
    }

    fn read_motor_status(&mut self, port: u8) -> Result<MotorStatus> {
        self.record(Call::ReadStatus(port));
        if let Some(err) = self.take_fault(port) {
            return Err(err);
        }
        let raw = self.encoders.get(&port).copied().unwrap_or(0);
        let offset = self.offsets.get(&port).copied().unwrap_or(0);
        Ok(MotorStatus {
            position: raw - offset,
            ..MotorStatus::default()
        })
    }

    fn set_motor_power(&mut self, mask: u8, power: i8) -> Result<()> {
        self.record(Call::Power(mask, power));
        Ok(())
    }

    fn set_motor_dps(&mut self, mask: u8, dps: i32) -> Result<()> {
        self.record(Call::Dps(mask, dps));
        Ok(())
    }

    fn set_motor_position(&mut self, mask: u8, position: i32) -> Result<()> {
        self.record(Call::Position(mask, position));
        Ok(())
    }

    fn set_motor_limits(&mut self, mask: u8, power_limit: u8, dps_limit: i32) -> Result<()> {
        self.record(Call::Limits(mask, power_limit, dps_limit));
        Ok(())
    }

    fn manufacturer(&mut self) -> Result<String> {
        Ok("Yantra Labs".to_string())
    }

    fn board_name(&mut self) -> Result<String> {
        Ok("Yantra Mk0 (mock)".to_string())
    }

    fn serial_id(&mut self) -> Result<String> {
        Ok("0000000000000000".to_string())
    }

    fn hardware_version(&mut self) -> Result<String> {
        Ok("1.0.0".to_string())
    }

    fn firmware_version(&mut self) -> Result<String> {
        match &self.firmware_fault {
            Some((expected, actual)) => Err(Error::FirmwareMismatch {
                expected: expected.clone(),
                actual: actual.clone(),
            }),
            None => Ok("1.4.6".to_string()),
        }
    }

    fn voltage_battery(&mut self) -> Result<f32> {
        Ok(9.6)
    }

    fn voltage_9v(&mut self) -> Result<f32> {
        Ok(9.1)
    }

    fn voltage_5v(&mut self) -> Result<f32> {
        Ok(5.0)
    }

    fn voltage_3v3(&mut self) -> Result<f32> {
        Ok(3.3)
    }

    fn set_led(&mut self, brightness: u8) -> Result<()> {
        self.record(Call::Led(brightness));
        Ok(())
    }

    fn reset_all(&mut self) -> Result<()> {
        self.record(Call::ResetAll);
        self.current_mode.clear();
        Ok(())
    }
}
