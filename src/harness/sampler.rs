//! Value sampling for sensor tests
//!
//! A sensor test targets either one capability mode or an ordered list of
//! modes. In the multi-mode case the physical port can only hold one mode
//! at a time, so each round re-arms the port mode before every read.

use crate::controller::{parse_value, Controller, SensorMode, ValueParser};
use crate::error::{Error, Result};
use crate::harness::cancel::CancelToken;
use crate::harness::{configure, console, TestCtx};
use crate::ports::Port;
use std::time::Duration;

/// Polling period of the sampling loop
const SAMPLE_PERIOD: Duration = Duration::from_millis(20);

/// Settle delay after a mode change, before the read
const MODE_SETTLE: Duration = Duration::from_millis(20);

/// Mode selection for one sensor test, resolved once at test start
#[derive(Debug, Clone)]
pub enum SensorModeSpec {
    /// Sample one mode every tick
    Single(SensorMode),
    /// Cycle through an ordered list of modes every tick
    Multi(Vec<SensorMode>),
}

impl SensorModeSpec {
    /// The mode the port is armed with before configuration
    pub fn first(&self) -> Option<SensorMode> {
        match self {
            SensorModeSpec::Single(mode) => Some(*mode),
            SensorModeSpec::Multi(modes) => modes.first().copied(),
        }
    }
}

/// Run one multi-mode sampling round
///
/// For each mode in order: arm the mode, wait for it to settle, take one
/// read. Values come back parsed, in mode order. The first failure aborts
/// the round; the caller decides whether to skip or propagate.
pub fn sample_all_modes(
    ctrl: &mut dyn Controller,
    cancel: &CancelToken,
    port: Port,
    modes: &[SensorMode],
    parser: Option<ValueParser>,
) -> Result<Vec<String>> {
    let mut raw = Vec::with_capacity(modes.len());
    for &mode in modes {
        ctrl.set_sensor_mode(port.id, mode)?;
        cancel.sleep(MODE_SETTLE)?;
        raw.push(ctrl.read_sensor(port.id)?);
    }
    Ok(raw.iter().map(|v| parse_value(v, parser)).collect())
}

fn sample_round(
    ctrl: &mut dyn Controller,
    cancel: &CancelToken,
    port: Port,
    spec: &SensorModeSpec,
    parser: Option<ValueParser>,
) -> Result<String> {
    match spec {
        SensorModeSpec::Single(_) => {
            let value = ctrl.read_sensor(port.id)?;
            Ok(parse_value(&value, parser))
        }
        SensorModeSpec::Multi(modes) => {
            Ok(sample_all_modes(ctrl, cancel, port, modes, parser)?.join("   "))
        }
    }
}

/// Run a sensor test on one port until cancelled
///
/// Prints the intro (with the port name substituted), arms the first
/// mode, waits for configuration, then samples on a fixed period. Read
/// errors are printed and the loop continues; only operator cancellation
/// leaves it.
pub fn run_sensor_test(
    ctx: &mut TestCtx<'_>,
    port: Port,
    intro: &str,
    spec: &SensorModeSpec,
    parser: Option<ValueParser>,
) -> Result<()> {
    let first = spec
        .first()
        .ok_or_else(|| Error::Other("sensor test needs at least one mode".to_string()))?;

    console::init_test(&intro.replace("{}", port.name), ctx.cancel, ctx.input)?;
    ctx.ctrl.set_sensor_mode(port.id, first)?;
    configure::ensure_ready(ctx.ctrl, ctx.cancel, port)?;

    loop {
        match sample_round(ctx.ctrl, ctx.cancel, port, spec, parser) {
            Ok(line) => println!("{}", line),
            Err(Error::Interrupted) => return Err(Error::Interrupted),
            // Transient per-tick failures skip the round, not the test
            Err(err) => println!("{}", err),
        }
        ctx.cancel.sleep(SAMPLE_PERIOD)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{parse_color, SensorValue};
    use crate::devices::mock::{Call, MockController};
    use crate::ports::SENSOR_PORTS;
    use std::io::Cursor;

    #[test]
    fn test_multi_mode_round_preserves_order() {
        let port = SENSOR_PORTS[1];
        let mut mock = MockController::new();
        mock.push_sensor_values(
            port.id,
            SensorMode::ColorReflected,
            vec![SensorValue::Scalar(11)],
        );
        mock.push_sensor_values(
            port.id,
            SensorMode::ColorAmbient,
            vec![SensorValue::Scalar(22)],
        );
        mock.push_sensor_values(
            port.id,
            SensorMode::ColorColor,
            vec![SensorValue::Scalar(33)],
        );
        let cancel = CancelToken::new();

        let modes = [
            SensorMode::ColorReflected,
            SensorMode::ColorAmbient,
            SensorMode::ColorColor,
        ];
        let values = sample_all_modes(&mut mock, &cancel, port, &modes, None).unwrap();
        assert_eq!(values, vec!["11", "22", "33"]);

        // Each read happens immediately after its own mode was armed
        let calls: Vec<&Call> = mock
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::SetMode(..) | Call::ReadSensor(_)))
            .collect();
        assert_eq!(
            calls,
            vec![
                &Call::SetMode(port.id, SensorMode::ColorReflected),
                &Call::ReadSensor(port.id),
                &Call::SetMode(port.id, SensorMode::ColorAmbient),
                &Call::ReadSensor(port.id),
                &Call::SetMode(port.id, SensorMode::ColorColor),
                &Call::ReadSensor(port.id),
            ]
        );
    }

    #[test]
    fn test_multi_mode_round_aborts_on_failure() {
        let port = SENSOR_PORTS[0];
        let mut mock = MockController::new();
        mock.fail_reads(port.id, 1);
        let cancel = CancelToken::new();

        let modes = [SensorMode::ColorReflected, SensorMode::ColorAmbient];
        let result = sample_all_modes(&mut mock, &cancel, port, &modes, None);
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_single_round_applies_parser() {
        let port = SENSOR_PORTS[0];
        let mut mock = MockController::new();
        mock.set_sensor_mode(port.id, SensorMode::ColorColor).unwrap();
        mock.push_sensor_values(
            port.id,
            SensorMode::ColorColor,
            vec![SensorValue::Scalar(5)],
        );
        let cancel = CancelToken::new();

        let spec = SensorModeSpec::Single(SensorMode::ColorColor);
        let line = sample_round(&mut mock, &cancel, port, &spec, Some(parse_color)).unwrap();
        assert_eq!(line, "Red");
    }

    #[test]
    fn test_sensor_test_runs_until_cancelled() {
        let port = SENSOR_PORTS[0];
        let mut mock = MockController::new();
        let cancel = CancelToken::new();
        mock.cancel_after(cancel.clone(), 8);
        let mut input = Cursor::new(b"\n".to_vec());
        let mut ctx = TestCtx {
            ctrl: &mut mock,
            cancel: &cancel,
            input: &mut input,
        };

        let spec = SensorModeSpec::Single(SensorMode::Touch);
        let result = run_sensor_test(&mut ctx, port, "# Touch sensor on port {}.", &spec, None);
        assert!(matches!(result, Err(Error::Interrupted)));
        // The boundary has not run yet: no reset happened inside the loop
        assert_eq!(mock.reset_count(), 0);
    }

    #[test]
    fn test_read_errors_do_not_terminate_test() {
        let port = SENSOR_PORTS[0];
        let mut mock = MockController::new();
        // Faults on every early read; the loop must keep polling through
        // them until the cancellation fires.
        mock.fail_reads(port.id, 3);
        let cancel = CancelToken::new();
        mock.cancel_after(cancel.clone(), 10);
        let mut input = Cursor::new(b"\n".to_vec());
        let mut ctx = TestCtx {
            ctrl: &mut mock,
            cancel: &cancel,
            input: &mut input,
        };

        let spec = SensorModeSpec::Single(SensorMode::Touch);
        let result = run_sensor_test(&mut ctx, port, "# Touch sensor on port {}.", &spec, None);
        assert!(matches!(result, Err(Error::Interrupted)));

        let reads = mock
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::ReadSensor(_)))
            .count();
        assert!(reads > 3, "loop should outlive the faulty reads");
    }
}
