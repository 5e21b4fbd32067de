//! Closed-loop motor test patterns
//!
//! Every pattern shares the same framing: zero all encoders to establish
//! a common reference, split the registry into one leader port and its
//! followers, then derive control outputs from the leader's reading on a
//! fixed period until cancelled.

use crate::controller::{Controller, SensorMode, MOTOR_FLOAT};
use crate::error::Result;
use crate::harness::status::{render_status, safe_read};
use crate::harness::{configure, console, TestCtx};
use crate::ports::{other_ports, port_mask, Port, MOTOR_PORTS, SENSOR_PORTS};
use std::time::Duration;

/// Control loop period
const TICK: Duration = Duration::from_millis(20);

/// Follower power limit in percent (speed- and position-follow)
const FOLLOWER_POWER_LIMIT: u8 = 50;

/// Follower speed limit in degrees per second
const FOLLOWER_DPS_LIMIT: i32 = 200;

/// Encoder-to-power divider for the power-from-position pattern
const POWER_DIVIDER: i32 = 10;

/// Power clamp for the power-from-position pattern
const MAX_POWER: i32 = 100;

/// Leader/follower split for one motor test invocation
pub struct MotorSession {
    /// Port whose reading drives the control outputs
    pub leader: Port,
    /// Registry minus the leader, in registry order
    pub followers: Vec<Port>,
    /// Combined id mask of the followers
    pub follower_mask: u8,
}

impl MotorSession {
    /// Split the motor registry around a leader port (by id equality)
    pub fn new(leader: Port) -> Self {
        let followers = other_ports(&MOTOR_PORTS, leader);
        let follower_mask = port_mask(&followers);
        MotorSession {
            leader,
            followers,
            follower_mask,
        }
    }
}

/// Zero every motor encoder to its current reading
///
/// Establishes a common zero at test start; a read failure is logged and
/// that port keeps its old offset rather than aborting setup.
pub fn zero_all_encoders(ctrl: &mut dyn Controller) -> Result<()> {
    for port in MOTOR_PORTS {
        let current = safe_read(0, || ctrl.read_encoder(port.id));
        ctrl.offset_encoder(port.id, current)?;
    }
    Ok(())
}

/// Shared framing for the leader/follower patterns
///
/// Prints the intro (leader name substituted), zeroes encoders, resolves
/// the session and hands control to the pattern body.
pub fn run_motor_test<F>(ctx: &mut TestCtx<'_>, intro: &str, leader: Port, body: F) -> Result<()>
where
    F: FnOnce(&mut TestCtx<'_>, &MotorSession) -> Result<()>,
{
    console::init_test(&intro.replace("{}", leader.name), ctx.cancel, ctx.input)?;
    zero_all_encoders(ctx.ctrl)?;
    let session = MotorSession::new(leader);
    body(ctx, &session)
}

/// Signed power accumulator for the power-mirror pattern
///
/// While the trigger is active the power ramps by one percent per tick,
/// reversing direction at the +/-100 rails; releasing the trigger resets
/// it to zero, ramping up again on the next press.
#[derive(Debug)]
pub struct PowerRamp {
    power: i16,
    adder: i16,
}

impl Default for PowerRamp {
    fn default() -> Self {
        Self::new()
    }
}

impl PowerRamp {
    /// Start at zero power, ramping upward
    pub fn new() -> Self {
        PowerRamp { power: 0, adder: 1 }
    }

    /// Advance one tick and return the power to apply
    pub fn tick(&mut self, active: bool) -> i8 {
        if active {
            if self.power <= -100 || self.power >= 100 {
                self.adder = -self.adder;
            }
            self.power += self.adder;
        } else {
            self.power = 0;
            self.adder = 1;
        }
        self.power as i8
    }
}

/// Derive a clamped power value from an encoder reading
pub fn power_from_encoder(encoder: i32, divider: i32, max_power: i32) -> i8 {
    (encoder / divider).clamp(-max_power, max_power) as i8
}

/// Power-mirror pattern: a touch sensor ramps power on all motor ports
///
/// Waits for an initial press on sensor port 1, then mirrors the ramp to
/// every motor port each tick while printing all encoder values.
pub fn run_power_mirror(ctx: &mut TestCtx<'_>, intro: &str) -> Result<()> {
    let touch_port = SENSOR_PORTS[0];

    console::init_test(intro, ctx.cancel, ctx.input)?;
    ctx.ctrl.set_sensor_mode(touch_port.id, SensorMode::Touch)?;
    configure::ensure_ready(ctx.ctrl, ctx.cancel, touch_port)?;

    println!("Press touch sensor on port {} to run motors", touch_port.name);
    loop {
        ctx.cancel.checkpoint()?;
        match ctx.ctrl.read_sensor(touch_port.id) {
            Ok(value) if value.is_active() => break,
            _ => {}
        }
    }

    let all_motors = port_mask(&MOTOR_PORTS);
    let mut ramp = PowerRamp::new();
    loop {
        let active = match ctx.ctrl.read_sensor(touch_port.id) {
            Ok(value) => value.is_active(),
            Err(err) => {
                // An unreadable trigger counts as released for this tick
                println!("{}", err);
                false
            }
        };

        let power = ramp.tick(active);
        ctx.ctrl.set_motor_power(all_motors, power)?;

        let line = render_status(ctx.ctrl, "Encoder: ", &MOTOR_PORTS, |c, p| {
            c.read_encoder(p.id).map(|v| v.to_string())
        });
        println!("{}", line);

        ctx.cancel.sleep(TICK)?;
    }
}

/// Speed-follow pattern: followers chase the leader's encoder as a speed
///
/// The leader floats so it can be rotated by hand; its (zeroed) encoder
/// value becomes every follower's target speed each tick.
pub fn run_speed_follow(ctx: &mut TestCtx<'_>, session: &MotorSession) -> Result<()> {
    ctx.ctrl.set_motor_power(session.leader.id, MOTOR_FLOAT)?;

    loop {
        let target = safe_read(0, || ctx.ctrl.read_encoder(session.leader.id));
        ctx.ctrl.set_motor_dps(session.follower_mask, target)?;
        ctx.ctrl
            .set_motor_limits(session.follower_mask, FOLLOWER_POWER_LIMIT, FOLLOWER_DPS_LIMIT)?;

        let prefix = format!("Target Degrees Per Second: {}   Motor status ", target);
        let line = render_status(ctx.ctrl, &prefix, &session.followers, |c, p| {
            c.read_motor_status(p.id).map(|s| s.to_string())
        });
        println!("{}", line);

        ctx.cancel.sleep(TICK)?;
    }
}

/// Position-follow pattern: followers run to the leader's position
pub fn run_position_follow(ctx: &mut TestCtx<'_>, session: &MotorSession) -> Result<()> {
    ctx.ctrl.set_motor_power(session.leader.id, MOTOR_FLOAT)?;
    ctx.ctrl
        .set_motor_limits(session.follower_mask, FOLLOWER_POWER_LIMIT, FOLLOWER_DPS_LIMIT)?;

    loop {
        let target = safe_read(0, || ctx.ctrl.read_encoder(session.leader.id));
        ctx.ctrl.set_motor_position(session.follower_mask, target)?;

        let prefix = format!("Target: {}   Motor position ", target);
        let line = render_status(ctx.ctrl, &prefix, &session.followers, |c, p| {
            c.read_encoder(p.id).map(|v| v.to_string())
        });
        println!("{}", line);

        ctx.cancel.sleep(TICK)?;
    }
}

/// Power-from-position pattern: leader position drives follower power
///
/// Every tick the leader's encoder reading is divided down, clamped to
/// +/-100 percent and applied to the followers.
pub fn run_power_from_position(ctx: &mut TestCtx<'_>, session: &MotorSession) -> Result<()> {
    loop {
        let encoder = safe_read(0, || ctx.ctrl.read_encoder(session.leader.id));
        let power = power_from_encoder(encoder, POWER_DIVIDER, MAX_POWER);
        ctx.ctrl.set_motor_power(session.follower_mask, power)?;

        ctx.cancel.sleep(TICK)?;
    }
}

/// Open-loop readings test: render one reading for all motor ports
///
/// Backs the encoder and motor-status menu entries; zeroes the encoders
/// once and then only reads.
pub fn run_motor_readings<F>(
    ctx: &mut TestCtx<'_>,
    intro: &str,
    prefix: &str,
    mut read: F,
) -> Result<()>
where
    F: FnMut(&mut dyn Controller, Port) -> Result<String>,
{
    console::init_test(intro, ctx.cancel, ctx.input)?;
    zero_all_encoders(ctx.ctrl)?;

    loop {
        let line = render_status(ctx.ctrl, prefix, &MOTOR_PORTS, &mut read);
        println!("{}", line);

        ctx.cancel.sleep(TICK)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::SensorValue;
    use crate::devices::mock::{Call, MockController};
    use crate::error::Error;
    use crate::harness::cancel::CancelToken;
    use crate::ports::{PORT_A, PORT_B, PORT_C, PORT_D};
    use std::io::Cursor;

    #[test]
    fn test_power_ramp_round_trip() {
        let mut ramp = PowerRamp::new();

        let mut last = 0;
        for _ in 0..100 {
            last = ramp.tick(true);
        }
        assert_eq!(last, 100);

        for _ in 0..100 {
            last = ramp.tick(true);
        }
        assert_eq!(last, 0);
    }

    #[test]
    fn test_power_ramp_resets_on_release() {
        let mut ramp = PowerRamp::new();
        for _ in 0..42 {
            ramp.tick(true);
        }
        assert_eq!(ramp.tick(false), 0);
        // The next press ramps upward again
        assert_eq!(ramp.tick(true), 1);
    }

    #[test]
    fn test_power_from_encoder_clamping() {
        assert_eq!(power_from_encoder(1500, 10, 100), 100);
        assert_eq!(power_from_encoder(-50, 10, 100), -5);
        assert_eq!(power_from_encoder(-2000, 10, 100), -100);
        assert_eq!(power_from_encoder(0, 10, 100), 0);
    }

    #[test]
    fn test_session_excludes_leader_by_id() {
        let session = MotorSession::new(MOTOR_PORTS[2]);
        assert_eq!(session.followers.len(), 3);
        assert_eq!(session.follower_mask, PORT_A | PORT_B | PORT_D);
        assert!(session.followers.iter().all(|p| p.id != PORT_C));
    }

    #[test]
    fn test_zero_all_encoders_survives_read_failure() {
        let mut mock = MockController::new();
        mock.set_encoder(PORT_A, 123);
        mock.set_encoder(PORT_B, 77);
        mock.fail_reads(PORT_B, 1);

        zero_all_encoders(&mut mock).unwrap();

        // Port A was zeroed against its live reading, port B against the
        // substituted default.
        assert_eq!(mock.read_encoder(PORT_A).unwrap(), 0);
        assert_eq!(mock.read_encoder(PORT_B).unwrap(), 77);
    }

    #[test]
    fn test_speed_follow_commands_followers() {
        let mut mock = MockController::new();
        mock.set_encoder(PORT_A, 90);
        let cancel = CancelToken::new();
        mock.cancel_after(cancel.clone(), 40);
        let mut input = Cursor::new(b"\n".to_vec());
        let mut ctx = TestCtx {
            ctrl: &mut mock,
            cancel: &cancel,
            input: &mut input,
        };

        let result = run_motor_test(&mut ctx, "# Motor {} drives the others.", MOTOR_PORTS[0], run_speed_follow);
        assert!(matches!(result, Err(Error::Interrupted)));

        let followers = PORT_B | PORT_C | PORT_D;
        // Leader floated, followers commanded with the zeroed encoder value
        assert!(mock.calls().contains(&Call::Power(PORT_A, MOTOR_FLOAT)));
        assert!(mock.calls().contains(&Call::Dps(followers, 0)));
        assert!(mock
            .calls()
            .contains(&Call::Limits(followers, FOLLOWER_POWER_LIMIT, FOLLOWER_DPS_LIMIT)));
    }

    #[test]
    fn test_position_follow_sets_limits_once() {
        let mut mock = MockController::new();
        let cancel = CancelToken::new();
        mock.cancel_after(cancel.clone(), 40);
        let mut input = Cursor::new(b"\n".to_vec());
        let mut ctx = TestCtx {
            ctrl: &mut mock,
            cancel: &cancel,
            input: &mut input,
        };

        let result = run_motor_test(
            &mut ctx,
            "# Motors follow the position of motor {}.",
            MOTOR_PORTS[1],
            run_position_follow,
        );
        assert!(matches!(result, Err(Error::Interrupted)));

        let limit_calls = mock
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::Limits(..)))
            .count();
        assert_eq!(limit_calls, 1);

        let followers = PORT_A | PORT_C | PORT_D;
        assert!(mock.calls().contains(&Call::Position(followers, 0)));
    }

    #[test]
    fn test_power_from_position_applies_clamped_power() {
        let mut mock = MockController::new();
        // Leader D sits at 1500 degrees: divided by 10 and clamped to 100
        mock.set_encoder(PORT_D, 1500);
        let cancel = CancelToken::new();
        mock.cancel_after(cancel.clone(), 10);
        let mut input = Cursor::new(Vec::new());
        let mut ctx = TestCtx {
            ctrl: &mut mock,
            cancel: &cancel,
            input: &mut input,
        };

        let session = MotorSession::new(MOTOR_PORTS[3]);
        let result = run_power_from_position(&mut ctx, &session);
        assert!(matches!(result, Err(Error::Interrupted)));

        let followers = PORT_A | PORT_B | PORT_C;
        assert!(mock.calls().contains(&Call::Power(followers, 100)));
    }

    #[test]
    fn test_power_mirror_ramps_while_pressed() {
        let touch = SENSOR_PORTS[0];
        let mut mock = MockController::new();
        mock.set_sensor_mode(touch.id, SensorMode::Touch).unwrap();
        mock.push_sensor_values(touch.id, SensorMode::Touch, vec![SensorValue::Scalar(1)]);
        let cancel = CancelToken::new();
        mock.cancel_after(cancel.clone(), 60);
        let mut input = Cursor::new(b"\n".to_vec());
        let mut ctx = TestCtx {
            ctrl: &mut mock,
            cancel: &cancel,
            input: &mut input,
        };

        let result = run_power_mirror(&mut ctx, "# Touch sensor ramps the motors.");
        assert!(matches!(result, Err(Error::Interrupted)));

        let all = PORT_A | PORT_B | PORT_C | PORT_D;
        // Power ramps one percent per tick from the first pressed tick
        let powers: Vec<i8> = mock
            .calls()
            .iter()
            .filter_map(|c| match c {
                Call::Power(mask, power) if *mask == all => Some(*power),
                _ => None,
            })
            .collect();
        assert!(powers.len() >= 2);
        assert_eq!(powers[0], 1);
        assert_eq!(powers[1], 2);
    }
}
