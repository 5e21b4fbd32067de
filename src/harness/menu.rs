//! Interactive test menu
//!
//! Numbered options mirror the board's feature surface: motor loops,
//! sensor loops, LED fade, board info and voltage rails. Each option is
//! its own cancellation boundary, so Ctrl+C inside a test returns the
//! operator to this menu; Ctrl+C at the menu prompt leaves the program.

use crate::controller::{parse_color, SensorMode, ValueParser};
use crate::error::{Error, Result};
use crate::harness::cancel::CancelToken;
use crate::harness::sampler::{self, SensorModeSpec};
use crate::harness::status::safe_read;
use crate::harness::{console, motor, select, shutdown, TestCtx};
use crate::ports::PortKind;
use std::io::BufRead;
use std::time::Duration;

/// Voltage polling period
const VOLTAGE_PERIOD: Duration = Duration::from_millis(20);

/// LED fade step period
const LED_STEP: Duration = Duration::from_millis(10);

type TestFn = fn(&mut TestCtx<'_>) -> Result<()>;

/// Menu entries, in display order
const OPTIONS: &[(&str, TestFn)] = &[
    ("Motor encoder", motor_encoder_test),
    ("Motor status", motor_status_test),
    ("Motor power", motor_power_test),
    ("Motor position", motor_position_test),
    ("Motor DPS", motor_dps_test),
    ("Motors with touch sensor", motors_touch_sensor_test),
    ("Touch sensor", touch_sensor_test),
    ("Color sensor", color_sensor_color_test),
    ("Color sensor (raw)", color_sensor_raw_test),
    ("Color sensor (multi mode)", color_sensor_multi_mode_test),
    ("Gyro sensor", gyro_sensor_test),
    ("Infrared sensor", infrared_sensor_test),
    ("Infrared remote", infrared_remote_test),
    ("Ultrasonic sensor", ultrasonic_sensor_test),
    ("LED", led_test),
    ("Controller info", read_info),
    ("Voltages", voltages_test),
];

/// Run the option menu until the operator quits
pub fn run(ctx: &mut TestCtx<'_>) -> Result<()> {
    loop {
        print_options();
        let choice = prompt_option(OPTIONS.len(), ctx.cancel, ctx.input)?;

        match (OPTIONS[choice].1)(ctx) {
            Ok(()) => {}
            Err(Error::Interrupted) => return Err(Error::Interrupted),
            Err(err) => println!("{}", err),
        }

        // Leave the board neutral between tests
        if let Err(err) = ctx.ctrl.reset_all() {
            log::warn!("reset after test failed: {}", err);
        }
    }
}

fn print_options() {
    println!("Test options:");
    for (i, (name, _)) in OPTIONS.iter().enumerate() {
        println!("{}. {}", i, name);
    }
    println!();
    println!("Press Ctrl+C to exit the program.");
}

fn prompt_option(count: usize, cancel: &CancelToken, input: &mut dyn BufRead) -> Result<usize> {
    loop {
        let choice = console::prompt_line(
            "Choose the number of option you want to test: ",
            cancel,
            input,
        )?;
        if let Ok(number) = choice.parse::<usize>() {
            if number < count {
                return Ok(number);
            }
        }
    }
}

// === Sensor tests ===

fn sensor_test(
    ctx: &mut TestCtx<'_>,
    intro: &'static str,
    spec: SensorModeSpec,
    parser: Option<ValueParser>,
) -> Result<()> {
    select::run_for_each_port(PortKind::Sensor, ctx, &mut |ctx, port| {
        sampler::run_sensor_test(ctx, port, intro, &spec, parser)
    })
}

fn touch_sensor_test(ctx: &mut TestCtx<'_>) -> Result<()> {
    let intro = "\
# Hardware: Connect a touch sensor to controller port {}.
#
# Results:  You should see a 0 when the touch sensor is not pressed, and a 1 when it is pressed.";
    sensor_test(ctx, intro, SensorModeSpec::Single(SensorMode::Touch), None)
}

fn color_sensor_color_test(ctx: &mut TestCtx<'_>) -> Result<()> {
    let intro = "\
# Hardware: Connect a color sensor to controller sensor port {}.
#
# Results:  The detected color will be printed.";
    sensor_test(
        ctx,
        intro,
        SensorModeSpec::Single(SensorMode::ColorColor),
        Some(parse_color),
    )
}

fn color_sensor_raw_test(ctx: &mut TestCtx<'_>) -> Result<()> {
    let intro = "\
# Hardware: Connect a color sensor to controller sensor port {}.
#
# Results:  The raw color components will be printed.";
    sensor_test(
        ctx,
        intro,
        SensorModeSpec::Single(SensorMode::ColorComponents),
        None,
    )
}

fn color_sensor_multi_mode_test(ctx: &mut TestCtx<'_>) -> Result<()> {
    let intro = "\
# Hardware: Connect a color sensor to controller sensor port {}.
#
# Results:  The sensor will rapidly switch between modes, taking readings, and print the values.";
    let modes = vec![
        SensorMode::ColorReflected,
        SensorMode::ColorAmbient,
        SensorMode::ColorColor,
        SensorMode::ColorComponents,
    ];
    sensor_test(ctx, intro, SensorModeSpec::Multi(modes), None)
}

fn gyro_sensor_test(ctx: &mut TestCtx<'_>) -> Result<()> {
    let intro = "\
# Hardware: Connect a gyro sensor to controller sensor port {}.
#
# Results:  The gyro's absolute rotation and rate of rotation will be printed.";
    sensor_test(
        ctx,
        intro,
        SensorModeSpec::Single(SensorMode::GyroAbsDps),
        None,
    )
}

fn infrared_sensor_test(ctx: &mut TestCtx<'_>) -> Result<()> {
    let intro = "\
# Hardware: Connect an infrared sensor to controller sensor port {}.
#
# Results:  The infrared proximity will be printed.";
    sensor_test(
        ctx,
        intro,
        SensorModeSpec::Single(SensorMode::InfraredProximity),
        None,
    )
}

fn infrared_remote_test(ctx: &mut TestCtx<'_>) -> Result<()> {
    let intro = "\
# Hardware: Connect an infrared sensor to controller sensor port {}.
#
# Results:  The infrared remote status will be printed.";
    sensor_test(
        ctx,
        intro,
        SensorModeSpec::Single(SensorMode::InfraredRemote),
        None,
    )
}

fn ultrasonic_sensor_test(ctx: &mut TestCtx<'_>) -> Result<()> {
    let intro = "\
# Hardware: Connect an ultrasonic sensor to controller sensor port {}.
#
# Results:  The ultrasonic sensor distance will be printed.";
    sensor_test(
        ctx,
        intro,
        SensorModeSpec::Single(SensorMode::UltrasonicCm),
        None,
    )
}

// === Motor tests ===

fn motor_encoder_test(ctx: &mut TestCtx<'_>) -> Result<()> {
    let intro = "\
# Hardware: Connect motor(s) to any of the controller motor ports.
#
# Results:  You should see the encoder value for each motor. Manually rotating a motor changes the count by 1 per degree of rotation.";
    let result = motor::run_motor_readings(ctx, intro, "Encoder: ", |c, p| {
        c.read_encoder(p.id).map(|v| v.to_string())
    });
    shutdown::at_boundary(ctx.ctrl, ctx.cancel, result)
}

fn motor_status_test(ctx: &mut TestCtx<'_>) -> Result<()> {
    let intro = "\
# Hardware: Connect motor(s) to any of the controller motor ports.
#
# Results:  The status of each motor will be printed.";
    let result = motor::run_motor_readings(ctx, intro, "Motor status: ", |c, p| {
        c.read_motor_status(p.id).map(|s| s.to_string())
    });
    shutdown::at_boundary(ctx.ctrl, ctx.cancel, result)
}

fn motor_power_test(ctx: &mut TestCtx<'_>) -> Result<()> {
    let intro = "\
# Hardware: Connect motors to the controller motor ports. Make sure the controller is running on a 9v power supply.
#
# Results:  Motors' power will be controlled by the position of motor {}. Manually rotate motor {}, and motors' power will change.";
    select::run_for_each_port(PortKind::Motor, ctx, &mut |ctx, port| {
        motor::run_motor_test(ctx, intro, port, motor::run_power_from_position)
    })
}

fn motor_position_test(ctx: &mut TestCtx<'_>) -> Result<()> {
    let intro = "\
# Hardware: Connect motors to the controller motor ports. Make sure the controller is running on a 9v power supply.
#
# Results:  Other motors will run to match the position of motor {}. Manually rotate motor {}, and motors will follow.";
    select::run_for_each_port(PortKind::Motor, ctx, &mut |ctx, port| {
        motor::run_motor_test(ctx, intro, port, motor::run_position_follow)
    })
}

fn motor_dps_test(ctx: &mut TestCtx<'_>) -> Result<()> {
    let intro = "\
# Hardware: Connect motors to the controller motor ports. Make sure the controller is running on a 9v power supply.
#
# Results:  Other motors' speed will be controlled by the position of motor {}. Manually rotate motor {}, and motors' speed will change.";
    select::run_for_each_port(PortKind::Motor, ctx, &mut |ctx, port| {
        motor::run_motor_test(ctx, intro, port, motor::run_speed_follow)
    })
}

fn motors_touch_sensor_test(ctx: &mut TestCtx<'_>) -> Result<()> {
    let intro = "\
# Hardware: Connect motor(s) to any of the controller motor ports. Make sure the controller is running on a 9v power supply.
#           Connect a touch sensor to controller port 1.
#
# Results:  The motors' power will ramp up and down while the touch sensor is pressed. The position for each motor will be printed.";
    let result = motor::run_power_mirror(ctx, intro);
    shutdown::at_boundary(ctx.ctrl, ctx.cancel, result)
}

// === Board tests ===

fn led_test(ctx: &mut TestCtx<'_>) -> Result<()> {
    let intro = "\
# Results:  The controller LED will fade up and down.";
    let result = run_led(ctx, intro);
    shutdown::at_boundary(ctx.ctrl, ctx.cancel, result)
}

fn run_led(ctx: &mut TestCtx<'_>, intro: &str) -> Result<()> {
    console::init_test(intro, ctx.cancel, ctx.input)?;
    loop {
        for brightness in 0..=100u8 {
            ctx.ctrl.set_led(brightness)?;
            ctx.cancel.sleep(LED_STEP)?;
        }
        for brightness in (0..=100u8).rev() {
            ctx.ctrl.set_led(brightness)?;
            ctx.cancel.sleep(LED_STEP)?;
        }
    }
}

fn voltages_test(ctx: &mut TestCtx<'_>) -> Result<()> {
    let intro = "\
# Results: Print the voltages of the controller.";
    let result = run_voltages(ctx, intro);
    shutdown::at_boundary(ctx.ctrl, ctx.cancel, result)
}

fn run_voltages(ctx: &mut TestCtx<'_>, intro: &str) -> Result<()> {
    console::init_test(intro, ctx.cancel, ctx.input)?;
    loop {
        let battery = safe_read(0.0, || ctx.ctrl.voltage_battery());
        let v9 = safe_read(0.0, || ctx.ctrl.voltage_9v());
        let v5 = safe_read(0.0, || ctx.ctrl.voltage_5v());
        let v3 = safe_read(0.0, || ctx.ctrl.voltage_3v3());
        println!(
            "Battery voltage: {:6.3}  9v voltage: {:6.3}  5v voltage: {:6.3}  3.3v voltage: {:6.3}",
            battery, v9, v5, v3
        );
        ctx.cancel.sleep(VOLTAGE_PERIOD)?;
    }
}

fn read_info(ctx: &mut TestCtx<'_>) -> Result<()> {
    println!("# Results: Print information about the attached controller.");
    println!();

    match print_board_info(ctx) {
        Ok(()) => {}
        Err(Error::Interrupted) => {}
        // A firmware mismatch aborts only this one-shot action
        Err(err) => println!("{}", err),
    }

    shutdown::finish(ctx.ctrl);
    ctx.cancel.reset();
    Ok(())
}

fn print_board_info(ctx: &mut TestCtx<'_>) -> Result<()> {
    println!("Manufacturer    :  {}", info_field(|| ctx.ctrl.manufacturer())?);
    println!("Board           :  {}", info_field(|| ctx.ctrl.board_name())?);
    println!("Serial Number   :  {}", info_field(|| ctx.ctrl.serial_id())?);
    println!("Hardware version:  {}", info_field(|| ctx.ctrl.hardware_version())?);
    println!("Firmware version:  {}", info_field(|| ctx.ctrl.firmware_version())?);
    println!("Battery voltage :  {}", info_field(|| ctx.ctrl.voltage_battery())?);
    println!("9v voltage      :  {}", info_field(|| ctx.ctrl.voltage_9v())?);
    println!("5v voltage      :  {}", info_field(|| ctx.ctrl.voltage_5v())?);
    println!("3.3v voltage    :  {}", info_field(|| ctx.ctrl.voltage_3v3())?);

    console::prompt_line("\nPress enter to continue ...", ctx.cancel, ctx.input)?;
    Ok(())
}

/// Render one info field, substituting "0" on a hard I/O fault
///
/// Firmware mismatches propagate so the one-shot action aborts.
fn info_field<T: std::fmt::Display>(read: impl FnOnce() -> Result<T>) -> Result<String> {
    match read() {
        Ok(value) => Ok(value.to_string()),
        Err(Error::Io(err)) => {
            log::warn!("{}", err);
            Ok("0".to_string())
        }
        Err(other) => Err(other),
    }
}
