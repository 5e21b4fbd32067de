//! Port iteration engine
//!
//! Wraps any per-port test routine with the interactive "one port or all
//! ports" selection protocol. The engine owns the cancellation boundary:
//! whatever leaks [`Error::Interrupted`] from the prompts or the routine
//! is converted into exactly one shutdown sequence here.

use crate::error::{Error, Result};
use crate::harness::{console, shutdown, TestCtx};
use crate::ports::{registry_for, Port, PortKind};

/// Operator's port selection for one outer-loop round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionDecision {
    /// Run the routine for every port in registry order
    All,
    /// Run the routine for one chosen port
    One(Port),
}

/// Per-port test routine invoked by the engine
pub type PortRoutine<'r> = dyn FnMut(&mut TestCtx<'_>, Port) -> Result<()> + 'r;

/// Run a per-port routine for an operator-chosen port or for all ports
///
/// Selecting "all" runs the routine once per port and returns; selecting
/// a single port runs it once and re-prompts, so the operator can try
/// another port without restarting the test.
pub fn run_for_each_port(
    kind: PortKind,
    ctx: &mut TestCtx<'_>,
    routine: &mut PortRoutine<'_>,
) -> Result<()> {
    let result = run_inner(kind, ctx, routine);
    shutdown::at_boundary(ctx.ctrl, ctx.cancel, result)
}

fn run_inner(kind: PortKind, ctx: &mut TestCtx<'_>, routine: &mut PortRoutine<'_>) -> Result<()> {
    let ports = registry_for(kind);
    if ports.is_empty() {
        return Err(Error::UnknownPortType(kind.to_string()));
    }

    loop {
        println!();
        print_available_ports(ports);
        println!("If you want to quit the test just press Ctrl+C.");

        match prompt_decision(ports, ctx)? {
            SelectionDecision::All => {
                println!(
                    "The test will be held for every {} port of the controller.",
                    kind
                );
                for &port in ports {
                    routine(ctx, port)?;
                }
                return Ok(());
            }
            SelectionDecision::One(port) => routine(ctx, port)?,
        }
    }
}

fn print_available_ports(ports: &[Port]) {
    let names: Vec<&str> = ports.iter().map(|p| p.name).collect();
    println!("Available ports: {}", names.join(" "));
}

/// Prompt until the operator types `all` or an exact port name
pub fn prompt_decision(ports: &[Port], ctx: &mut TestCtx<'_>) -> Result<SelectionDecision> {
    loop {
        let choice = console::prompt_line(
            "Choose port or type 'all' if you want to run tests for all ports: ",
            ctx.cancel,
            ctx.input,
        )?;
        if choice == "all" {
            return Ok(SelectionDecision::All);
        }
        if let Some(port) = ports.iter().find(|p| p.name == choice) {
            return Ok(SelectionDecision::One(*port));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::mock::MockController;
    use crate::harness::cancel::CancelToken;
    use crate::ports::MOTOR_PORTS;
    use std::io::Cursor;

    fn run_with_input(
        input: &str,
        kind: PortKind,
        visited: &mut Vec<(u8, &'static str)>,
    ) -> (Result<()>, usize) {
        let mut mock = MockController::new();
        let cancel = CancelToken::new();
        let mut cursor = Cursor::new(input.as_bytes().to_vec());
        let mut ctx = TestCtx {
            ctrl: &mut mock,
            cancel: &cancel,
            input: &mut cursor,
        };
        let result = run_for_each_port(kind, &mut ctx, &mut |_, port| {
            visited.push((port.id, port.name));
            Ok(())
        });
        (result, mock.reset_count())
    }

    #[test]
    fn test_all_visits_every_port_once_in_order() {
        let mut visited = Vec::new();
        let (result, _) = run_with_input("all\n", PortKind::Motor, &mut visited);
        assert!(result.is_ok());
        let expected: Vec<(u8, &str)> = MOTOR_PORTS.iter().map(|p| (p.id, p.name)).collect();
        assert_eq!(visited, expected);
    }

    #[test]
    fn test_single_port_reprompts_after_routine() {
        let mut visited = Vec::new();
        // Run port B alone, then "all"; the engine returns after "all"
        let (result, _) = run_with_input("B\nall\n", PortKind::Motor, &mut visited);
        assert!(result.is_ok());
        assert_eq!(visited.len(), 5);
        assert_eq!(visited[0], (MOTOR_PORTS[1].id, "B"));
    }

    #[test]
    fn test_invalid_selections_reprompt() {
        let mut visited = Vec::new();
        let (result, _) = run_with_input("Z\nbanana\n2\n", PortKind::Sensor, &mut visited);
        // "2" is a sensor port name; afterwards the prompt hits EOF,
        // which counts as cancellation handled at the boundary.
        assert!(result.is_ok());
        assert_eq!(visited.len(), 1);
        assert_eq!(visited[0].1, "2");
    }

    #[test]
    fn test_eof_cancellation_triggers_one_shutdown() {
        let mut visited = Vec::new();
        let (result, resets) = run_with_input("", PortKind::Motor, &mut visited);
        assert!(result.is_ok());
        assert!(visited.is_empty());
        assert_eq!(resets, 1);
    }

    #[test]
    fn test_routine_interrupt_is_caught_at_boundary() {
        let mut mock = MockController::new();
        let cancel = CancelToken::new();
        let mut cursor = Cursor::new(b"A\n".to_vec());
        let mut ctx = TestCtx {
            ctrl: &mut mock,
            cancel: &cancel,
            input: &mut cursor,
        };

        let result = run_for_each_port(PortKind::Motor, &mut ctx, &mut |_, _| {
            Err(Error::Interrupted)
        });
        assert!(result.is_ok());
        assert_eq!(mock.reset_count(), 1);
        assert!(!cancel.is_cancelled());
    }

    #[test]
    fn test_cancellation_during_sampling_resets_once() {
        use crate::controller::SensorMode;
        use crate::harness::sampler::{run_sensor_test, SensorModeSpec};

        let mut mock = MockController::new();
        let cancel = CancelToken::new();
        mock.cancel_after(cancel.clone(), 6);
        // Select port "1", then confirm the start prompt
        let mut cursor = Cursor::new(b"1\n\n".to_vec());
        let mut ctx = TestCtx {
            ctrl: &mut mock,
            cancel: &cancel,
            input: &mut cursor,
        };

        let spec = SensorModeSpec::Single(SensorMode::Touch);
        let result = run_for_each_port(PortKind::Sensor, &mut ctx, &mut |ctx, port| {
            run_sensor_test(ctx, port, "# Touch sensor on port {}.", &spec, None)
        });
        assert!(result.is_ok());
        assert_eq!(mock.reset_count(), 1);
        assert!(!cancel.is_cancelled());
    }

    #[test]
    fn test_hard_errors_propagate_uncaught() {
        let mut mock = MockController::new();
        let cancel = CancelToken::new();
        let mut cursor = Cursor::new(b"all\n".to_vec());
        let mut ctx = TestCtx {
            ctrl: &mut mock,
            cancel: &cancel,
            input: &mut cursor,
        };

        let result = run_for_each_port(PortKind::Motor, &mut ctx, &mut |_, _| {
            Err(Error::Other("boom".to_string()))
        });
        assert!(matches!(result, Err(Error::Other(_))));
        assert_eq!(mock.reset_count(), 0);
    }
}
