//! YantraIO - interactive exerciser for multi-port controller boards
//!
//! Presents a numbered menu of hardware tests and runs each as a
//! foreground polling loop until the operator cancels it with Ctrl+C.

use std::env;
use std::io;

use yantra_io::config::AppConfig;
use yantra_io::devices::create_controller;
use yantra_io::error::{Error, Result};
use yantra_io::harness::cancel::CancelToken;
use yantra_io::harness::{menu, shutdown, TestCtx};

/// Parse config path from command line arguments.
///
/// Supports:
/// - `yantra-io <path>` (positional)
/// - `yantra-io --config <path>` (flag-based)
/// - `yantra-io -c <path>` (short flag)
///
/// Without a path the built-in mock configuration is used.
fn parse_config_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();

    // Look for --config or -c flag
    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }

    // Fall back to first positional argument (if it doesn't start with -)
    if args.len() > 1 && !args[1].starts_with('-') {
        return Some(args[1].clone());
    }

    None
}

fn main() -> Result<()> {
    let config = match parse_config_path() {
        Some(path) => AppConfig::load(&path)?,
        None => AppConfig::default(),
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    log::info!("YantraIO v0.1.0 starting...");
    log::info!(
        "Device: {} ({})",
        config.device.name,
        config.device.device_type
    );

    let mut controller = create_controller(&config)?;

    let cancel = CancelToken::new();
    cancel.install_ctrlc()?;

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut ctx = TestCtx {
        ctrl: controller.as_mut(),
        cancel: &cancel,
        input: &mut input,
    };

    // Ctrl+C at the menu prompt itself ends the program; the board is
    // left neutral on the way out.
    match menu::run(&mut ctx) {
        Err(Error::Interrupted) => {
            shutdown::finish(ctx.ctrl);
            Ok(())
        }
        other => other,
    }
}
