//! Sensor auto-configuration retry loop
//!
//! After a mode change the board needs a moment to detect and configure
//! the attached sensor; reads fail with the transient not-ready error
//! until it does.

use crate::controller::Controller;
use crate::error::{Error, Result};
use crate::harness::cancel::CancelToken;
use crate::ports::Port;
use std::time::Duration;

/// Retry interval while a sensor port is configuring
const CONFIGURE_RETRY: Duration = Duration::from_millis(100);

/// Block until a sensor port stops reporting the transient not-ready error
///
/// Success and hard I/O errors both count as "done"; a hard error is
/// logged but not raised, so the following sample loop gets to report it
/// per tick. Performs exactly k+1 read attempts for k not-ready replies.
pub fn ensure_ready(ctrl: &mut dyn Controller, cancel: &CancelToken, port: Port) -> Result<()> {
    match ctrl.read_sensor(port.id) {
        Err(Error::SensorNotReady) => {
            println!("Configuring...");
            loop {
                cancel.sleep(CONFIGURE_RETRY)?;
                match ctrl.read_sensor(port.id) {
                    Err(Error::SensorNotReady) => continue,
                    Err(err) => {
                        log::warn!("sensor port {}: {}", port.name, err);
                        break;
                    }
                    Ok(_) => break,
                }
            }
        }
        Err(err) => log::warn!("sensor port {}: {}", port.name, err),
        Ok(_) => {}
    }
    println!("Configured.");
    Ok(())
}
