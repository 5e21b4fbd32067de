//! Status rendering and the safe-read convention
//!
//! A single faulty reading must never terminate a running test: wrapped
//! reads substitute a neutral default and log the error instead of
//! propagating it.

use crate::controller::Controller;
use crate::error::Result;
use crate::ports::Port;
use std::fmt::Write;

/// safe_read convention: substitute `fallback` and log on read failure
pub fn safe_read<T>(fallback: T, read: impl FnOnce() -> Result<T>) -> T {
    match read() {
        Ok(value) => value,
        Err(err) => {
            log::warn!("{}", err);
            fallback
        }
    }
}

/// Render one aggregate status line across `ports`, in the given order
///
/// Each port's value is read through the safe-read convention ("0" on
/// failure), so this never fails and always renders every port.
pub fn render_status<F>(
    ctrl: &mut dyn Controller,
    prefix: &str,
    ports: &[Port],
    mut read: F,
) -> String
where
    F: FnMut(&mut dyn Controller, Port) -> Result<String>,
{
    let mut line = String::from(prefix);
    for &port in ports {
        let value = match read(ctrl, port) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("port {}: {}", port.name, err);
                "0".to_string()
            }
        };
        let _ = write!(line, " {}: {}", port.name, value);
    }
    line
}
