//! Shutdown sequencing on operator cancellation
//!
//! The outermost catcher of [`Error::Interrupted`] owns the shutdown:
//! inner loops only propagate, so the controller reset runs exactly once
//! per cancellation event.

use crate::controller::Controller;
use crate::error::{Error, Result};
use crate::harness::cancel::CancelToken;

/// Restore the controller to its neutral state and close the test output
///
/// Deconfigures all sensors, stops all motors and returns the LED to
/// firmware control. A reset failure is logged rather than raised so the
/// operator always gets back to the menu.
pub fn finish(ctrl: &mut dyn Controller) {
    if let Err(err) = ctrl.reset_all() {
        log::warn!("controller reset failed during shutdown: {}", err);
    }
    println!();
    println!();
}

/// Handle a test's result at its outer boundary
///
/// Converts [`Error::Interrupted`] into one [`finish`] call and re-arms
/// the token so the operator can pick another test; everything else
/// passes through.
pub fn at_boundary(ctrl: &mut dyn Controller, cancel: &CancelToken, result: Result<()>) -> Result<()> {
    match result {
        Err(Error::Interrupted) => {
            finish(ctrl);
            cancel.reset();
            Ok(())
        }
        other => other,
    }
}
