//! Controller device implementations

pub mod mock;

pub use mock::MockController;

use crate::config::AppConfig;
use crate::controller::Controller;
use crate::error::{Error, Result};

/// Create the controller named by the configuration
///
/// The physical SPI transport driver is an external crate; the only
/// built-in device type is the hardware-free `mock` simulation.
pub fn create_controller(config: &AppConfig) -> Result<Box<dyn Controller>> {
    match config.device.device_type.as_str() {
        "mock" => {
            log::info!("Creating mock controller: {}", config.device.name);
            Ok(Box::new(MockController::new()))
        }
        other => Err(Error::UnknownDevice(other.to_string())),
    }
}
