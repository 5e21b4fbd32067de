//! Error types for YantraIO

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// YantraIO error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Sensor port has not completed auto-configuration yet (transient, retried)
    #[error("Sensor port not ready")]
    SensorNotReady,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Firmware capability mismatch
    #[error("Firmware version mismatch: expected {expected}, detected {actual}")]
    FirmwareMismatch {
        /// Firmware version the host library requires
        expected: String,
        /// Firmware version reported by the board
        actual: String,
    },

    /// Operator cancellation (Ctrl+C); unwinds to the nearest test boundary
    #[error("Interrupted by operator")]
    Interrupted,

    /// Port type with no registered ports
    #[error("Unknown port type: {0}")]
    UnknownPortType(String),

    /// Configuration file could not be loaded or parsed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unknown device type in configuration
    #[error("Unknown device type: {0}")]
    UnknownDevice(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
