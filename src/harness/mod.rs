//! Per-port test-execution engine
//!
//! The harness is one single-threaded foreground loop per test: no
//! background polling, no work queue. All suspension is either a fixed
//! sleep between ticks or a blocking read of operator input, and the
//! cancellation token is the only cross-thread state.

pub mod cancel;
pub mod configure;
pub mod console;
pub mod menu;
pub mod motor;
pub mod sampler;
pub mod select;
pub mod shutdown;
pub mod status;

use crate::controller::Controller;
use self::cancel::CancelToken;
use std::io::BufRead;

/// Shared context threaded through every test routine
///
/// Tests run strictly sequentially, so holding the one controller handle
/// here also guarantees that no two routines poll the same port at once.
pub struct TestCtx<'a> {
    /// Controller handle (constructed once, reset on every cancellation)
    pub ctrl: &'a mut dyn Controller,
    /// Operator cancellation token
    pub cancel: &'a CancelToken,
    /// Operator input stream (stdin in the binary, a cursor in tests)
    pub input: &'a mut dyn BufRead,
}
