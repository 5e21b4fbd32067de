//! Operator console helpers
//!
//! All prompts read whole lines from a caller-supplied [`BufRead`] so the
//! engine can be driven by a scripted cursor in tests. End-of-input on a
//! prompt is treated as cancellation; a closed stdin must not spin a
//! reprompt loop.

use crate::error::{Error, Result};
use crate::harness::cancel::CancelToken;
use std::io::{self, BufRead, Write};

/// Print a prompt and read one trimmed line
pub fn prompt_line(prompt: &str, cancel: &CancelToken, input: &mut dyn BufRead) -> Result<String> {
    cancel.checkpoint()?;
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(Error::Interrupted);
    }
    cancel.checkpoint()?;
    Ok(line.trim().to_string())
}

/// Print a test intro and wait for the operator to start it
pub fn init_test(intro: &str, cancel: &CancelToken, input: &mut dyn BufRead) -> Result<()> {
    println!("{}", intro);
    println!("# To stop test press Ctrl+C.");
    println!();
    prompt_line("Press enter to start the test", cancel, input)?;
    println!();
    Ok(())
}
