//! SIGINT/SIGTERM handling.
//!
//! The handler only raises a flag; the extraction notices it at its next
//! cancellation poll and unwinds with `Cancelled`.

use anyhow::Context;
use anyhow::Result;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use unspool_core::ExtractionError;

/// Exit status of a run stopped by a signal (128 + SIGINT).
pub const INTERRUPTED_EXIT: u8 = 130;

/// Installs the process-wide handler and returns the flag it raises.
pub fn install() -> Result<Arc<AtomicBool>> {
    let flag = Arc::new(AtomicBool::new(false));
    let raised = Arc::clone(&flag);
    ctrlc::set_handler(move || raised.store(true, Ordering::SeqCst))
        .context("installing interrupt handler")?;
    Ok(flag)
}

/// Returns `true` if `err` came from a cancelled extraction.
pub fn is_interrupt(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ExtractionError>()
        .is_some_and(ExtractionError::is_cancelled)
}
