//! Cooperative cancellation.
//!
//! Extraction polls a [`CancellationToken`] before every entry and
//! periodically while copying file payloads. Once the token reports
//! cancellation the current operation unwinds with
//! [`ExtractionError::Cancelled`](crate::ExtractionError::Cancelled).

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

/// Source of a cancellation signal.
///
/// # Examples
///
/// ```
/// use std::sync::atomic::AtomicBool;
/// use std::sync::atomic::Ordering;
/// use unspool_core::CancellationToken;
///
/// let flag = AtomicBool::new(false);
/// assert!(!flag.is_cancelled());
/// flag.store(true, Ordering::SeqCst);
/// assert!(flag.is_cancelled());
/// ```
pub trait CancellationToken {
    /// Returns `true` once the operation should stop.
    fn is_cancelled(&self) -> bool;
}

/// Token that never fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl CancellationToken for NeverCancel {
    #[inline]
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl CancellationToken for AtomicBool {
    #[inline]
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

impl<T: CancellationToken + ?Sized> CancellationToken for &T {
    #[inline]
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

impl<T: CancellationToken + ?Sized> CancellationToken for Arc<T> {
    #[inline]
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}
