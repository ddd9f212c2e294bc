//! Exclusive admission gate for runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

/// Process-wide gate allowing at most one run at a time.
///
/// Acquisition never waits: [`RunGate::try_acquire`] either hands out a
/// [`RunPermit`] or returns `None` straight away. Cloning the gate shares
/// the same underlying flag.
///
/// # Example
///
/// ```ignore
/// let gate = RunGate::new();
/// let Some(permit) = gate.try_acquire() else {
///     return Err(OrchestratorError::Busy);
/// };
/// pipeline.run(&config).await;
/// drop(permit); // released on every exit path, including panics
/// ```
#[derive(Debug, Clone, Default)]
pub struct RunGate {
    held: Arc<AtomicBool>,
}

impl RunGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self) -> Option<RunPermit> {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| {
                debug!("Run gate acquired");
                RunPermit {
                    held: Arc::clone(&self.held),
                }
            })
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

/// Proof of admission. Dropping it reopens the gate.
#[derive(Debug)]
pub struct RunPermit {
    held: Arc<AtomicBool>,
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        if std::thread::panicking() {
            warn!("Run gate released while panicking");
        } else {
            debug!("Run gate released");
        }
        self.held.store(false, Ordering::Release);
    }
}
