use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One-shot cooperative stop flag shared between a session and its
/// capture thread.
///
/// Setting it never blocks. The capture loop checks it once per
/// iteration, so a thread parked inside a read only notices after the
/// read returns.
#[derive(Clone, Debug, Default)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal stop. Returns `true` only for the call that set the flag.
    pub fn signal(&self) -> bool {
        let first = !self.stopped.swap(true, Ordering::SeqCst);
        if first {
            tracing::trace!("stop signal raised");
        }
        first
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}
